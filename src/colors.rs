use std::collections::HashMap;
use std::fmt;

use md5::{Digest, Md5};

use crate::models::{is_absent, ScheduleTable};

const FIXED_COLORS: [(&str, &str); 5] = [
    ("Ferie", "#90EE90"),
    ("Casa", "#ADD8E6"),
    ("Ufficio", "#FFA500"),
    ("Offsite", "#DAA520"),
    ("Trasferta", "#FF6B6B"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellColor {
    Fixed(&'static str),
    Hsl { hue: u32, saturation: u32, lightness: u32 },
}

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellColor::Fixed(hex) => f.write_str(hex),
            CellColor::Hsl {
                hue,
                saturation,
                lightness,
            } => write!(f, "hsl({hue}, {saturation}%, {lightness}%)"),
        }
    }
}

/// Display color for a cell value; `None` for absent cells.
///
/// Values outside the fixed vocabulary get a hue derived from the MD5 of the
/// trimmed text, so the same string colors the same way on every run.
pub fn color_for(value: &str) -> Option<CellColor> {
    if is_absent(value) {
        return None;
    }

    let trimmed = value.trim();
    if let Some((_, hex)) = FIXED_COLORS.iter().find(|(name, _)| *name == trimmed) {
        return Some(CellColor::Fixed(*hex));
    }

    let digest = Md5::digest(trimmed.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    Some(CellColor::Hsl {
        hue: ((u64::from(prefix) * 137) % 360) as u32,
        saturation: 60 + u32::from(digest[4]) % 20,
        lightness: 70 + u32::from(digest[5]) % 10,
    })
}

/// CSS declaration for a cell, empty when the cell is left unstyled.
pub fn style_for(value: &str) -> String {
    color_for(value)
        .map(|color| format!("background-color: {color}"))
        .unwrap_or_default()
}

/// Value→style lookup built once per render over the visible day cells.
#[derive(Debug, Default)]
pub struct ColorMap {
    styles: HashMap<String, String>,
}

impl ColorMap {
    pub fn build(table: &ScheduleTable, day_columns: &[usize]) -> Self {
        let mut styles = HashMap::new();
        for row in &table.rows {
            for &column in day_columns {
                let value = table.cell(row, column);
                if !styles.contains_key(value) {
                    styles.insert(value.to_string(), style_for(value));
                }
            }
        }
        Self { styles }
    }

    pub fn style(&self, value: &str) -> &str {
        self.styles.get(value).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_vocabulary_uses_exact_hex() {
        assert_eq!(color_for("Ferie"), Some(CellColor::Fixed("#90EE90")));
        assert_eq!(color_for("Casa"), Some(CellColor::Fixed("#ADD8E6")));
        assert_eq!(color_for(" Ufficio "), Some(CellColor::Fixed("#FFA500")));
        assert_eq!(color_for("Offsite"), Some(CellColor::Fixed("#DAA520")));
        assert_eq!(color_for("Trasferta"), Some(CellColor::Fixed("#FF6B6B")));
    }

    #[test]
    fn absent_cells_are_unstyled() {
        assert_eq!(color_for(""), None);
        assert_eq!(color_for("   "), None);
        assert_eq!(color_for("x"), None);
        assert_eq!(style_for("X"), "");
    }

    #[test]
    fn other_values_hash_to_stable_hsl() {
        assert_eq!(
            color_for("abc"),
            Some(CellColor::Hsl {
                hue: 184,
                saturation: 60,
                lightness: 70
            })
        );
        assert_eq!(
            color_for("Malattia").map(|c| c.to_string()),
            Some("hsl(185, 76%, 79%)".to_string())
        );
        assert_eq!(color_for("  Malattia"), color_for("Malattia"));
    }

    #[test]
    fn color_map_styles_each_visible_value() {
        let table = ScheduleTable::new(
            vec!["persona".into(), "1".into(), "2".into()],
            vec![
                vec!["Anna".into(), "Casa".into(), "X".into()],
                vec!["Luca".into(), "Casa".into(), "Ferie".into()],
            ],
        );
        let map = ColorMap::build(&table, &[1, 2]);
        assert_eq!(map.style("Ferie"), "background-color: #90EE90");
        assert_eq!(map.style("Casa"), "background-color: #ADD8E6");
        assert_eq!(map.style("X"), "");
        assert_eq!(map.style("Anna"), "");
    }
}

/// Header of the column naming the person a row belongs to.
pub const PERSON_COLUMN: &str = "persona";
const DATE_COLUMN: &str = "data";

/// The first worksheet as loaded: a header row plus data rows of equal width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ScheduleTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Index of the `persona` column, matched case-insensitively.
    pub fn person_index(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.to_lowercase() == PERSON_COLUMN)
    }

    pub fn cell<'a>(&'a self, row: &'a [String], column: usize) -> &'a str {
        row.get(column).map(String::as_str).unwrap_or("")
    }

    /// Same columns, only the rows accepted by `keep`.
    pub fn retain_rows<F>(&self, mut keep: F) -> ScheduleTable
    where
        F: FnMut(&[String]) -> bool,
    {
        ScheduleTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }

    /// Every column except the person and month columns, compared case-insensitively.
    pub fn day_columns(&self, month_column: Option<&str>) -> Vec<usize> {
        let month = month_column.map(str::to_lowercase);
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                let lower = name.to_lowercase();
                lower != PERSON_COLUMN
                    && lower != crate::months::MONTH_COLUMN
                    && month.as_deref() != Some(lower.as_str())
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Column headers with the person, date and month labels blanked, as shown to readers.
    pub fn display_headers(&self, month_column: Option<&str>) -> Vec<String> {
        self.columns
            .iter()
            .map(|name| {
                let lower = name.to_lowercase();
                let hidden = lower == PERSON_COLUMN
                    || lower == DATE_COLUMN
                    || month_column.is_some_and(|month| month == name);
                if hidden {
                    String::new()
                } else {
                    name.clone()
                }
            })
            .collect()
    }
}

/// True for cells that count as "nothing here": blank or the `X` placeholder.
pub fn is_absent(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("x")
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceStat {
    pub person: String,
    pub home_days: usize,
    pub office_days: usize,
    pub home_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ScheduleTable {
        ScheduleTable::new(
            vec!["Persona".into(), "mese".into(), "1".into(), "2".into()],
            vec![vec!["Anna".into(), "2025-12".into(), "Casa".into()]],
        )
    }

    #[test]
    fn absent_markers_cover_blank_and_x() {
        assert!(is_absent(""));
        assert!(is_absent("   "));
        assert!(is_absent("x"));
        assert!(is_absent(" X "));
        assert!(!is_absent("Casa"));
        assert!(!is_absent("xx"));
    }

    #[test]
    fn day_columns_skip_person_and_month() {
        let table = table();
        assert_eq!(table.day_columns(Some("mese")), vec![2, 3]);
        assert_eq!(table.person_index(), Some(0));
    }

    #[test]
    fn short_rows_read_as_empty_cells() {
        let table = table();
        let row = &table.rows[0];
        assert_eq!(table.cell(row, 2), "Casa");
        assert_eq!(table.cell(row, 3), "");
    }

    #[test]
    fn display_headers_blank_person_and_month() {
        let table = table();
        assert_eq!(
            table.display_headers(Some("mese")),
            vec!["", "", "1", "2"]
        );
    }

    #[test]
    fn display_headers_blank_a_date_column() {
        let table = ScheduleTable::new(
            vec!["Persona".into(), "Data".into(), "1".into()],
            vec![vec!["Anna".into(), "2025-12".into(), "Casa".into()]],
        );
        assert_eq!(table.display_headers(Some("Data")), vec!["", "", "1"]);
        assert_eq!(table.display_headers(None), vec!["", "", "1"]);
    }
}

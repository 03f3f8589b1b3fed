use std::collections::HashMap;

use crate::models::{is_absent, AttendanceStat, ScheduleTable};

const HOME: &str = "Casa";
const OFFICE: &str = "Ufficio";

/// Counts home and office days per person across every row of `table`.
///
/// Rows without a person get a positional `Person N` label. Stats come back
/// in the order each person is first seen.
pub fn aggregate_attendance(table: &ScheduleTable, day_columns: &[usize]) -> Vec<AttendanceStat> {
    let person_column = table.person_index();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut stats: Vec<AttendanceStat> = Vec::new();

    for (position, row) in table.rows.iter().enumerate() {
        let person = person_column
            .map(|column| table.cell(row, column).trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Person {}", position + 1));

        let index = *positions.entry(person.clone()).or_insert_with(|| {
            stats.push(AttendanceStat {
                person,
                home_days: 0,
                office_days: 0,
                home_percentage: 0.0,
            });
            stats.len() - 1
        });
        let entry = &mut stats[index];

        for &column in day_columns {
            let value = table.cell(row, column);
            if is_absent(value) {
                continue;
            }
            match value.trim() {
                HOME => entry.home_days += 1,
                OFFICE => entry.office_days += 1,
                _ => {}
            }
        }
    }

    for stat in stats.iter_mut() {
        stat.home_percentage = home_percentage(stat.home_days, stat.office_days);
    }
    stats
}

pub fn home_percentage(home_days: usize, office_days: usize) -> f64 {
    let total = home_days + office_days;
    if total == 0 {
        0.0
    } else {
        home_days as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(person: &str, days: &[&str]) -> Vec<String> {
        let mut row = vec![person.to_string(), "2025-12".to_string()];
        row.extend(days.iter().map(|d| d.to_string()));
        row
    }

    fn table(rows: Vec<Vec<String>>) -> ScheduleTable {
        ScheduleTable::new(
            vec!["persona".into(), "mese".into(), "1".into(), "2".into()],
            rows,
        )
    }

    #[test]
    fn counts_accumulate_per_person() {
        let t = table(vec![
            row("P1", &["Casa"]),
            row("P1", &["Ufficio"]),
            row("P1", &["Casa"]),
        ]);
        let stats = aggregate_attendance(&t, &[2]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].home_days, 2);
        assert_eq!(stats[0].office_days, 1);
        assert!((stats[0].home_percentage - 66.666).abs() < 0.01);
    }

    #[test]
    fn no_home_or_office_days_is_zero_percent() {
        let t = table(vec![row("Anna", &["Ferie", "Trasferta"])]);
        let stats = aggregate_attendance(&t, &[2, 3]);
        assert_eq!(stats[0].home_days, 0);
        assert_eq!(stats[0].office_days, 0);
        assert_eq!(stats[0].home_percentage, 0.0);
    }

    #[test]
    fn missing_person_gets_positional_label() {
        let t = table(vec![row("Anna", &["Casa"]), row(" ", &[" Ufficio ", "x"])]);
        let stats = aggregate_attendance(&t, &[2, 3]);
        let people: Vec<&str> = stats.iter().map(|s| s.person.as_str()).collect();
        assert_eq!(people, vec!["Anna", "Person 2"]);
        assert_eq!(stats[1].office_days, 1);
    }

    #[test]
    fn stats_keep_first_seen_order() {
        let t = table(vec![
            row("Luca", &["Casa"]),
            row("Anna", &["Casa"]),
            row("Luca", &["Ufficio"]),
        ]);
        let stats = aggregate_attendance(&t, &[2]);
        assert_eq!(stats[0].person, "Luca");
        assert_eq!(stats[0].home_percentage, 50.0);
        assert_eq!(stats[1].person, "Anna");
        assert_eq!(stats[1].home_percentage, 100.0);
    }
}

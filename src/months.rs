use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::error::DashboardError;
use crate::models::ScheduleTable;

/// Preferred header of the month-key column.
pub const MONTH_COLUMN: &str = "mese";

const MONTH_HINTS: [&str; 3] = ["mese", "month", "date"];

const ITALIAN_MONTHS: [&str; 12] = [
    "Gennaio",
    "Febbraio",
    "Marzo",
    "Aprile",
    "Maggio",
    "Giugno",
    "Luglio",
    "Agosto",
    "Settembre",
    "Ottobre",
    "Novembre",
    "Dicembre",
];

/// Picks the month column: `mese` if present, else the first header hinting at a month or date.
pub fn resolve_month_column(table: &ScheduleTable) -> Result<String, DashboardError> {
    if table.column_index(MONTH_COLUMN).is_some() {
        return Ok(MONTH_COLUMN.to_string());
    }

    table
        .columns
        .iter()
        .find(|column| {
            let lower = column.to_lowercase();
            MONTH_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .cloned()
        .ok_or_else(|| DashboardError::Schema {
            column: MONTH_COLUMN.to_string(),
            available: table.columns.clone(),
        })
}

pub fn current_month_key(today: NaiveDate) -> String {
    today.format("%Y-%m").to_string()
}

/// Sorted, de-duplicated month keys found in `column`, blanks skipped.
pub fn distinct_months(table: &ScheduleTable, column: &str) -> Vec<String> {
    let Some(index) = table.column_index(column) else {
        return Vec::new();
    };

    let mut months: Vec<String> = table
        .rows
        .iter()
        .map(|row| table.cell(row, index).trim())
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect();
    months.sort();
    months.dedup();
    months
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthChoices {
    pub months: Vec<String>,
    /// Set when no month from the current one onwards exists and every month is offered.
    pub fell_back: bool,
}

impl MonthChoices {
    pub fn default_month(&self) -> Option<&str> {
        self.months.first().map(String::as_str)
    }
}

/// Months offered for selection: the current month and later, or all of them when none are left.
pub fn selectable_months(table: &ScheduleTable, column: &str, today: NaiveDate) -> MonthChoices {
    let current = current_month_key(today);
    let available = distinct_months(table, column);
    let upcoming: Vec<String> = available
        .iter()
        .filter(|key| key.as_str() >= current.as_str())
        .cloned()
        .collect();

    if upcoming.is_empty() {
        warn!(current = %current, "no month from the current one onwards, offering every month");
        MonthChoices {
            months: available,
            fell_back: true,
        }
    } else {
        MonthChoices {
            months: upcoming,
            fell_back: false,
        }
    }
}

pub fn filter_month(table: &ScheduleTable, column: &str, key: &str) -> ScheduleTable {
    let Some(index) = table.column_index(column) else {
        return table.clone();
    };
    table.retain_rows(|row| row.get(index).map(|cell| cell.trim()) == Some(key))
}

/// Rows whose month key lies in `[start, end]`; an inverted range selects nothing.
pub fn select_range(
    table: &ScheduleTable,
    column: &str,
    start: &str,
    end: &str,
) -> Result<ScheduleTable, DashboardError> {
    if start > end {
        return Err(DashboardError::Validation(format!(
            "start month {start} is after end month {end}"
        )));
    }

    let Some(index) = table.column_index(column) else {
        return Err(DashboardError::Schema {
            column: column.to_string(),
            available: table.columns.clone(),
        });
    };

    Ok(table.retain_rows(|row| {
        let key = row.get(index).map(|cell| cell.trim()).unwrap_or("");
        !key.is_empty() && key >= start && key <= end
    }))
}

/// `2025-12` → `Dicembre 2025`; anything unparsable is returned verbatim.
pub fn italian_label(key: &str) -> String {
    match NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d") {
        Ok(date) => format!("{} {}", ITALIAN_MONTHS[date.month0() as usize], date.year()),
        Err(_) => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], months: &[&str]) -> ScheduleTable {
        ScheduleTable::new(
            columns.iter().map(|c| c.to_string()).collect(),
            months
                .iter()
                .enumerate()
                .map(|(i, m)| vec![format!("P{i}"), m.to_string(), "Casa".to_string()])
                .collect(),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn prefers_exact_mese_column() {
        let t = table(&["persona", "mese", "Month"], &[]);
        assert_eq!(resolve_month_column(&t).unwrap(), "mese");
    }

    #[test]
    fn infers_month_column_from_hints() {
        let t = table(&["persona", "Start Date", "1"], &[]);
        assert_eq!(resolve_month_column(&t).unwrap(), "Start Date");
        let t = table(&["persona", "MESE_rif", "1"], &[]);
        assert_eq!(resolve_month_column(&t).unwrap(), "MESE_rif");
    }

    #[test]
    fn missing_month_column_lists_available_columns() {
        let t = table(&["persona", "giorno", "1"], &[]);
        match resolve_month_column(&t) {
            Err(DashboardError::Schema { column, available }) => {
                assert_eq!(column, "mese");
                assert_eq!(available, vec!["persona", "giorno", "1"]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn selectable_months_start_at_current_month() {
        let t = table(
            &["persona", "mese", "1"],
            &["2025-11", "2025-12", "2026-01", "2025-12", ""],
        );
        let choices = selectable_months(&t, "mese", date(2025, 12, 3));
        assert_eq!(choices.months, vec!["2025-12", "2026-01"]);
        assert!(!choices.fell_back);
        assert_eq!(choices.default_month(), Some("2025-12"));
    }

    #[test]
    fn selectable_months_fall_back_to_everything() {
        let t = table(&["persona", "mese", "1"], &["2024-01", "2024-02"]);
        let choices = selectable_months(&t, "mese", date(2025, 6, 1));
        assert_eq!(choices.months, vec!["2024-01", "2024-02"]);
        assert!(choices.fell_back);
    }

    #[test]
    fn filter_month_keeps_matching_rows() {
        let t = table(&["persona", "mese", "1"], &["2025-01", "2025-02", "2025-01"]);
        let filtered = filter_month(&t, "mese", "2025-01");
        assert_eq!(filtered.rows.len(), 2);
        assert_eq!(filtered.columns, t.columns);
    }

    #[test]
    fn range_is_inclusive() {
        let t = table(&["persona", "mese", "1"], &["2025-01", "2025-02", "2025-03"]);
        let selected = select_range(&t, "mese", "2025-02", "2025-03").unwrap();
        assert_eq!(selected.rows.len(), 2);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let t = table(&["persona", "mese", "1"], &["2025-01", "2025-02", "2025-03"]);
        let result = select_range(&t, "mese", "2025-02", "2025-01");
        assert!(matches!(result, Err(DashboardError::Validation(_))));
    }

    #[test]
    fn italian_labels() {
        assert_eq!(italian_label("2025-12"), "Dicembre 2025");
        assert_eq!(italian_label("2026-01"), "Gennaio 2026");
        assert_eq!(italian_label("dicembre"), "dicembre");
    }
}

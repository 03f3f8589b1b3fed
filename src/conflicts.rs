use std::collections::BTreeSet;

use tracing::debug;

use crate::models::{is_absent, ScheduleTable};

/// Statuses that take a person away from home; a day filled only with these is uncovered.
const AWAY_STATUSES: [&str; 3] = ["Trasferta", "Offsite", "Ufficio"];

/// Day-column labels where every present value is an away status.
pub fn detect_conflicts(table: &ScheduleTable, day_columns: &[usize]) -> BTreeSet<String> {
    let mut days = BTreeSet::new();

    for &column in day_columns {
        let present: Vec<&str> = table
            .rows
            .iter()
            .map(|row| table.cell(row, column))
            .filter(|value| !is_absent(value))
            .map(str::trim)
            .collect();

        if !present.is_empty() && present.iter().all(|value| AWAY_STATUSES.contains(value)) {
            days.insert(table.columns[column].clone());
        }
    }

    debug!(count = days.len(), "detected conflict days");
    days
}

/// Splits the free-text manual list (`"3, 7"`) into trimmed labels.
pub fn parse_manual_days(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn merge_conflicts(detected: &BTreeSet<String>, manual: &str) -> BTreeSet<String> {
    detected.union(&parse_manual_days(manual)).cloned().collect()
}

/// Renders the labels sorted numerically when every one parses as a number
/// (decimals truncated), otherwise in plain string order.
pub fn format_days(days: &BTreeSet<String>) -> String {
    let numeric: Option<Vec<i64>> = days
        .iter()
        .map(|label| {
            label
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(|value| value.trunc() as i64)
        })
        .collect();

    match numeric {
        Some(mut values) => {
            values.sort_unstable();
            values
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
        None => days.iter().cloned().collect::<Vec<_>>().join(", "),
    }
}

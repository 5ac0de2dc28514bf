use crate::models::{HOURS_PER_RECORD, Record};

/// Heatmap class for a single hour cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourPace {
    Empty,
    OnPace,
    BehindPace,
}

pub fn target_met(record: &Record) -> bool {
    record.total() >= record.target
}

pub fn hourly_threshold(target: f64) -> f64 {
    target / HOURS_PER_RECORD as f64
}

pub fn classify_hour(value: f64, target: f64) -> HourPace {
    if value == 0.0 {
        HourPace::Empty
    } else if value >= hourly_threshold(target) {
        HourPace::OnPace
    } else {
        HourPace::BehindPace
    }
}

/// Sum of displayable totals as a percentage of the site goal, capped at 100.
pub fn progress_percent(records: &[Record], global_target: f64) -> f64 {
    let sum = displayed_total(records);
    (100.0 * sum / global_target.max(1.0)).min(100.0)
}

pub fn displayed_total(records: &[Record]) -> f64 {
    records
        .iter()
        .filter(|record| record.is_displayable())
        .map(Record::total)
        .sum()
}

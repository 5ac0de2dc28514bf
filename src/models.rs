use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const HOURS_PER_RECORD: usize = 10;
pub const DEFAULT_TARGET: f64 = 500.0;
pub const NEW_RECORD_NAME: &str = "New Operator";

static RECORD_ID_SEQ: AtomicU64 = AtomicU64::new(0);

pub fn next_record_id(tag: &str, index: usize) -> String {
    let seq = RECORD_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{tag}-{index}-{}-{seq}", Utc::now().timestamp_millis())
}

/// Blank, non-numeric, non-finite and zero inputs all resolve to `default`.
pub fn coerce_number(raw: &str, default: f64) -> f64 {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value != 0.0 => value,
        _ => default,
    }
}

pub fn coerce_value(value: f64, default: f64) -> f64 {
    if value.is_finite() && value != 0.0 {
        value
    } else {
        default
    }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let text = format!("{value:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThemeId {
    #[default]
    #[serde(rename = "yg")]
    YoungGuns,
    #[serde(rename = "v8")]
    V8,
    #[serde(rename = "nrl")]
    Nrl,
    #[serde(rename = "arcade")]
    Arcade,
    #[serde(rename = "cricket")]
    Cricket,
}

impl ThemeId {
    pub const ALL: [ThemeId; 5] = [
        ThemeId::YoungGuns,
        ThemeId::V8,
        ThemeId::Nrl,
        ThemeId::Arcade,
        ThemeId::Cricket,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeId::YoungGuns => "yg",
            ThemeId::V8 => "v8",
            ThemeId::Nrl => "nrl",
            ThemeId::Arcade => "arcade",
            ThemeId::Cricket => "cricket",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == raw.trim())
    }
}

/// `hours` and `total` are private so the total always matches the hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRecord", into = "StoredRecord")]
pub struct Record {
    id: String,
    pub name: String,
    hours: [f64; HOURS_PER_RECORD],
    pub target: f64,
    total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    hours: Vec<f64>,
    #[serde(default)]
    total: f64,
    #[serde(default = "default_target")]
    target: f64,
}

fn default_target() -> f64 {
    DEFAULT_TARGET
}

impl From<StoredRecord> for Record {
    fn from(stored: StoredRecord) -> Self {
        // The stored total is ignored; it is derived from the hours.
        Record::new(stored.id, stored.name, stored.hours, stored.target)
    }
}

impl From<Record> for StoredRecord {
    fn from(record: Record) -> Self {
        StoredRecord {
            id: record.id,
            name: record.name,
            hours: record.hours.to_vec(),
            total: record.total,
            target: record.target,
        }
    }
}

impl Record {
    /// Pads missing hours with zero and drops anything past the tenth hour.
    pub fn new(
        id: String,
        name: String,
        hours: impl IntoIterator<Item = f64>,
        target: f64,
    ) -> Self {
        let mut slots = [0.0; HOURS_PER_RECORD];
        for (slot, value) in slots.iter_mut().zip(hours) {
            *slot = if value.is_finite() { value } else { 0.0 };
        }
        let mut record = Self {
            id,
            name,
            hours: slots,
            target,
            total: 0.0,
        };
        record.recompute_total();
        record
    }

    pub fn blank() -> Self {
        Self::new(
            next_record_id("new", 0),
            NEW_RECORD_NAME.to_string(),
            [],
            DEFAULT_TARGET,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hours(&self) -> &[f64; HOURS_PER_RECORD] {
        &self.hours
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn set_hour(&mut self, index: usize, value: f64) -> bool {
        let Some(slot) = self.hours.get_mut(index) else {
            return false;
        };
        *slot = if value.is_finite() { value } else { 0.0 };
        self.recompute_total();
        true
    }

    pub fn is_displayable(&self) -> bool {
        self.total > 0.0 && !self.name.trim().is_empty()
    }

    fn recompute_total(&mut self) {
        self.total = self.hours.iter().sum();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    records: Vec<Record>,
}

impl Roster {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn add_blank(&mut self) -> &Record {
        self.records.push(Record::blank());
        &self.records[self.records.len() - 1]
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        before != self.records.len()
    }

    pub fn set_name(&mut self, id: &str, name: &str) -> bool {
        self.with_record(id, |record| record.name = name.to_string())
    }

    pub fn set_target_text(&mut self, id: &str, raw: &str) -> bool {
        let target = coerce_number(raw, 0.0);
        self.with_record(id, |record| record.target = target)
    }

    pub fn set_hour_text(&mut self, id: &str, index: usize, raw: &str) -> bool {
        if index >= HOURS_PER_RECORD {
            return false;
        }
        let value = coerce_number(raw, 0.0);
        self.with_record(id, |record| {
            record.set_hour(index, value);
        })
    }

    pub fn replace_all(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    fn with_record(&mut self, id: &str, apply: impl FnOnce(&mut Record)) -> bool {
        match self.records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                apply(record);
                true
            }
            None => false,
        }
    }
}

pub fn sample_records() -> Vec<Record> {
    let rows: [(&str, &str, [f64; HOURS_PER_RECORD], f64); 5] = [
        (
            "1",
            "John Smith",
            [45.0, 50.0, 48.0, 55.0, 60.0, 40.0, 50.0, 55.0, 60.0, 65.0],
            500.0,
        ),
        (
            "2",
            "Sarah Connor",
            [60.0, 65.0, 70.0, 75.0, 80.0, 70.0, 75.0, 80.0, 85.0, 90.0],
            600.0,
        ),
        (
            "3",
            "Max Rockatansky",
            [30.0, 35.0, 40.0, 30.0, 35.0, 40.0, 45.0, 30.0, 35.0, 40.0],
            500.0,
        ),
        (
            "4",
            "Ellen Ripley",
            [55.0, 58.0, 60.0, 62.0, 65.0, 60.0, 62.0, 65.0, 68.0, 70.0],
            600.0,
        ),
        (
            "5",
            "Tony Stark",
            [80.0, 85.0, 90.0, 85.0, 90.0, 95.0, 100.0, 90.0, 85.0, 90.0],
            800.0,
        ),
    ];

    rows.into_iter()
        .map(|(id, name, hours, target)| {
            Record::new(id.to_string(), name.to_string(), hours, target)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_hours(hours: &[f64]) -> Record {
        Record::new("r".to_string(), "Alice".to_string(), hours.to_vec(), 500.0)
    }

    #[test]
    fn total_tracks_every_hour_edit() {
        let mut record = record_with_hours(&[10.0, 20.0]);
        assert_eq!(record.total(), 30.0);

        record.set_hour(9, 5.0);
        assert_eq!(record.total(), 35.0);

        record.set_hour(0, 0.0);
        assert_eq!(record.total(), record.hours().iter().sum::<f64>());
        assert!(!record.set_hour(10, 1.0));
    }

    #[test]
    fn hours_are_padded_and_truncated() {
        let short = record_with_hours(&[1.0, 2.0, 3.0]);
        assert_eq!(short.hours()[3..], [0.0; 7]);

        let long = record_with_hours(&[1.0; 12]);
        assert_eq!(long.total(), 10.0);
    }

    #[test]
    fn roster_edits_use_lenient_coercion() {
        let mut roster = Roster::from_records(vec![record_with_hours(&[10.0; 10])]);

        assert!(roster.set_hour_text("r", 2, "abc"));
        assert_eq!(roster.get("r").map(Record::total), Some(90.0));

        assert!(roster.set_hour_text("r", 2, " 25 "));
        assert_eq!(roster.get("r").map(Record::total), Some(115.0));

        assert!(roster.set_target_text("r", "n/a"));
        assert_eq!(roster.get("r").map(|r| r.target), Some(0.0));

        assert!(!roster.set_hour_text("r", 10, "1"));
        assert!(!roster.set_name("missing", "Bob"));
    }

    #[test]
    fn add_and_remove_rows() {
        let mut roster = Roster::default();
        let first = roster.add_blank().id().to_string();
        let second = roster.add_blank().id().to_string();
        assert_ne!(first, second);

        let added = roster.get(&first).cloned();
        assert_eq!(added.as_ref().map(|r| r.name.as_str()), Some(NEW_RECORD_NAME));
        assert_eq!(added.as_ref().map(|r| r.target), Some(DEFAULT_TARGET));
        assert_eq!(added.map(|r| r.total()), Some(0.0));

        assert!(roster.remove(&first));
        assert!(!roster.remove(&first));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn stored_totals_are_recomputed_on_load() {
        let json = r#"{"id":"x","name":"Bob","hours":[1,2,3,4,5,6,7,8,9,10,11],"total":9999,"target":600}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.total(), 55.0);
        assert_eq!(record.target, 600.0);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["total"], 55.0);
        assert_eq!(back["hours"].as_array().map(Vec::len), Some(10));
    }

    #[test]
    fn coercion_defaults() {
        assert_eq!(coerce_number("", 500.0), 500.0);
        assert_eq!(coerce_number("0", 500.0), 500.0);
        assert_eq!(coerce_number("12.5", 500.0), 12.5);
        assert_eq!(coerce_number("NaN", 0.0), 0.0);
        assert_eq!(coerce_value(f64::INFINITY, 500.0), 500.0);
    }

    #[test]
    fn sample_totals_match_their_hours() {
        let totals: Vec<f64> = sample_records().iter().map(Record::total).collect();
        assert_eq!(totals, vec![528.0, 750.0, 360.0, 625.0, 890.0]);
    }

    #[test]
    fn theme_ids_round_trip_through_text() {
        assert_eq!(ThemeId::parse("arcade"), Some(ThemeId::Arcade));
        assert_eq!(ThemeId::parse("bogus"), None);
        assert_eq!(format_number(528.0), "528");
        assert_eq!(format_number(12.25), "12.25");
    }
}

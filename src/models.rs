use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use crate::constants::{DATE_ONLY_FORMATS, NAIVE_TIMESTAMP_FORMATS, OFFSET_TIMESTAMP_FORMATS};

/// One record as handed over by the vendor export parser. The timestamp is
/// kept as text until aggregation; the value is already reduced to an
/// optional number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub flag: String,
    #[serde(default, alias = "timestamp")]
    pub start_date: String,
    #[serde(default, deserialize_with = "deserialize_value")]
    pub value: Option<f64>,
}

impl RawObservation {
    pub fn new(flag: impl Into<String>, start_date: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            flag: flag.into(),
            start_date: start_date.into(),
            value: value.filter(|v| !v.is_nan()),
        }
    }
}

/// A raw observation whose timestamp parsed successfully.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<'a> {
    pub flag: &'a str,
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

impl<'a> Observation<'a> {
    pub fn parse(raw: &'a RawObservation) -> Option<Self> {
        let timestamp = parse_timestamp(&raw.start_date)?;
        Some(Self {
            flag: &raw.flag,
            timestamp,
            value: raw.value.filter(|v| !v.is_nan()),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Parses the timestamp layouts found in health exports. Offsets are read but
/// not applied: the wall-clock date and time written in the string win.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_local());
    }

    for format in OFFSET_TIMESTAMP_FORMATS.iter() {
        if let Ok(parsed) = DateTime::parse_from_str(text, format) {
            return Some(parsed.naive_local());
        }
    }

    for format in NAIVE_TIMESTAMP_FORMATS.iter() {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }

    DATE_ONLY_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

// Accepts numbers, numeric strings and null. Anything else counts as missing.
fn deserialize_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(serde_json::Value::Number(number)) => number.as_f64(),
        Some(serde_json::Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| !v.is_nan()))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayAggregate {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl DayAggregate {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// Output of the day aggregator for one flag.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Aggregation {
    /// Strictly increasing by date, one entry per calendar day.
    pub series: Vec<DayAggregate>,
    /// Observations dropped because their timestamp did not parse.
    pub excluded: usize,
    pub total: usize,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl fmt::Display for DateBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min.format("%Y-%m-%d"), self.max.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportRow {
    pub offset: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesExport {
    pub rows: Vec<ExportRow>,
    /// Date range of the input slice, including rows dropped for missing values.
    pub bounds: DateBounds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Bytes,
    pub rows: usize,
}

/// Upload body: the parsed export as produced by the vendor parser.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadDocument {
    #[serde(default)]
    pub filename: Option<String>,
    pub records: Vec<RawObservation>,
}

/// Per-flag card data: day count, preview rows and the default selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagSummary {
    pub flag: String,
    pub generation: u64,
    pub unique_days: usize,
    pub excluded: usize,
    pub preview: Vec<DayAggregate>,
    pub default_range: [usize; 2],
    pub download_href: String,
}

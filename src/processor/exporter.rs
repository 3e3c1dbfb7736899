use bytes::Bytes;
use itertools::Itertools;
use std::fmt::Write;
use tracing::error;
use crate::constants::{CSV_METRIC_COLUMN, CSV_OFFSET_COLUMN};
use crate::error::{Error, Result};
use crate::models::{DateBounds, DayAggregate, ExportFile, ExportRow, SeriesExport};

/// Converts a slice into `(offset, value)` rows anchored at the slice's first
/// date. Days with a missing value are dropped after their offset is fixed, so
/// the first emitted row can have a non-zero offset.
pub fn export(slice: &[DayAggregate]) -> Result<SeriesExport> {
    let first_date = match slice.first() {
        Some(first) => first.date,
        None => {
            error!("Exporter received an empty slice");
            return Err(Error::Invariant("export of an empty slice".to_string()));
        }
    };

    let bounds = slice
        .iter()
        .map(|entry| entry.date)
        .minmax()
        .into_option()
        .map(|(min, max)| DateBounds { min, max })
        .ok_or_else(|| Error::Invariant("slice has no date bounds".to_string()))?;

    let mut rows = Vec::with_capacity(slice.len());
    for entry in slice {
        let offset = entry.date.signed_duration_since(first_date).num_days();
        if offset < 0 {
            error!(
                "Negative day offset {} for {} relative to {}",
                offset, entry.date, first_date
            );
            return Err(Error::Invariant(format!(
                "negative offset {} for {}",
                offset, entry.date
            )));
        }

        if let Some(value) = entry.value {
            rows.push(ExportRow { offset, value });
        }
    }

    if rows.is_empty() {
        return Err(Error::NoValidRows);
    }

    Ok(SeriesExport { rows, bounds })
}

/// `<flag>_<YYYY-MM-DD>-<YYYY-MM-DD>.csv`
pub fn export_filename(flag: &str, bounds: &DateBounds) -> String {
    format!("{}_{}.csv", flag, bounds)
}

/// Float text as pandas-style float columns render: shortest round-trip
/// digits, integral values keep a trailing `.0`, and magnitudes below `1e-4`
/// or from `1e16` up switch to exponent form (`1e-07`, `1.5e+20`).
pub fn format_metric(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return positional(value);
    }

    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return positional(value);
    };
    match exponent.parse::<i32>() {
        Ok(exponent) if !(-4..16).contains(&exponent) => {
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        _ => positional(value),
    }
}

fn positional(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

pub fn render_csv(rows: &[ExportRow]) -> Bytes {
    let mut out = String::with_capacity(16 + rows.len() * 16);
    out.push_str(CSV_OFFSET_COLUMN);
    out.push(',');
    out.push_str(CSV_METRIC_COLUMN);
    out.push('\n');

    for row in rows {
        // Writing into a String cannot fail
        let _ = writeln!(out, "{},{}", row.offset, format_metric(row.value));
    }

    Bytes::from(out)
}

/// Full export step for one flag: offsets, CSV body and file name.
pub fn export_file(flag: &str, slice: &[DayAggregate]) -> Result<ExportFile> {
    let export = export(slice)?;
    Ok(ExportFile {
        filename: export_filename(flag, &export.bounds),
        bytes: render_csv(&export.rows),
        rows: export.rows.len(),
    })
}

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn, error};
use crate::error::{Error, Result};
use crate::models::DayAggregate;
use crate::processor::{export, slice};
use crate::store::SeriesStore;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationStats {
    pub days: usize,
    pub observations: usize,
    pub excluded: usize,
    pub missing_value_days: usize,
    pub ordering_violations: usize,
    pub offset_mismatches: usize,
    pub exportable_rows: usize,
}

impl ValidationStats {
    pub fn is_valid(&self) -> bool {
        self.ordering_violations == 0 && self.offset_mismatches == 0
    }

    pub fn excluded_percent(&self) -> f64 {
        if self.observations > 0 {
            self.excluded as f64 / self.observations as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Re-checks the day series invariants for every loaded flag: strictly
/// increasing dates and offsets that match the calendar distance to the
/// first day of a full-range export.
pub struct Validator {
    store: Arc<SeriesStore>,
}

impl Validator {
    pub fn new(store: Arc<SeriesStore>) -> Self {
        Self { store }
    }

    pub async fn validate_all(&self) -> Result<BTreeMap<String, ValidationStats>> {
        let snapshot = self.store.snapshot().await;
        if !snapshot.is_loaded() {
            return Err(Error::NotReady);
        }

        let mut results = BTreeMap::new();
        for flag in snapshot.flags() {
            let aggregation = self.store.aggregation_in(&snapshot, flag)?;
            let mut stats = check_series(&aggregation.series);
            stats.observations = aggregation.total;
            stats.excluded = aggregation.excluded;

            if stats.is_valid() {
                info!(
                    "Flag {}: {} days, {} exportable rows, {:.2}% observations excluded",
                    flag, stats.days, stats.exportable_rows, stats.excluded_percent()
                );
            } else {
                error!(
                    "Flag {}: {} ordering violations, {} offset mismatches",
                    flag, stats.ordering_violations, stats.offset_mismatches
                );
            }
            results.insert(flag.to_string(), stats);
        }

        Ok(results)
    }
}

pub fn check_series(series: &[DayAggregate]) -> ValidationStats {
    let mut stats = ValidationStats {
        days: series.len(),
        missing_value_days: series.iter().filter(|day| day.value.is_none()).count(),
        ..Default::default()
    };

    stats.ordering_violations = series
        .windows(2)
        .filter(|pair| pair[0].date >= pair[1].date)
        .count();

    if series.is_empty() {
        return stats;
    }

    let full_range = match slice(series, 0, series.len() as i64 - 1) {
        Ok(full_range) => full_range,
        Err(e) => {
            warn!("Could not select full range: {}", e);
            return stats;
        }
    };

    match export(full_range) {
        Ok(exported) => {
            let first_date = series[0].date;
            let expected = series
                .iter()
                .filter(|day| day.value.is_some())
                .map(|day| day.date.signed_duration_since(first_date).num_days());

            stats.offset_mismatches = exported
                .rows
                .iter()
                .map(|row| row.offset)
                .zip(expected)
                .filter(|(actual, expected)| actual != expected)
                .count();
            stats.exportable_rows = exported.rows.len();
        }
        Err(Error::NoValidRows) => {}
        Err(Error::Invariant(message)) => {
            error!("Export invariant violated: {}", message);
            stats.offset_mismatches += 1;
        }
        Err(e) => warn!("Unexpected export failure: {}", e),
    }

    stats
}

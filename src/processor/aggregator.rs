use chrono::NaiveDate;
use itertools::Itertools;
use ordered_float::OrderedFloat;
use tracing::debug;
use crate::models::{Aggregation, DayAggregate, Observation, RawObservation};

/// Collapses a flag's observations into one maximum value per calendar day.
///
/// Observations with an unparseable timestamp are skipped and counted in
/// `Aggregation::excluded`. A day whose observations all lack a value is kept
/// with a missing value. An empty series is a valid outcome, not an error.
pub fn aggregate(observations: &[RawObservation]) -> Aggregation {
    let total = observations.len();
    let mut excluded = 0usize;

    let mut dated: Vec<(NaiveDate, Option<f64>)> = observations
        .iter()
        .filter_map(|raw| match Observation::parse(raw) {
            Some(observation) => Some((observation.date(), observation.value)),
            None => {
                excluded += 1;
                None
            }
        })
        .collect();

    if dated.is_empty() {
        debug!("No parseable observations among {} records", total);
        return Aggregation {
            series: Vec::new(),
            excluded,
            total,
        };
    }

    dated.sort_by_key(|(date, _)| *date);

    let days = dated.iter().chunk_by(|(date, _)| *date);
    let series: Vec<DayAggregate> = days
        .into_iter()
        .map(|(date, group)| {
            let max = group
                .filter_map(|&(_, value)| value.map(OrderedFloat))
                .max()
                .map(OrderedFloat::into_inner);
            DayAggregate::new(date, max)
        })
        .collect();

    debug!(
        "Aggregated {} observations into {} days ({} excluded)",
        total,
        series.len(),
        excluded
    );

    Aggregation {
        series,
        excluded,
        total,
    }
}

use crate::error::{Error, Result};
use crate::models::DayAggregate;

/// Returns the inclusive ordinal range `[start_index, end_index]` of `series`.
///
/// Indices are never clamped. Bounds are checked before ordering, so a pair
/// that is both out of range and inverted reports `IndexOutOfRange`.
pub fn slice(series: &[DayAggregate], start_index: i64, end_index: i64) -> Result<&[DayAggregate]> {
    if series.is_empty() {
        return Err(Error::EmptySeries);
    }

    let len = series.len();
    let position = |index: i64| usize::try_from(index).ok().filter(|&p| p < len);

    match (position(start_index), position(end_index)) {
        (Some(start), Some(end)) if start <= end => Ok(&series[start..=end]),
        (Some(_), Some(_)) => Err(Error::InvalidRange {
            start_index,
            end_index,
        }),
        _ => Err(Error::IndexOutOfRange {
            start_index,
            end_index,
            len,
        }),
    }
}

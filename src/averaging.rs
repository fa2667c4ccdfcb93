//! Time-weighted averaging
//!
//! This module integrates a scalar channel of a reading sequence over a
//! half-open window using a zero-order hold: each observed value is assumed
//! to persist until the next observation. An optional gap cap bounds how
//! long a single stale sample may be held, so one reading before a long
//! outage cannot dominate the average.

use crate::types::Reading;

/// Compute the time-weighted average of one channel over `[start_ms, end_ms)`.
///
/// The input does not need to be pre-sorted; readings are ordered by
/// timestamp before integration. The value held at `start_ms` is taken from
/// the last reading at or before the window start, or `0.0` when none
/// exists. When `max_gap_ms` is supplied, each held interval contributes at
/// most `max_gap_ms` of duration to the accumulated area.
///
/// An empty sequence or a degenerate window (`end_ms <= start_ms`) yields
/// exactly `0.0`.
///
/// # Panics
/// Panics if `max_gap_ms` is supplied and not positive; that is a usage
/// error, not a data condition.
pub fn time_weighted_average<F>(
    readings: &[Reading],
    start_ms: i64,
    end_ms: i64,
    channel: F,
    max_gap_ms: Option<i64>,
) -> f64
where
    F: Fn(&Reading) -> f64,
{
    assert!(
        max_gap_ms.map_or(true, |gap| gap > 0),
        "max_gap_ms must be positive when supplied"
    );

    if end_ms <= start_ms || readings.is_empty() {
        return 0.0;
    }

    let mut ordered: Vec<&Reading> = readings.iter().collect();
    ordered.sort_by_key(|r| r.timestamp_ms);

    let effective = |gap_ms: i64| -> f64 {
        let capped = match max_gap_ms {
            Some(max) => gap_ms.min(max),
            None => gap_ms,
        };
        capped as f64
    };

    // Seed with the value held at the window start.
    let mut held = ordered
        .iter()
        .rev()
        .copied()
        .find(|r| r.timestamp_ms <= start_ms)
        .map(|r| channel(r))
        .unwrap_or(0.0);

    let mut cursor = start_ms;
    let mut area = 0.0;

    for reading in ordered
        .iter()
        .copied()
        .filter(|r| r.timestamp_ms >= start_ms && r.timestamp_ms < end_ms)
    {
        area += held * effective(reading.timestamp_ms - cursor);
        cursor = reading.timestamp_ms;
        held = channel(reading);
    }

    // Close out the final held interval up to the window end.
    area += held * effective(end_ms - cursor);

    area / (end_ms - start_ms) as f64
}

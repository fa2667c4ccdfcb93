//! Gap backfilling
//!
//! Sensor readings arrive whenever the platform decides to sample, which
//! leaves long undersampled gaps in the series. This module synthesizes
//! carry-forward readings on a fixed wall-clock grid between two real
//! readings, so downstream averaging and charting see a quasi-regular
//! stream without re-implementing gap handling themselves.

use crate::types::{Reading, BACKFILL_SOURCE};
use uuid::Uuid;

/// Backfill grid bucket size: 5 minutes.
pub const BUCKET_MS: i64 = 5 * 60 * 1000;

/// Synthesize readings between two real readings.
///
/// One reading is produced for every absolute bucket boundary (an exact
/// multiple of [`BUCKET_MS`]) strictly between `prev` and `next`. Each
/// synthetic reading holds every channel of `prev` (all channels freeze
/// together), takes `prev`'s kind, and is tagged with the `"Backfill"`
/// source label.
///
/// Returns an empty vector when the gap spans no bucket boundary or when
/// `next` does not follow `prev`.
pub fn fill_gap(prev: &Reading, next: &Reading) -> Vec<Reading> {
    if next.timestamp_ms <= prev.timestamp_ms {
        return Vec::new();
    }

    // First absolute boundary strictly after the previous reading.
    let mut boundary = (prev.timestamp_ms.div_euclid(BUCKET_MS) + 1) * BUCKET_MS;
    let mut synthesized = Vec::new();

    while boundary < next.timestamp_ms {
        synthesized.push(carry_forward(prev, boundary));
        boundary += BUCKET_MS;
    }

    synthesized
}

/// Zero-order-hold copy of a reading at a new instant.
fn carry_forward(prev: &Reading, timestamp_ms: i64) -> Reading {
    Reading {
        id: Uuid::new_v4(),
        timestamp_ms,
        wifi_level: prev.wifi_level,
        sar_level: prev.sar_level,
        bluetooth_level: prev.bluetooth_level,
        kind: prev.kind,
        source: BACKFILL_SOURCE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReadingKind;
    use pretty_assertions::assert_eq;

    fn reading(timestamp_ms: i64) -> Reading {
        Reading::new(timestamp_ms, 1.5, 0.4, 0.1, ReadingKind::Wifi, "WifiManager")
    }

    #[test]
    fn test_twenty_five_minute_gap_is_filled() {
        let prev = reading(0);
        let next = reading(25 * 60 * 1000);

        let filled = fill_gap(&prev, &next);

        // Boundaries at 5, 10, 15, 20 minutes; 25 is the next reading itself.
        assert_eq!(filled.len(), 4);
        for synthetic in &filled {
            assert_eq!(synthetic.timestamp_ms % BUCKET_MS, 0);
            assert!(synthetic.timestamp_ms > prev.timestamp_ms);
            assert!(synthetic.timestamp_ms < next.timestamp_ms);
            assert!(synthetic.is_backfill());
        }
    }

    #[test]
    fn test_channels_freeze_together() {
        let prev = reading(0);
        let next = reading(12 * 60 * 1000);

        let filled = fill_gap(&prev, &next);
        assert_eq!(filled.len(), 2);

        for synthetic in &filled {
            assert_eq!(synthetic.wifi_level, prev.wifi_level);
            assert_eq!(synthetic.sar_level, prev.sar_level);
            assert_eq!(synthetic.bluetooth_level, prev.bluetooth_level);
            assert_eq!(synthetic.kind, prev.kind);
        }
    }

    #[test]
    fn test_boundaries_align_to_absolute_grid() {
        // Readings off the grid still produce on-grid boundaries.
        let prev = reading(BUCKET_MS + 42_000);
        let next = reading(3 * BUCKET_MS + 17_000);

        let filled = fill_gap(&prev, &next);

        let timestamps: Vec<i64> = filled.iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(timestamps, vec![2 * BUCKET_MS, 3 * BUCKET_MS]);
    }

    #[test]
    fn test_prev_on_boundary_is_excluded() {
        let prev = reading(2 * BUCKET_MS);
        let next = reading(3 * BUCKET_MS);

        // Only boundaries strictly between count; 2*BUCKET is prev itself
        // and 3*BUCKET is next itself.
        assert!(fill_gap(&prev, &next).is_empty());
    }

    #[test]
    fn test_short_gap_produces_nothing() {
        let prev = reading(1_000);
        let next = reading(200_000);

        assert!(fill_gap(&prev, &next).is_empty());
    }

    #[test]
    fn test_out_of_order_pair_produces_nothing() {
        let prev = reading(30 * 60 * 1000);
        let next = reading(0);

        assert!(fill_gap(&prev, &next).is_empty());
    }

    #[test]
    fn test_synthetic_readings_get_fresh_ids() {
        let prev = reading(0);
        let next = reading(11 * 60 * 1000);

        let filled = fill_gap(&prev, &next);
        assert_eq!(filled.len(), 2);
        assert_ne!(filled[0].id, prev.id);
        assert_ne!(filled[0].id, filled[1].id);
    }
}

//! Exposure series store
//!
//! This module owns the append-only, time-ordered reading sequence and ties
//! the engine together: ingestion runs the gap backfiller against the
//! preceding real reading, windowed queries delegate to the time-weighted
//! averager per channel, and an optional change listener is notified after
//! each successful ingestion.

use crate::averaging::time_weighted_average;
use crate::backfill::fill_gap;
use crate::types::{Reading, WindowAverages};
use std::sync::{PoisonError, RwLock};

/// Callback invoked after a reading has been ingested.
pub type ChangeListener = Box<dyn Fn(&Reading) + Send + Sync>;

/// Thread-safe, append-only store of multi-channel exposure readings.
///
/// Writers (`ingest`, `ingest_batch`, `clear`) are serialized against
/// concurrent readers (`query_window`, `snapshot`); every query observes a
/// consistent snapshot of the sequence. Readings are kept sorted by
/// timestamp, ties preserving insertion order.
pub struct ExposureSeriesStore {
    readings: RwLock<Vec<Reading>>,
    on_ingest: Option<ChangeListener>,
}

impl Default for ExposureSeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExposureSeriesStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            readings: RwLock::new(Vec::new()),
            on_ingest: None,
        }
    }

    /// Register a listener fired after each ingested sensor reading.
    ///
    /// The listener runs outside the store lock and receives the real
    /// reading, not the synthetic backfill readings it may have triggered.
    /// Must be set before the store is shared.
    pub fn set_change_listener(&mut self, listener: ChangeListener) {
        self.on_ingest = Some(listener);
    }

    /// Append a reading, backfilling any sampling gap since the preceding
    /// real reading.
    pub fn ingest(&self, reading: Reading) {
        {
            let mut readings = self
                .readings
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            // Backfill holds from the latest preceding sensor reading;
            // synthetic readings never seed another backfill run.
            let synthesized = readings
                .iter()
                .rev()
                .find(|r| !r.is_backfill() && r.timestamp_ms <= reading.timestamp_ms)
                .map(|prev| fill_gap(prev, &reading))
                .unwrap_or_default();

            readings.extend(synthesized);
            readings.push(reading.clone());

            // Stable sort keeps insertion order for equal timestamps.
            readings.sort_by_key(|r| r.timestamp_ms);
        }

        if let Some(listener) = &self.on_ingest {
            listener(&reading);
        }
    }

    /// Append a batch of readings, each triggering its own backfill pass.
    pub fn ingest_batch(&self, readings: Vec<Reading>) {
        for reading in readings {
            self.ingest(reading);
        }
    }

    /// Per-channel time-weighted averages over `[start_ms, end_ms)`.
    pub fn query_window(&self, start_ms: i64, end_ms: i64) -> WindowAverages {
        self.query(start_ms, end_ms, None)
    }

    /// Per-channel time-weighted averages with a cap on how long any held
    /// value may persist.
    pub fn query_window_capped(
        &self,
        start_ms: i64,
        end_ms: i64,
        max_gap_ms: i64,
    ) -> WindowAverages {
        self.query(start_ms, end_ms, Some(max_gap_ms))
    }

    fn query(&self, start_ms: i64, end_ms: i64, max_gap_ms: Option<i64>) -> WindowAverages {
        let readings = self.readings.read().unwrap_or_else(PoisonError::into_inner);

        WindowAverages {
            wifi: time_weighted_average(&readings, start_ms, end_ms, |r| r.wifi_level, max_gap_ms),
            sar: time_weighted_average(&readings, start_ms, end_ms, |r| r.sar_level, max_gap_ms),
            bluetooth: time_weighted_average(
                &readings,
                start_ms,
                end_ms,
                |r| r.bluetooth_level,
                max_gap_ms,
            ),
        }
    }

    /// Discard all stored readings.
    pub fn clear(&self) {
        self.readings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Copy of the current sequence, sorted by timestamp.
    pub fn snapshot(&self) -> Vec<Reading> {
        self.readings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of stored readings, synthetic ones included.
    pub fn len(&self) -> usize {
        self.readings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backfill::BUCKET_MS;
    use crate::types::ReadingKind;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn reading(timestamp_ms: i64, wifi: f64, sar: f64, bluetooth: f64) -> Reading {
        Reading::new(
            timestamp_ms,
            wifi,
            sar,
            bluetooth,
            ReadingKind::Wifi,
            "WifiManager",
        )
    }

    #[test]
    fn test_multi_channel_window_query() {
        let store = ExposureSeriesStore::new();
        store.ingest(reading(0, 1.0, 0.5, 0.2));
        store.ingest(reading(10_000, 3.0, 1.5, 0.6));

        let averages = store.query_window(0, 20_000);

        assert!((averages.wifi - 2.0).abs() < 1e-9);
        assert!((averages.sar - 1.0).abs() < 1e-9);
        assert!((averages.bluetooth - 0.4).abs() < 1e-9);
        assert!((averages.combined() - 3.4).abs() < 1e-9);
    }

    #[test]
    fn test_query_on_empty_store_is_zero() {
        let store = ExposureSeriesStore::new();
        let averages = store.query_window(0, 60_000);

        assert_eq!(averages.wifi, 0.0);
        assert_eq!(averages.sar, 0.0);
        assert_eq!(averages.bluetooth, 0.0);
    }

    #[test]
    fn test_capped_query_limits_stale_hold() {
        let store = ExposureSeriesStore::new();
        store.ingest(reading(0, 5.0, 0.0, 0.0));

        let averages = store.query_window_capped(0, 60_000, 10_000);
        assert!((averages.wifi - 5.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_first_reading_triggers_no_backfill() {
        let store = ExposureSeriesStore::new();
        store.ingest(reading(40 * 60 * 1000, 1.0, 0.0, 0.0));

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_gap_ingestion_backfills_on_grid() {
        let store = ExposureSeriesStore::new();
        store.ingest(reading(0, 1.0, 0.5, 0.2));
        store.ingest(reading(25 * 60 * 1000, 3.0, 1.5, 0.6));

        let snapshot = store.snapshot();
        let synthetics: Vec<&Reading> = snapshot.iter().filter(|r| r.is_backfill()).collect();

        assert_eq!(synthetics.len(), 4);
        for synthetic in &synthetics {
            assert_eq!(synthetic.timestamp_ms % BUCKET_MS, 0);
            // Carry-forward of the earlier reading's channels.
            assert_eq!(synthetic.wifi_level, 1.0);
            assert_eq!(synthetic.sar_level, 0.5);
        }
    }

    #[test]
    fn test_backfill_holds_from_real_readings_only() {
        let store = ExposureSeriesStore::new();
        store.ingest(reading(0, 1.0, 0.0, 0.0));
        store.ingest(reading(25 * 60 * 1000, 3.0, 0.0, 0.0));
        store.ingest(reading(50 * 60 * 1000, 5.0, 0.0, 0.0));

        let snapshot = store.snapshot();
        let second_run: Vec<&Reading> = snapshot
            .iter()
            .filter(|r| r.is_backfill() && r.timestamp_ms > 25 * 60 * 1000)
            .collect();

        // The second backfill run carries the second real reading forward.
        assert_eq!(second_run.len(), 4);
        for synthetic in &second_run {
            assert_eq!(synthetic.wifi_level, 3.0);
        }

        assert_eq!(store.len(), 11); // 3 real + 8 synthetic
    }

    #[test]
    fn test_snapshot_is_time_ordered() {
        let store = ExposureSeriesStore::new();
        store.ingest_batch(vec![
            reading(10_000, 2.0, 0.0, 0.0),
            reading(0, 1.0, 0.0, 0.0),
            reading(5_000, 1.5, 0.0, 0.0),
        ]);

        let timestamps: Vec<i64> = store.snapshot().iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(timestamps, vec![0, 5_000, 10_000]);
    }

    #[test]
    fn test_clear_discards_everything() {
        let store = ExposureSeriesStore::new();
        store.ingest(reading(0, 1.0, 0.0, 0.0));
        store.ingest(reading(30 * 60 * 1000, 2.0, 0.0, 0.0));
        assert!(!store.is_empty());

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.query_window(0, 60_000).wifi, 0.0);
    }

    #[test]
    fn test_change_listener_fires_per_sensor_reading() {
        let ingested = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ingested);

        let mut store = ExposureSeriesStore::new();
        store.set_change_listener(Box::new(move |reading| {
            assert!(!reading.is_backfill());
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        // The gap produces synthetic readings, but the listener only sees
        // the two sensor readings.
        store.ingest(reading(0, 1.0, 0.0, 0.0));
        store.ingest(reading(25 * 60 * 1000, 2.0, 0.0, 0.0));

        assert_eq!(ingested.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_ingest_and_query() {
        let store = Arc::new(ExposureSeriesStore::new());

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..200 {
                    store.ingest(reading(i * 1_000, 1.0, 0.5, 0.2));
                }
            })
        };

        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let averages = store.query_window(0, 200_000);
                    assert!(averages.wifi >= 0.0);
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();

        assert_eq!(store.len(), 200);
    }
}

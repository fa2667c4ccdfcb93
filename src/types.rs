//! Core types for the Emwatch engine
//!
//! This module defines the data structures shared across the engine:
//! readings ingested from radio sensors and the per-window aggregate
//! results returned by windowed queries.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source label applied to engine-generated readings.
///
/// Readings carrying this label were synthesized by the gap backfiller
/// rather than observed by a sensor.
pub const BACKFILL_SOURCE: &str = "Backfill";

/// Origin category of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKind {
    Wifi,
    Sar,
    Noise,
    Health,
}

impl ReadingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingKind::Wifi => "wifi",
            ReadingKind::Sar => "sar",
            ReadingKind::Noise => "noise",
            ReadingKind::Health => "health",
        }
    }
}

/// A single multi-channel exposure sample.
///
/// Readings are immutable once created; corrections are expressed as new
/// readings, never as in-place edits. Channel values are unit-specific per
/// channel and always non-negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Unique id for provenance tracking
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Wall-clock instant of the sample (milliseconds since the Unix epoch)
    pub timestamp_ms: i64,
    /// Wi-Fi exposure level
    #[serde(default)]
    pub wifi_level: f64,
    /// SAR-like exposure level
    #[serde(default)]
    pub sar_level: f64,
    /// Bluetooth exposure level
    #[serde(default)]
    pub bluetooth_level: f64,
    /// Origin category
    pub kind: ReadingKind,
    /// Free-text origin label; `"Backfill"` marks synthetic readings
    pub source: String,
}

impl Reading {
    /// Create a new sensor-observed reading.
    ///
    /// Channel values are clamped to be non-negative.
    pub fn new(
        timestamp_ms: i64,
        wifi_level: f64,
        sar_level: f64,
        bluetooth_level: f64,
        kind: ReadingKind,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp_ms,
            wifi_level: wifi_level.max(0.0),
            sar_level: sar_level.max(0.0),
            bluetooth_level: bluetooth_level.max(0.0),
            kind,
            source: source.into(),
        }
    }

    /// Create a reading at a `chrono` instant.
    pub fn at(
        observed_at: DateTime<Utc>,
        wifi_level: f64,
        sar_level: f64,
        bluetooth_level: f64,
        kind: ReadingKind,
        source: impl Into<String>,
    ) -> Self {
        Self::new(
            observed_at.timestamp_millis(),
            wifi_level,
            sar_level,
            bluetooth_level,
            kind,
            source,
        )
    }

    /// The sample instant as a `chrono` UTC datetime.
    pub fn observed_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp_ms)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Whether this reading was synthesized by the backfiller.
    pub fn is_backfill(&self) -> bool {
        self.source == BACKFILL_SOURCE
    }
}

/// Per-channel time-weighted averages over a query window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowAverages {
    /// Wi-Fi channel average
    pub wifi: f64,
    /// SAR channel average
    pub sar: f64,
    /// Bluetooth channel average
    pub bluetooth: f64,
}

impl WindowAverages {
    /// Sum of all channel averages, the combined exposure figure callers
    /// display as a single number.
    pub fn combined(&self) -> f64 {
        self.wifi + self.sar + self.bluetooth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reading_clamps_negative_channels() {
        let reading = Reading::new(1000, -0.5, 0.3, -1.0, ReadingKind::Wifi, "sensor");
        assert_eq!(reading.wifi_level, 0.0);
        assert_eq!(reading.sar_level, 0.3);
        assert_eq!(reading.bluetooth_level, 0.0);
    }

    #[test]
    fn test_backfill_detection() {
        let observed = Reading::new(0, 1.0, 0.0, 0.0, ReadingKind::Wifi, "WifiManager");
        let synthetic = Reading::new(0, 1.0, 0.0, 0.0, ReadingKind::Wifi, BACKFILL_SOURCE);

        assert!(!observed.is_backfill());
        assert!(synthetic.is_backfill());
    }

    #[test]
    fn test_chrono_round_trip() {
        let now = Utc::now();
        let reading = Reading::at(now, 0.1, 0.2, 0.3, ReadingKind::Sar, "SarManager");

        assert_eq!(reading.timestamp_ms, now.timestamp_millis());
        assert_eq!(
            reading.observed_at().timestamp_millis(),
            now.timestamp_millis()
        );
    }

    #[test]
    fn test_combined_average() {
        let averages = WindowAverages {
            wifi: 2.0,
            sar: 1.0,
            bluetooth: 0.4,
        };
        assert!((averages.combined() - 3.4).abs() < 1e-9);
    }

    #[test]
    fn test_reading_serialization() {
        let reading = Reading::new(300_000, 1.5, 0.2, 0.0, ReadingKind::Wifi, "WifiManager");
        let json = serde_json::to_string(&reading).unwrap();
        let back: Reading = serde_json::from_str(&json).unwrap();

        assert_eq!(back.timestamp_ms, 300_000);
        assert_eq!(back.kind, ReadingKind::Wifi);
        assert_eq!(back.source, "WifiManager");
    }
}

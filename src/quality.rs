//! Signal quality classification
//!
//! This module maps raw physical measurements (cellular power, quality
//! ratio, signal-to-noise) onto an ordinal quality scale. Classification is
//! data-driven: each measure carries an ordered threshold table and one
//! generic walk evaluates it, so new measures are added as descriptors,
//! never as new branches.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Ordinal signal quality, from no usable signal to excellent.
///
/// The derive order makes `None < Poor < Moderate < Good < Great`; not
/// every measure uses all five levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    None,
    Poor,
    Moderate,
    Good,
    Great,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::None => "none",
            Quality::Poor => "poor",
            Quality::Moderate => "moderate",
            Quality::Good => "good",
            Quality::Great => "great",
        }
    }
}

/// Static descriptor of one physical signal measure.
///
/// `bands` is an ordered list of `(upper_bound, quality)` pairs evaluated
/// low-to-high with closed upper bounds; values above every band classify
/// as `top`. Larger raw values are better for all current measures.
#[derive(Debug, Clone, Copy)]
pub struct SignalMeasure {
    /// Short lowercase identifier, e.g. `"rsrp"`
    pub name: &'static str,
    /// Physical unit label
    pub unit: &'static str,
    /// Lower edge of the plausible raw-value domain
    pub min_value: f64,
    /// Upper edge of the plausible raw-value domain
    pub max_value: f64,
    bands: &'static [(f64, Quality)],
    top: Quality,
}

/// Reference signal received power (dBm).
pub static RSRP: SignalMeasure = SignalMeasure {
    name: "rsrp",
    unit: "dBm",
    min_value: -120.0,
    max_value: -40.0,
    bands: &[
        (-100.0, Quality::None),
        (-90.0, Quality::Poor),
        (-80.0, Quality::Good),
    ],
    top: Quality::Great,
};

/// Reference signal received quality (dB).
pub static RSRQ: SignalMeasure = SignalMeasure {
    name: "rsrq",
    unit: "dB",
    min_value: -20.0,
    max_value: 0.0,
    bands: &[
        (-20.0, Quality::None),
        (-15.0, Quality::Poor),
        (-10.0, Quality::Good),
    ],
    top: Quality::Great,
};

/// Signal-to-noise ratio (dB).
pub static SNR: SignalMeasure = SignalMeasure {
    name: "snr",
    unit: "dB",
    min_value: 0.0,
    max_value: 30.0,
    bands: &[
        (0.0, Quality::None),
        (13.0, Quality::Poor),
        (20.0, Quality::Good),
    ],
    top: Quality::Great,
};

/// All built-in measure descriptors.
pub static MEASURES: [&SignalMeasure; 3] = [&RSRP, &RSRQ, &SNR];

impl SignalMeasure {
    /// Classify a raw value against this measure's threshold table.
    ///
    /// An absent value always classifies as [`Quality::None`].
    pub fn classify(&self, value: Option<f64>) -> Quality {
        let Some(raw) = value else {
            return Quality::None;
        };

        for (upper_bound, quality) in self.bands {
            if raw <= *upper_bound {
                return *quality;
            }
        }
        self.top
    }

    /// Look up a built-in descriptor by name (case-insensitive).
    pub fn by_name(name: &str) -> Result<&'static SignalMeasure, EngineError> {
        MEASURES
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .copied()
            .ok_or_else(|| EngineError::UnknownMeasure(name.to_string()))
    }
}

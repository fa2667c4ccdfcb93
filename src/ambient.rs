//! Ambient broadcast exposure estimation
//!
//! This module turns counts of nearby broadcast transmitters and an
//! environment profile into a composite risk index plus a physically
//! derived incident power density and SAR-like exposure figure. The
//! physical model is deliberately simple: nominal transmitter power per
//! category, nominal distance per environment, and inverse-square
//! free-space propagation.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Hard ceiling on the SAR-like scalars (W/kg-equivalent).
pub const SAR_CAP_W_KG: f64 = 0.10;

/// ERP to EIRP conversion for FM and TV antennas (half-wave dipole gain).
const ERP_TO_EIRP: f64 = 1.64;

// Nominal transmit power per source category (kW, ERP for FM/TV).
const FM_STRONG_ERP_KW: f64 = 100.0;
const FM_WEAK_ERP_KW: f64 = 10.0;
const AM_STRONG_POWER_KW: f64 = 50.0;
const TV_OPEN_AIR_ERP_KW: f64 = 1000.0;
const TV_ANTENNA_ERP_KW: f64 = 100.0;

// Composite index weights per source category.
const FM_STRONG_WEIGHT: u32 = 2;
const FM_WEAK_WEIGHT: u32 = 1;
const AM_STRONG_WEIGHT: u32 = 1;
const TV_OPEN_AIR_WEIGHT: u32 = 3;
const TV_ANTENNA_WEIGHT: u32 = 2;

/// Counts of nearby broadcast sources by category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    /// Strong FM transmitters
    #[serde(default)]
    pub fm_strong: u32,
    /// Weak FM transmitters
    #[serde(default)]
    pub fm_weak: u32,
    /// Strong AM transmitters
    #[serde(default)]
    pub am_strong: u32,
    /// TV channels receivable over the air
    #[serde(default)]
    pub tv_open_air: u32,
    /// TV channels receivable with an antenna
    #[serde(default)]
    pub tv_antenna: u32,
}

/// Environment category, selecting both a qualitative index factor and
/// nominal source distances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Urban,
    #[default]
    Suburban,
    Rural,
}

impl Environment {
    /// Qualitative weight applied to the composite index.
    pub fn index_factor(&self) -> f64 {
        match self {
            Environment::Urban => 1.5,
            Environment::Suburban => 1.0,
            Environment::Rural => 0.5,
        }
    }

    /// Nominal distance to FM and TV transmitters (meters).
    pub fn fm_tv_distance_m(&self) -> f64 {
        match self {
            Environment::Urban => 3_000.0,
            Environment::Suburban => 5_000.0,
            Environment::Rural => 10_000.0,
        }
    }

    /// Nominal distance to AM transmitters (meters).
    pub fn am_distance_m(&self) -> f64 {
        match self {
            Environment::Urban => 5_000.0,
            Environment::Suburban => 8_000.0,
            Environment::Rural => 15_000.0,
        }
    }

    /// Parse an environment name, falling back to the suburban default for
    /// unknown input.
    pub fn parse_or_default(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "urban" => Environment::Urban,
            "rural" => Environment::Rural,
            _ => Environment::Suburban,
        }
    }
}

/// Estimation profile selecting the density-to-SAR conversion coefficient
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExposureProfile {
    Conservative,
    #[default]
    Average,
    Maximal,
}

impl ExposureProfile {
    /// Density-to-SAR conversion coefficient.
    pub fn alpha(&self) -> f64 {
        match self {
            ExposureProfile::Conservative => 0.05,
            ExposureProfile::Average => 0.10,
            ExposureProfile::Maximal => 0.20,
        }
    }

    /// Parse a profile name, falling back to the average default for
    /// unknown input.
    pub fn parse_or_default(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "conservative" => ExposureProfile::Conservative,
            "maximal" => ExposureProfile::Maximal,
            _ => ExposureProfile::Average,
        }
    }
}

/// Derived ambient exposure figures.
///
/// Recomputed on demand from current inputs; never persisted as
/// authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientEstimate {
    /// Composite risk index, clamped to `[0, 100]`
    pub composite_index: u32,
    /// Total incident power density (W/m²)
    pub total_density_w_m2: f64,
    /// FM band incident power density (W/m²)
    pub fm_density_w_m2: f64,
    /// TV band incident power density (W/m²)
    pub tv_density_w_m2: f64,
    /// AM band incident power density (W/m²)
    pub am_density_w_m2: f64,
    /// SAR-like scalar over the total density, capped at [`SAR_CAP_W_KG`]
    pub sar_total_w_kg: f64,
    /// SAR-like scalar over the FM+TV broadcast subset, capped likewise
    pub sar_broadcast_w_kg: f64,
}

/// Estimate ambient exposure from source counts and an environment profile.
///
/// Pure function; all inputs are validated by construction and every input
/// combination has a defined result.
pub fn estimate(
    counts: &SourceCounts,
    environment: Environment,
    profile: ExposureProfile,
) -> AmbientEstimate {
    let weighted_sum = FM_STRONG_WEIGHT * counts.fm_strong
        + FM_WEAK_WEIGHT * counts.fm_weak
        + AM_STRONG_WEIGHT * counts.am_strong
        + TV_OPEN_AIR_WEIGHT * counts.tv_open_air
        + TV_ANTENNA_WEIGHT * counts.tv_antenna;

    let composite_index =
        ((weighted_sum as f64 * environment.index_factor()) as i64).clamp(0, 100) as u32;

    let fm_tv_distance = environment.fm_tv_distance_m();
    let am_distance = environment.am_distance_m();

    let fm_density_w_m2 = counts.fm_strong as f64
        * free_space_density(FM_STRONG_ERP_KW, ERP_TO_EIRP, fm_tv_distance)
        + counts.fm_weak as f64 * free_space_density(FM_WEAK_ERP_KW, ERP_TO_EIRP, fm_tv_distance);

    let tv_density_w_m2 = counts.tv_open_air as f64
        * free_space_density(TV_OPEN_AIR_ERP_KW, ERP_TO_EIRP, fm_tv_distance)
        + counts.tv_antenna as f64
            * free_space_density(TV_ANTENNA_ERP_KW, ERP_TO_EIRP, fm_tv_distance);

    // AM power is used directly, without the dipole gain conversion.
    let am_density_w_m2 =
        counts.am_strong as f64 * free_space_density(AM_STRONG_POWER_KW, 1.0, am_distance);

    let total_density_w_m2 = fm_density_w_m2 + tv_density_w_m2 + am_density_w_m2;

    let alpha = profile.alpha();
    let sar_total_w_kg = (alpha * total_density_w_m2).min(SAR_CAP_W_KG);
    let sar_broadcast_w_kg = (alpha * (fm_density_w_m2 + tv_density_w_m2)).min(SAR_CAP_W_KG);

    AmbientEstimate {
        composite_index,
        total_density_w_m2,
        fm_density_w_m2,
        tv_density_w_m2,
        am_density_w_m2,
        sar_total_w_kg,
        sar_broadcast_w_kg,
    }
}

/// Inverse-square free-space power density at a distance (W/m²).
fn free_space_density(power_kw: f64, gain: f64, distance_m: f64) -> f64 {
    power_kw * 1_000.0 * gain / (4.0 * PI * distance_m * distance_m)
}

//! Emwatch - On-device aggregation engine for personal RF exposure monitoring
//!
//! Emwatch turns irregular, sparse radio sensor readings into continuous
//! exposure figures through a deterministic pipeline: ingestion → gap
//! backfill → time-weighted windowed averaging, plus two pure evaluation
//! functions consumed by reporting code.
//!
//! ## Modules
//!
//! - **Series**: [`store::ExposureSeriesStore`] owns the time-ordered
//!   reading sequence, backfills sampling gaps on a fixed 5-minute grid,
//!   and answers windowed average queries
//! - **Quality**: [`quality::SignalMeasure`] classifies raw cellular
//!   measurements (RSRP, RSRQ, SNR) into ordinal quality categories
//! - **Ambient**: [`ambient::estimate`] derives a composite risk index and
//!   SAR-like exposure figure from nearby broadcast sources

pub mod ambient;
pub mod averaging;
pub mod backfill;
pub mod error;
pub mod quality;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use ambient::{estimate, AmbientEstimate, Environment, ExposureProfile, SourceCounts};
pub use averaging::time_weighted_average;
pub use backfill::{fill_gap, BUCKET_MS};
pub use error::EngineError;
pub use quality::{Quality, SignalMeasure};
pub use store::ExposureSeriesStore;
pub use types::{Reading, ReadingKind, WindowAverages, BACKFILL_SOURCE};

/// Engine version embedded in CLI and FFI output
pub const EMWATCH_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for CLI and FFI output
pub const PRODUCER_NAME: &str = "emwatch";

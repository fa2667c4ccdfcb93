//! Error types for the Emwatch engine

use thiserror::Error;

/// Errors surfaced by the engine's fallible entry points.
///
/// The numeric core (averaging, backfill, classification, estimation) is
/// total over its typed inputs and never returns these; they arise only on
/// the JSON ingestion and descriptor-lookup surfaces.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse readings: {0}")]
    ParseError(String),

    #[error("Unknown signal measure: {0}")]
    UnknownMeasure(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),
}

//! Errors the core can actually raise.
//!
//! Per the propagation policy, almost every anomaly in a day's data is
//! reported as a counter or status field on [`crate::result::DayResult`],
//! never as an `Err`. Only programming errors — inputs that make the
//! engine itself impossible to construct — abort with a structured error.
use thiserror::Error;

/// Errors building geometry inputs (fences, zones, the metal building).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("polygon \"{0}\" has {1} vertices, at least 3 are required")]
    TooFewVertices(String, usize),
}

/// Errors constructing the processing engine or its configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid geometry input: {0}")]
    Geometry(#[from] GeometryError),
    #[error("max backward jump must be positive, got {0}")]
    InvalidMaxBackwardJump(i64),
    #[error("max interval seconds must be positive, got {0}")]
    InvalidMaxIntervalSec(i64),
    #[error("cluster radius must be positive, got {0}")]
    InvalidClusterRadius(f64),
}

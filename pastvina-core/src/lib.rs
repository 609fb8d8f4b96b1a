//! Cattle-collar telemetry behavioral reconstruction core.
//!
//! Transforms a day's raw dual-modality telemetry (GPS + 3-axis
//! accelerometer) into a structured [`result::DayResult`]: time spent
//! lying/standing/walking, dwell clusters, zone usage, and data-quality
//! diagnostics. See [`pipeline::process`] for the single entry point.

pub mod aggregate;
pub mod behavior;
pub mod config;
pub mod dwell;
pub mod error;
pub mod geo;
pub mod gravity;
pub mod outage;
pub mod pipeline;
pub mod record;
pub mod resample;
pub mod result;
pub mod time_model;
pub mod zone;

/// Convenience re-exports of the types most callers need.
pub mod prelude {
    pub use crate::behavior::{Behavior, ConsistencyTag, Interval, SimpleBehavior};
    pub use crate::config::{EngineConfig, GeoInputs, ProcessingOptions};
    pub use crate::error::{CoreError, GeometryError};
    pub use crate::pipeline::process;
    pub use crate::record::RawRecord;
    pub use crate::result::DayResult;
}

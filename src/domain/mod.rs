//! Domain layer: Core scoring types and algorithms.
//!
//! Pure Rust types with no I/O. Everything here is deterministic given its
//! inputs; tables and artifacts are read by the adapters layer.

mod calibration;
mod interaction;
mod parameters;
mod report;
mod score;
mod shap;
mod time;
mod trend;

pub use calibration::{
    BucketModel, CalibrationArtifact, CalibrationError, CalibrationModel, Calibrator,
    LogisticParams, EXP_ARG_LIMIT,
};
pub use interaction::InteractionMatrix;
pub use parameters::{
    normalize_name, FeatureVector, MeasuredParameters, MissingParameter, Parameter, SCORING_ORDER,
};
pub use report::InvasionReport;
pub use score::{raw_score, ScoreError};
pub use shap::{parse_cell, parse_time_label, ShapRow, ShapTable, ShapValueSet, INTERACTION_MARKER};
pub use time::{ObservationTime, TimeBucket, TimeError, BUCKET_HOURS, MAX_TIME_H};
pub use trend::{CalibrationGroup, ScoreHistory};

//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! SHAP extraction and Invasion Factor scoring.

mod scoring;
mod shap_window;

pub use scoring::{InvasionFactorService, ScoreBreakdown, ScoringSession};
pub use shap_window::ShapWindowExtractor;

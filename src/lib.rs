//! # Implantometrics
//!
//! Invasion Factor scoring for spheroid implantation time series.
//!
//! This crate provides:
//! - SHAP window extraction from per-model CSV tables
//! - A normalized, SHAP-weighted raw invasion score
//! - Trend-aware sigmoid calibration into a bounded Invasion Factor
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types and algorithms (time buckets, parameters, SHAP sets, calibration)
//! - `ports`: Trait definitions for SHAP tables and measurement extractors
//! - `adapters`: Concrete implementations (CSV tables, JSON measurements, calibration file)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{CalibrationGroup, InvasionReport, ObservationTime};

/// Result type for Implantometrics operations
pub type Result<T> = std::result::Result<T, ImplantoError>;

/// Main error type for Implantometrics
#[derive(Debug, thiserror::Error)]
pub enum ImplantoError {
    #[error("Invalid observation time: {0}")]
    InvalidTime(#[from] domain::TimeError),

    #[error("Missing parameter: {0}")]
    MissingParameter(#[from] domain::MissingParameter),

    #[error("SHAP extraction failed: {0}")]
    Shap(#[from] ports::ShapError),

    #[error("Provider failed: {0}")]
    Provider(#[from] ports::ProviderError),

    #[error("Scoring failed: {0}")]
    Score(#[from] domain::ScoreError),

    #[error("Calibration failed: {0}")]
    Calibration(#[from] domain::CalibrationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

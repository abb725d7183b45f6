//! Time- and group-aware sigmoid calibration of raw Invasion Factors.
//!
//! The calibration artifact is produced offline and shipped as JSON:
//!
//! ```json
//! {
//!   "version": "v11.2",
//!   "params": { "b0": 0.0, "b1": 1.0, "k": 1.0, "x0": 0.0 },
//!   "time_grid": [0, 8, 16],
//!   "med_A": [0.1, 0.2, 0.3],
//!   "iqr_A": [1.0, 1.0, 1.0],
//!   "Δ": [[0, 0, 0], [0, 0, 0], [0, 0, 0]]
//! }
//! ```
//!
//! A raw score is standardized with the median/IQR of the nearest grid point,
//! then mapped through `b0' + b1 / (1 + exp(-k (z - x0)))`, where `b0'` is
//! `b0` shifted by the group's offset at that grid point.
//!
//! # States
//!
//! A [`Calibrator`] is either `Loaded` or `Unavailable`. When unavailable,
//! calibration is the identity, so a raw score is always returned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::time::ObservationTime;
use super::trend::CalibrationGroup;

/// Clamp for the exponent so `exp` never overflows.
pub const EXP_ARG_LIMIT: f64 = 700.0;

/// Error type for calibration artifact handling.
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("Calibration artifact not readable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Calibration artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed calibration artifact: {0}")]
    Malformed(String),
}

/// Global logistic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub b0: f64,
    pub b1: f64,
    pub k: f64,
    pub x0: f64,
}

impl LogisticParams {
    /// Evaluate the logistic curve at standardized score `z`.
    #[must_use]
    pub fn evaluate(&self, z: f64) -> f64 {
        let arg = (-self.k * (z - self.x0)).clamp(-EXP_ARG_LIMIT, EXP_ARG_LIMIT);
        self.b0 + self.b1 / (1.0 + arg.exp())
    }

    /// Same parameters with `b0` shifted by `delta`.
    #[must_use]
    pub fn with_offset(self, delta: f64) -> Self {
        Self {
            b0: self.b0 + delta,
            ..self
        }
    }
}

/// Serialized calibration artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub params: LogisticParams,
    pub time_grid: Vec<i64>,
    #[serde(rename = "med_A")]
    pub med: Vec<f64>,
    #[serde(rename = "iqr_A")]
    pub iqr: Vec<f64>,
    /// Additive `b0` offsets, one row per group (A, D, E), aligned to `time_grid`.
    #[serde(rename = "Δ")]
    pub delta: Vec<Vec<f64>>,
}

/// Normalization statistics and group-adjusted parameters at one grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketModel {
    pub med: f64,
    pub iqr: f64,
    pub params: LogisticParams,
}

impl BucketModel {
    /// Calibrate, or `None` when the IQR is zero.
    #[must_use]
    pub fn calibrate(&self, raw: f64) -> Option<f64> {
        if self.iqr == 0.0 {
            return None;
        }
        let z = (raw - self.med) / self.iqr;
        Some(self.params.evaluate(z))
    }
}

/// Parsed, immutable calibration model.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationModel {
    version: Option<String>,
    fingerprint: Option<String>,
    time_grid: Vec<i64>,
    groups: [BTreeMap<i64, BucketModel>; 3],
}

impl CalibrationModel {
    /// Build the per-group lookup tables from an artifact.
    ///
    /// Each group covers the first `min(|time_grid|, |med|, |iqr|, |Δ[g]|)`
    /// grid points; grid points beyond that are absent for the group.
    ///
    /// # Errors
    /// Returns `CalibrationError::Malformed` if fewer than three offset rows
    /// are present or the time grid is empty.
    pub fn from_artifact(artifact: CalibrationArtifact) -> Result<Self, CalibrationError> {
        if artifact.delta.len() < CalibrationGroup::ALL.len() {
            return Err(CalibrationError::Malformed(format!(
                "expected {} offset rows, found {}",
                CalibrationGroup::ALL.len(),
                artifact.delta.len()
            )));
        }
        if artifact.time_grid.is_empty() {
            return Err(CalibrationError::Malformed("time_grid is empty".into()));
        }
        if artifact.time_grid.windows(2).any(|w| w[0] > w[1]) {
            tracing::warn!("Calibration time_grid is not ascending");
        }

        let aligned = artifact
            .time_grid
            .len()
            .min(artifact.med.len())
            .min(artifact.iqr.len());

        let groups = CalibrationGroup::ALL.map(|group| {
            let offsets = &artifact.delta[group.index()];
            let len = aligned.min(offsets.len());
            (0..len)
                .map(|t| {
                    (
                        artifact.time_grid[t],
                        BucketModel {
                            med: artifact.med[t],
                            iqr: artifact.iqr[t],
                            params: artifact.params.with_offset(offsets[t]),
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>()
        });

        Ok(Self {
            version: artifact.version,
            fingerprint: None,
            time_grid: artifact.time_grid,
            groups,
        })
    }

    /// Parse and build from JSON bytes.
    ///
    /// # Errors
    /// Returns `CalibrationError::Json` or `CalibrationError::Malformed`.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, CalibrationError> {
        let artifact: CalibrationArtifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(artifact)
    }

    /// Attach a content fingerprint (e.g. a SHA-256 of the artifact bytes).
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    #[must_use]
    pub fn time_grid(&self) -> &[i64] {
        &self.time_grid
    }

    /// Grid point closest to `hours`; ties go to the earliest grid entry.
    #[must_use]
    pub fn nearest_grid_point(&self, hours: i64) -> Option<i64> {
        self.time_grid
            .iter()
            .copied()
            .min_by_key(|t| t.abs_diff(hours))
    }

    /// Bucket model for a group at a grid point.
    #[must_use]
    pub fn bucket(&self, group: CalibrationGroup, grid_point: i64) -> Option<&BucketModel> {
        self.groups[group.index()].get(&grid_point)
    }

    /// Calibrated score, or `None` when no usable bucket exists.
    #[must_use]
    pub fn try_apply(&self, raw: f64, time: ObservationTime, group: CalibrationGroup) -> Option<f64> {
        let grid_point = self.nearest_grid_point(time.hours())?;
        self.bucket(group, grid_point)?.calibrate(raw)
    }
}

/// Calibration state: loaded once, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Calibrator {
    Loaded(CalibrationModel),
    #[default]
    Unavailable,
}

impl Calibrator {
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    #[must_use]
    pub fn model(&self) -> Option<&CalibrationModel> {
        match self {
            Self::Loaded(model) => Some(model),
            Self::Unavailable => None,
        }
    }

    /// Calibrated score, or `None` when calibration does not apply.
    #[must_use]
    pub fn try_apply(&self, raw: f64, time: ObservationTime, group: CalibrationGroup) -> Option<f64> {
        self.model()?.try_apply(raw, time, group)
    }

    /// Calibrated score; the raw score unchanged when calibration does not apply.
    #[must_use]
    pub fn apply(&self, raw: f64, time: ObservationTime, group: CalibrationGroup) -> f64 {
        self.try_apply(raw, time, group).unwrap_or(raw)
    }
}

impl From<CalibrationModel> for Calibrator {
    fn from(model: CalibrationModel) -> Self {
        Self::Loaded(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn t(h: i64) -> ObservationTime {
        ObservationTime::new(h).expect("valid time")
    }

    fn midpoint_artifact() -> CalibrationArtifact {
        CalibrationArtifact {
            version: None,
            params: LogisticParams {
                b0: 0.0,
                b1: 1.0,
                k: 1.0,
                x0: 0.0,
            },
            time_grid: vec![0, 8],
            med: vec![0.0, 0.0],
            iqr: vec![1.0, 1.0],
            delta: vec![vec![0.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0]],
        }
    }

    #[test]
    fn test_midpoint_scenario() {
        let model = CalibrationModel::from_artifact(midpoint_artifact()).expect("Should build");
        let cal = Calibrator::from(model);
        assert!((cal.apply(0.0, t(0), CalibrationGroup::A) - 0.5).abs() < TOL);
    }

    #[test]
    fn test_parses_json_with_delta_key() {
        let json = r#"{
            "version": "v11.2",
            "params": {"b0": 0.1, "b1": 0.8, "k": 2.0, "x0": 0.5},
            "time_grid": [0, 8, 16],
            "med_A": [0.0, 1.0, 2.0],
            "iqr_A": [1.0, 2.0, 0.0],
            "Δ": [[0.0, 0.0, 0.0], [-0.1, -0.1, -0.1], [0.2, 0.2, 0.2]]
        }"#;
        let model = CalibrationModel::from_json_slice(json.as_bytes()).expect("Should parse");
        assert_eq!(model.version(), Some("v11.2"));
        assert_eq!(model.time_grid(), &[0, 8, 16]);

        let d = model.bucket(CalibrationGroup::D, 8).expect("bucket");
        assert!((d.params.b0 - 0.0).abs() < TOL);
        assert!((d.med - 1.0).abs() < TOL);
        let e = model.bucket(CalibrationGroup::E, 8).expect("bucket");
        assert!((e.params.b0 - 0.3).abs() < TOL);
    }

    #[test]
    fn test_group_offset_shifts_output() {
        let mut artifact = midpoint_artifact();
        artifact.delta[2] = vec![0.25, 0.25];
        let cal = Calibrator::from(CalibrationModel::from_artifact(artifact).expect("build"));
        let a = cal.apply(0.0, t(0), CalibrationGroup::A);
        let e = cal.apply(0.0, t(0), CalibrationGroup::E);
        assert!((e - a - 0.25).abs() < TOL);
    }

    #[test]
    fn test_nearest_grid_point_ties_take_first() {
        let mut artifact = midpoint_artifact();
        artifact.time_grid = vec![0, 8, 16];
        let model = CalibrationModel::from_artifact(artifact).expect("build");
        assert_eq!(model.nearest_grid_point(4), Some(0));
        assert_eq!(model.nearest_grid_point(5), Some(8));
        assert_eq!(model.nearest_grid_point(12), Some(8));
        assert_eq!(model.nearest_grid_point(143), Some(16));
    }

    #[test]
    fn test_extreme_grid_point_does_not_overflow() {
        let json = r#"{
            "params": {"b0": 0.0, "b1": 1.0, "k": 1.0, "x0": 0.0},
            "time_grid": [-9223372036854775808, 8],
            "med_A": [0.0, 0.0],
            "iqr_A": [1.0, 1.0],
            "Δ": [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]]
        }"#;
        let model = CalibrationModel::from_json_slice(json.as_bytes()).expect("Should parse");
        assert_eq!(model.nearest_grid_point(0), Some(8));
        assert_eq!(model.nearest_grid_point(143), Some(8));
        let cal = Calibrator::from(model);
        assert!((cal.apply(0.0, t(8), CalibrationGroup::A) - 0.5).abs() < TOL);
    }

    #[test]
    fn test_zero_iqr_is_identity() {
        let mut artifact = midpoint_artifact();
        artifact.iqr = vec![0.0, 1.0];
        let cal = Calibrator::from(CalibrationModel::from_artifact(artifact).expect("build"));
        assert_eq!(cal.apply(3.25, t(1), CalibrationGroup::A), 3.25);
        assert!(cal.try_apply(3.25, t(1), CalibrationGroup::A).is_none());
        assert!(cal.try_apply(3.25, t(9), CalibrationGroup::A).is_some());
    }

    #[test]
    fn test_unavailable_is_identity() {
        let cal = Calibrator::Unavailable;
        assert!(!cal.is_loaded());
        for raw in [-5.0, 0.0, 0.123, 1e6] {
            assert_eq!(cal.apply(raw, t(40), CalibrationGroup::D).to_bits(), raw.to_bits());
        }
    }

    #[test]
    fn test_truncates_to_shortest_arrays() {
        let mut artifact = midpoint_artifact();
        artifact.time_grid = vec![0, 8, 16];
        artifact.med = vec![0.0, 0.0, 0.0];
        artifact.iqr = vec![1.0, 1.0, 1.0];
        artifact.delta = vec![vec![0.0, 0.0, 0.0], vec![0.0], vec![0.0, 0.0, 0.0]];
        let cal = Calibrator::from(CalibrationModel::from_artifact(artifact).expect("build"));

        // Group D only covers grid point 0; nearest point 16 is absent => identity.
        assert_eq!(cal.apply(2.0, t(16), CalibrationGroup::D), 2.0);
        assert!(cal.try_apply(2.0, t(16), CalibrationGroup::E).is_some());
        assert!(cal.try_apply(2.0, t(0), CalibrationGroup::D).is_some());
    }

    #[test]
    fn test_exponent_clamped() {
        let mut artifact = midpoint_artifact();
        artifact.params.k = 1e6;
        let cal = Calibrator::from(CalibrationModel::from_artifact(artifact).expect("build"));
        let high = cal.apply(1e6, t(0), CalibrationGroup::A);
        let low = cal.apply(-1e6, t(0), CalibrationGroup::A);
        assert!(high.is_finite() && low.is_finite());
        assert!((high - 1.0).abs() < TOL);
        assert!(low.abs() < TOL);
    }

    #[test]
    fn test_missing_offset_rows_rejected() {
        let mut artifact = midpoint_artifact();
        artifact.delta.truncate(2);
        assert!(matches!(
            CalibrationModel::from_artifact(artifact),
            Err(CalibrationError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_field_rejected() {
        let json = r#"{"params": {"b0": 0, "b1": 1, "k": 1, "x0": 0}, "time_grid": [0]}"#;
        assert!(matches!(
            CalibrationModel::from_json_slice(json.as_bytes()),
            Err(CalibrationError::Json(_))
        ));
    }

    #[test]
    fn test_apply_bit_identical() {
        let cal = Calibrator::from(CalibrationModel::from_artifact(midpoint_artifact()).expect("build"));
        let a = cal.apply(0.731, t(7), CalibrationGroup::E);
        let b = cal.apply(0.731, t(7), CalibrationGroup::E);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

//! Invasion Factor report types.
//!
//! Represents the output of one scoring request.

use serde::{Deserialize, Serialize};

use super::time::{ObservationTime, TimeBucket};
use super::trend::CalibrationGroup;

/// Complete scoring record including metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvasionReport {
    /// Unique identifier
    pub id: String,

    /// Observation time in hours
    pub time_h: ObservationTime,

    /// SHAP bucket the weights were taken from
    pub bucket: TimeBucket,

    /// Uncalibrated score
    pub raw_score: f64,

    /// Group selected by the trend classifier
    pub group: CalibrationGroup,

    /// Calibrated Invasion Factor (equals `raw_score` when not calibrated)
    pub invasion_factor: f64,

    /// Whether the calibration model was applied
    pub calibrated: bool,

    /// Size of the feature vector the interaction matrix was built over
    pub feature_count: usize,

    /// Timestamp of scoring
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl InvasionReport {
    /// Create a new report.
    #[must_use]
    pub fn new(
        time_h: ObservationTime,
        raw_score: f64,
        group: CalibrationGroup,
        calibrated_score: Option<f64>,
        feature_count: usize,
    ) -> Self {
        Self {
            id: uuid_v4(),
            time_h,
            bucket: time_h.bucket(),
            raw_score,
            group,
            invasion_factor: calibrated_score.unwrap_or(raw_score),
            calibrated: calibrated_score.is_some(),
            feature_count,
            created_at: chrono::Utc::now(),
        }
    }

    /// The `(time_h, invasion_factor)` pair shown to users.
    #[must_use]
    pub fn summary(&self) -> (i64, f64) {
        (self.time_h.hours(), self.invasion_factor)
    }
}

/// Generate a random UUID v4 string.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

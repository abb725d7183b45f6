//! Calibration groups and the trend classifier that assigns them.

use serde::{Deserialize, Serialize};

/// Number of recent scores the trend slope spans.
pub const TREND_WINDOW: usize = 4;

/// Calibration group selecting a per-group offset in the calibration model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalibrationGroup {
    /// Default group, also used with fewer than four recorded scores.
    A,
    /// Declining trend.
    D,
    /// Rising or flat trend.
    E,
}

impl CalibrationGroup {
    /// Groups in the order their offsets appear in the calibration artifact.
    pub const ALL: [CalibrationGroup; 3] = [Self::A, Self::D, Self::E];

    /// Row of this group in the artifact's offset matrix.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::D => 1,
            Self::E => 2,
        }
    }

    /// Classify a score history by the slope over its last four entries.
    ///
    /// `slope = (h[n-1] - h[n-4]) / 3`; negative gives `D`, otherwise `E`.
    /// Histories shorter than four give `A`. No hysteresis.
    #[must_use]
    pub fn classify(history: &[f64]) -> Self {
        let n = history.len();
        if n < TREND_WINDOW {
            return Self::A;
        }
        let slope = (history[n - 1] - history[n - TREND_WINDOW]) / (TREND_WINDOW - 1) as f64;
        if slope < 0.0 {
            Self::D
        } else {
            Self::E
        }
    }
}

impl std::fmt::Display for CalibrationGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::D => write!(f, "D"),
            Self::E => write!(f, "E"),
        }
    }
}

/// Append-only history of raw scores for one scoring session.
///
/// Never persisted; not synchronized.
#[derive(Debug, Clone, Default)]
pub struct ScoreHistory {
    scores: Vec<f64>,
}

impl ScoreHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, raw_score: f64) {
        self.scores.push(raw_score);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.scores
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Current group for this history.
    #[must_use]
    pub fn group(&self) -> CalibrationGroup {
        CalibrationGroup::classify(&self.scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_history_is_a() {
        assert_eq!(CalibrationGroup::classify(&[]), CalibrationGroup::A);
        assert_eq!(CalibrationGroup::classify(&[5.0, -3.0, 100.0]), CalibrationGroup::A);
    }

    #[test]
    fn test_rising_is_e() {
        assert_eq!(CalibrationGroup::classify(&[1.0, 2.0, 3.0, 4.0]), CalibrationGroup::E);
    }

    #[test]
    fn test_flat_is_e() {
        assert_eq!(CalibrationGroup::classify(&[2.0, 9.0, -9.0, 2.0]), CalibrationGroup::E);
    }

    #[test]
    fn test_declining_is_d() {
        assert_eq!(CalibrationGroup::classify(&[4.0, 3.0, 2.0, 1.0]), CalibrationGroup::D);
    }

    #[test]
    fn test_uses_last_four_only() {
        // Older entries are ignored: last four are 0, 5, 5, 1 => slope > 0
        let history = [100.0, 50.0, 0.0, 5.0, 5.0, 1.0];
        assert_eq!(CalibrationGroup::classify(&history), CalibrationGroup::E);
    }

    #[test]
    fn test_history_accumulates() {
        let mut h = ScoreHistory::new();
        for s in [3.0, 2.0, 1.0] {
            h.push(s);
            assert_eq!(h.group(), CalibrationGroup::A);
        }
        h.push(0.5);
        assert_eq!(h.len(), 4);
        assert_eq!(h.group(), CalibrationGroup::D);
    }
}

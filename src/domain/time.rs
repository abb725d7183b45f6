//! Observation time and the 8-hour buckets SHAP weights are grouped by.

use serde::{Deserialize, Serialize};

/// Latest supported observation hour (inclusive).
pub const MAX_TIME_H: i64 = 143;

/// Width of one SHAP/calibration time bucket in hours.
pub const BUCKET_HOURS: i64 = 8;

/// Error returned when a time input cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("The hour entered is not a valid number: {0:?}")]
    NotANumber(String),

    #[error("Invalid hour {0}: must be an integer between 0 and 143")]
    OutOfRange(i64),
}

/// A validated observation time in whole hours, within `[0, 143]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ObservationTime(i64);

impl ObservationTime {
    /// Validate an hour value.
    ///
    /// # Errors
    /// Returns `TimeError::OutOfRange` outside `[0, 143]`.
    pub fn new(hours: i64) -> Result<Self, TimeError> {
        if (0..=MAX_TIME_H).contains(&hours) {
            Ok(Self(hours))
        } else {
            Err(TimeError::OutOfRange(hours))
        }
    }

    /// Hours since seeding.
    #[must_use]
    pub fn hours(self) -> i64 {
        self.0
    }

    /// The 8-hour bucket containing this time.
    #[must_use]
    pub fn bucket(self) -> TimeBucket {
        TimeBucket::containing(self.0)
    }
}

impl std::str::FromStr for ObservationTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hours: i64 = trimmed
            .parse()
            .map_err(|_| TimeError::NotANumber(trimmed.to_string()))?;
        Self::new(hours)
    }
}

impl TryFrom<i64> for ObservationTime {
    type Error = TimeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObservationTime> for i64 {
    fn from(t: ObservationTime) -> Self {
        t.0
    }
}

impl std::fmt::Display for ObservationTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h", self.0)
    }
}

/// Half-open hour window `[start, start + 8)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeBucket {
    pub start: i64,
    pub end: i64,
}

impl TimeBucket {
    /// Bucket containing `hours`, `floor(hours / 8) * 8 .. +8`.
    #[must_use]
    pub fn containing(hours: i64) -> Self {
        let start = hours.div_euclid(BUCKET_HOURS) * BUCKET_HOURS;
        Self {
            start,
            end: start + BUCKET_HOURS,
        }
    }

    #[must_use]
    pub fn contains(&self, hours: i64) -> bool {
        hours >= self.start && hours < self.end
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

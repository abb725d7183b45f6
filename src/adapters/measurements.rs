//! JSON measurement adapter: Implementation of ParameterProvider and
//! FeatureProvider over measurement files written by the extractors.
//!
//! A file holds one sample or an array of samples:
//!
//! ```json
//! [
//!   { "time_h": 0,  "parameters": { "Cell Radius": 112.0, "Area": 40210.5,
//!                                   "Migration Radius": 130.2, "Number of Projections": 3 },
//!     "features": { "Feature_1": 0.12, "Feature_2": -0.4 } },
//!   { "time_h": 8,  "parameters": { ... } }
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::ObservationTime;
use crate::ports::{FeatureProvider, ParameterProvider, ProviderError};
use crate::ImplantoError;

/// One extractor sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Observation time, required for timeline scoring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_h: Option<ObservationTime>,

    /// Measured parameters keyed by name
    pub parameters: BTreeMap<String, f64>,

    /// Feature embedding keyed by name
    #[serde(default)]
    pub features: BTreeMap<String, f64>,
}

impl ParameterProvider for MeasurementRecord {
    fn parameters(&self) -> Result<BTreeMap<String, f64>, ProviderError> {
        if self.parameters.is_empty() {
            return Err(ProviderError::Unavailable(
                "measurement contains no parameters".into(),
            ));
        }
        Ok(self.parameters.clone())
    }
}

impl FeatureProvider for MeasurementRecord {
    fn features(&self) -> Result<BTreeMap<String, f64>, ProviderError> {
        Ok(self.features.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MeasurementFile {
    Many(Vec<MeasurementRecord>),
    One(MeasurementRecord),
}

/// Read a measurement file holding one record or an array of records.
///
/// # Errors
/// Returns `ImplantoError::Io` or `ImplantoError::Serialization`.
pub fn load_measurements(path: &Path) -> Result<Vec<MeasurementRecord>, ImplantoError> {
    let content = std::fs::read_to_string(path)?;
    let records = match serde_json::from_str::<MeasurementFile>(&content)? {
        MeasurementFile::Many(records) => records,
        MeasurementFile::One(record) => vec![record],
    };
    tracing::debug!("Read {} measurement record(s) from {:?}", records.len(), path);
    Ok(records)
}

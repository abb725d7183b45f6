//! Calibration artifact adapter: loads the sigmoid calibration JSON from disk.
//!
//! Loading is fail-soft by default: any error is logged and yields
//! [`Calibrator::Unavailable`], under which calibration is the identity.
//! [`CalibrationSlot`] guards the load so it happens once per process.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use sha2::{Digest, Sha256};

use crate::domain::{CalibrationError, CalibrationModel, Calibrator};

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Load and validate a calibration artifact.
///
/// # Errors
/// Returns `CalibrationError` if the file cannot be read or parsed.
pub fn load_calibration(path: &Path) -> Result<CalibrationModel, CalibrationError> {
    let bytes = std::fs::read(path)?;
    let fingerprint = sha256_hex_bytes(&bytes);
    let model = CalibrationModel::from_json_slice(&bytes)?.with_fingerprint(fingerprint);

    tracing::info!(
        "Loaded calibration model from {:?} (version={}, grid_points={}, sha256={})",
        path,
        model.version().unwrap_or("unversioned"),
        model.time_grid().len(),
        model.fingerprint().unwrap_or_default()
    );
    Ok(model)
}

/// Load a calibrator, degrading to `Unavailable` on any error.
#[must_use]
pub fn load_calibrator(path: &Path) -> Calibrator {
    match load_calibration(path) {
        Ok(model) => Calibrator::Loaded(model),
        Err(e) => {
            tracing::error!(
                "[SigmoidCalibrator] Failed to load model from {:?}: {}. Scores will be uncalibrated.",
                path,
                e
            );
            Calibrator::Unavailable
        }
    }
}

/// Process-wide, load-once holder for the calibrator.
///
/// The first call to [`CalibrationSlot::get_or_load`] reads the artifact;
/// later calls return the same instance without touching the filesystem.
#[derive(Debug, Default)]
pub struct CalibrationSlot {
    cell: OnceLock<Arc<Calibrator>>,
}

impl CalibrationSlot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Return the calibrator, loading it from `path` on first use.
    pub fn get_or_load(&self, path: &Path) -> Arc<Calibrator> {
        if let Some(existing) = self.cell.get() {
            tracing::debug!("Calibration already initialized, ignoring {:?}", path);
            return Arc::clone(existing);
        }
        Arc::clone(self.cell.get_or_init(|| Arc::new(load_calibrator(path))))
    }

    /// The calibrator, if already initialized.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Calibrator>> {
        self.cell.get().cloned()
    }
}

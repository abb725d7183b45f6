//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the integration with files on disk:
//! - `csv_tables`: SHAP tables via the `csv` crate
//! - `calibration_file`: calibration artifact loading and load-once slot
//! - `measurements`: extractor output stored as JSON

pub mod calibration_file;
pub mod csv_tables;
pub mod measurements;

pub use calibration_file::{load_calibration, load_calibrator, CalibrationSlot};
pub use csv_tables::CsvShapTables;
pub use measurements::{load_measurements, MeasurementRecord};

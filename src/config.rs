//! Runtime configuration resolved from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `IMPLANTO_DATA_DIR` | `resources` |
//! | `IMPLANTO_CALIBRATION` | `<data dir>/sigmoid_global_v11.2.json` |
//! | `IMPLANTO_MODEL_A` | `Model-A.csv` (`;`-delimited) |
//! | `IMPLANTO_MODEL_B` | `Model-B.csv` (`;`-delimited) |
//! | `IMPLANTO_INTERACTIONS` | `interaction_intervals.csv` (`,`-delimited) |
//! | `IMPLANTO_STRICT_CALIBRATION` | off |

use std::path::PathBuf;

use crate::ports::ShapTableSpec;

const DATA_DIR_ENV: &str = "IMPLANTO_DATA_DIR";
const CALIBRATION_ENV: &str = "IMPLANTO_CALIBRATION";
const MODEL_A_ENV: &str = "IMPLANTO_MODEL_A";
const MODEL_B_ENV: &str = "IMPLANTO_MODEL_B";
const INTERACTIONS_ENV: &str = "IMPLANTO_INTERACTIONS";
const STRICT_CALIBRATION_ENV: &str = "IMPLANTO_STRICT_CALIBRATION";

const DEFAULT_DATA_DIR: &str = "resources";
const DEFAULT_CALIBRATION_FILE: &str = "sigmoid_global_v11.2.json";

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

/// Scoring configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Directory containing the SHAP tables
    pub data_dir: PathBuf,
    /// Calibration artifact path
    pub calibration_path: PathBuf,
    /// SHAP tables in merge order (later tables win on name collisions)
    pub tables: Vec<ShapTableSpec>,
    /// Fail at startup instead of scoring uncalibrated
    pub strict_calibration: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::with_data_dir(DEFAULT_DATA_DIR)
    }
}

impl ScoringConfig {
    /// Default layout rooted at `data_dir`.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            calibration_path: data_dir.join(DEFAULT_CALIBRATION_FILE),
            data_dir,
            tables: default_tables(),
            strict_calibration: false,
        }
    }

    /// Resolve configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup(DATA_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let mut config = Self::with_data_dir(data_dir);

        if let Some(path) = lookup(CALIBRATION_ENV).filter(|v| !v.trim().is_empty()) {
            config.calibration_path = PathBuf::from(path);
        }
        for (env, index) in [(MODEL_A_ENV, 0), (MODEL_B_ENV, 1), (INTERACTIONS_ENV, 2)] {
            if let Some(name) = lookup(env).filter(|v| !v.trim().is_empty()) {
                config.tables[index].name = name;
            }
        }
        config.strict_calibration = lookup(STRICT_CALIBRATION_ENV)
            .map(|v| parse_bool(&v))
            .unwrap_or(false);
        config
    }
}

/// Model A, Model B, then interaction table.
fn default_tables() -> Vec<ShapTableSpec> {
    vec![
        ShapTableSpec::new("Model-A.csv", b';'),
        ShapTableSpec::new("Model-B.csv", b';'),
        ShapTableSpec::new("interaction_intervals.csv", b','),
    ]
}

//! SHAP table port: Trait for locating and reading tabular SHAP sources.

use crate::domain::ShapTable;

/// Error type for SHAP table access.
#[derive(Debug, thiserror::Error)]
pub enum ShapError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Failed to parse {table}: {message}")]
    Parse { table: String, message: String },

    #[error("IO error reading {table}: {source}")]
    Io {
        table: String,
        #[source]
        source: std::io::Error,
    },
}

/// Identifies one SHAP table and how its fields are delimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapTableSpec {
    /// Resource name, e.g. `Model-A.csv`
    pub name: String,
    /// Field delimiter byte, e.g. `b';'`
    pub delimiter: u8,
}

impl ShapTableSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, delimiter: u8) -> Self {
        Self {
            name: name.into(),
            delimiter,
        }
    }
}

/// Trait for SHAP table sources.
///
/// Implementations read the whole table; rows are returned in file order with
/// the header as the first record.
pub trait ShapTableSource: Send + Sync {
    /// Load a table.
    ///
    /// # Errors
    /// Returns `ShapError::ResourceNotFound` if the table does not exist and
    /// `ShapError::Parse` if delimiter-based parsing fails.
    fn load(&self, spec: &ShapTableSpec) -> Result<ShapTable, ShapError>;
}

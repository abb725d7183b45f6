//! CSV adapter: Implementation of ShapTableSource over a directory of
//! delimiter-separated files.

use std::path::{Path, PathBuf};

use crate::domain::ShapTable;
use crate::ports::{ShapError, ShapTableSource, ShapTableSpec};

/// Reads SHAP tables from files in one directory.
#[derive(Debug, Clone)]
pub struct CsvShapTables {
    dir: PathBuf,
}

impl CsvShapTables {
    /// Create a source rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, spec: &ShapTableSpec) -> PathBuf {
        self.dir.join(&spec.name)
    }
}

impl ShapTableSource for CsvShapTables {
    fn load(&self, spec: &ShapTableSpec) -> Result<ShapTable, ShapError> {
        let path = self.path_for(spec);
        if !path.is_file() {
            return Err(ShapError::ResourceNotFound(path.display().to_string()));
        }

        let file = std::fs::File::open(&path).map_err(|source| ShapError::Io {
            table: spec.name.clone(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(spec.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| ShapError::Parse {
                table: spec.name.clone(),
                message: e.to_string(),
            })?;
            records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let table = ShapTable::from_records(spec.name.clone(), records);
        tracing::debug!(
            "Loaded SHAP table {} ({} columns, {} rows)",
            spec.name,
            table.columns.len(),
            table.rows.len()
        );
        Ok(table)
    }
}

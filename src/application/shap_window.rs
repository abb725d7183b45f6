//! SHAP window extraction: collapses every table row in the query's 8-hour
//! bucket into one value set.

use std::sync::Arc;

use crate::domain::{parse_cell, ObservationTime, ShapTable, ShapValueSet};
use crate::ports::{ShapError, ShapTableSource, ShapTableSpec};

/// Extracts SHAP value sets from an ordered list of tables.
///
/// Tables are merged in list order; on a name collision the later row (and
/// the later table) wins.
pub struct ShapWindowExtractor<S>
where
    S: ShapTableSource,
{
    source: Arc<S>,
    tables: Vec<ShapTableSpec>,
}

impl<S> ShapWindowExtractor<S>
where
    S: ShapTableSource,
{
    /// Create an extractor over `tables`, merged in the given order.
    pub fn new(source: Arc<S>, tables: Vec<ShapTableSpec>) -> Self {
        Self { source, tables }
    }

    #[must_use]
    pub fn tables(&self) -> &[ShapTableSpec] {
        &self.tables
    }

    /// Extract the SHAP values for the bucket containing `time`.
    ///
    /// Tables are re-read on every call. Unparseable time labels and cells
    /// are logged and skipped.
    ///
    /// # Errors
    /// Returns `ShapError` if any table cannot be loaded.
    pub fn extract(&self, time: ObservationTime) -> Result<ShapValueSet, ShapError> {
        let bucket = time.bucket();
        let mut values = ShapValueSet::new(bucket);

        for spec in &self.tables {
            let table = self.source.load(spec)?;
            let merged = merge_table(&table, &mut values, time);
            tracing::debug!("{}: merged {} value(s) for bucket {}", spec.name, merged, bucket);
        }

        tracing::debug!("Extracted {} SHAP value(s) for {}", values.len(), time);
        Ok(values)
    }
}

/// Upsert every parseable cell of the in-bucket rows; returns the count.
fn merge_table(table: &ShapTable, values: &mut ShapValueSet, time: ObservationTime) -> usize {
    let mut merged = 0;
    for row in table.rows_in(time.bucket()) {
        for (col, cell) in row.cells.iter().enumerate() {
            let Some(column) = table.columns.get(col) else {
                tracing::warn!(
                    "{}: row {:?} has more cells than header columns, ignoring {:?}",
                    table.name,
                    row.label,
                    cell
                );
                continue;
            };
            match parse_cell(cell) {
                Some(value) => {
                    values.upsert(column, value);
                    merged += 1;
                }
                None => tracing::warn!(
                    "{}: parsing error at {:?} (row {:?}, column {:?})",
                    table.name,
                    cell,
                    row.label,
                    column
                ),
            }
        }
    }
    merged
}

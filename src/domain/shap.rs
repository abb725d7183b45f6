//! SHAP tables and the per-bucket value set extracted from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::parameters::{normalize_name, Parameter};
use super::time::TimeBucket;

/// Marker separating the parameter and feature parts of an interaction key,
/// e.g. `"Area-Feature_4"`.
pub const INTERACTION_MARKER: &str = "-Feature_";

/// One data row of a SHAP table: a time-range label plus the raw cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapRow {
    /// Time-range label such as `"24-32"`.
    pub label: String,
    /// Cells after the label column, unparsed.
    pub cells: Vec<String>,
}

impl ShapRow {
    /// Start hour of this row, or `None` if the label does not parse.
    #[must_use]
    pub fn start_hour(&self) -> Option<i64> {
        parse_time_label(&self.label)
    }
}

/// A loaded SHAP table: header names plus data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapTable {
    /// Source name, used in log messages.
    pub name: String,
    /// Column names after the time-label column.
    pub columns: Vec<String>,
    pub rows: Vec<ShapRow>,
}

impl ShapTable {
    /// Build a table from raw records where the first record is the header.
    ///
    /// Every record's first field is the time label. Empty records are ignored.
    pub fn from_records<I>(name: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut iter = records.into_iter().filter(|r| !r.is_empty());
        let columns = iter
            .next()
            .map(|header| header.into_iter().skip(1).collect())
            .unwrap_or_default();
        let rows = iter
            .map(|mut record| {
                let label = record.remove(0);
                ShapRow {
                    label,
                    cells: record,
                }
            })
            .collect();
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Rows whose start hour falls in `bucket`.
    ///
    /// Rows with an unparseable time label are skipped and logged.
    pub fn rows_in(&self, bucket: TimeBucket) -> impl Iterator<Item = &ShapRow> + '_ {
        self.rows.iter().filter(move |row| match row.start_hour() {
            Some(h) => bucket.contains(h),
            None => {
                tracing::warn!("{}: cannot parse time label {:?}", self.name, row.label);
                false
            }
        })
    }
}

/// Start hour of a label such as `"24-32"`: the integer before the first `-`.
#[must_use]
pub fn parse_time_label(label: &str) -> Option<i64> {
    let head = label.split('-').next().unwrap_or(label);
    head.trim().parse().ok()
}

/// Parse a SHAP cell. `"label:value"` cells contribute only the segment
/// between the first and second `:`.
#[must_use]
pub fn parse_cell(cell: &str) -> Option<f64> {
    let value = if cell.contains(':') {
        cell.split(':').nth(1)?
    } else {
        cell
    };
    value.trim().parse().ok()
}

/// SHAP values for one time bucket, keyed by canonical name.
///
/// Interaction keys (`"<param>-Feature_<j>"`) are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapValueSet {
    pub bucket: Option<TimeBucket>,
    values: BTreeMap<String, f64>,
}

impl ShapValueSet {
    #[must_use]
    pub fn new(bucket: TimeBucket) -> Self {
        Self {
            bucket: Some(bucket),
            values: BTreeMap::new(),
        }
    }

    /// Insert or overwrite a value. The name is normalized first.
    pub fn upsert(&mut self, name: &str, value: f64) {
        self.values.insert(normalize_name(name), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// SHAP weight of a canonical parameter.
    #[must_use]
    pub fn weight(&self, parameter: Parameter) -> Option<f64> {
        self.get(parameter.canonical_name())
    }

    /// Weights in the given order; missing weights become 0.0 and are logged.
    #[must_use]
    pub fn project(&self, order: &[Parameter]) -> Vec<f64> {
        order
            .iter()
            .map(|p| {
                self.weight(*p).unwrap_or_else(|| {
                    tracing::warn!("No SHAP weight for {:?}, using 0", p.canonical_name());
                    0.0
                })
            })
            .collect()
    }

    /// Entries whose key is an interaction key.
    pub fn interaction_entries(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.iter().filter(|(k, _)| k.contains(INTERACTION_MARKER))
    }

    /// All entries, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_time_label() {
        assert_eq!(parse_time_label("24-32"), Some(24));
        assert_eq!(parse_time_label(" 8 - 16"), Some(8));
        assert_eq!(parse_time_label("40"), Some(40));
        assert_eq!(parse_time_label("time"), None);
        assert_eq!(parse_time_label("-8"), None);
        assert_eq!(parse_time_label(""), None);
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("0.25"), Some(0.25));
        assert_eq!(parse_cell(" -1.5 "), Some(-1.5));
        assert_eq!(parse_cell("shap: 0.75"), Some(0.75));
        assert_eq!(parse_cell("a:1:2"), Some(1.0));
        assert_eq!(parse_cell("a:"), None);
        assert_eq!(parse_cell("n/a"), None);
        assert_eq!(parse_cell(""), None);
    }

    #[test]
    fn test_table_from_records() {
        let table = ShapTable::from_records(
            "Model-A.csv",
            vec![
                record(&["Time", "Cell Radius", "Area"]),
                record(&["0-8", "0.1", "0.2"]),
                vec![],
                record(&["8-16", "0.3", "0.4"]),
            ],
        );
        assert_eq!(table.columns, vec!["Cell Radius", "Area"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].label, "8-16");
        assert_eq!(table.rows[1].cells, vec!["0.3", "0.4"]);
    }

    #[test]
    fn test_rows_in_bucket() {
        let table = ShapTable::from_records(
            "t",
            vec![
                record(&["Time", "a"]),
                record(&["16-24", "1"]),
                record(&["24-32", "2"]),
                record(&["bogus", "3"]),
                record(&["31-39", "4"]),
            ],
        );
        let labels: Vec<&str> = table
            .rows_in(TimeBucket::containing(30))
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(labels, vec!["24-32", "31-39"]);
    }

    #[test]
    fn test_value_set_normalizes_and_projects() {
        let mut set = ShapValueSet::new(TimeBucket::containing(0));
        set.upsert("Cell Radius", 0.5);
        set.upsert("Area", -0.2);
        set.upsert("Area-Feature_3", 0.9);
        assert_eq!(set.weight(Parameter::SpheroidRadius), Some(0.5));
        assert_eq!(set.get("Area-Feature_3"), Some(0.9));

        let projected = set.project(&crate::domain::SCORING_ORDER);
        assert_eq!(projected, vec![0.5, -0.2, 0.0, 0.0]);

        let interactions: Vec<_> = set.interaction_entries().collect();
        assert_eq!(interactions, vec![("Area-Feature_3", 0.9)]);
    }

    #[test]
    fn test_upsert_overwrites_synonym() {
        let mut set = ShapValueSet::default();
        set.upsert("radius", 1.0);
        set.upsert("Spheroid Radius", 2.0);
        assert_eq!(set.len(), 1);
        assert_eq!(set.weight(Parameter::SpheroidRadius), Some(2.0));
    }
}

//! Parameter × feature interaction matrix built from SHAP interaction keys.
//!
//! The matrix is assembled for every scoring request but the raw score does
//! not consume it; it is exposed so callers can inspect it.

use serde::{Deserialize, Serialize};

use super::parameters::Parameter;
use super::shap::{ShapValueSet, INTERACTION_MARKER};

/// Square, symmetric matrix of interaction SHAP values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionMatrix {
    size: usize,
    data: Vec<f64>,
}

impl InteractionMatrix {
    /// All-zero matrix of the given size.
    #[must_use]
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    /// Build from the interaction keys of a SHAP value set.
    ///
    /// For each `"<param>-Feature_<j>"` key with a known parameter row `i` and
    /// a 1-based feature index, writes `M[i][j-1] = M[j-1][i] = value`. Keys
    /// that do not fit the matrix are skipped.
    #[must_use]
    pub fn build(values: &ShapValueSet, feature_count: usize) -> Self {
        let mut matrix = Self::zeros(feature_count);
        for (key, value) in values.interaction_entries() {
            let Some((i, j)) = parse_interaction_key(key) else {
                tracing::debug!("Skipping interaction key {:?}", key);
                continue;
            };
            if i >= feature_count || j >= feature_count {
                tracing::debug!(
                    "Interaction key {:?} outside {}x{} matrix",
                    key,
                    feature_count,
                    feature_count
                );
                continue;
            }
            matrix.set_symmetric(i, j, value);
        }
        matrix
    }

    fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.size + j] = value;
        self.data[j * self.size + i] = value;
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Entry at `(i, j)`, or `None` out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.size && j < self.size {
            Some(self.data[i * self.size + j])
        } else {
            None
        }
    }

    /// Number of non-zero entries.
    #[must_use]
    pub fn non_zero(&self) -> usize {
        self.data.iter().filter(|v| **v != 0.0).count()
    }

    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| {
            (0..i).all(|j| {
                self.data[i * self.size + j].to_bits() == self.data[j * self.size + i].to_bits()
            })
        })
    }
}

/// Split an interaction key into (parameter row, 0-based feature index).
fn parse_interaction_key(key: &str) -> Option<(usize, usize)> {
    let mut parts = key.split(INTERACTION_MARKER);
    let param = parts.next()?;
    let feature = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let row = Parameter::from_name(param)?.interaction_index()?;
    let one_based: usize = feature.trim().parse().ok()?;
    let col = one_based.checked_sub(1)?;
    Some((row, col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeBucket;

    fn value_set(entries: &[(&str, f64)]) -> ShapValueSet {
        let mut set = ShapValueSet::new(TimeBucket::containing(0));
        for (k, v) in entries {
            set.upsert(k, *v);
        }
        set
    }

    #[test]
    fn test_parse_interaction_key() {
        assert_eq!(parse_interaction_key("Area-Feature_4"), Some((1, 3)));
        assert_eq!(parse_interaction_key("Cell Radius-Feature_1"), Some((0, 0)));
        assert_eq!(parse_interaction_key("circularity-Feature_2"), Some((4, 1)));
        assert_eq!(parse_interaction_key("Area-Feature_x"), None);
        assert_eq!(parse_interaction_key("Area-Feature_0"), None);
        assert_eq!(parse_interaction_key("Unknown-Feature_1"), None);
        assert_eq!(parse_interaction_key("Distribution of Migration-Feature_1"), None);
        assert_eq!(parse_interaction_key("Area-Feature_1-Feature_2"), None);
    }

    #[test]
    fn test_symmetric_writes() {
        let set = value_set(&[
            ("Area-Feature_4", 0.7),
            ("Migration Radius-Feature_1", -0.3),
            ("Cell Radius", 0.5),
        ]);
        let m = InteractionMatrix::build(&set, 6);
        assert_eq!(m.get(1, 3), Some(0.7));
        assert_eq!(m.get(3, 1), Some(0.7));
        assert_eq!(m.get(2, 0), Some(-0.3));
        assert_eq!(m.get(0, 2), Some(-0.3));
        assert_eq!(m.non_zero(), 4);
        assert!(m.is_symmetric());
    }

    #[test]
    fn test_out_of_range_keys_skipped() {
        let set = value_set(&[("Area-Feature_9", 1.0), ("circularity-Feature_1", 2.0)]);
        let m = InteractionMatrix::build(&set, 3);
        assert_eq!(m.non_zero(), 0);
        assert!(m.is_symmetric());
    }

    #[test]
    fn test_single_feature_matrix() {
        let set = value_set(&[("radius-Feature_1", 0.4)]);
        let m = InteractionMatrix::build(&set, 1);
        assert_eq!(m.size(), 1);
        assert_eq!(m.get(0, 0), Some(0.4));
        assert_eq!(m.get(1, 0), None);
    }

    #[test]
    fn test_empty_defaults_to_zero() {
        let m = InteractionMatrix::build(&ShapValueSet::default(), 4);
        assert_eq!(m.non_zero(), 0);
        assert_eq!(m.get(3, 3), Some(0.0));
    }
}

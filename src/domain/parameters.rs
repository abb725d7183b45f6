//! Morphological parameter vocabulary and measured values.
//!
//! Parameter names reach the scoring core from three places (SHAP table
//! headers, the parameter extractor, interaction keys) and each spells them
//! differently. Everything is funnelled through [`normalize_name`] so that
//! lookups happen against one canonical vocabulary.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Threshold below which a measured distribution of migration is treated as
/// "no invasion" by the parameter extractor.
pub const NO_INVASION_DISTRIBUTION: f64 = -0.01;

/// Canonical morphological parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parameter {
    SpheroidRadius,
    TotalArea,
    MigrationRadius,
    MigrationDistribution,
    ProjectionCount,
    Circularity,
}

/// Parameters that enter the raw score, in scoring order.
///
/// SHAP weights and measured values are projected onto this list before being
/// paired positionally, so the pairing never depends on map iteration order.
pub const SCORING_ORDER: [Parameter; 4] = [
    Parameter::SpheroidRadius,
    Parameter::TotalArea,
    Parameter::MigrationRadius,
    Parameter::ProjectionCount,
];

/// Synonyms accepted for each parameter (lowercase, single-spaced).
const SYNONYMS: &[(&str, Parameter)] = &[
    ("spheroid radius", Parameter::SpheroidRadius),
    ("cell radius", Parameter::SpheroidRadius),
    ("radius", Parameter::SpheroidRadius),
    ("spheroid size", Parameter::SpheroidRadius),
    ("total spheroid and cell projections area", Parameter::TotalArea),
    ("area", Parameter::TotalArea),
    ("spheroid area", Parameter::TotalArea),
    ("cell area", Parameter::TotalArea),
    ("the migration/invasion radius", Parameter::MigrationRadius),
    ("migration/invasion radius", Parameter::MigrationRadius),
    ("migration radius", Parameter::MigrationRadius),
    ("invasion radius", Parameter::MigrationRadius),
    ("the distribution of migration/invasion", Parameter::MigrationDistribution),
    ("distribution of migration/invasion", Parameter::MigrationDistribution),
    ("distribution of migration", Parameter::MigrationDistribution),
    ("distribution of invasion", Parameter::MigrationDistribution),
    ("the number of cell projections", Parameter::ProjectionCount),
    ("number of cell projections", Parameter::ProjectionCount),
    ("number of projections", Parameter::ProjectionCount),
    ("projection count", Parameter::ProjectionCount),
    ("cell projections", Parameter::ProjectionCount),
    ("circularity", Parameter::Circularity),
];

impl Parameter {
    /// All parameters in extractor output order.
    pub const ALL: [Parameter; 6] = [
        Parameter::SpheroidRadius,
        Parameter::TotalArea,
        Parameter::MigrationRadius,
        Parameter::MigrationDistribution,
        Parameter::ProjectionCount,
        Parameter::Circularity,
    ];

    /// Canonical vocabulary entry.
    #[must_use]
    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::SpheroidRadius => "spheroid radius",
            Self::TotalArea => "total spheroid and cell projections area",
            Self::MigrationRadius => "the migration/invasion radius",
            Self::MigrationDistribution => "the distribution of migration/invasion",
            Self::ProjectionCount => "the number of cell projections",
            Self::Circularity => "circularity",
        }
    }

    /// Recognize a free-text name (case-insensitive, whitespace tolerant).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let key = fold(name);
        SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == key)
            .map(|(_, p)| *p)
    }

    /// Row of this parameter in the interaction matrix.
    ///
    /// The distribution of migration has no interaction row.
    #[must_use]
    pub fn interaction_index(self) -> Option<usize> {
        match self {
            Self::SpheroidRadius => Some(0),
            Self::TotalArea => Some(1),
            Self::MigrationRadius => Some(2),
            Self::ProjectionCount => Some(3),
            Self::Circularity => Some(4),
            Self::MigrationDistribution => None,
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical_name())
    }
}

fn separator_pattern() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[\s_]+").expect("Valid regex"))
}

/// Lowercase, trim, and collapse underscores and whitespace runs to one space.
fn fold(name: &str) -> String {
    separator_pattern()
        .replace_all(name.trim(), " ")
        .to_lowercase()
}

/// Map a name variant to its canonical vocabulary entry.
///
/// Best effort: unrecognized input is returned unchanged.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    match Parameter::from_name(name) {
        Some(p) => p.canonical_name().to_string(),
        None => name.to_string(),
    }
}

/// A measured parameter required for scoring was not provided.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing measured parameter: {0}")]
pub struct MissingParameter(pub Parameter);

/// Measured morphological parameters keyed by canonical parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasuredParameters {
    values: BTreeMap<Parameter, f64>,
}

impl MeasuredParameters {
    /// Build from extractor output, normalizing names.
    ///
    /// Names that match no parameter are dropped with a debug log. Applies the
    /// extractor's no-invasion rule (see [`Self::suppress_spurious_invasion`]).
    pub fn from_named<'a, I>(named: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut values = BTreeMap::new();
        for (name, value) in named {
            match Parameter::from_name(name) {
                Some(p) => {
                    values.insert(p, value);
                }
                None => tracing::debug!("Ignoring unrecognized parameter {:?}", name),
            }
        }
        let mut params = Self { values };
        params.suppress_spurious_invasion();
        params
    }

    #[must_use]
    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        self.values.get(&parameter).copied()
    }

    pub fn set(&mut self, parameter: Parameter, value: f64) {
        self.values.insert(parameter, value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Zero the invasion-related parameters when the distribution of migration
    /// is negative beyond tolerance. Idempotent.
    pub fn suppress_spurious_invasion(&mut self) {
        let spurious = self
            .get(Parameter::MigrationDistribution)
            .is_some_and(|d| d < NO_INVASION_DISTRIBUTION);
        if spurious {
            tracing::debug!("Distribution of migration below threshold, zeroing invasion parameters");
            for p in [
                Parameter::MigrationRadius,
                Parameter::MigrationDistribution,
                Parameter::ProjectionCount,
            ] {
                self.values.insert(p, 0.0);
            }
        }
    }

    /// Values in the given order.
    ///
    /// # Errors
    /// Returns the first parameter that has no measured value.
    pub fn project(&self, order: &[Parameter]) -> Result<Vec<f64>, MissingParameter> {
        order
            .iter()
            .map(|p| self.get(*p).ok_or(MissingParameter(*p)))
            .collect()
    }
}

/// Learned embedding values from the feature extractor, keyed by feature name.
///
/// Only the cardinality is consumed by scoring (it sizes the interaction matrix).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
}

impl FeatureVector {
    #[must_use]
    pub fn new(values: BTreeMap<String, f64>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Interaction matrix size: feature count, at least 1.
    #[must_use]
    pub fn matrix_size(&self) -> usize {
        self.values.len().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonyms_normalize() {
        assert_eq!(normalize_name("Cell Radius"), "spheroid radius");
        assert_eq!(normalize_name("  SPHEROID SIZE "), "spheroid radius");
        assert_eq!(normalize_name("Area"), "total spheroid and cell projections area");
        assert_eq!(normalize_name("Migration Radius"), "the migration/invasion radius");
        assert_eq!(
            normalize_name("Distribution of Migration"),
            "the distribution of migration/invasion"
        );
        assert_eq!(normalize_name("Number of Projections"), "the number of cell projections");
        assert_eq!(normalize_name("projection_count"), "the number of cell projections");
        assert_eq!(normalize_name("Circularity"), "circularity");
    }

    #[test]
    fn test_canonical_names_are_fixed_points() {
        for p in Parameter::ALL {
            assert_eq!(normalize_name(p.canonical_name()), p.canonical_name());
            assert_eq!(Parameter::from_name(p.canonical_name()), Some(p));
        }
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(normalize_name("Feature_12"), "Feature_12");
        assert_eq!(normalize_name("Area-Feature_4"), "Area-Feature_4");
    }

    #[test]
    fn test_interaction_indices() {
        assert_eq!(Parameter::SpheroidRadius.interaction_index(), Some(0));
        assert_eq!(Parameter::Circularity.interaction_index(), Some(4));
        assert_eq!(Parameter::MigrationDistribution.interaction_index(), None);
    }

    #[test]
    fn test_projection_uses_scoring_order() {
        let params = MeasuredParameters::from_named([
            ("the number of cell projections", 4.0),
            ("Cell Radius", 1.0),
            ("migration radius", 3.0),
            ("Area", 2.0),
            ("circularity", 0.9),
        ]);
        let v = params.project(&SCORING_ORDER).expect("Should project");
        assert_eq!(v, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_projection_reports_missing() {
        let params = MeasuredParameters::from_named([("radius", 1.0)]);
        assert_eq!(
            params.project(&SCORING_ORDER),
            Err(MissingParameter(Parameter::TotalArea))
        );
    }

    #[test]
    fn test_spurious_invasion_zeroed() {
        let params = MeasuredParameters::from_named([
            ("spheroid radius", 10.0),
            ("the migration/invasion radius", 5.0),
            ("the distribution of migration/invasion", -0.5),
            ("the number of cell projections", 7.0),
        ]);
        assert_eq!(params.get(Parameter::SpheroidRadius), Some(10.0));
        assert_eq!(params.get(Parameter::MigrationRadius), Some(0.0));
        assert_eq!(params.get(Parameter::MigrationDistribution), Some(0.0));
        assert_eq!(params.get(Parameter::ProjectionCount), Some(0.0));
    }

    #[test]
    fn test_small_negative_distribution_kept() {
        let params = MeasuredParameters::from_named([
            ("the migration/invasion radius", 5.0),
            ("the distribution of migration/invasion", -0.005),
        ]);
        assert_eq!(params.get(Parameter::MigrationRadius), Some(5.0));
    }

    #[test]
    fn test_feature_matrix_size_floor() {
        assert_eq!(FeatureVector::default().matrix_size(), 1);
        let mut values = BTreeMap::new();
        values.insert("Feature_1".to_string(), 0.2);
        values.insert("Feature_2".to_string(), 0.4);
        assert_eq!(FeatureVector::new(values).matrix_size(), 2);
    }
}

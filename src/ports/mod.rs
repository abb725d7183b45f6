//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the scoring core and the systems that feed it (SHAP tables,
//! parameter and feature extractors).

mod providers;
mod shap_source;

pub use providers::{FeatureProvider, ParameterProvider, ProviderError};
pub use shap_source::{ShapError, ShapTableSource, ShapTableSpec};

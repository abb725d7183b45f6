//! Measurement ports: parameter and feature extractors.
//!
//! Both extractors run upstream of scoring (image segmentation and learned
//! models) and are treated as black boxes that produce named values.

use std::collections::BTreeMap;

/// Error type for measurement providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Measurement unavailable: {0}")]
    Unavailable(String),
}

/// Source of measured morphological parameters.
pub trait ParameterProvider {
    /// Measured values keyed by parameter name (any recognized synonym).
    ///
    /// # Errors
    /// Returns `ProviderError::Unavailable` if the measurement cannot be produced.
    fn parameters(&self) -> Result<BTreeMap<String, f64>, ProviderError>;
}

/// Source of the learned feature embedding.
pub trait FeatureProvider {
    /// Feature values keyed by feature name (e.g. `Feature_1`).
    ///
    /// # Errors
    /// Returns `ProviderError::Unavailable` if extraction fails.
    fn features(&self) -> Result<BTreeMap<String, f64>, ProviderError>;
}

impl<T: ParameterProvider + ?Sized> ParameterProvider for &T {
    fn parameters(&self) -> Result<BTreeMap<String, f64>, ProviderError> {
        (**self).parameters()
    }
}

impl<T: FeatureProvider + ?Sized> FeatureProvider for &T {
    fn features(&self) -> Result<BTreeMap<String, f64>, ProviderError> {
        (**self).features()
    }
}

//! Scoring service: Orchestrates the Invasion Factor pipeline.
//!
//! This service coordinates:
//! - Measured parameter and feature retrieval
//! - SHAP window extraction
//! - Interaction matrix construction
//! - Raw scoring and trend classification
//! - Sigmoid calibration

use std::sync::Arc;

use crate::application::ShapWindowExtractor;
use crate::domain::{
    raw_score, CalibrationGroup, Calibrator, FeatureVector, InteractionMatrix, InvasionReport,
    MeasuredParameters, ObservationTime, ScoreHistory, ShapValueSet, SCORING_ORDER,
};
use crate::ports::{FeatureProvider, ParameterProvider, ShapTableSource};
use crate::ImplantoError;

/// Score history for a sequence of scoring calls.
///
/// Reuse one session across calls to let the trend classifier see earlier
/// scores; a fresh session always classifies as group A. Not synchronized:
/// callers sharing a session must serialize access.
#[derive(Debug, Clone, Default)]
pub struct ScoringSession {
    history: ScoreHistory,
}

impl ScoringSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw scores recorded so far.
    #[must_use]
    pub fn history(&self) -> &[f64] {
        self.history.as_slice()
    }

    /// Record a raw score and return the resulting group.
    pub fn record(&mut self, raw: f64) -> CalibrationGroup {
        self.history.push(raw);
        self.history.group()
    }
}

/// Intermediate values of one scoring run.
#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    pub shap: ShapValueSet,
    pub interactions: InteractionMatrix,
    pub weights: Vec<f64>,
    pub measured: Vec<f64>,
    pub report: InvasionReport,
}

/// Service computing calibrated Invasion Factors.
///
/// The calibrator is loaded once by the caller and shared read-only.
pub struct InvasionFactorService<S>
where
    S: ShapTableSource,
{
    shap: ShapWindowExtractor<S>,
    calibrator: Arc<Calibrator>,
}

impl<S> InvasionFactorService<S>
where
    S: ShapTableSource,
{
    /// Create a new scoring service.
    pub fn new(shap: ShapWindowExtractor<S>, calibrator: Arc<Calibrator>) -> Self {
        Self { shap, calibrator }
    }

    #[must_use]
    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// SHAP values for the bucket containing `time`.
    ///
    /// # Errors
    /// Returns error if a SHAP table cannot be loaded.
    pub fn extract_shap(&self, time: ObservationTime) -> Result<ShapValueSet, ImplantoError> {
        Ok(self.shap.extract(time)?)
    }

    /// Score one observation in a fresh session.
    ///
    /// `time_h` is validated before any other work. With a fresh session the
    /// calibration group is always A.
    ///
    /// # Errors
    /// Returns `ImplantoError::InvalidTime` for hours outside `[0, 143]`, or
    /// any pipeline error from [`Self::score`].
    pub fn compute_invasion_factor<P, F>(
        &self,
        time_h: i64,
        parameters: &P,
        features: &F,
    ) -> Result<InvasionReport, ImplantoError>
    where
        P: ParameterProvider + ?Sized,
        F: FeatureProvider + ?Sized,
    {
        let time = ObservationTime::new(time_h)?;
        let mut session = ScoringSession::new();
        self.score(&mut session, time, parameters, features)
    }

    /// Score one observation, recording the raw score in `session`.
    ///
    /// # Errors
    /// Returns error if parameters are unavailable or incomplete, or a SHAP
    /// table cannot be loaded. Feature extraction failure is not fatal.
    pub fn score<P, F>(
        &self,
        session: &mut ScoringSession,
        time: ObservationTime,
        parameters: &P,
        features: &F,
    ) -> Result<InvasionReport, ImplantoError>
    where
        P: ParameterProvider + ?Sized,
        F: FeatureProvider + ?Sized,
    {
        Ok(self.score_detailed(session, time, parameters, features)?.report)
    }

    /// Like [`Self::score`], also returning intermediate values.
    ///
    /// # Errors
    /// See [`Self::score`].
    pub fn score_detailed<P, F>(
        &self,
        session: &mut ScoringSession,
        time: ObservationTime,
        parameters: &P,
        features: &F,
    ) -> Result<ScoreBreakdown, ImplantoError>
    where
        P: ParameterProvider + ?Sized,
        F: FeatureProvider + ?Sized,
    {
        tracing::info!("Scoring invasion factor at {}...", time);

        // Step 1: Measured parameters
        let named = parameters.parameters()?;
        let params = MeasuredParameters::from_named(named.iter().map(|(k, v)| (k.as_str(), *v)));
        let measured = params.project(&SCORING_ORDER)?;
        tracing::debug!("Step 1: measured parameters {:?}", measured);

        // Step 2: Features (only the count is used)
        let features = match features.features() {
            Ok(values) => FeatureVector::new(values),
            Err(e) => {
                tracing::warn!("Feature extraction failed: {}", e);
                FeatureVector::default()
            }
        };

        // Step 3: SHAP window
        let shap = self.shap.extract(time)?;
        let weights = shap.project(&SCORING_ORDER);
        tracing::debug!("Step 3: SHAP weights {:?}", weights);

        // Step 4: Interaction matrix
        let interactions = InteractionMatrix::build(&shap, features.matrix_size());
        tracing::debug!(
            "Step 4: interaction matrix {}x{} with {} non-zero entries",
            interactions.size(),
            interactions.size(),
            interactions.non_zero()
        );

        // Step 5: Raw score and group
        let raw = raw_score(&weights, &measured)?;
        let group = session.record(raw);

        // Step 6: Calibration
        let calibrated = self.calibrator.try_apply(raw, time, group);
        if calibrated.is_none() {
            tracing::debug!("Calibration not applied, returning raw score");
        }

        let report = InvasionReport::new(time, raw, group, calibrated, features.len());
        tracing::info!(
            "Scoring complete: time={}, raw={:.4}, group={}, invasion_factor={:.4}",
            report.time_h,
            report.raw_score,
            report.group,
            report.invasion_factor
        );

        Ok(ScoreBreakdown {
            shap,
            interactions,
            weights,
            measured,
            report,
        })
    }
}

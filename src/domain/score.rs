//! Raw Invasion Factor from SHAP-weighted morphological parameters.
//!
//! Each parameter gets an amplitude `w * (|s| / max|s|)^2` from its SHAP
//! weight `s`; the raw score is the signed, amplitude-weighted sum of the
//! measured values divided by the Euclidean norm of values and amplitudes:
//!
//! ```text
//! raw = Σ sign(s_i)·amp_i·x_i / sqrt(max(Σ x_i² + amp_i², 1e-9))
//! ```
//!
//! The result is unitless and unbounded; calibration maps it to a usable range.

/// Weight applied to every normalized SHAP amplitude.
pub const AMPLITUDE_WEIGHT: f64 = 2.0;

/// Floor for the SHAP normalizer and for each normalized weight.
pub const SHAP_FLOOR: f64 = 1e-3;

/// Floor for the squared norm in the denominator.
pub const DENOMINATOR_FLOOR: f64 = 1e-9;

/// Error type for raw scoring.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("SHAP weights ({weights}) and measured parameters ({measured}) differ in length")]
    LengthMismatch { weights: usize, measured: usize },
}

/// Compute the raw score from positionally aligned SHAP weights and measured values.
///
/// `shap_values[i]` weights `measured[i]`. Callers align both slices by
/// projecting onto [`crate::domain::SCORING_ORDER`].
///
/// # Errors
/// Returns `ScoreError::LengthMismatch` if the slices differ in length.
pub fn raw_score(shap_values: &[f64], measured: &[f64]) -> Result<f64, ScoreError> {
    if shap_values.len() != measured.len() {
        return Err(ScoreError::LengthMismatch {
            weights: shap_values.len(),
            measured: measured.len(),
        });
    }

    let max_shap = shap_values
        .iter()
        .map(|s| s.abs())
        .reduce(f64::max)
        .unwrap_or(1.0)
        .max(SHAP_FLOOR);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (&s, &x) in shap_values.iter().zip(measured) {
        let norm = (s.abs() / max_shap).max(SHAP_FLOOR);
        let amp = AMPLITUDE_WEIGHT * norm.powi(2);
        let sign = if s >= 0.0 { 1.0 } else { -1.0 };
        numerator += sign * amp * x;
        denominator += x.powi(2) + amp.powi(2);
    }

    Ok(numerator / denominator.max(DENOMINATOR_FLOOR).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_opposite_weights_cancel() {
        let score = raw_score(&[1.0, -1.0], &[10.0, 10.0]).expect("Should score");
        assert!(score.abs() < TOL);
    }

    #[test]
    fn test_all_zero_weights_finite() {
        let score = raw_score(&[0.0, 0.0, 0.0, 0.0], &[1.0, 2.0, 3.0, 4.0]).expect("Should score");
        assert!(score.is_finite());
        assert!(score > 0.0);
    }

    #[test]
    fn test_all_zero_inputs_finite() {
        let score = raw_score(&[0.0; 4], &[0.0; 4]).expect("Should score");
        assert!(score.is_finite());
        assert!(score.abs() < TOL);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(raw_score(&[], &[]), Ok(0.0));
    }

    #[test]
    fn test_single_parameter_closed_form() {
        // max = 0.5, norm = 1, amp = 2 => 2*3 / sqrt(9 + 4)
        let score = raw_score(&[0.5], &[3.0]).expect("Should score");
        assert!((score - 6.0 / 13.0_f64.sqrt()).abs() < TOL);
    }

    #[test]
    fn test_negative_weight_flips_sign() {
        let pos = raw_score(&[0.5, 0.25], &[3.0, 1.0]).expect("Should score");
        let neg = raw_score(&[-0.5, -0.25], &[3.0, 1.0]).expect("Should score");
        assert!((pos + neg).abs() < TOL);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            raw_score(&[1.0], &[1.0, 2.0]),
            Err(ScoreError::LengthMismatch {
                weights: 1,
                measured: 2
            })
        );
    }

    #[test]
    fn test_deterministic() {
        let a = raw_score(&[0.3, -0.1, 0.7, 0.05], &[120.0, 5400.0, 80.0, 12.0]).expect("score");
        let b = raw_score(&[0.3, -0.1, 0.7, 0.05], &[120.0, 5400.0, 80.0, 12.0]).expect("score");
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

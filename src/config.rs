//! Solver parameters.

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

/// Default discount factor.
pub const DEFAULT_DISCOUNT: f64 = 0.97;

/// Default convergence threshold.
pub const DEFAULT_THRESHOLD: f64 = 1e-6;

/// Default safety cap on sweeps (and policy-iteration rounds).
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

/// Parameters shared by both solvers.
///
/// Fields missing from a serialized config fall back to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Discount factor γ, in (0, 1).
    pub discount: f64,
    /// Convergence threshold θ on the per-sweep value change, > 0.
    pub threshold: f64,
    /// Maximum sweeps before a solve reports divergence.
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            discount: DEFAULT_DISCOUNT,
            threshold: DEFAULT_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Set the discount factor.
    #[must_use]
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    /// Set the convergence threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Validate parameters.
    ///
    /// Both solvers call this before touching the model.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] if `discount` is not in (0, 1), if
    /// `threshold` is not a positive finite number, or if the cap is zero.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !(self.discount > 0.0 && self.discount < 1.0) {
            return Err(ParameterError::Discount {
                value: self.discount,
            });
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(ParameterError::Threshold {
                value: self.threshold,
            });
        }
        if self.max_iterations == 0 {
            return Err(ParameterError::MaxIterations);
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns `ParameterError::Config` for malformed JSON, or the
    /// validation error for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ParameterError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ParameterError::Config {
            reason: format!("failed to parse solver config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let c = SolverConfig::default();
        c.validate().unwrap();
        assert_eq!(c.discount, 0.97);
        assert_eq!(c.threshold, 1e-6);
    }

    #[test]
    fn rejects_out_of_range_discount() {
        for d in [0.0, 1.0, 1.5, -0.1, f64::NAN] {
            let err = SolverConfig::default().with_discount(d).validate().unwrap_err();
            assert!(matches!(err, ParameterError::Discount { .. }), "discount {d}");
        }
    }

    #[test]
    fn rejects_non_positive_threshold() {
        for t in [0.0, -1e-6, f64::INFINITY, f64::NAN] {
            let err = SolverConfig::default().with_threshold(t).validate().unwrap_err();
            assert!(matches!(err, ParameterError::Threshold { .. }), "threshold {t}");
        }
    }

    #[test]
    fn rejects_zero_cap() {
        let err = SolverConfig::default()
            .with_max_iterations(0)
            .validate()
            .unwrap_err();
        assert_eq!(err, ParameterError::MaxIterations);
    }

    #[test]
    fn from_json_fills_defaults() {
        let c = SolverConfig::from_json(r#"{"discount": 0.9}"#).unwrap();
        assert_eq!(c.discount, 0.9);
        assert_eq!(c.threshold, DEFAULT_THRESHOLD);
        assert_eq!(c.max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn from_json_rejects_garbage_and_bad_values() {
        assert!(matches!(
            SolverConfig::from_json("{not json").unwrap_err(),
            ParameterError::Config { .. }
        ));
        assert!(matches!(
            SolverConfig::from_json(r#"{"discount": 1.0}"#).unwrap_err(),
            ParameterError::Discount { .. }
        ));
    }
}

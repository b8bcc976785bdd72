//! Error types for linkmdp.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific failure. A solve either returns a complete solution or one
//! of these errors; there are no partial results.

use std::path::PathBuf;

use thiserror::Error;

/// Structural problems with an MDP, detected while constructing it.
///
/// States and actions are reported through their `Debug` rendering so the
/// error type does not depend on the identifier types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("MDP has no states")]
    EmptyStateSet,

    #[error("State {state} is listed more than once")]
    DuplicateState {
        state: String,
    },

    #[error("Unknown state {state} referenced by {context}")]
    UnknownState {
        state: String,
        context: String,
    },

    #[error("State {state} has no actions and no terminal reward")]
    NoActions {
        state: String,
    },

    #[error("Terminal state {state} must have exactly the no-op action")]
    TerminalWithChoices {
        state: String,
    },

    #[error("Action {action} is listed more than once for state {state}")]
    DuplicateAction {
        state: String,
        action: String,
    },

    #[error("No transition distribution for state {state}, action {action}")]
    MissingTransition {
        state: String,
        action: String,
    },

    #[error("Transition given for state {state}, action {action} that is not in its action list")]
    UnlistedAction {
        state: String,
        action: String,
    },

    #[error("Probability {probability} for state {state}, action {action} is outside [0.0, 1.0]")]
    InvalidProbability {
        state: String,
        action: String,
        probability: f64,
    },

    #[error("Probabilities for state {state}, action {action} sum to {sum}, expected 1.0")]
    ProbabilitySum {
        state: String,
        action: String,
        sum: f64,
    },

    #[error("No rewards for state {state}, action {action}")]
    MissingRewards {
        state: String,
        action: String,
    },

    #[error("Rewards for state {state}, action {action} do not cover the same successors as the transitions")]
    RewardKeyMismatch {
        state: String,
        action: String,
    },

    #[error("Reward {reward} for state {state} is not finite")]
    NonFiniteReward {
        state: String,
        reward: f64,
    },
}

/// Invalid scalar solver parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("Discount factor {value} must be in (0.0, 1.0)")]
    Discount {
        value: f64,
    },

    #[error("Convergence threshold {value} must be finite and > 0.0")]
    Threshold {
        value: f64,
    },

    #[error("Iteration cap must be > 0")]
    MaxIterations,

    #[error("Invalid configuration: {reason}")]
    Config {
        reason: String,
    },
}

/// Top-level error type for a solve.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("Malformed model: {0}")]
    Malformed(#[from] ModelError),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("{algorithm} did not converge within {iterations} iterations (last delta {delta})")]
    Divergence {
        algorithm: &'static str,
        iterations: usize,
        delta: f64,
    },
}

impl SolveError {
    /// Returns true if the model failed validation.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// Returns true if a solver parameter was rejected.
    #[must_use]
    pub const fn is_parameter(&self) -> bool {
        matches!(self, Self::Parameter(_))
    }

    /// Returns true if the iteration cap was hit before convergence.
    #[must_use]
    pub const fn is_divergence(&self) -> bool {
        matches!(self, Self::Divergence { .. })
    }
}

/// Errors raised while reading a page corpus from disk.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Page {page} has an unparsable reward marker '{raw}'")]
    InvalidReward {
        page: String,
        raw: String,
    },

    #[error("Invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type alias for solver operations.
pub type SolveResult<T> = Result<T, SolveError>;

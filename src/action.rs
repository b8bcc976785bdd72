//! Actions available in a state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An action a policy can take in a state.
///
/// Terminal states and dead ends have no decision to make; they carry the
/// single `NoOp` action whose outcome is a self-loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action<A> {
    /// A caller-defined action, e.g. following a link.
    Choice(A),

    /// No decision here.
    NoOp,
}

impl<A> Action<A> {
    /// Returns true for the no-op sentinel.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// Returns the chosen action, if any.
    #[must_use]
    pub fn choice(&self) -> Option<&A> {
        match self {
            Self::Choice(a) => Some(a),
            Self::NoOp => None,
        }
    }
}

impl<A> From<A> for Action<A> {
    fn from(a: A) -> Self {
        Self::Choice(a)
    }
}

impl<A: fmt::Display> fmt::Display for Action<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choice(a) => write!(f, "{a}"),
            Self::NoOp => write!(f, "no-op"),
        }
    }
}

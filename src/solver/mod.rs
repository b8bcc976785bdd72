//! MDP solvers.
//!
//! Two engines compute the same object: the optimal value function and a
//! greedy policy. Value iteration is the default; policy iteration takes
//! fewer rounds but evaluates each policy to convergence.

mod policy_iteration;
mod value_iteration;

pub use policy_iteration::policy_iteration;
pub use value_iteration::value_iteration;

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::config::SolverConfig;
use crate::error::SolveResult;
use crate::model::Mdp;

/// Which engine to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Synchronous Bellman-optimality sweeps.
    #[default]
    ValueIteration,

    /// Alternating policy evaluation and greedy improvement.
    PolicyIteration,
}

impl Algorithm {
    /// Returns a short stable identifier suitable for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ValueIteration => "value_iteration",
            Self::PolicyIteration => "policy_iteration",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Work done by a solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Sweeps for value iteration, improvement rounds for policy iteration.
    pub iterations: usize,
    /// Total value sweeps over the state set.
    pub sweeps: usize,
    /// Largest value change in the final sweep.
    pub final_delta: f64,
}

/// Value function and policy returned by a solver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution<S: Eq + Hash, A> {
    /// Expected discounted return per state.
    pub values: HashMap<S, f64>,
    /// Chosen action per state; `NoOp` for terminals and dead ends.
    pub policy: HashMap<S, Action<A>>,
    /// Engine that produced this solution.
    pub algorithm: Algorithm,
    /// Iteration counts.
    pub stats: SolveStats,
}

impl<S, A> Solution<S, A>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    pub(crate) fn from_parts(
        mdp: &Mdp<S, A>,
        values: &[f64],
        policy: &[usize],
        algorithm: Algorithm,
        stats: SolveStats,
    ) -> Self {
        let mut value_map = HashMap::with_capacity(mdp.len());
        let mut policy_map = HashMap::with_capacity(mdp.len());
        for (i, s) in mdp.states().iter().enumerate() {
            value_map.insert(s.clone(), values[i]);
            policy_map.insert(s.clone(), mdp.model(i).actions[policy[i]].action.clone());
        }
        Self {
            values: value_map,
            policy: policy_map,
            algorithm,
            stats,
        }
    }

    /// Returns `V(state)`.
    #[must_use]
    pub fn value(&self, state: &S) -> Option<f64> {
        self.values.get(state).copied()
    }

    /// Returns `π(state)`.
    #[must_use]
    pub fn action(&self, state: &S) -> Option<&Action<A>> {
        self.policy.get(state)
    }
}

/// Solve `mdp` with the chosen engine.
///
/// # Errors
///
/// See [`value_iteration`] and [`policy_iteration`].
pub fn solve<S, A>(
    mdp: &Mdp<S, A>,
    algorithm: Algorithm,
    config: &SolverConfig,
) -> SolveResult<Solution<S, A>>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    match algorithm {
        Algorithm::ValueIteration => value_iteration(mdp, config),
        Algorithm::PolicyIteration => policy_iteration(mdp, config),
    }
}

//! Bellman backup shared by both solvers.
//!
//! `Q(s, a) = Σ P(s, a, s') · (R(s, a, s') + γ · V(s'))` is computed here and
//! nowhere else.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::action::Action;
use crate::model::{ActionModel, Mdp, Outcome};

/// Expected backed-up value of one action, with `values` indexed by state position.
#[must_use]
pub fn expected_value(outcomes: &[Outcome], values: &[f64], discount: f64) -> f64 {
    outcomes
        .iter()
        .map(|o| o.probability * (o.reward + discount * values[o.successor]))
        .sum()
}

/// Best action by expected value.
///
/// Returns the position of the winning action and its value. Ties go to the
/// earliest action in `actions`. `actions` must be non-empty; a validated
/// [`Mdp`] guarantees that.
#[must_use]
pub fn greedy<A>(actions: &[ActionModel<A>], values: &[f64], discount: f64) -> (usize, f64) {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, m) in actions.iter().enumerate() {
        let q = expected_value(&m.outcomes, values, discount);
        if q > best_value {
            best = i;
            best_value = q;
        }
    }
    (best, best_value)
}

/// Largest absolute per-state change between two value vectors.
#[must_use]
pub fn max_delta(old: &[f64], new: &[f64]) -> f64 {
    old.iter()
        .zip(new)
        .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()))
}

/// `Q(state, action)` against a keyed value function, e.g. a solver's output.
///
/// Returns `None` if the state or action is not part of the model, or if
/// `values` lacks a successor.
#[must_use]
pub fn action_value<S, A>(
    mdp: &Mdp<S, A>,
    state: &S,
    action: &Action<A>,
    values: &HashMap<S, f64>,
    discount: f64,
) -> Option<f64>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    let model = mdp.action_model(mdp.index_of(state)?, action)?;
    let dense = mdp
        .states()
        .iter()
        .map(|s| values.get(s).copied())
        .collect::<Option<Vec<f64>>>()?;
    Some(expected_value(&model.outcomes, &dense, discount))
}

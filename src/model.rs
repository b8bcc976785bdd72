//! The MDP model consumed by the solvers.
//!
//! Callers hand over the nested `state -> action -> successor` maps of the
//! input contract. [`Mdp::new`] validates them eagerly and interns them into
//! an indexed, read-only layout: states are addressed by position and every
//! `(state, action)` pair owns a small vector of [`Outcome`]s. Nothing in the
//! model changes after construction.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use crate::action::Action;
use crate::error::ModelError;

/// Allowed deviation of a distribution's total mass from 1.0.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Successor state -> probability (or reward) for one `(state, action)` pair.
pub type Distribution<S> = HashMap<S, f64>;

/// `P[state][action][successor]`.
pub type TransitionModel<S, A> = HashMap<S, HashMap<Action<A>, Distribution<S>>>;

/// `R[state][action][successor]`, keyed exactly like the transition model.
pub type RewardModel<S, A> = HashMap<S, HashMap<Action<A>, Distribution<S>>>;

/// One possible result of taking an action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// Index of the successor state.
    pub successor: usize,
    /// Transition probability.
    pub probability: f64,
    /// Immediate reward for this transition.
    pub reward: f64,
}

/// An action together with its outcome distribution.
#[derive(Debug, Clone)]
pub struct ActionModel<A> {
    /// The action.
    pub action: Action<A>,
    /// Outcomes, ordered by successor index.
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone)]
pub(crate) struct StateModel<A> {
    pub(crate) terminal_reward: Option<f64>,
    pub(crate) actions: Vec<ActionModel<A>>,
}

/// A validated finite MDP.
#[derive(Debug, Clone)]
pub struct Mdp<S, A> {
    states: Vec<S>,
    index: HashMap<S, usize>,
    models: Vec<StateModel<A>>,
}

fn describe<T: Debug>(value: &T) -> String {
    format!("{value:?}")
}

impl<S, A> Mdp<S, A>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    /// Validates and interns an MDP.
    ///
    /// `states` fixes the sweep order; each action list fixes the tie-break
    /// order among equally good actions.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] for the first structural problem found:
    /// unknown or duplicate states, missing or empty action lists, terminal
    /// states with real choices, distributions that do not sum to 1.0, or
    /// reward maps whose successors differ from the transition map.
    pub fn new(
        states: Vec<S>,
        actions: &HashMap<S, Vec<Action<A>>>,
        terminal_rewards: &HashMap<S, f64>,
        transitions: &TransitionModel<S, A>,
        rewards: &RewardModel<S, A>,
    ) -> Result<Self, ModelError> {
        if states.is_empty() {
            return Err(ModelError::EmptyStateSet);
        }

        let mut index: HashMap<S, usize> = HashMap::with_capacity(states.len());
        for (i, s) in states.iter().enumerate() {
            if index.insert(s.clone(), i).is_some() {
                return Err(ModelError::DuplicateState { state: describe(s) });
            }
        }

        let known = |s: &S, context: &str| -> Result<(), ModelError> {
            if index.contains_key(s) {
                Ok(())
            } else {
                Err(ModelError::UnknownState {
                    state: describe(s),
                    context: context.to_string(),
                })
            }
        };
        for s in actions.keys() {
            known(s, "action lists")?;
        }
        for (s, reward) in terminal_rewards {
            known(s, "terminal rewards")?;
            if !reward.is_finite() {
                return Err(ModelError::NonFiniteReward {
                    state: describe(s),
                    reward: *reward,
                });
            }
        }
        for s in transitions.keys() {
            known(s, "transition model")?;
        }
        for s in rewards.keys() {
            known(s, "reward model")?;
        }

        let empty = HashMap::new();
        let mut models = Vec::with_capacity(states.len());
        for s in &states {
            let listed = actions.get(s).map(Vec::as_slice).unwrap_or_default();
            let terminal_reward = terminal_rewards.get(s).copied();

            match terminal_reward {
                Some(_) if !matches!(listed, [Action::NoOp]) => {
                    return Err(ModelError::TerminalWithChoices { state: describe(s) });
                }
                None if listed.is_empty() => {
                    return Err(ModelError::NoActions { state: describe(s) });
                }
                _ => {}
            }

            let mut seen: HashSet<&Action<A>> = HashSet::with_capacity(listed.len());
            for a in listed {
                if !seen.insert(a) {
                    return Err(ModelError::DuplicateAction {
                        state: describe(s),
                        action: describe(a),
                    });
                }
            }

            let p_state = transitions.get(s).unwrap_or(&empty);
            let r_state = rewards.get(s).unwrap_or(&empty);
            for a in p_state.keys().chain(r_state.keys()) {
                if !seen.contains(a) {
                    return Err(ModelError::UnlistedAction {
                        state: describe(s),
                        action: describe(a),
                    });
                }
            }

            let mut action_models = Vec::with_capacity(listed.len());
            for a in listed {
                let dist = p_state.get(a).ok_or_else(|| ModelError::MissingTransition {
                    state: describe(s),
                    action: describe(a),
                })?;
                let rew = r_state.get(a).ok_or_else(|| ModelError::MissingRewards {
                    state: describe(s),
                    action: describe(a),
                })?;
                let outcomes = intern_outcomes(s, a, dist, rew, &index)?;
                action_models.push(ActionModel {
                    action: a.clone(),
                    outcomes,
                });
            }

            models.push(StateModel {
                terminal_reward,
                actions: action_models,
            });
        }

        Ok(Self {
            states,
            index,
            models,
        })
    }

    /// Returns the states in sweep order.
    #[must_use]
    pub fn states(&self) -> &[S] {
        &self.states
    }

    /// Returns the number of states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if the model has no states.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns the position of `state`, if it belongs to the model.
    #[must_use]
    pub fn index_of(&self, state: &S) -> Option<usize> {
        self.index.get(state).copied()
    }

    /// Returns the fixed reward of a terminal state.
    #[must_use]
    pub fn terminal_reward(&self, state: &S) -> Option<f64> {
        self.index_of(state)
            .and_then(|i| self.models[i].terminal_reward)
    }

    /// Returns true if `state` is terminal.
    #[must_use]
    pub fn is_terminal(&self, state: &S) -> bool {
        self.terminal_reward(state).is_some()
    }

    /// Returns the actions of `state` in tie-break order.
    #[must_use]
    pub fn actions(&self, state: &S) -> Option<Vec<&Action<A>>> {
        let i = self.index_of(state)?;
        Some(self.models[i].actions.iter().map(|m| &m.action).collect())
    }

    /// Returns `P(state, action, successor)`.
    ///
    /// Successors outside the action's support yield `None`.
    #[must_use]
    pub fn probability(&self, state: &S, action: &Action<A>, successor: &S) -> Option<f64> {
        self.outcome(state, action, successor).map(|o| o.probability)
    }

    /// Returns `R(state, action, successor)`.
    #[must_use]
    pub fn reward(&self, state: &S, action: &Action<A>, successor: &S) -> Option<f64> {
        self.outcome(state, action, successor).map(|o| o.reward)
    }

    fn outcome(&self, state: &S, action: &Action<A>, successor: &S) -> Option<&Outcome> {
        let j = self.index_of(successor)?;
        self.action_model(self.index_of(state)?, action)?
            .outcomes
            .iter()
            .find(|o| o.successor == j)
    }

    /// Returns the outcome model for `action` in the state at `state_index`.
    #[must_use]
    pub fn action_model(&self, state_index: usize, action: &Action<A>) -> Option<&ActionModel<A>> {
        self.models
            .get(state_index)?
            .actions
            .iter()
            .find(|m| &m.action == action)
    }

    pub(crate) fn model(&self, state_index: usize) -> &StateModel<A> {
        &self.models[state_index]
    }
}

fn intern_outcomes<S, A>(
    state: &S,
    action: &Action<A>,
    dist: &Distribution<S>,
    rewards: &Distribution<S>,
    index: &HashMap<S, usize>,
) -> Result<Vec<Outcome>, ModelError>
where
    S: Eq + Hash + Debug,
    A: Debug,
{
    if rewards.len() != dist.len() || dist.keys().any(|s2| !rewards.contains_key(s2)) {
        return Err(ModelError::RewardKeyMismatch {
            state: describe(state),
            action: describe(action),
        });
    }

    let mut outcomes = Vec::with_capacity(dist.len());
    let mut sum = 0.0;
    for (s2, &probability) in dist {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ModelError::InvalidProbability {
                state: describe(state),
                action: describe(action),
                probability,
            });
        }
        let successor = *index.get(s2).ok_or_else(|| ModelError::UnknownState {
            state: describe(s2),
            context: format!("transitions of {}", describe(state)),
        })?;
        let reward = rewards[s2];
        if !reward.is_finite() {
            return Err(ModelError::NonFiniteReward {
                state: describe(state),
                reward,
            });
        }
        sum += probability;
        outcomes.push(Outcome {
            successor,
            probability,
            reward,
        });
    }

    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(ModelError::ProbabilitySum {
            state: describe(state),
            action: describe(action),
            sum,
        });
    }

    // Hash iteration order must not leak into the backup's summation order.
    outcomes.sort_by_key(|o| o.successor);
    Ok(outcomes)
}

/// Fluent builder for hand-written models.
///
/// ```
/// use linkmdp::{Action, MdpBuilder};
///
/// let mdp = MdpBuilder::<&str, &str>::new()
///     .action("A", "goto_B", [("B", 0.9, -0.05), ("A", 0.1, -0.05)])
///     .terminal("B", 10.0)
///     .build()
///     .unwrap();
/// assert_eq!(mdp.len(), 2);
/// assert_eq!(mdp.probability(&"A", &Action::Choice("goto_B"), &"B"), Some(0.9));
/// ```
#[derive(Debug, Clone)]
pub struct MdpBuilder<S, A> {
    states: Vec<S>,
    seen: HashSet<S>,
    actions: HashMap<S, Vec<Action<A>>>,
    terminal_rewards: HashMap<S, f64>,
    transitions: TransitionModel<S, A>,
    rewards: RewardModel<S, A>,
}

impl<S, A> Default for MdpBuilder<S, A> {
    fn default() -> Self {
        Self {
            states: Vec::new(),
            seen: HashSet::new(),
            actions: HashMap::new(),
            terminal_rewards: HashMap::new(),
            transitions: HashMap::new(),
            rewards: HashMap::new(),
        }
    }
}

impl<S, A> MdpBuilder<S, A>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state (idempotent). States keep their first-seen order.
    #[must_use]
    pub fn state(mut self, state: S) -> Self {
        self.register(&state);
        self
    }

    /// Add a terminal state with a no-op self-loop and a fixed reward.
    #[must_use]
    pub fn terminal(mut self, state: S, reward: f64) -> Self {
        self.terminal_rewards.insert(state.clone(), reward);
        self.self_loop(state)
    }

    /// Add a decision state without outgoing actions (no-op self-loop, reward 0).
    #[must_use]
    pub fn dead_end(self, state: S) -> Self {
        self.self_loop(state)
    }

    /// Append an action to `state` with `(successor, probability, reward)` outcomes.
    #[must_use]
    pub fn action(
        mut self,
        state: S,
        action: impl Into<Action<A>>,
        outcomes: impl IntoIterator<Item = (S, f64, f64)>,
    ) -> Self {
        let action = action.into();
        self.register(&state);
        let mut dist = HashMap::new();
        let mut rew = HashMap::new();
        for (s2, p, r) in outcomes {
            self.register(&s2);
            dist.insert(s2.clone(), p);
            rew.insert(s2, r);
        }
        self.actions
            .entry(state.clone())
            .or_default()
            .push(action.clone());
        self.transitions
            .entry(state.clone())
            .or_default()
            .insert(action.clone(), dist);
        self.rewards.entry(state).or_default().insert(action, rew);
        self
    }

    /// Validate and build the model.
    ///
    /// # Errors
    ///
    /// Any [`ModelError`] reported by [`Mdp::new`].
    pub fn build(self) -> Result<Mdp<S, A>, ModelError> {
        Mdp::new(
            self.states,
            &self.actions,
            &self.terminal_rewards,
            &self.transitions,
            &self.rewards,
        )
    }

    fn self_loop(self, state: S) -> Self {
        self.action(state.clone(), Action::NoOp, [(state, 1.0, 0.0)])
    }

    fn register(&mut self, state: &S) {
        if self.seen.insert(state.clone()) {
            self.states.push(state.clone());
        }
    }
}

//! Turning a [`LinkGraph`] into an [`Mdp`].
//!
//! Each page is a state and each outgoing link an action. Following a link
//! succeeds with a fixed probability; otherwise the surfer stays put or
//! lands on one of the page's other links. Terminal pages and dead ends get
//! the no-op self-loop.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::Action;
use crate::error::{ParameterError, SolveResult};
use crate::graph::LinkGraph;
use crate::model::{Distribution, Mdp, RewardModel, TransitionModel, PROBABILITY_TOLERANCE};

/// Probability split and step penalty used when building link actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSplit {
    /// Success probability when the page has exactly one link.
    pub single_link: f64,
    /// Probability of staying on the current page.
    pub stay: f64,
    /// Success probability when the page has several links.
    pub chosen_link: f64,
    /// Mass shared evenly by the links that were not chosen.
    pub other_links: f64,
    /// Reward for every transition out of a decision state.
    pub action_penalty: f64,
}

impl Default for TransitionSplit {
    fn default() -> Self {
        Self {
            single_link: 0.90,
            stay: 0.10,
            chosen_link: 0.60,
            other_links: 0.30,
            action_penalty: -0.05,
        }
    }
}

impl TransitionSplit {
    /// Validate the split.
    ///
    /// # Errors
    ///
    /// Returns `ParameterError::Config` if a probability is outside [0, 1],
    /// either split does not sum to 1.0, or the penalty is not finite.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let probabilities = [
            ("single_link", self.single_link),
            ("stay", self.stay),
            ("chosen_link", self.chosen_link),
            ("other_links", self.other_links),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ParameterError::Config {
                    reason: format!("{name} probability {p} is outside [0.0, 1.0]"),
                });
            }
        }
        let single = self.single_link + self.stay;
        if (single - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ParameterError::Config {
                reason: format!("single_link + stay must be 1.0, got {single}"),
            });
        }
        let multi = self.chosen_link + self.stay + self.other_links;
        if (multi - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ParameterError::Config {
                reason: format!("chosen_link + stay + other_links must be 1.0, got {multi}"),
            });
        }
        if !self.action_penalty.is_finite() {
            return Err(ParameterError::Config {
                reason: format!("action_penalty {} is not finite", self.action_penalty),
            });
        }
        Ok(())
    }

    fn distribution(&self, page: &str, chosen: &str, links: &[&str]) -> Distribution<String> {
        let mut dist = HashMap::with_capacity(links.len() + 1);
        if links.len() == 1 {
            dist.insert(chosen.to_string(), self.single_link);
        } else {
            dist.insert(chosen.to_string(), self.chosen_link);
            #[allow(clippy::cast_precision_loss)]
            let share = self.other_links / (links.len() - 1) as f64;
            for other in links.iter().filter(|l| **l != chosen) {
                dist.insert((*other).to_string(), share);
            }
        }
        dist.insert(page.to_string(), self.stay);
        dist
    }
}

/// Build the navigation MDP of `graph`.
///
/// States follow the graph's page order and actions its link order, so the
/// result is deterministic for a given graph.
///
/// # Errors
///
/// - `SolveError::Parameter` if `split` is invalid.
/// - `SolveError::Malformed` if the resulting model fails validation, e.g.
///   for an empty graph.
pub fn build_mdp(graph: &LinkGraph, split: &TransitionSplit) -> SolveResult<Mdp<String, String>> {
    split.validate()?;

    let mut states = Vec::with_capacity(graph.page_count());
    let mut actions: HashMap<String, Vec<Action<String>>> = HashMap::new();
    let mut terminal_rewards = HashMap::new();
    let mut transitions: TransitionModel<String, String> = HashMap::new();
    let mut rewards: RewardModel<String, String> = HashMap::new();

    for page in graph.pages() {
        states.push(page.to_string());
        let links: Vec<&str> = graph
            .links(page)
            .map(|out| out.iter().map(String::as_str).collect())
            .unwrap_or_default();

        let terminal = graph.terminal_reward(page);
        if let Some(reward) = terminal {
            terminal_rewards.insert(page.to_string(), reward);
        }

        if terminal.is_some() || links.is_empty() {
            actions.insert(page.to_string(), vec![Action::NoOp]);
            transitions.insert(
                page.to_string(),
                HashMap::from([(Action::NoOp, HashMap::from([(page.to_string(), 1.0)]))]),
            );
            rewards.insert(
                page.to_string(),
                HashMap::from([(Action::NoOp, HashMap::from([(page.to_string(), 0.0)]))]),
            );
            continue;
        }

        let mut page_actions = Vec::with_capacity(links.len());
        let mut page_p = HashMap::with_capacity(links.len());
        let mut page_r = HashMap::with_capacity(links.len());
        for chosen in &links {
            let action = Action::Choice((*chosen).to_string());
            let dist = split.distribution(page, chosen, &links);
            let rew = dist
                .keys()
                .map(|s2| (s2.clone(), split.action_penalty))
                .collect();
            page_actions.push(action.clone());
            page_p.insert(action.clone(), dist);
            page_r.insert(action, rew);
        }
        actions.insert(page.to_string(), page_actions);
        transitions.insert(page.to_string(), page_p);
        rewards.insert(page.to_string(), page_r);
    }

    let mdp = Mdp::new(states, &actions, &terminal_rewards, &transitions, &rewards)?;
    debug!(
        states = mdp.len(),
        terminals = terminal_rewards.len(),
        "built link-graph MDP"
    );
    Ok(mdp)
}

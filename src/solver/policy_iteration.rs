use std::fmt::Debug;
use std::hash::Hash;

use tracing::{debug, info, warn};

use crate::backup::{expected_value, greedy};
use crate::config::SolverConfig;
use crate::error::{SolveError, SolveResult};
use crate::model::Mdp;
use crate::solver::{Algorithm, Solution, SolveStats};

/// Solve `mdp` by policy iteration.
///
/// Starts from the first listed action of every decision state, then
/// alternates policy evaluation (sweeping `V(s) = Q(s, π(s))` until the
/// per-sweep change drops below `config.threshold`) with greedy improvement.
/// Stops on the first round in which no state changes its action.
///
/// Terminal values are set once at initialization and never touched again.
///
/// # Errors
///
/// - `SolveError::Parameter` if `config` is invalid.
/// - `SolveError::Divergence` if one evaluation needs more than
///   `config.max_iterations` sweeps, or the policy is still changing after
///   `config.max_iterations` rounds.
pub fn policy_iteration<S, A>(mdp: &Mdp<S, A>, config: &SolverConfig) -> SolveResult<Solution<S, A>>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    config.validate()?;

    let n = mdp.len();
    let mut values: Vec<f64> = (0..n)
        .map(|i| mdp.model(i).terminal_reward.unwrap_or(0.0))
        .collect();
    let mut policy = vec![0usize; n];
    let mut total_sweeps = 0;
    let mut delta = f64::INFINITY;

    for round in 1..=config.max_iterations {
        let (sweeps, eval_delta) = evaluate(mdp, &policy, &mut values, config)?;
        total_sweeps += sweeps;
        delta = eval_delta;

        let mut changed = 0usize;
        for (i, action) in policy.iter_mut().enumerate() {
            let model = mdp.model(i);
            if model.terminal_reward.is_some() {
                continue;
            }
            let (best, _) = greedy(&model.actions, &values, config.discount);
            if best != *action {
                *action = best;
                changed += 1;
            }
        }
        debug!(round, sweeps, changed, "policy improvement");

        if changed == 0 {
            info!(
                rounds = round,
                sweeps = total_sweeps,
                states = n,
                "policy iteration converged"
            );
            let stats = SolveStats {
                iterations: round,
                sweeps: total_sweeps,
                final_delta: delta,
            };
            return Ok(Solution::from_parts(
                mdp,
                &values,
                &policy,
                Algorithm::PolicyIteration,
                stats,
            ));
        }
    }

    warn!(
        max_iterations = config.max_iterations,
        "policy iteration did not reach a stable policy"
    );
    Err(SolveError::Divergence {
        algorithm: Algorithm::PolicyIteration.name(),
        iterations: config.max_iterations,
        delta,
    })
}

/// Evaluate a fixed policy in place. Returns the sweep count and final delta.
fn evaluate<S, A>(
    mdp: &Mdp<S, A>,
    policy: &[usize],
    values: &mut [f64],
    config: &SolverConfig,
) -> SolveResult<(usize, f64)>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    let mut delta = f64::INFINITY;
    for sweep in 1..=config.max_iterations {
        delta = 0.0;
        for i in 0..mdp.len() {
            let model = mdp.model(i);
            if model.terminal_reward.is_some() {
                continue;
            }
            let v = expected_value(&model.actions[policy[i]].outcomes, values, config.discount);
            delta = delta.max((values[i] - v).abs());
            values[i] = v;
        }
        if delta < config.threshold {
            return Ok((sweep, delta));
        }
    }

    warn!(
        max_iterations = config.max_iterations,
        delta, "policy evaluation hit the iteration cap"
    );
    Err(SolveError::Divergence {
        algorithm: Algorithm::PolicyIteration.name(),
        iterations: config.max_iterations,
        delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::model::MdpBuilder;
    use crate::solver::test_models::{branching, two_state, two_state_value};

    #[test]
    fn two_state_matches_closed_form() {
        let sol = policy_iteration(&two_state(), &SolverConfig::default()).unwrap();
        assert_eq!(sol.value(&"B"), Some(10.0));
        let v_a = sol.value(&"A").unwrap();
        assert!((v_a - two_state_value(0.97)).abs() < 1e-5, "V[A] = {v_a}");
        assert_eq!(sol.action(&"A"), Some(&Action::Choice("goto_B")));
        assert_eq!(sol.action(&"B"), Some(&Action::NoOp));
    }

    #[test]
    fn improves_away_from_bad_initial_policy() {
        // `to_bad` is listed first, so it is the initial policy.
        let sol = policy_iteration(&branching(), &SolverConfig::default()).unwrap();
        assert_eq!(sol.action(&"hub"), Some(&Action::Choice("to_good")));
        assert!(sol.stats.iterations >= 2);
        assert_eq!(sol.value(&"good"), Some(5.0));
        assert_eq!(sol.value(&"bad"), Some(-5.0));
        assert_eq!(sol.value(&"stuck"), Some(0.0));
    }

    #[test]
    fn single_action_states_stabilize_in_one_round() {
        let sol = policy_iteration(&two_state(), &SolverConfig::default()).unwrap();
        assert_eq!(sol.stats.iterations, 1);
    }

    #[test]
    fn first_listed_action_wins_ties() {
        let mdp = MdpBuilder::<&str, &str>::new()
            .action("s", "second", [("t", 1.0, 0.0)])
            .action("s", "first", [("t", 1.0, 0.0)])
            .terminal("t", 1.0)
            .build()
            .unwrap();
        let sol = policy_iteration(&mdp, &SolverConfig::default()).unwrap();
        assert_eq!(sol.action(&"s"), Some(&Action::Choice("second")));
        assert_eq!(sol.stats.iterations, 1);
    }

    #[test]
    fn evaluation_cap_reports_divergence() {
        let config = SolverConfig::default().with_max_iterations(2);
        let err = policy_iteration(&two_state(), &config).unwrap_err();
        assert!(err.is_divergence());
        assert!(format!("{err}").contains("policy_iteration"));
    }

    #[test]
    fn chain_prefers_shorter_path() {
        let mdp = MdpBuilder::<&str, &str>::new()
            .action("start", "long", [("mid", 1.0, -1.0)])
            .action("start", "short", [("goal", 1.0, -1.0)])
            .action("mid", "on", [("goal", 1.0, -1.0)])
            .terminal("goal", 10.0)
            .build()
            .unwrap();
        let sol = policy_iteration(&mdp, &SolverConfig::default().with_discount(0.9)).unwrap();
        assert_eq!(sol.action(&"start"), Some(&Action::Choice("short")));
        assert!((sol.value(&"start").unwrap() - 8.0).abs() < 1e-9);
        assert!((sol.value(&"mid").unwrap() - 8.0).abs() < 1e-9);
    }
}

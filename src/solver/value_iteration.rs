use std::fmt::Debug;
use std::hash::Hash;

use tracing::{debug, info, warn};

use crate::backup::{greedy, max_delta};
use crate::config::SolverConfig;
use crate::error::{SolveError, SolveResult};
use crate::model::Mdp;
use crate::solver::{Algorithm, Solution, SolveStats};

/// Solve `mdp` by value iteration.
///
/// Every sweep backs up all states from the previous sweep's values
/// (synchronous update): terminal states are pinned to their reward, all
/// others take the best action's expected value. The loop stops once the
/// largest per-state change of a sweep drops below `config.threshold`.
///
/// # Errors
///
/// - `SolveError::Parameter` if `config` is invalid.
/// - `SolveError::Divergence` if `config.max_iterations` sweeps pass
///   without convergence.
pub fn value_iteration<S, A>(mdp: &Mdp<S, A>, config: &SolverConfig) -> SolveResult<Solution<S, A>>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    config.validate()?;

    let n = mdp.len();
    let mut values = vec![0.0; n];
    let mut next = vec![0.0; n];
    let mut policy = vec![0usize; n];
    let mut delta = f64::INFINITY;

    for sweep in 1..=config.max_iterations {
        for (i, slot) in next.iter_mut().enumerate() {
            let model = mdp.model(i);
            *slot = match model.terminal_reward {
                // The only action of a terminal state is the no-op.
                Some(reward) => {
                    policy[i] = 0;
                    reward
                }
                None => {
                    let (best, q) = greedy(&model.actions, &values, config.discount);
                    policy[i] = best;
                    q
                }
            };
        }

        delta = max_delta(&values, &next);
        std::mem::swap(&mut values, &mut next);
        debug!(sweep, delta, "value iteration sweep");

        if delta < config.threshold {
            info!(
                sweeps = sweep,
                states = n,
                delta,
                "value iteration converged"
            );
            let stats = SolveStats {
                iterations: sweep,
                sweeps: sweep,
                final_delta: delta,
            };
            return Ok(Solution::from_parts(
                mdp,
                &values,
                &policy,
                Algorithm::ValueIteration,
                stats,
            ));
        }
    }

    warn!(
        max_iterations = config.max_iterations,
        delta, "value iteration hit the iteration cap"
    );
    Err(SolveError::Divergence {
        algorithm: Algorithm::ValueIteration.name(),
        iterations: config.max_iterations,
        delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::backup::action_value;
    use crate::model::MdpBuilder;
    use crate::solver::test_models::{branching, two_state, two_state_value};

    #[test]
    fn two_state_matches_closed_form() {
        let config = SolverConfig::default();
        let sol = value_iteration(&two_state(), &config).unwrap();
        assert_eq!(sol.value(&"B"), Some(10.0));
        let v_a = sol.value(&"A").unwrap();
        assert!((v_a - two_state_value(0.97)).abs() < 1e-5, "V[A] = {v_a}");
        assert!((v_a - 9.612_403).abs() < 1e-5);
        assert_eq!(sol.action(&"A"), Some(&Action::Choice("goto_B")));
        assert_eq!(sol.action(&"B"), Some(&Action::NoOp));
    }

    #[test]
    fn values_are_a_fixed_point() {
        let mdp = branching();
        let config = SolverConfig::default();
        let sol = value_iteration(&mdp, &config).unwrap();
        for s in mdp.states() {
            if let Some(reward) = mdp.terminal_reward(s) {
                assert_eq!(sol.value(s), Some(reward));
                continue;
            }
            let best = mdp
                .actions(s)
                .unwrap()
                .into_iter()
                .map(|a| action_value(&mdp, s, a, &sol.values, config.discount).unwrap())
                .fold(f64::NEG_INFINITY, f64::max);
            let v = sol.value(s).unwrap();
            assert!((v - best).abs() < config.threshold * 10.0, "{s}: {v} vs {best}");
        }
    }

    #[test]
    fn dead_end_converges_to_zero() {
        let mdp = MdpBuilder::<&str, &str>::new().dead_end("stuck").build().unwrap();
        let sol = value_iteration(&mdp, &SolverConfig::default().with_discount(0.5)).unwrap();
        assert_eq!(sol.value(&"stuck"), Some(0.0));
        assert_eq!(sol.action(&"stuck"), Some(&Action::NoOp));
    }

    #[test]
    fn first_listed_action_wins_ties() {
        let mdp = MdpBuilder::<&str, &str>::new()
            .action("s", "second", [("t", 1.0, 0.0)])
            .action("s", "first", [("t", 1.0, 0.0)])
            .terminal("t", 1.0)
            .build()
            .unwrap();
        let sol = value_iteration(&mdp, &SolverConfig::default()).unwrap();
        assert_eq!(sol.action(&"s"), Some(&Action::Choice("second")));
    }

    #[test]
    fn sweeps_read_only_previous_values() {
        // Listed so that an in-place sweep would see `s1` updated before `s0`.
        let mdp = MdpBuilder::<&str, &str>::new()
            .terminal("goal", 10.0)
            .action("s1", "go", [("goal", 1.0, 0.0)])
            .action("s0", "go", [("s1", 1.0, 0.0)])
            .build()
            .unwrap();
        let sol = value_iteration(&mdp, &SolverConfig::default().with_discount(0.5)).unwrap();
        assert_eq!(sol.value(&"s1"), Some(5.0));
        assert_eq!(sol.value(&"s0"), Some(2.5));
        // Values propagate one hop per sweep, plus one sweep with no change.
        assert_eq!(sol.stats.sweeps, 4);
    }

    #[test]
    fn iteration_cap_reports_divergence() {
        let config = SolverConfig::default().with_max_iterations(3);
        let err = value_iteration(&two_state(), &config).unwrap_err();
        match err {
            SolveError::Divergence {
                algorithm,
                iterations,
                delta,
            } => {
                assert_eq!(algorithm, "value_iteration");
                assert_eq!(iterations, 3);
                assert!(delta >= config.threshold);
            }
            other => panic!("expected divergence, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_discount_before_solving() {
        let config = SolverConfig::default().with_discount(1.0);
        let err = value_iteration(&two_state(), &config).unwrap_err();
        assert!(err.is_parameter());
    }

    #[test]
    fn stats_count_sweeps() {
        let sol = value_iteration(&two_state(), &SolverConfig::default()).unwrap();
        assert_eq!(sol.stats.iterations, sol.stats.sweeps);
        assert!(sol.stats.sweeps > 1);
        assert!(sol.stats.final_delta < 1e-6);
    }
}

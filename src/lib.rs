//! # linkmdp - Optimal navigation over link-graph MDPs
//!
//! linkmdp computes optimal policies for finite Markov decision processes
//! whose states are pages of a link graph and whose actions are the links
//! a surfer can follow.
//!
//! ## Core Concepts
//!
//! - **Mdp**: A validated, read-only model: states, ordered actions per state,
//!   transition probabilities, rewards, and terminal rewards
//! - **Action**: Either a caller-defined choice or the explicit `NoOp` used by
//!   terminal states and dead ends
//! - **Solvers**: Value iteration (default) and policy iteration, both built on
//!   one Bellman backup
//! - **Solution**: The value function and greedy policy of a solve
//!
//! The `graph`, `crawl`, and `builder` modules turn a directory of HTML pages
//! into an [`Mdp`]; the solvers do not depend on them.
//!
//! ## Usage
//!
//! ```rust
//! use linkmdp::{value_iteration, Action, MdpBuilder, SolverConfig};
//!
//! let mdp = MdpBuilder::<&str, &str>::new()
//!     .action("A", "goto_B", [("B", 0.9, -0.05), ("A", 0.1, -0.05)])
//!     .terminal("B", 10.0)
//!     .build()?;
//!
//! let solution = value_iteration(&mdp, &SolverConfig::default())?;
//! assert_eq!(solution.value(&"B"), Some(10.0));
//! assert_eq!(solution.action(&"A"), Some(&Action::Choice("goto_B")));
//! # Ok::<(), linkmdp::SolveError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Solver core
pub mod action;
pub mod backup;
pub mod config;
pub mod error;
pub mod model;
pub mod solver;

// Corpus to model
pub mod builder;
pub mod crawl;
pub mod graph;

// Re-export primary types at crate root for convenience
pub use action::Action;
pub use config::{SolverConfig, DEFAULT_DISCOUNT, DEFAULT_MAX_ITERATIONS, DEFAULT_THRESHOLD};
pub use error::{CrawlError, ModelError, ParameterError, SolveError, SolveResult};
pub use model::{Mdp, MdpBuilder, Outcome, PROBABILITY_TOLERANCE};
pub use solver::{policy_iteration, solve, value_iteration, Algorithm, Solution, SolveStats};

pub use builder::{build_mdp, TransitionSplit};
pub use crawl::{crawl_directory, PageParser};
pub use graph::LinkGraph;

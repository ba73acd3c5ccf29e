//! # Decision Heuristics
//!
//! Heuristics are driven by events from the search engine and are asked for
//! the next decision literal. Solver state is read through a [`SearchView`].

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::types::{Literal, Var};

pub mod combined;
pub mod domain;
pub mod minisat;

pub use combined::CombinedHeuristic;
pub use domain::DomainHeuristic;
pub use minisat::MinisatHeuristic;

/// Read-only access to the state of the search engine
pub trait SearchView {
    /// The number of variables
    fn n_vars(&self) -> u32;
    /// Whether the variable is not assigned yet
    fn is_undefined(&self, var: Var) -> bool;
    /// The number of restarts so far
    fn n_restarts(&self) -> u64;
    /// The number of choices so far
    fn n_choices(&self) -> u64;
}

/// A decision heuristic
pub trait Heuristic {
    /// A variable was created while parsing
    fn on_new_variable(&mut self, var: Var);
    /// A variable was created during search
    fn on_new_variable_runtime(&mut self, var: Var);
    /// A literal took part in conflict analysis
    fn on_literal_involved_in_conflict(&mut self, lit: Literal);
    /// A variable was unassigned during backjumping
    fn on_unrolling_variable(&mut self, var: Var);
    /// The heuristic value of a variable should be increased
    fn increment_heuristic_values(&mut self, var: Var);
    /// The search engine simplified the formula at decision level zero
    fn simplify_variables_at_level_zero(&mut self, view: &dyn SearchView);
    /// A conflict was analyzed
    fn conflict_occurred(&mut self);
    /// Proposes the next decision literal. [`Literal::NULL`] means the
    /// heuristic abstains.
    fn make_a_choice(&mut self, view: &dyn SearchView) -> Literal;
    /// A heuristic-specific statistic; a value of at least 100 signals that
    /// the heuristic should be abandoned
    fn threshold(&self) -> u32;
    /// The input was completely parsed
    fn on_finished_parsing(&mut self, view: &dyn SearchView);
}

/// Error for heuristic names that are not known
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown heuristic `{0}`")]
pub struct UnknownHeuristic(pub String);

/// The available domain heuristics
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum HeuristicKind {
    /// Partner units problem
    Pup,
    /// Graph colouring
    Colouring,
    /// Bin packing
    #[cfg_attr(feature = "clap", value(name = "binpacking"))]
    BinPacking,
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeuristicKind::Pup => write!(f, "pup"),
            HeuristicKind::Colouring => write!(f, "colouring"),
            HeuristicKind::BinPacking => write!(f, "binpacking"),
        }
    }
}

impl FromStr for HeuristicKind {
    type Err = UnknownHeuristic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pup" => Ok(HeuristicKind::Pup),
            "colouring" => Ok(HeuristicKind::Colouring),
            "binpacking" => Ok(HeuristicKind::BinPacking),
            _ => Err(UnknownHeuristic(s.to_string())),
        }
    }
}

//! # Search Engine Interface
//!
//! The optimization core drives an external conflict-driven search engine
//! through the [`Oracle`] trait. The engine finds models under assumptions,
//! extracts unsatisfiable cores, and builds the aggregate constraints the core
//! describes with [`Aggregate`].

use std::fmt;

use crate::types::{Literal, Var};

/// Results of a call to the search engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveResult {
    /// A model was found
    Coherent,
    /// No model exists under the current assumptions
    Incoherent,
    /// The call was interrupted
    Interrupted,
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveResult::Coherent => write!(f, "COHERENT"),
            SolveResult::Incoherent => write!(f, "INCOHERENT"),
            SolveResult::Interrupted => write!(f, "INTERRUPTED"),
        }
    }
}

/// A weighted at-most constraint: if `guard` is true (or absent), the summed
/// weight of the true literals in `lits` is at most `bound`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregate {
    pub guard: Option<Literal>,
    pub lits: Vec<(Literal, u64)>,
    pub bound: u64,
}

impl Aggregate {
    /// Creates an unconditional aggregate
    pub fn new(lits: Vec<(Literal, u64)>, bound: u64) -> Self {
        Aggregate {
            guard: None,
            lits,
            bound,
        }
    }

    /// Creates an aggregate that is only enforced when `guard` is true
    pub fn guarded(guard: Literal, lits: Vec<(Literal, u64)>, bound: u64) -> Self {
        Aggregate {
            guard: Some(guard),
            lits,
            bound,
        }
    }

    /// Checks whether the aggregate is satisfied by an assignment given as a
    /// predicate over literals
    pub fn is_satisfied_by<F: Fn(Literal) -> bool>(&self, is_true: F) -> bool {
        if let Some(guard) = self.guard {
            if !is_true(guard) {
                return true;
            }
        }
        let sum: u64 = self
            .lits
            .iter()
            .filter(|(l, _)| is_true(*l))
            .map(|(_, w)| *w)
            .sum();
        sum <= self.bound
    }
}

/// The operations the optimization core needs from the search engine
pub trait Oracle {
    /// Disables simplifications that could remove variables the core refers to
    fn turn_off_simplifications(&mut self);
    /// Gets the number of variables known to the engine
    fn n_vars(&self) -> u32;
    /// Creates a fresh variable
    fn new_var(&mut self) -> Var;
    /// Adds a clause. Returns `false` if the engine became inconsistent.
    fn add_clause(&mut self, clause: &[Literal]) -> bool;
    /// Adds an aggregate. Returns `false` if the engine rejected it.
    fn add_aggregate(&mut self, aggregate: &Aggregate) -> bool;
    /// Gets the optimization literals and weights of a level
    fn optimization_lits(&self, level: usize) -> Vec<(Literal, u64)>;
    /// Sorts the optimization literals of a level
    fn sort_optimization_lits(&mut self, level: usize);
    /// Backjumps to decision level zero
    fn unroll_to_zero(&mut self);
    /// Enables or disables unsat core extraction
    fn set_compute_unsat_cores(&mut self, compute: bool);
    /// Solves without assumptions
    fn solve(&mut self) -> SolveResult;
    /// Solves under assumptions
    fn solve_assumps(&mut self, assumps: &[Literal]) -> SolveResult;
    /// Gets the core of the last incoherent call, a subset of the assumptions
    fn unsat_core(&self) -> Vec<Literal>;
    /// Gets the model of the last coherent call as the list of true literals
    fn model(&self) -> Vec<Literal>;
    /// Gets the cost of the current model at a level
    fn cost_of_model(&self, level: usize) -> u64;
    /// Gets the current decision level
    fn decision_level(&self) -> u32;
    /// Gets the number of restarts so far
    fn n_restarts(&self) -> u64;
    /// Gets the number of choices so far
    fn n_choices(&self) -> u64;
    /// Hints the decision heuristic to prefer a literal with a given weight
    fn prefer_literal(&mut self, lit: Literal, weight: u64);
}

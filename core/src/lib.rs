//! # Weakopt
//!
//! The optimization core of a conflict-driven answer-set/SAT solver. Given a
//! search engine implementing [`oracle::Oracle`], it finds models minimizing
//! the weak constraints of each level, alternating core-guided lower bounding
//! (OLL) with model-guided branch and bound (BB). It also provides the
//! [`heuristic::CombinedHeuristic`] that mixes domain heuristics with a
//! native activity heuristic.

use std::fmt;

pub mod options;
pub use options::{Algorithm, KernelOptions, Limits, SwitchPolicy};

pub mod types;

pub mod oracle;

pub mod heuristic;

pub mod algs;
pub use algs::{Interrupter, KernelFunctions, Solve};

// Reexport algorithms
pub use algs::ollbb::StepOutcome;
pub use algs::opt::Opt;

pub mod logging;

pub(crate) mod termination;
pub use termination::Termination;

/// Results of optimizing a level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The best model is optimal and its cost was made permanent
    OptimumFound,
    /// The best model is optimal but its cost could not be made permanent
    OptimumFoundStop,
    /// No model exists
    Incoherent,
    /// The search was interrupted
    Interrupted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::OptimumFound => write!(f, "OPTIMUM FOUND"),
            Outcome::OptimumFoundStop => write!(f, "OPTIMUM FOUND (STOP)"),
            Outcome::Incoherent => write!(f, "INCOHERENT"),
            Outcome::Interrupted => write!(f, "INTERRUPTED"),
        }
    }
}

/// Algorithm phases that the solver can be in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Core-guided lower bounding
    Oll,
    /// Model-guided branch and bound
    BranchAndBound,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Oll => write!(f, "oll"),
            Phase::BranchAndBound => write!(f, "branch-and-bound"),
        }
    }
}

/// Statistics of the solver
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Stats {
    /// The number of calls to [`Solve::solve`]
    pub n_solve_calls: usize,
    /// The number of calls to the search engine
    pub n_oracle_calls: usize,
    /// The number of models found
    pub n_models: usize,
    /// The number of cores relaxed
    pub n_cores: usize,
    /// The number of aggregates handed to the search engine
    pub n_aggregates: usize,
    /// The number of iterations of the main loop
    pub n_iterations: usize,
    /// The number of OLL steps
    pub n_oll_steps: usize,
    /// The number of branch and bound steps
    pub n_bb_steps: usize,
}

/// A logger to attach to a solver
pub trait WriteSolverLog {
    /// Adds a model with its cost to the log
    fn log_model(&mut self, cost: u64, phase: Phase) -> anyhow::Result<()>;
    /// Adds an oracle call to the log
    fn log_oracle_call(&mut self, result: oracle::SolveResult) -> anyhow::Result<()>;
    /// Adds a relaxed core to the log
    fn log_core(&mut self, weight: u64, len: usize) -> anyhow::Result<()>;
    /// Adds updated bounds to the log
    fn log_bounds(&mut self, lower: u64, upper: u64) -> anyhow::Result<()>;
    /// Adds an aggregate handed to the search engine to the log
    fn log_aggregate(&mut self, bound: u64) -> anyhow::Result<()>;
    /// Adds a new routine starting to the log
    fn log_routine_start(&mut self, desc: &'static str) -> anyhow::Result<()>;
    /// Adds a new routine ending to the log
    fn log_routine_end(&mut self) -> anyhow::Result<()>;
    /// Adds end of solving to the log
    fn log_end_solve(&mut self) -> anyhow::Result<()>;
    /// Logs any string
    fn log_message(&mut self, msg: &str) -> anyhow::Result<()>;
}

//! Core solver functionality shared between different algorithms

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Context;

use crate::{
    oracle::{Aggregate, Oracle, SolveResult},
    types::{Literal, Objective},
    KernelOptions, Limits, Outcome, Phase, Stats, Termination, WriteSolverLog,
};

pub mod ollbb;
pub mod opt;

mod coreguided;

/// Solving interface for each algorithm
pub trait Solve: KernelFunctions {
    /// Solves the current level under given limits. Early termination is
    /// reported as [`Outcome::Interrupted`], the reason is available from
    /// [`KernelFunctions::termination`].
    fn solve(&mut self, limits: Limits) -> anyhow::Result<Outcome>;
}

/// Shared functionality provided by the [`Kernel`]
pub trait KernelFunctions {
    /// Gets tracked statistics from the solver
    fn stats(&self) -> Stats;
    /// Gets the lower bound on the cost of the current level
    fn lower_bound(&self) -> u64;
    /// Gets the upper bound on the cost of the current level
    fn upper_bound(&self) -> u64;
    /// Gets the best model found so far, restricted to the original variables
    fn best_model(&self) -> Option<&[Literal]>;
    /// Gets the reason for the last early termination
    fn termination(&self) -> Option<Termination>;
    /// Attaches a logger to the solver
    fn attach_logger<L: WriteSolverLog + 'static>(&mut self, logger: L);
    /// Detaches a logger from the solver
    fn detach_logger(&mut self) -> Option<Box<dyn WriteSolverLog>>;
    /// Gets an iterrupter to the solver
    fn interrupter(&mut self) -> Interrupter;
}

/// Handle to interrupt a solver from another thread
#[derive(Clone)]
pub struct Interrupter {
    /// Termination flag of the solver
    term_flag: Arc<AtomicBool>,
}

impl Interrupter {
    /// Interrupts the solver asynchronously
    pub fn interrupt(&mut self) {
        self.term_flag.store(true, Ordering::Relaxed);
    }
}

/// Kernel struct shared between all algorithms
///
/// # Generics
///
/// - `O`: the search engine oracle
pub struct Kernel<O> {
    /// The search engine
    oracle: O,
    /// The weak-constraint level being optimized
    level: usize,
    /// The optimization literals of the level as given by the oracle
    orig_lits: Vec<(Literal, u64)>,
    /// The reformulated objective
    obj: Objective,
    /// Lower bound on the optimal cost of the level
    lower_bound: u64,
    /// Cost of the best model of the level
    upper_bound: u64,
    /// The current assumptions
    assumptions: Vec<Literal>,
    /// The number of variables before any auxiliary variable was introduced
    n_orig_vars: Option<u32>,
    /// Weights last passed to the decision heuristic
    pref_weights: HashMap<Literal, u64>,
    /// The number of models found at the current level
    n_level_models: usize,
    /// The best model found so far
    best_model: Option<Vec<Literal>>,
    /// Configuration options
    opts: KernelOptions,
    /// Running statistics
    stats: Stats,
    /// Limits for the current solving run
    lims: Limits,
    /// Why the last run terminated early
    termination: Option<Termination>,
    /// Logger to log with
    logger: Option<Box<dyn WriteSolverLog>>,
    /// Termination flag
    term_flag: Arc<AtomicBool>,
}

impl<O> Kernel<O> {
    pub fn new(oracle: O, level: usize, opts: KernelOptions) -> Self {
        Kernel {
            oracle,
            level,
            orig_lits: vec![],
            obj: Objective::default(),
            lower_bound: 0,
            upper_bound: u64::MAX,
            assumptions: vec![],
            n_orig_vars: None,
            pref_weights: HashMap::new(),
            n_level_models: 0,
            best_model: None,
            opts,
            stats: Stats::default(),
            lims: Limits::none(),
            termination: None,
            logger: None,
            term_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    fn start_solving(&mut self, limits: Limits) {
        self.stats.n_solve_calls += 1;
        self.lims = limits;
        self.termination = None;
    }

    fn attach_logger<L: WriteSolverLog + 'static>(&mut self, logger: L) {
        self.logger = Some(Box::new(logger));
    }

    fn detach_logger(&mut self) -> Option<Box<dyn WriteSolverLog>> {
        self.logger.take()
    }

    fn interrupter(&mut self) -> Interrupter {
        Interrupter {
            term_flag: self.term_flag.clone(),
        }
    }

    /// Checks the termination flag and records the termination if appropriate
    fn check_termination(&mut self) -> bool {
        if self.term_flag.load(Ordering::Relaxed) {
            self.termination = Some(Termination::Interrupted);
            return true;
        }
        false
    }

    /// Checks whether a limit forbids another oracle call
    fn check_limits(&mut self) -> bool {
        if self.lims.oracle_calls == Some(0) {
            self.termination = Some(Termination::OracleCallsLimit);
            return true;
        }
        if self.lims.models == Some(0) {
            self.termination = Some(Termination::ModelsLimit);
            return true;
        }
        false
    }

    /// Logs an oracle call and updates the call limit
    fn log_oracle_call(&mut self, result: SolveResult) -> anyhow::Result<()> {
        self.stats.n_oracle_calls += 1;
        // Dispatch to logger
        if let Some(logger) = &mut self.logger {
            logger.log_oracle_call(result).context("logger failed")?;
        }
        if let Some(oracle_calls) = &mut self.lims.oracle_calls {
            *oracle_calls -= 1;
        }
        Ok(())
    }

    /// Logs the bounds of the level
    fn log_bounds(&mut self) -> anyhow::Result<()> {
        debug_assert!(self.lower_bound <= self.upper_bound);
        // Dispatch to logger
        if let Some(logger) = &mut self.logger {
            logger
                .log_bounds(self.lower_bound, self.upper_bound)
                .context("logger failed")?;
        }
        Ok(())
    }

    /// Logs an extracted core
    fn log_core(&mut self, weight: u64, len: usize) -> anyhow::Result<()> {
        self.stats.n_cores += 1;
        // Dispatch to logger
        if let Some(logger) = &mut self.logger {
            logger.log_core(weight, len).context("logger failed")?;
        }
        Ok(())
    }

    /// Logs a message
    fn log_message(&mut self, msg: &str) -> anyhow::Result<()> {
        // Dispatch to logger
        if let Some(logger) = &mut self.logger {
            logger.log_message(msg).context("logger failed")?;
        }
        Ok(())
    }

    /// Logs a routine start
    fn log_routine_start(&mut self, desc: &'static str) -> anyhow::Result<()> {
        // Dispatch to logger
        if let Some(logger) = &mut self.logger {
            logger.log_routine_start(desc).context("logger failed")?;
        }
        Ok(())
    }

    /// Logs a routine end
    fn log_routine_end(&mut self) -> anyhow::Result<()> {
        // Dispatch to logger
        if let Some(logger) = &mut self.logger {
            logger.log_routine_end().context("logger failed")?;
        }
        Ok(())
    }

    /// Logs the end of a solving run
    fn log_end_solve(&mut self) -> anyhow::Result<()> {
        // Dispatch to logger
        if let Some(logger) = &mut self.logger {
            logger.log_end_solve().context("logger failed")?;
        }
        Ok(())
    }

    /// Raises the lower bound by a given value
    fn raise_lower_bound(&mut self, by: u64) -> anyhow::Result<()> {
        self.lower_bound += by;
        assert!(
            self.lower_bound <= self.upper_bound,
            "lower bound {} exceeds upper bound {}",
            self.lower_bound,
            self.upper_bound
        );
        self.log_bounds()
    }

    /// Sets the lower bound to the upper bound, proving the best model optimal
    fn prove_optimal(&mut self) -> anyhow::Result<()> {
        if self.lower_bound == self.upper_bound {
            return Ok(());
        }
        self.lower_bound = self.upper_bound;
        self.log_bounds()
    }

    /// Computes the assumptions from the working objective: the negation of
    /// every active objective literal, heaviest first
    fn compute_assumptions(&mut self) {
        let mut active: Vec<_> = self.obj.active().map(|e| (e.lit, e.weight)).collect();
        active.sort_by(|(_, w1), (_, w2)| w2.cmp(w1));
        self.assumptions.clear();
        self.assumptions.extend(active.into_iter().map(|(l, _)| !l));
    }
}

impl<O> Kernel<O>
where
    O: Oracle,
{
    /// Wrapper around the oracle with call logging, limits and interrupt
    /// detection. Solves without assumptions if none are given.
    fn solve_assumps(&mut self, assumps: &[Literal]) -> anyhow::Result<SolveResult> {
        if self.check_termination() || self.check_limits() {
            return Ok(SolveResult::Interrupted);
        }
        self.log_routine_start("oracle call")?;
        let res = if assumps.is_empty() {
            self.oracle.solve()
        } else {
            self.oracle.solve_assumps(assumps)
        };
        self.log_routine_end()?;
        self.log_oracle_call(res)?;
        if self.check_termination() {
            return Ok(SolveResult::Interrupted);
        }
        if res == SolveResult::Interrupted {
            self.termination = Some(Termination::OracleInterrupted);
        }
        Ok(res)
    }

    /// Solves under the current assumptions
    fn solve_with_assumptions(&mut self) -> anyhow::Result<SolveResult> {
        let assumps = std::mem::take(&mut self.assumptions);
        let res = self.solve_assumps(&assumps);
        self.assumptions = assumps;
        res
    }

    /// Adds an aggregate to the oracle. Returns `false` if it was rejected.
    fn add_aggregate(&mut self, aggregate: &Aggregate) -> anyhow::Result<bool> {
        self.stats.n_aggregates += 1;
        // Dispatch to logger
        if let Some(logger) = &mut self.logger {
            logger
                .log_aggregate(aggregate.bound)
                .context("logger failed")?;
        }
        Ok(self.oracle.add_aggregate(aggregate))
    }

    /// Records the model currently held by the oracle. Lowers the upper bound
    /// and stores the model if it improves on the best one.
    fn found_model(&mut self, cost: u64, phase: Phase) -> anyhow::Result<()> {
        self.stats.n_models += 1;
        self.n_level_models += 1;
        if let Some(models) = &mut self.lims.models {
            *models = models.saturating_sub(1);
        }
        // Dispatch to logger
        if let Some(logger) = &mut self.logger {
            logger.log_model(cost, phase).context("logger failed")?;
        }
        if cost >= self.upper_bound {
            return Ok(());
        }
        let n_orig_vars = self.n_orig_vars.unwrap_or(u32::MAX);
        let model = self
            .oracle
            .model()
            .into_iter()
            .filter(|l| l.var() <= n_orig_vars)
            .collect();
        self.best_model = Some(model);
        self.upper_bound = cost;
        assert!(
            self.lower_bound <= self.upper_bound,
            "model of cost {} below lower bound {}",
            cost,
            self.lower_bound
        );
        self.log_bounds()
    }

    /// Starts a fresh optimization of the current level: builds the working
    /// objective with its unsat core lookup and resets the bounds
    fn init_in_unsat_core(&mut self) {
        self.orig_lits = self.oracle.optimization_lits(self.level);
        self.obj = Objective::new(&self.orig_lits);
        self.lower_bound = 0;
        self.upper_bound = u64::MAX;
        self.n_level_models = 0;
        self.assumptions.clear();
        self.pref_weights.clear();
    }

    /// Snapshots the number of original variables, once
    fn init_orig_vars(&mut self) {
        if self.n_orig_vars.is_none() {
            self.n_orig_vars = Some(self.oracle.n_vars());
        }
    }

    /// Passes the weights of the original optimization literals to the
    /// decision heuristic, preferring to falsify them
    fn init_heuristic_values(&mut self) {
        if !self.opts.preferred_choices {
            return;
        }
        for &(lit, weight) in &self.orig_lits {
            self.oracle.prefer_literal(!lit, weight);
            self.pref_weights.insert(lit, weight);
        }
    }

    /// Passes changed residual weights of the working objective to the
    /// decision heuristic
    fn set_and_update_heuristic_values(&mut self) {
        if !self.opts.preferred_choices {
            return;
        }
        for entry in self.obj.iter() {
            if self.pref_weights.get(&entry.lit) == Some(&entry.weight) {
                continue;
            }
            self.oracle.prefer_literal(!entry.lit, entry.weight);
            self.pref_weights.insert(entry.lit, entry.weight);
        }
    }
}

//! # Optimization Strategy
//!
//! [`Opt`] optimizes one weak-constraint level at a time. It owns the
//! bounding aggregate used by branch and bound and the guard variable that
//! activates it.

use weakopt_proc::{KernelFunctions, Solve};

use crate::{
    oracle::{Aggregate, Oracle},
    options::Algorithm,
    types::{Literal, Var},
    KernelOptions, Outcome,
};

use super::{ollbb::StepOutcome, Kernel};

/// The optimization strategy for weak constraints
#[derive(KernelFunctions, Solve)]
pub struct Opt<O> {
    /// The kernel holding oracle, bounds and working objective
    pub(super) kernel: Kernel<O>,
    /// The current bounding aggregate, if a model was found
    aggregate: Option<Aggregate>,
    /// The variable guarding [`Self::aggregate`] while it is in use
    var_id: Option<Var>,
    /// Optimal costs of the completed levels
    level_costs: Vec<(usize, u64)>,
}

impl<O> Opt<O> {
    pub fn new(oracle: O, level: usize, opts: KernelOptions) -> Self {
        Opt {
            kernel: Kernel::new(oracle, level, opts),
            aggregate: None,
            var_id: None,
            level_costs: vec![],
        }
    }

    /// Gets the search engine
    pub fn oracle(&self) -> &O {
        &self.kernel.oracle
    }

    /// Gets the level currently optimized
    pub fn level(&self) -> usize {
        self.kernel.level
    }

    /// Gets the optimal costs of the levels completed by
    /// [`Opt::solve_levels`], in the order they were solved
    pub fn level_costs(&self) -> &[(usize, u64)] {
        &self.level_costs
    }

    /// Gets the current bounding aggregate
    pub fn aggregate(&self) -> Option<&Aggregate> {
        self.aggregate.as_ref()
    }

    /// The assumption activating the bounding aggregate, or
    /// [`Literal::NULL`] if no aggregate is in use
    pub fn assumption_to_add(&self) -> Literal {
        match self.var_id {
            Some(var) => Literal::negative(var),
            None => Literal::NULL,
        }
    }

    /// Switches to another level and drops the bounding aggregate. Bounds and
    /// working objective are rebuilt when the level is run.
    pub fn switch_level(&mut self, level: usize) {
        self.kernel.level = level;
        self.aggregate = None;
        self.var_id = None;
    }
}

impl<O> Opt<O>
where
    O: Oracle,
{
    fn alg_main(&mut self) -> anyhow::Result<Outcome> {
        let outcome = self.run()?;
        self.kernel.log_end_solve()?;
        Ok(outcome)
    }

    /// Solves the current level to proven optimality
    pub fn run(&mut self) -> anyhow::Result<Outcome> {
        self.init_level();
        match self.kernel.opts.algorithm {
            Algorithm::OllBb => self.oll_bb(),
            Algorithm::ModelGuided => self.model_guided(),
        }
    }

    /// Solves the given levels one after the other in priority order. Stops
    /// at the first level that is not solved to optimality.
    pub fn solve_levels(&mut self, levels: &[usize]) -> anyhow::Result<Outcome> {
        self.level_costs.clear();
        for &level in levels {
            self.switch_level(level);
            self.kernel.log_message(&format!("optimizing level {level}"))?;
            let outcome = self.run()?;
            if outcome != Outcome::OptimumFound {
                return Ok(outcome);
            }
            self.level_costs.push((level, self.kernel.upper_bound));
        }
        Ok(Outcome::OptimumFound)
    }

    /// Prepares the oracle and the kernel for optimizing the current level
    fn init_level(&mut self) {
        self.aggregate = None;
        self.var_id = None;
        self.kernel.oracle.turn_off_simplifications();
        self.kernel.init_in_unsat_core();
        self.kernel.init_orig_vars();
        self.kernel.oracle.sort_optimization_lits(self.kernel.level);
        self.kernel.init_heuristic_values();
    }

    /// Installs the bound `cost <= model_cost - 1` over the level's
    /// optimization literals, guarded by a fresh variable. Returns `false` if
    /// the bound cannot be tightened further or the oracle rejects it.
    pub fn update_optimization_aggregate(&mut self, model_cost: u64) -> anyhow::Result<bool> {
        if model_cost == 0 || model_cost <= self.kernel.lower_bound {
            return Ok(false);
        }
        let var = self.kernel.oracle.new_var();
        let aggregate = Aggregate::guarded(
            Literal::negative(var),
            self.kernel.orig_lits.clone(),
            model_cost - 1,
        );
        if !self.kernel.add_aggregate(&aggregate)? {
            self.var_id = None;
            return Ok(false);
        }
        self.aggregate = Some(aggregate);
        self.var_id = Some(var);
        Ok(true)
    }

    /// Makes the optimal cost of the level permanent. Returns `true` iff the
    /// level is solved to optimality and the oracle accepted the bound.
    pub fn completed_level(&mut self) -> anyhow::Result<bool> {
        if self.kernel.lower_bound != self.kernel.upper_bound {
            return Ok(false);
        }
        let aggregate = Aggregate::new(self.kernel.orig_lits.clone(), self.kernel.upper_bound);
        let accepted = self.kernel.add_aggregate(&aggregate)?;
        self.var_id = None;
        Ok(accepted)
    }

    /// Closes a level where the best model is optimal
    pub(super) fn close_level(&mut self) -> anyhow::Result<Outcome> {
        if self.completed_level()? {
            Ok(Outcome::OptimumFound)
        } else {
            Ok(Outcome::OptimumFoundStop)
        }
    }

    /// Pure model-guided branch and bound
    fn model_guided(&mut self) -> anyhow::Result<Outcome> {
        self.kernel.log_routine_start("model-guided")?;
        let res = loop {
            self.kernel.set_and_update_heuristic_values();
            self.kernel.stats.n_iterations += 1;
            match self.bb()? {
                StepOutcome::Unresolved => continue,
                res => break res,
            }
        };
        self.kernel.log_routine_end()?;
        match res {
            StepOutcome::Interrupted => Ok(Outcome::Interrupted),
            StepOutcome::Incoherent => Ok(Outcome::Incoherent),
            _ => self.close_level(),
        }
    }
}

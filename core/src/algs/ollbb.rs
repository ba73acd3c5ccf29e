//! # OLL/BB Search Loop
//!
//! Alternates core-guided lower bounding (OLL) with model-guided branch and
//! bound (BB) until the bounds meet. Even iterations run OLL, odd iterations
//! run BB.

use std::fmt;

use crate::{
    oracle::{Oracle, SolveResult},
    Outcome, Phase,
};

use super::opt::Opt;

/// The result of a single OLL or BB step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The best model is proven optimal
    OptimumFound,
    /// No further refinement is possible
    Incoherent,
    /// The search engine was interrupted
    Interrupted,
    /// The step budget was exhausted
    Unresolved,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::OptimumFound => write!(f, "optimum found"),
            StepOutcome::Incoherent => write!(f, "incoherent"),
            StepOutcome::Interrupted => write!(f, "interrupted"),
            StepOutcome::Unresolved => write!(f, "unresolved"),
        }
    }
}

impl<O> Opt<O>
where
    O: Oracle,
{
    /// The main loop alternating OLL and BB steps
    pub(super) fn oll_bb(&mut self) -> anyhow::Result<Outcome> {
        self.kernel.log_routine_start("oll-bb")?;
        let mut iteration = 0usize;
        let outcome = loop {
            self.kernel.set_and_update_heuristic_values();
            self.kernel.stats.n_iterations += 1;
            let res = if iteration % 2 == 0 {
                self.oll()?
            } else {
                self.bb()?
            };
            iteration += 1;

            if res == StepOutcome::Interrupted {
                break Outcome::Interrupted;
            }
            if self.kernel.lower_bound == self.kernel.upper_bound
                || res == StepOutcome::OptimumFound
            {
                break self.close_level()?;
            }
            if res == StepOutcome::Incoherent {
                if self.kernel.n_level_models == 0 {
                    break Outcome::Incoherent;
                }
                break self.close_level()?;
            }
        };
        self.kernel.log_routine_end()?;
        Ok(outcome)
    }

    /// Model-guided branch and bound. Every model tightens the bounding
    /// aggregate until no better model exists.
    pub fn bb(&mut self) -> anyhow::Result<StepOutcome> {
        self.kernel.log_routine_start("bb")?;
        self.kernel.stats.n_bb_steps += 1;
        self.kernel.oracle.unroll_to_zero();
        self.kernel.assumptions.clear();
        let guard = self.assumption_to_add();
        if !guard.is_null() {
            self.kernel.assumptions.push(guard);
        }
        self.kernel.oracle.set_compute_unsat_cores(false);

        let mut step_models = 0;
        let mut rejected = false;
        let mut res = self.kernel.solve_with_assumptions()?;
        while res == SolveResult::Coherent {
            let cost = self.kernel.oracle.cost_of_model(self.kernel.level);
            self.kernel.found_model(cost, Phase::BranchAndBound)?;
            step_models += 1;
            if self.kernel.upper_bound == self.kernel.lower_bound
                || self.kernel.upper_bound == 0
                || self.kernel.oracle.decision_level() == 0
            {
                break;
            }
            if !self.update_optimization_aggregate(cost)? {
                rejected = true;
                break;
            }
            self.kernel.assumptions.clear();
            self.kernel.assumptions.push(self.assumption_to_add());
            if self
                .kernel
                .opts
                .bb_models_per_step
                .is_some_and(|max| step_models >= max)
            {
                self.kernel.log_routine_end()?;
                return Ok(StepOutcome::Unresolved);
            }
            res = self.kernel.solve_with_assumptions()?;
        }
        self.kernel.log_routine_end()?;

        if res == SolveResult::Interrupted {
            return Ok(StepOutcome::Interrupted);
        }
        if res == SolveResult::Incoherent && self.kernel.n_level_models == 0 {
            return Ok(StepOutcome::Incoherent);
        }
        if rejected {
            // Nothing excludes the remaining models, the bounds stay apart
            self.kernel.log_message("bounding aggregate rejected")?;
            return Ok(StepOutcome::OptimumFound);
        }
        // Exhaustion under the tightest bound proves the best model optimal
        self.kernel.prove_optimal()?;
        Ok(StepOutcome::OptimumFound)
    }

    /// Core-guided lower bounding. Relaxes cores until the assumptions are
    /// satisfiable, the resulting model is optimal.
    pub fn oll(&mut self) -> anyhow::Result<StepOutcome> {
        self.kernel.log_routine_start("oll")?;
        self.kernel.stats.n_oll_steps += 1;
        self.kernel.oracle.unroll_to_zero();
        self.kernel.assumptions.clear();
        self.kernel.oracle.set_compute_unsat_cores(true);
        self.kernel.compute_assumptions();

        let mut step_cores = 0;
        let mut res = self.kernel.solve_with_assumptions()?;
        while res == SolveResult::Incoherent {
            if !self.kernel.found_unsat()? {
                self.kernel.log_routine_end()?;
                return Ok(StepOutcome::Incoherent);
            }
            step_cores += 1;
            self.kernel.compute_assumptions();
            if self
                .kernel
                .opts
                .oll_cores_per_step
                .is_some_and(|max| step_cores >= max)
            {
                self.kernel.log_routine_end()?;
                return Ok(StepOutcome::Unresolved);
            }
            res = self.kernel.solve_with_assumptions()?;
        }
        self.kernel.log_routine_end()?;

        if res == SolveResult::Interrupted {
            return Ok(StepOutcome::Interrupted);
        }
        let cost = self.kernel.oracle.cost_of_model(self.kernel.level);
        self.kernel.found_model(cost, Phase::Oll)?;
        debug_assert_eq!(
            self.kernel.lower_bound, self.kernel.upper_bound,
            "model under all assumptions must be optimal"
        );
        Ok(StepOutcome::OptimumFound)
    }
}

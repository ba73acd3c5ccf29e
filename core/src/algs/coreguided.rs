//! # Core-Guided Search Functionality
//!
//! OLL core relaxation on the working objective. Each core raises the lower
//! bound by its minimum weight and introduces outputs counting how many of
//! its literals are true beyond the first.

use itertools::Itertools;

use crate::{
    oracle::{Aggregate, Oracle},
    types::Literal,
};

use super::Kernel;

impl<O> Kernel<O>
where
    O: Oracle,
{
    /// Processes the core of the last incoherent oracle call. Returns `false`
    /// if no refinement is possible: the core is empty (the problem is
    /// incoherent without assumptions), it contains no objective literal, or
    /// the oracle rejects an aggregate.
    pub(super) fn found_unsat(&mut self) -> anyhow::Result<bool> {
        let core = self.oracle.unsat_core();
        if core.is_empty() {
            return Ok(false);
        }
        let entries: Vec<usize> = core
            .iter()
            .filter_map(|&l| self.obj.entry_of_assumption(l))
            .filter(|&idx| self.obj.get(idx).weight > 0)
            .unique()
            .collect();
        let Some(weight) = entries.iter().map(|&idx| self.obj.get(idx).weight).min() else {
            return Ok(false);
        };
        self.log_core(weight, entries.len())?;
        self.raise_lower_bound(weight)?;
        for &idx in &entries {
            self.obj.decrease(idx, weight);
        }
        if entries.len() == 1 {
            return Ok(true);
        }
        let core_lits: Vec<(Literal, u64)> = entries
            .iter()
            .map(|&idx| (self.obj.get(idx).lit, 1))
            .collect();
        for bound in 1..entries.len() {
            // ¬o_k => at most k core literals are true
            let output = self.oracle.new_var();
            let agg = Aggregate::guarded(
                Literal::negative(output),
                core_lits.clone(),
                bound as u64,
            );
            if !self.add_aggregate(&agg)? {
                return Ok(false);
            }
            self.obj.push(Literal::positive(output), weight);
        }
        Ok(true)
    }
}

//! # Combined Heuristic
//!
//! Runs a sequence of domain heuristics one after the other and falls back to
//! a native heuristic once all of them have been abandoned. The active domain
//! heuristic is abandoned when it abstains or when the switch statistic
//! reaches 100. The cursor only moves forward.

use crate::{
    options::SwitchPolicy,
    types::{Literal, Var},
};

use super::{DomainHeuristic, Heuristic, HeuristicKind, MinisatHeuristic, SearchView};

/// The value of the switch statistic at which the active heuristic is left
const SWITCH_AT: f64 = 100.;

/// A sequence of domain heuristics with a fallback
pub struct CombinedHeuristic {
    fallback: Box<dyn Heuristic>,
    heuristics: Vec<Box<dyn Heuristic>>,
    index: usize,
    policy: SwitchPolicy,
}

impl Default for CombinedHeuristic {
    fn default() -> Self {
        Self::new(SwitchPolicy::default())
    }
}

impl CombinedHeuristic {
    /// Creates a combined heuristic with the activity heuristic as fallback
    pub fn new(policy: SwitchPolicy) -> Self {
        Self::with_fallback(Box::new(MinisatHeuristic::default()), policy)
    }

    /// Creates a combined heuristic with a given fallback
    pub fn with_fallback(fallback: Box<dyn Heuristic>, policy: SwitchPolicy) -> Self {
        CombinedHeuristic {
            fallback,
            heuristics: vec![],
            index: 0,
            policy,
        }
    }

    /// Appends a domain heuristic to the sequence
    pub fn add_heuristic(&mut self, heuristic: Box<dyn Heuristic>) {
        self.heuristics.push(heuristic);
    }

    /// Appends a domain heuristic by its (case-insensitive) name. Returns
    /// `false` and adds nothing if the name is unknown.
    pub fn add_heuristic_by_name(&mut self, name: &str) -> bool {
        match name.parse::<HeuristicKind>() {
            Ok(kind) => {
                self.heuristics.push(Box::new(DomainHeuristic::new(kind)));
                true
            }
            Err(_) => false,
        }
    }

    /// The position of the active domain heuristic. Equal to [`Self::len`]
    /// once only the fallback is consulted.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The number of domain heuristics
    pub fn len(&self) -> usize {
        self.heuristics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heuristics.is_empty()
    }

    pub fn policy(&self) -> SwitchPolicy {
        self.policy
    }

    fn active(&mut self) -> Option<&mut Box<dyn Heuristic>> {
        self.heuristics.get_mut(self.index)
    }

    fn switch_statistic(&self, view: &dyn SearchView) -> f64 {
        match self.policy {
            SwitchPolicy::RestartRatio => {
                let choices = view.n_choices();
                if choices == 0 {
                    return 0.;
                }
                view.n_restarts() as f64 / choices as f64
            }
            SwitchPolicy::Threshold => self.threshold() as f64,
        }
    }
}

impl Heuristic for CombinedHeuristic {
    fn on_new_variable(&mut self, var: Var) {
        self.fallback.on_new_variable(var);
        for heur in &mut self.heuristics {
            heur.on_new_variable(var);
        }
    }

    fn on_new_variable_runtime(&mut self, var: Var) {
        self.fallback.on_new_variable_runtime(var);
        for heur in &mut self.heuristics {
            heur.on_new_variable_runtime(var);
        }
    }

    fn on_literal_involved_in_conflict(&mut self, lit: Literal) {
        if let Some(heur) = self.active() {
            heur.on_literal_involved_in_conflict(lit);
        }
        self.fallback.on_literal_involved_in_conflict(lit);
    }

    fn on_unrolling_variable(&mut self, var: Var) {
        self.fallback.on_unrolling_variable(var);
        for heur in &mut self.heuristics {
            heur.on_unrolling_variable(var);
        }
    }

    fn increment_heuristic_values(&mut self, var: Var) {
        if let Some(heur) = self.active() {
            heur.increment_heuristic_values(var);
        }
        self.fallback.increment_heuristic_values(var);
    }

    fn simplify_variables_at_level_zero(&mut self, view: &dyn SearchView) {
        self.fallback.simplify_variables_at_level_zero(view);
        for heur in &mut self.heuristics {
            heur.simplify_variables_at_level_zero(view);
        }
    }

    fn conflict_occurred(&mut self) {
        if let Some(heur) = self.active() {
            heur.conflict_occurred();
        }
        self.fallback.conflict_occurred();
    }

    fn make_a_choice(&mut self, view: &dyn SearchView) -> Literal {
        if self.index < self.heuristics.len() && self.switch_statistic(view) >= SWITCH_AT {
            self.index += 1;
        }
        while self.index < self.heuristics.len() {
            let lit = self.heuristics[self.index].make_a_choice(view);
            if !lit.is_null() {
                return lit;
            }
            self.index += 1;
        }
        self.fallback.make_a_choice(view)
    }

    fn threshold(&self) -> u32 {
        match self.heuristics.get(self.index) {
            Some(heur) => heur.threshold(),
            None => self.fallback.threshold(),
        }
    }

    fn on_finished_parsing(&mut self, view: &dyn SearchView) {
        self.fallback.on_finished_parsing(view);
        for heur in &mut self.heuristics {
            heur.on_finished_parsing(view);
        }
    }
}

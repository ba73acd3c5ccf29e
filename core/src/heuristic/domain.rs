//! # Domain Heuristics
//!
//! A domain heuristic follows a fixed preference order of decision literals,
//! as produced by a domain-specific encoding (partner units, graph colouring,
//! bin packing). It abstains once the order is exhausted. Its threshold grows
//! with the number of conflicts it ran into relative to its conflict budget.

use std::collections::HashMap;

use crate::types::{Literal, Var};

use super::{Heuristic, HeuristicKind, SearchView};

impl HeuristicKind {
    /// The default number of conflicts a heuristic of this kind may cause
    /// before it signals that it should be abandoned
    pub fn default_conflict_budget(self) -> u64 {
        match self {
            HeuristicKind::Pup => 1000,
            HeuristicKind::Colouring => 500,
            HeuristicKind::BinPacking => 2000,
        }
    }
}

/// A domain heuristic following a preference order
#[derive(Debug)]
pub struct DomainHeuristic {
    kind: HeuristicKind,
    /// Whether the order was given by the domain encoding
    fixed_order: bool,
    order: Vec<Literal>,
    position: HashMap<Var, usize>,
    cursor: usize,
    conflicts: u64,
    budget: u64,
}

impl DomainHeuristic {
    /// Creates a heuristic that prefers the positive literals of all
    /// variables in order of creation
    pub fn new(kind: HeuristicKind) -> Self {
        DomainHeuristic {
            kind,
            fixed_order: false,
            order: vec![],
            position: HashMap::new(),
            cursor: 0,
            conflicts: 0,
            budget: kind.default_conflict_budget(),
        }
    }

    /// Creates a heuristic with an explicit preference order
    pub fn with_order(kind: HeuristicKind, order: Vec<Literal>) -> Self {
        let mut heur = Self::new(kind);
        heur.set_order(order);
        heur.fixed_order = true;
        heur
    }

    /// Sets the conflict budget
    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = budget.max(1);
        self
    }

    pub fn kind(&self) -> HeuristicKind {
        self.kind
    }

    fn set_order(&mut self, order: Vec<Literal>) {
        self.position.clear();
        self.order = Vec::with_capacity(order.len());
        for lit in order {
            if self.position.contains_key(&lit.var()) {
                continue;
            }
            self.position.insert(lit.var(), self.order.len());
            self.order.push(lit);
        }
        self.cursor = 0;
    }

    fn register(&mut self, var: Var) {
        if self.fixed_order || self.position.contains_key(&var) {
            return;
        }
        self.position.insert(var, self.order.len());
        self.order.push(Literal::positive(var));
    }
}

impl Heuristic for DomainHeuristic {
    fn on_new_variable(&mut self, var: Var) {
        self.register(var);
    }

    fn on_new_variable_runtime(&mut self, _var: Var) {}

    fn on_literal_involved_in_conflict(&mut self, _lit: Literal) {}

    fn on_unrolling_variable(&mut self, var: Var) {
        if let Some(&pos) = self.position.get(&var) {
            if pos < self.cursor {
                self.cursor = pos;
            }
        }
    }

    fn increment_heuristic_values(&mut self, _var: Var) {}

    fn simplify_variables_at_level_zero(&mut self, _view: &dyn SearchView) {}

    fn conflict_occurred(&mut self) {
        self.conflicts += 1;
    }

    fn make_a_choice(&mut self, view: &dyn SearchView) -> Literal {
        while self.cursor < self.order.len() {
            let lit = self.order[self.cursor];
            self.cursor += 1;
            if view.is_undefined(lit.var()) {
                return lit;
            }
        }
        Literal::NULL
    }

    fn threshold(&self) -> u32 {
        let pct = self.conflicts.saturating_mul(100) / self.budget;
        u32::try_from(pct).unwrap_or(u32::MAX)
    }

    fn on_finished_parsing(&mut self, view: &dyn SearchView) {
        for var in 1..=view.n_vars() {
            self.register(var);
        }
    }
}

//! # Variable Activity Heuristic
//!
//! VSIDS-style fallback heuristic. It chooses the most active undefined
//! variable, negatively, and therefore never abstains while an undefined
//! variable exists.

use crate::types::{Literal, Var};

use super::{Heuristic, SearchView};

const RESCALE_LIMIT: f64 = 1e100;

/// A max-heap over variables ordered by activity, with positions tracked so
/// that activities can be increased in place
#[derive(Debug, Default)]
struct ActivityHeap {
    activity: Vec<f64>,
    position: Vec<Option<usize>>,
    heap: Vec<Var>,
}

impl ActivityHeap {
    fn grow(&mut self, var: Var) {
        let idx = var as usize;
        if self.activity.len() <= idx {
            self.activity.resize(idx + 1, 0.0);
            self.position.resize(idx + 1, None);
        }
    }

    fn contains(&self, var: Var) -> bool {
        self.position
            .get(var as usize)
            .is_some_and(|pos| pos.is_some())
    }

    fn activity(&self, var: Var) -> f64 {
        self.activity[var as usize]
    }

    fn insert(&mut self, var: Var) {
        self.grow(var);
        if self.contains(var) {
            return;
        }
        let pos = self.heap.len();
        self.heap.push(var);
        self.position[var as usize] = Some(pos);
        self.sift_up(pos);
    }

    fn pop_max(&mut self) -> Option<Var> {
        if self.heap.is_empty() {
            return None;
        }
        let max = self.heap.swap_remove(0);
        self.position[max as usize] = None;
        if !self.heap.is_empty() {
            self.position[self.heap[0] as usize] = Some(0);
            self.sift_down(0);
        }
        Some(max)
    }

    fn increase(&mut self, var: Var, by: f64) {
        self.grow(var);
        self.activity[var as usize] += by;
        if let Some(pos) = self.position[var as usize] {
            self.sift_up(pos);
        }
    }

    fn scale_all(&mut self, factor: f64) {
        self.activity.iter_mut().for_each(|a| *a *= factor);
    }

    fn rebuild<I: IntoIterator<Item = Var>>(&mut self, vars: I) {
        for var in self.heap.drain(..) {
            self.position[var as usize] = None;
        }
        for var in vars {
            self.insert(var);
        }
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.activity(self.heap[a]) < self.activity(self.heap[b])
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.position[self.heap[a] as usize] = Some(a);
        self.position[self.heap[b] as usize] = Some(b);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less(parent, pos) {
                break;
            }
            self.swap(parent, pos);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut largest = pos;
            if left < self.heap.len() && self.less(largest, left) {
                largest = left;
            }
            if right < self.heap.len() && self.less(largest, right) {
                largest = right;
            }
            if largest == pos {
                break;
            }
            self.swap(pos, largest);
            pos = largest;
        }
    }
}

/// The native fallback heuristic
#[derive(Debug)]
pub struct MinisatHeuristic {
    heap: ActivityHeap,
    bump: f64,
    decay: f64,
}

impl Default for MinisatHeuristic {
    fn default() -> Self {
        Self::new(0.95)
    }
}

impl MinisatHeuristic {
    /// Creates the heuristic with a given activity decay factor
    pub fn new(decay: f64) -> Self {
        debug_assert!(decay > 0.0 && decay <= 1.0);
        MinisatHeuristic {
            heap: ActivityHeap::default(),
            bump: 1.0,
            decay,
        }
    }

    /// Gets the current activity of a variable
    pub fn activity(&self, var: Var) -> f64 {
        self.heap.activity.get(var as usize).copied().unwrap_or(0.0)
    }

    fn bump_var(&mut self, var: Var) {
        self.heap.increase(var, self.bump);
        if self.heap.activity(var) > RESCALE_LIMIT {
            self.heap.scale_all(1.0 / RESCALE_LIMIT);
            self.bump /= RESCALE_LIMIT;
        }
    }
}

impl Heuristic for MinisatHeuristic {
    fn on_new_variable(&mut self, var: Var) {
        self.heap.insert(var);
    }

    fn on_new_variable_runtime(&mut self, var: Var) {
        self.heap.insert(var);
    }

    fn on_literal_involved_in_conflict(&mut self, lit: Literal) {
        self.bump_var(lit.var());
    }

    fn on_unrolling_variable(&mut self, var: Var) {
        self.heap.insert(var);
    }

    fn increment_heuristic_values(&mut self, var: Var) {
        self.bump_var(var);
    }

    fn simplify_variables_at_level_zero(&mut self, view: &dyn SearchView) {
        let undefined: Vec<Var> = self
            .heap
            .heap
            .iter()
            .copied()
            .filter(|&v| view.is_undefined(v))
            .collect();
        self.heap.rebuild(undefined);
    }

    fn conflict_occurred(&mut self) {
        self.bump /= self.decay;
    }

    fn make_a_choice(&mut self, view: &dyn SearchView) -> Literal {
        while let Some(var) = self.heap.pop_max() {
            if view.is_undefined(var) {
                return Literal::negative(var);
            }
        }
        Literal::NULL
    }

    fn threshold(&self) -> u32 {
        0
    }

    fn on_finished_parsing(&mut self, view: &dyn SearchView) {
        for var in 1..=view.n_vars() {
            self.heap.insert(var);
        }
        debug_assert!(self.heap.len() >= view.n_vars() as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::MinisatHeuristic;
    use crate::{
        heuristic::{tests::View, Heuristic},
        types::Literal,
    };

    fn setup(n_vars: u32) -> (MinisatHeuristic, View) {
        let mut heur = MinisatHeuristic::default();
        let view = View::new(n_vars);
        for var in 1..=n_vars {
            heur.on_new_variable(var);
        }
        heur.on_finished_parsing(&view);
        (heur, view)
    }

    #[test]
    fn chooses_most_active_negatively() {
        let (mut heur, view) = setup(4);
        heur.increment_heuristic_values(3);
        heur.on_literal_involved_in_conflict(Literal::positive(3));
        heur.increment_heuristic_values(2);
        assert_eq!(heur.make_a_choice(&view), Literal::negative(3));
        assert_eq!(heur.make_a_choice(&view), Literal::negative(2));
    }

    #[test]
    fn skips_assigned_and_exhausts() {
        let (mut heur, mut view) = setup(3);
        view.assigned = vec![1, 3];
        assert_eq!(heur.make_a_choice(&view), Literal::negative(2));
        assert!(heur.make_a_choice(&view).is_null());
    }

    #[test]
    fn unrolling_reinserts() {
        let (mut heur, view) = setup(2);
        heur.increment_heuristic_values(1);
        assert_eq!(heur.make_a_choice(&view), Literal::negative(1));
        heur.on_unrolling_variable(1);
        assert_eq!(heur.make_a_choice(&view), Literal::negative(1));
    }

    #[test]
    fn decay_favours_recent_conflicts() {
        let (mut heur, view) = setup(2);
        heur.increment_heuristic_values(1);
        heur.conflict_occurred();
        heur.increment_heuristic_values(2);
        assert!(heur.activity(2) > heur.activity(1));
        assert_eq!(heur.make_a_choice(&view), Literal::negative(2));
    }

    #[test]
    fn rescales_large_activities() {
        let (mut heur, _) = setup(2);
        heur.bump = 1e101;
        heur.increment_heuristic_values(1);
        assert!(heur.activity(1) <= 1e100);
        assert!(heur.activity(1) > heur.activity(2));
    }

    #[test]
    fn simplify_drops_assigned() {
        let (mut heur, mut view) = setup(3);
        view.assigned = vec![2];
        heur.simplify_variables_at_level_zero(&view);
        assert_eq!(heur.heap.len(), 2);
        assert_eq!(heur.threshold(), 0);
    }

    #[test]
    fn runtime_variables() {
        let (mut heur, mut view) = setup(1);
        view.n_vars = 2;
        heur.on_new_variable_runtime(2);
        heur.increment_heuristic_values(2);
        assert_eq!(heur.make_a_choice(&view), Literal::negative(2));
    }
}

//! Search engines for testing. [`SatOracle`] drives CaDiCaL through
//! `rustsat` and reads MCNF instances, objective `k` becoming level `k`.
//! [`Faulty`] wraps it to inject interrupts, rejected aggregates and a fixed
//! decision level.

#![allow(dead_code)]

use std::{collections::BTreeMap, ops::Deref, path::Path};

use rustsat::{
    encodings::pb::{self, BoundUpper},
    instances::{BasicVarManager, ManageVars, MultiOptInstance},
    solvers::{FreezeVar, PhaseLit, Solve, SolveIncremental, SolverResult},
    types::{Clause, Lit},
};
use rustsat_cadical::CaDiCaL;
use weakopt_core::{
    oracle::{Aggregate, Oracle, SolveResult},
    types::{Literal, Sign, Var},
};

fn to_rs(lit: Literal) -> Lit {
    Lit::new(lit.var() - 1, lit.is_negative())
}

fn from_rs(lit: Lit) -> Literal {
    let sign = if lit.is_neg() {
        Sign::Negative
    } else {
        Sign::Positive
    };
    Literal::new(lit.var().idx32() + 1, sign)
}

pub struct SatOracle {
    solver: CaDiCaL<'static, 'static>,
    var_manager: BasicVarManager,
    /// Number of variables of the instance itself
    n_base: u32,
    hards: Vec<Clause>,
    levels: BTreeMap<usize, Vec<(Literal, u64)>>,
    model: Vec<Literal>,
    values: Vec<bool>,
    core: Vec<Literal>,
    compute_cores: bool,
    aggregates: Vec<Aggregate>,
    /// Assumptions of every call
    pub calls: Vec<Vec<Literal>>,
    /// Literals passed to `prefer_literal`
    pub preferred: Vec<(Literal, u64)>,
    pub simplifications_off: bool,
    pub n_unrolls: usize,
    pub sorted_levels: Vec<usize>,
}

impl SatOracle {
    pub fn from_instance(inst: MultiOptInstance) -> anyhow::Result<Self> {
        let (constr, objs) = inst.decompose();
        let (cnf, mut var_manager) = constr.into_cnf();
        let mut solver = CaDiCaL::default();
        let mut hards = vec![];
        let mut levels = BTreeMap::new();
        for (idx, obj) in objs.into_iter().enumerate() {
            let (soft_cls, _) = obj.into_soft_cls();
            let mut lits = vec![];
            for (mut cl, w) in soft_cls {
                if cl.len() == 1 {
                    lits.push((!cl[0], w));
                    continue;
                }
                // Relax non-unit soft clauses
                let blit = var_manager.new_var().pos_lit();
                lits.push((blit, w));
                cl.add(blit);
                hards.push(cl);
            }
            let lits: Vec<(Literal, u64)> = lits
                .into_iter()
                .map(|(l, w)| (from_rs(l), w as u64))
                .collect();
            levels.insert(idx + 1, lits);
        }
        hards.extend(cnf);
        if let Some(max) = var_manager.max_var() {
            solver.reserve(max)?;
        }
        for cl in &hards {
            solver.add_clause(cl.clone())?;
        }
        let n_base = var_manager.n_used();
        Ok(SatOracle {
            solver,
            var_manager,
            n_base,
            hards,
            levels,
            model: vec![],
            values: vec![],
            core: vec![],
            compute_cores: false,
            aggregates: vec![],
            calls: vec![],
            preferred: vec![],
            simplifications_off: false,
            n_unrolls: 0,
            sorted_levels: vec![],
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
        let inst = MultiOptInstance::from_dimacs_path(path).expect("failed to parse instance");
        Self::from_instance(inst).expect("failed to load instance")
    }

    pub fn levels(&self) -> Vec<usize> {
        self.levels.keys().copied().collect()
    }

    pub fn n_base(&self) -> u32 {
        self.n_base
    }

    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    /// Whether a model restricted to the instance variables satisfies all
    /// hard clauses
    pub fn satisfies(&self, model: &[Literal]) -> bool {
        let vals = self.assignment(model);
        self.hards.iter().all(|cl| {
            cl.iter()
                .any(|&l| vals.get(l.var().idx()).copied().flatten() == Some(l.is_pos()))
        })
    }

    /// Cost of a model at a level
    pub fn cost_of(&self, model: &[Literal], level: usize) -> u64 {
        let vals = self.assignment(model);
        self.levels.get(&level).map_or(0, |lits| {
            lits.iter()
                .filter(|(l, _)| {
                    vals.get(l.var() as usize - 1).copied().flatten() == Some(l.is_positive())
                })
                .map(|(_, w)| w)
                .sum()
        })
    }

    fn assignment(&self, model: &[Literal]) -> Vec<Option<bool>> {
        let mut vals = vec![None; self.n_base as usize];
        for l in model {
            if let Some(val) = vals.get_mut(l.var() as usize - 1) {
                *val = Some(l.is_positive());
            }
        }
        vals
    }

    fn is_true(&self, lit: Literal) -> bool {
        self.values.get(lit.var() as usize) == Some(&lit.is_positive())
    }

    fn store_model(&mut self) {
        let n_vars = self.n_vars();
        let sol = self
            .solver
            .solution(rustsat::types::Var::new(n_vars - 1))
            .expect("no solution after coherent call");
        self.values = vec![false; n_vars as usize + 1];
        self.model = sol.into_iter().map(from_rs).collect();
        for l in &self.model {
            self.values[l.var() as usize] = l.is_positive();
        }
    }
}

impl Oracle for SatOracle {
    fn turn_off_simplifications(&mut self) {
        self.simplifications_off = true;
        for lits in self.levels.values() {
            for (l, _) in lits {
                self.solver
                    .freeze_var(to_rs(*l).var())
                    .expect("failed to freeze variable");
            }
        }
    }

    fn n_vars(&self) -> u32 {
        self.var_manager.n_used()
    }

    fn new_var(&mut self) -> Var {
        let var = self.var_manager.new_var();
        self.solver.reserve(var).expect("failed to reserve variable");
        var.idx32() + 1
    }

    fn add_clause(&mut self, clause: &[Literal]) -> bool {
        let cl: Clause = clause.iter().map(|&l| to_rs(l)).collect();
        self.solver.add_clause(cl).is_ok()
    }

    /// Encodes the aggregate with a generalized totalizer. The guard implies
    /// each literal enforcing the bound.
    fn add_aggregate(&mut self, aggregate: &Aggregate) -> bool {
        let mut enc: pb::GeneralizedTotalizer = aggregate
            .lits
            .iter()
            .map(|&(l, w)| (to_rs(l), w as usize))
            .collect();
        let bound = aggregate.bound as usize;
        enc.encode_ub(bound..bound + 1, &mut self.solver, &mut self.var_manager);
        let Ok(enforce) = enc.enforce_ub(bound) else {
            return false;
        };
        for a in enforce {
            let cl: Clause = match aggregate.guard {
                Some(guard) => [!to_rs(guard), a].into_iter().collect(),
                None => [a].into_iter().collect(),
            };
            if self.solver.add_clause(cl).is_err() {
                return false;
            }
        }
        self.aggregates.push(aggregate.clone());
        true
    }

    fn optimization_lits(&self, level: usize) -> Vec<(Literal, u64)> {
        self.levels.get(&level).cloned().unwrap_or_default()
    }

    fn sort_optimization_lits(&mut self, level: usize) {
        self.sorted_levels.push(level);
        if let Some(lits) = self.levels.get_mut(&level) {
            lits.sort_by(|(_, w1), (_, w2)| w2.cmp(w1));
        }
    }

    fn unroll_to_zero(&mut self) {
        self.n_unrolls += 1;
    }

    fn set_compute_unsat_cores(&mut self, compute: bool) {
        self.compute_cores = compute;
    }

    fn solve(&mut self) -> SolveResult {
        self.solve_assumps(&[])
    }

    fn solve_assumps(&mut self, assumps: &[Literal]) -> SolveResult {
        self.calls.push(assumps.to_vec());
        self.core.clear();
        let rs_assumps: Vec<Lit> = assumps.iter().map(|&l| to_rs(l)).collect();
        match self
            .solver
            .solve_assumps(&rs_assumps)
            .expect("solver call failed")
        {
            SolverResult::Sat => {
                self.store_model();
                SolveResult::Coherent
            }
            SolverResult::Unsat => {
                if self.compute_cores {
                    let core = self.solver.core().expect("failed to get core");
                    self.core = core.into_iter().map(|l| from_rs(!l)).collect();
                }
                SolveResult::Incoherent
            }
            SolverResult::Interrupted => SolveResult::Interrupted,
        }
    }

    fn unsat_core(&self) -> Vec<Literal> {
        self.core.clone()
    }

    fn model(&self) -> Vec<Literal> {
        self.model.clone()
    }

    fn cost_of_model(&self, level: usize) -> u64 {
        self.levels.get(&level).map_or(0, |lits| {
            lits.iter()
                .filter(|(l, _)| self.is_true(*l))
                .map(|(_, w)| w)
                .sum()
        })
    }

    /// CaDiCaL does not expose its trail, models are never reported at the
    /// root
    fn decision_level(&self) -> u32 {
        1
    }

    fn n_restarts(&self) -> u64 {
        0
    }

    fn n_choices(&self) -> u64 {
        self.calls.len() as u64
    }

    fn prefer_literal(&mut self, lit: Literal, weight: u64) {
        self.preferred.push((lit, weight));
        self.solver
            .phase_lit(to_rs(lit))
            .expect("failed to phase literal");
    }
}

/// Which aggregates [`Faulty`] refuses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reject {
    Never,
    All,
    /// Guarded aggregates added while cores are off, i.e. branch-and-bound
    /// bounds
    Bounding,
    /// Aggregates added while cores are on, once a bound was accepted
    CoresAfterBounding,
}

/// Fault injection around [`SatOracle`]
pub struct Faulty {
    inner: SatOracle,
    /// The decision level reported after a call
    pub decision_level: Option<u32>,
    pub reject: Reject,
    /// Number of calls after which every call is interrupted
    pub interrupt_after: Option<usize>,
    n_calls: usize,
    cores_on: bool,
    bounded: bool,
}

impl Faulty {
    pub fn new(inner: SatOracle) -> Self {
        Faulty {
            inner,
            decision_level: None,
            reject: Reject::Never,
            interrupt_after: None,
            n_calls: 0,
            cores_on: false,
            bounded: false,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
        Self::new(SatOracle::from_file(path))
    }

    fn rejects(&self, aggregate: &Aggregate) -> bool {
        match self.reject {
            Reject::Never => false,
            Reject::All => true,
            Reject::Bounding => !self.cores_on && aggregate.guard.is_some(),
            Reject::CoresAfterBounding => self.cores_on && self.bounded,
        }
    }
}

impl Deref for Faulty {
    type Target = SatOracle;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Oracle for Faulty {
    fn turn_off_simplifications(&mut self) {
        self.inner.turn_off_simplifications();
    }

    fn n_vars(&self) -> u32 {
        self.inner.n_vars()
    }

    fn new_var(&mut self) -> Var {
        self.inner.new_var()
    }

    fn add_clause(&mut self, clause: &[Literal]) -> bool {
        self.inner.add_clause(clause)
    }

    fn add_aggregate(&mut self, aggregate: &Aggregate) -> bool {
        if self.rejects(aggregate) {
            return false;
        }
        if !self.cores_on && aggregate.guard.is_some() {
            self.bounded = true;
        }
        self.inner.add_aggregate(aggregate)
    }

    fn optimization_lits(&self, level: usize) -> Vec<(Literal, u64)> {
        self.inner.optimization_lits(level)
    }

    fn sort_optimization_lits(&mut self, level: usize) {
        self.inner.sort_optimization_lits(level);
    }

    fn unroll_to_zero(&mut self) {
        self.inner.unroll_to_zero();
    }

    fn set_compute_unsat_cores(&mut self, compute: bool) {
        self.cores_on = compute;
        self.inner.set_compute_unsat_cores(compute);
    }

    fn solve(&mut self) -> SolveResult {
        self.solve_assumps(&[])
    }

    fn solve_assumps(&mut self, assumps: &[Literal]) -> SolveResult {
        self.n_calls += 1;
        if self
            .interrupt_after
            .is_some_and(|after| self.n_calls > after)
        {
            return SolveResult::Interrupted;
        }
        self.inner.solve_assumps(assumps)
    }

    fn unsat_core(&self) -> Vec<Literal> {
        self.inner.unsat_core()
    }

    fn model(&self) -> Vec<Literal> {
        self.inner.model()
    }

    fn cost_of_model(&self, level: usize) -> u64 {
        self.inner.cost_of_model(level)
    }

    fn decision_level(&self) -> u32 {
        self.decision_level
            .unwrap_or_else(|| self.inner.decision_level())
    }

    fn n_restarts(&self) -> u64 {
        self.inner.n_restarts()
    }

    fn n_choices(&self) -> u64 {
        self.inner.n_choices()
    }

    fn prefer_literal(&mut self, lit: Literal, weight: u64) {
        self.inner.prefer_literal(lit, weight);
    }
}

/*****************************************************************************************[core.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::callbacks::{Callbacks, ProgressStatus},
    crate::clause::{
        self, lbool, CRef, ClauseAllocator, LSet, Lit, Range, VMap, Var, Watcher, Watches,
    },
    crate::interface::SolverInterface,
    crate::proof::{Chain, ProofVisitor, Resolvent},
    std::{
        f64, io, mem,
        ops::IndexMut,
        sync::atomic::{AtomicBool, Ordering},
    },
};

/// The main solver structure.
///
/// A `Solver` object contains the whole state of the SAT solver, including
/// the clause allocator, the trail, the recorded proof, and statistics.
///
/// It is parametrized by `Callbacks`.
pub struct Solver<Cb: Callbacks> {
    // Extra results: (read-only member variable)
    /// If problem is satisfiable, this vector contains the model (if any).
    model: Vec<lbool>,
    /// If problem is unsatisfiable (possibly under assumptions),
    /// this vector represent the final conflict clause expressed in the assumptions.
    conflict: LSet,

    cb: Cb, // the callbacks
    asynch_interrupt: AtomicBool,

    /// List of problem clauses.
    clauses: Vec<CRef>,
    /// List of learnt clauses.
    learnts: Vec<CRef>,

    v: SolverV,
}

/// The current assignments.
struct VarState {
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// Current assignment for each variable.
    ass: VMap<lbool>,
    /// Stores reason and level for each variable.
    vardata: VMap<VarData>,
    /// Amount to bump next variable with.
    var_inc: f64,
    var_decay: f64,

    /// Assignment stack; stores all assigments made in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for different decision levels in `trail`.
    trail_lim: Vec<i32>,
    /// Partition provenance of each level-0 assignment (proof logging only).
    trail_part: VMap<Range>,
}

struct SolverV {
    vars: VarState,

    learntsize_adjust_start_confl: i32,
    learntsize_adjust_inc: f64,
    max_learnts: f64,
    learntsize_adjust_confl: f64,
    learntsize_adjust_cnt: i32,

    remove_satisfied: bool,

    // Statistics: (read-only member variable)
    solves: u64,
    starts: u64,
    decisions: u64,
    rnd_decisions: u64,
    propagations: u64,
    conflicts: u64,
    dec_vars: u64,
    max_literals: u64,
    tot_literals: u64,

    num_clauses: u64,
    num_learnts: u64,
    clauses_literals: u64,
    learnts_literals: u64,

    // Mode of operation:
    clause_decay: f64,
    random_var_freq: f64,
    random_seed: f64,
    luby_restart: bool,
    /// Controls conflict clause minimization (0=none, 1=basic, 2=deep).
    ccmin_mode: i32,
    /// Controls the level of phase saving (0=none, 1=limited, 2=full).
    phase_saving: i32,
    /// Use random polarities for branching heuristics.
    rnd_pol: bool,
    /// Initialize variable activities with a small random value.
    rnd_init_act: bool,
    /// The fraction of wasted memory allowed before a garbage collection is triggered.
    garbage_frac: f64,
    /// Minimum number to set the learnts limit to.
    min_learnts_lim: i32,
    /// Record the resolution proof for later validation and replay.
    log_proof: bool,

    /// The initial restart limit. (default 100)
    restart_first: i32,
    /// The factor with which the restart limit is multiplied in each restart. (default 1.5)
    restart_inc: f64,
    /// The intitial limit for learnt clauses is a factor of the original clauses. (default 1 / 3)
    learntsize_factor: f64,
    /// The limit for learnt clauses is multiplied with this factor each restart. (default 1.1)
    learntsize_inc: f64,

    /// The preferred polarity of each variable.
    polarity: VMap<bool>,
    /// The users preferred polarity of each variable.
    user_pol: VMap<lbool>,
    /// Declares if a variable is eligible for selection in the decision heuristic.
    decision: VMap<bool>,
    /// `watches[lit]` is a list of constraints watching 'lit' (will go there if literal becomes true).
    watches: Watches,
    /// Unassigned variables ordered by activity, for branching.
    order_heap: ActivityHeap,
    /// If `false`, the constraints are already unsatisfiable. No part of the solver state may be used!
    ok: bool,
    /// Amount to bump next clause with.
    cla_inc: f64,
    /// Head of queue (as index into the trail -- no more explicit propagation queue in MiniSat).
    qhead: i32,
    /// Number of top-level assignments since last execution of 'simplify()'.
    simp_db_assigns: i32,
    /// Remaining number of propagations that must be made before next execution of 'simplify()'.
    simp_db_props: i64,
    /// Set by `search()`.
    progress_estimate: f64,

    /// Next variable to be created.
    next_var: Var,
    ca: ClauseAllocator,

    free_vars: Vec<Var>,

    /// Current set of assumptions provided to solve by the user.
    assumptions: Vec<Lit>,

    /// Ordered log of learnt and deleted clauses; the id of a deleted
    /// clause is re-appended with its deletion mark set. Replayed backwards
    /// by `validate` and forwards by `replay`.
    proof: Vec<CRef>,
    /// Partitions of all variables, per input clause membership.
    part_info: VMap<Range>,
    /// Join of the partitions of all input clauses.
    total_part: Range,
    /// Trail index up to which level-0 assignments have been labeled.
    replay_start: usize,
    /// Scratch chain handed to the proof visitor.
    chain_clauses: Vec<CRef>,
    chain_pivots: Vec<Lit>,

    // Temporaries (to reduce allocation overhead). Each variable is prefixed by the method in which it is
    // used, except `seen` wich is used in several places.
    seen: VMap<Seen>,
    minimize_stack: Vec<Lit>,
    analyze_toclear: Vec<Lit>,

    // Resource contraints:
    conflict_budget: i64,
    propagation_budget: i64,
}

// public API
impl<Cb: Callbacks> SolverInterface for Solver<Cb> {
    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var {
        self.v.new_var(upol, dvar)
    }

    fn new_var_default(&mut self) -> Var {
        self.new_var(lbool::UNDEF, true)
    }

    fn var_of_int(&mut self, v_idx: u32) -> Var {
        while v_idx >= self.num_vars() {
            self.new_var_default();
        }
        let var = Var::from_idx(v_idx);
        debug_assert_eq!(var.idx(), v_idx);
        var
    }

    fn set_decision_var(&mut self, v: Var, dvar: bool) {
        self.v.set_decision_var(v, dvar)
    }

    // in the API, we can only add clauses at level 0
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>, part: Range) -> bool {
        debug!("add toplevel clause {:?}", clause);
        debug_assert_eq!(
            self.v.decision_level(),
            0,
            "add clause at non-zero decision level"
        );
        self.add_clause_(clause, part)
    }

    fn solve_limited(&mut self, assumps: &[Lit]) -> lbool {
        self.asynch_interrupt.store(false, Ordering::SeqCst);
        self.v.assumptions.clear();
        self.v.assumptions.extend_from_slice(assumps);
        self.solve_internal()
    }

    #[inline(always)]
    fn simplify(&mut self) -> bool {
        self.simplify_internal()
    }

    fn validate(&mut self) -> bool {
        if !self.v.log_proof || self.v.ok || self.v.proof.is_empty() {
            return false;
        }
        self.v.validate()
    }

    fn replay<V: ProofVisitor>(&mut self, vis: &mut V) -> bool {
        if !self.v.log_proof || self.v.proof.is_empty() {
            return false;
        }
        self.v.replay(vis)
    }

    fn value_var(&self, v: Var) -> lbool {
        self.model
            .get(v.idx() as usize)
            .map_or(lbool::UNDEF, |&v| v)
    }
    fn value_lit(&self, v: Lit) -> lbool {
        self.value_var(v.var()) ^ !v.sign()
    }
    fn get_model(&self) -> &[lbool] {
        &self.model
    }
    fn is_ok(&self) -> bool {
        self.v.ok
    }

    fn num_vars(&self) -> u32 {
        self.v.num_vars()
    }
    fn num_clauses(&self) -> u64 {
        self.v.num_clauses()
    }
    fn num_conflicts(&self) -> u64 {
        self.v.num_conflicts()
    }
    fn num_propagations(&self) -> u64 {
        self.v.num_props()
    }
    fn num_decisions(&self) -> u64 {
        self.v.decisions
    }
    fn num_restarts(&self) -> u64 {
        self.v.starts
    }

    fn value_lvl_0(&self, lit: Lit) -> lbool {
        let mut res = self.v.value_lit(lit);
        if self.v.level(lit.var()) != 0 {
            res = lbool::UNDEF;
        }
        res
    }

    fn print_stats(&self) {
        println!("c restarts              : {}", self.v.starts);
        println!("c conflicts             : {:<12}", self.v.conflicts);
        println!(
            "c decisions             : {:<12}   ({:4.2} % random)",
            self.v.decisions,
            self.v.rnd_decisions as f32 * 100.0 / self.v.decisions as f32
        );
        println!("c propagations          : {:<12}", self.v.propagations);
        println!(
            "c conflict literals     : {:<12}   ({:4.2} % deleted)",
            self.v.tot_literals,
            (self.v.max_literals - self.v.tot_literals) as f64 * 100.0 / self.v.max_literals as f64
        );
    }

    fn unsat_core(&self) -> &[Lit] {
        self.conflict.as_slice()
    }

    fn unsat_core_contains_lit(&self, lit: Lit) -> bool {
        self.conflict.has(lit)
    }

    fn unsat_core_contains_var(&self, v: Var) -> bool {
        let lit = Lit::new(v, true);
        self.unsat_core_contains_lit(lit) || self.unsat_core_contains_lit(!lit)
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        self.v.vars.proved_at_lvl_0()
    }
}

impl<Cb: Callbacks + Default> Default for Solver<Cb> {
    fn default() -> Self {
        Solver::new(SolverOpts::default(), Default::default())
    }
}

impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given options and callbacks
    pub fn new(opts: SolverOpts, cb: Cb) -> Self {
        assert!(opts.check());
        Self {
            model: vec![],
            conflict: LSet::new(),
            cb,
            clauses: vec![],
            learnts: vec![],
            asynch_interrupt: AtomicBool::new(false),
            v: SolverV::new(&opts),
        }
    }

    /// Add a clause belonging to the partition range `part`.
    ///
    /// Input clauses typically carry `Range::singleton(p)`. Returns `false`
    /// if the solver is already in an UNSAT state.
    pub fn add_clause(&mut self, lits: &[Lit], part: Range) -> bool {
        let mut v = lits.to_vec();
        self.add_clause_reuse(&mut v, part)
    }

    /// Read-only access to the clause arena, for proof visitors and tools.
    pub fn ca(&self) -> &ClauseAllocator {
        &self.v.ca
    }

    /// The recorded proof: learnt clause ids in order, deletions re-appended.
    pub fn proof(&self) -> &[CRef] {
        &self.v.proof
    }

    /// Reason clause of a variable, or `CRef::UNDEF` for decisions.
    pub fn var_reason(&self, v: Var) -> CRef {
        self.v.reason(v)
    }

    /// Decision level at which a variable was assigned.
    pub fn var_level(&self, v: Var) -> i32 {
        self.v.level(v)
    }

    /// Partitions the variable occurs in (for singleton input partitions).
    pub fn var_partitions(&self, v: Var) -> Range {
        self.v.part_info[v]
    }

    /// Join of the partitions of all input clauses.
    pub fn total_partitions(&self) -> Range {
        self.v.total_part
    }

    /// Begins a new decision level.
    fn new_decision_level(&mut self) {
        trace!("new decision level {}", 1 + self.v.decision_level());
        self.v.vars.new_decision_level();
    }

    fn simplify_internal(&mut self) -> bool {
        debug_assert_eq!(self.v.decision_level(), 0);

        if !self.v.ok || self.v.propagate(false).is_some() {
            self.v.ok = false;
            return false;
        }

        if self.v.num_assigns() as i32 == self.v.simp_db_assigns || self.v.simp_db_props > 0 {
            return true;
        }

        self.cb.on_simplify();
        self.remove_satisfied(ClauseSetSelect::Learnt); // Remove satisfied learnt clauses
        if self.v.remove_satisfied {
            self.remove_satisfied(ClauseSetSelect::Original); // remove satisfied normal clauses
        }
        self.check_garbage();
        self.v.rebuild_order_heap();

        self.v.simp_db_assigns = self.v.num_assigns() as i32;
        // (shouldn't depend on stats really, but it will do for now)
        self.v.simp_db_props = (self.v.clauses_literals + self.v.learnts_literals) as i64;

        true
    }

    /// Search for a model the specified number of conflicts.
    ///
    /// Use negative value for `nof_conflicts` indicate infinity.
    ///
    /// # Output:
    ///
    /// - `lbool::TRUE` if a partial assigment that is consistent with respect to the clauseset is found. If
    ///    all variables are decision variables, this means that the clause set is satisfiable.
    /// - `lbool::FALSE` if the clause set is unsatisfiable.
    /// - 'lbool::UNDEF` if the bound on number of conflicts is reached.
    fn search(&mut self, nof_conflicts: i32, tmp_learnt: &mut Vec<Lit>) -> lbool {
        debug_assert!(self.v.ok);
        let mut conflict_c = 0;
        self.v.starts += 1;

        loop {
            // boolean propagation
            let confl = self.v.propagate(false);

            if let Some(confl) = confl {
                // CONFLICT
                self.v.conflicts += 1;
                conflict_c += 1;
                if self.v.decision_level() == 0 {
                    // the empty clause witness closes the proof
                    if self.v.log_proof {
                        self.v.proof.push(confl);
                    }
                    return lbool::FALSE;
                }

                tmp_learnt.clear();
                let (backtrack_level, part) = self.v.analyze(confl, &self.learnts, tmp_learnt);
                self.cb.on_new_clause(&tmp_learnt, clause::Kind::Learnt);
                self.cancel_until(backtrack_level as u32);

                if tmp_learnt.len() == 1 {
                    if self.v.log_proof {
                        // learnt units go into the proof with their own clause
                        let cr = self.v.ca.alloc_with_learnt(&tmp_learnt, true);
                        self.v.proof.push(cr);
                        self.v.ca.get_mut(cr).set_part(part);
                        self.v.unchecked_enqueue(tmp_learnt[0], cr);
                    } else {
                        self.v.unchecked_enqueue(tmp_learnt[0], CRef::UNDEF);
                    }
                } else {
                    let cr = self.v.ca.alloc_with_learnt(&tmp_learnt, true);
                    if self.v.log_proof {
                        self.v.proof.push(cr);
                        self.v.ca.get_mut(cr).set_part(part);
                    }
                    self.learnts.push(cr);
                    self.v.attach_clause(cr);
                    self.v.cla_bump_activity(&self.learnts, cr);
                    self.v.unchecked_enqueue(tmp_learnt[0], cr);
                }

                self.v.vars.var_decay_activity();
                self.v.cla_decay_activity();

                self.v.learntsize_adjust_cnt -= 1;
                if self.v.learntsize_adjust_cnt == 0 {
                    self.v.learntsize_adjust_confl *= self.v.learntsize_adjust_inc;
                    self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
                    self.v.max_learnts *= self.v.learntsize_inc;

                    let trail_lim_head = self
                        .v
                        .vars
                        .trail_lim
                        .first()
                        .cloned()
                        .unwrap_or(self.v.vars.trail.len() as i32);
                    let v = &self.v;
                    self.cb.on_progress(|| ProgressStatus {
                        conflicts: v.conflicts as i32,
                        dec_vars: v.dec_vars as i32 - trail_lim_head,
                        n_clauses: v.num_clauses(),
                        n_clause_lits: v.clauses_literals as i32,
                        max_learnt: v.max_learnts as i32,
                        n_learnt: v.num_learnts(),
                        n_learnt_lits: v.learnts_literals as f64 / v.num_learnts as f64,
                        progress_estimate: v.progress_estimate() * 100.0,
                    });
                }
            } else {
                // NO CONFLICT
                if (nof_conflicts >= 0 && conflict_c >= nof_conflicts) || !self.within_budget() {
                    // Reached bound on number of conflicts:
                    self.v.progress_estimate = self.v.progress_estimate();
                    self.cancel_until(0);
                    return lbool::UNDEF;
                }

                // Simplify the set of problem clauses:
                if self.v.decision_level() == 0 && !self.simplify_internal() {
                    return lbool::FALSE;
                }

                if self.learnts.len() as f64 - self.v.num_assigns() as f64 >= self.v.max_learnts {
                    // Reduce the set of learnt clauses:
                    self.reduce_db();
                }

                // select the next decision (using assumptions, or variable heap)
                let mut next = Lit::UNDEF;
                while (self.v.decision_level() as usize) < self.v.assumptions.len() {
                    // Perform user provided assumption:
                    let p = self.v.assumptions[self.v.decision_level() as usize];
                    if self.v.value_lit(p) == lbool::TRUE {
                        // Dummy decision level, since `p` is true already:
                        self.new_decision_level();
                    } else if self.v.value_lit(p) == lbool::FALSE {
                        // the negated assumption is entailed, unsat
                        let mut conflict = mem::replace(&mut self.conflict, LSet::new());
                        self.v.analyze_final(!p, &mut conflict);
                        self.conflict = conflict;
                        return lbool::FALSE;
                    } else {
                        next = p;
                        break;
                    }
                }

                if next == Lit::UNDEF {
                    // new variable decision:
                    self.v.decisions += 1;
                    next = self.v.pick_branch_lit();

                    if next == Lit::UNDEF {
                        // Model found:
                        return lbool::TRUE;
                    }
                }

                // Increase decision level and enqueue `next`
                // with no justification since it's a decision
                self.new_decision_level();
                debug!("pick-next {:?}", next);
                self.v.unchecked_enqueue(next, CRef::UNDEF);
            }
        }
    }

    /// Main solve method (assumptions given in `self.v.assumptions`).
    fn solve_internal(&mut self) -> lbool {
        debug_assert_eq!(self.v.decision_level(), 0);
        self.model.clear();
        self.conflict.clear();
        if !self.v.ok {
            return lbool::FALSE;
        }

        self.v.solves += 1;
        let mut tmp_learnt: Vec<Lit> = vec![];

        self.v.max_learnts = self.num_clauses() as f64 * self.v.learntsize_factor;
        if self.v.max_learnts < self.v.min_learnts_lim as f64 {
            self.v.max_learnts = self.v.min_learnts_lim as f64;
        }

        self.v.learntsize_adjust_confl = self.v.learntsize_adjust_start_confl as f64;
        self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
        let mut status;

        info!("search.start");
        self.cb.on_start();

        // Search:
        let mut curr_restarts: i32 = 0;
        loop {
            let rest_base = if self.v.luby_restart {
                utils::luby(self.v.restart_inc, curr_restarts)
            } else {
                f64::powi(self.v.restart_inc, curr_restarts)
            };
            let nof_conflicts = (rest_base * self.v.restart_first as f64) as i32;
            status = self.search(nof_conflicts, &mut tmp_learnt);
            if !self.within_budget() {
                break;
            }

            if status != lbool::UNDEF {
                break;
            } else {
                info!("search.restart({})", curr_restarts);
                curr_restarts += 1;
                self.cb.on_restart();
            }
        }

        self.cb.on_result(status);

        if status == lbool::TRUE {
            // Extend & copy model:
            let num_vars = self.num_vars();
            self.model.resize(num_vars as usize, lbool::UNDEF);
            for i in 0..num_vars {
                self.model[i as usize] = self.v.value(Var::from_idx(i));
            }
        } else if status == lbool::FALSE && self.conflict.len() == 0 {
            // NOTE: we may return `false` without an empty conflict in case we had assumptions. In
            // this case `self.conflict` contains the unsat-core but adding new clauses might
            // succeed in the absence of these assumptions.
            self.v.ok = false;
        }

        self.cancel_until(0);
        debug!("res: {:?}", status);
        status
    }

    /// Remove half of the learnt clauses, minus the clauses locked by the current assignment. Locked
    /// clauses are clauses that are reason to some assignment. Binary clauses are never removed.
    fn reduce_db(&mut self) {
        let extra_lim = self.v.cla_inc / self.learnts.len() as f64; // Remove any clause below this activity

        debug!("reduce_db.start");

        {
            let ca = &self.v.ca;
            self.learnts.sort_unstable_by(|&x, &y| {
                let x = ca.get_ref(x);
                let y = ca.get_ref(y);
                debug_assert!(x.learnt());
                debug_assert!(y.learnt());
                Ord::cmp(&(x.size() <= 2), &(y.size() <= 2)).then(
                    PartialOrd::partial_cmp(&x.activity(), &y.activity()).expect("NaN activity"),
                )
            });
        }
        // Don't delete binary or locked clauses. From the rest, delete clauses from the first half
        // and clauses with activity smaller than `extra_lim`:
        let mut j = 0;
        for i in 0..self.learnts.len() {
            let cr = self.learnts[i];
            let cond = {
                let c = self.v.ca.get_ref(cr);
                c.size() > 2
                    && !self.v.locked(cr)
                    && (i < self.learnts.len() / 2 || (c.activity() as f64) < extra_lim)
            };
            if cond {
                self.v.remove_clause(cr);
                self.cb.on_delete_clause(self.v.ca.get_ref(cr).lits());
            } else {
                self.learnts[j] = cr;
                j += 1;
            }
        }

        let _deleted = self.learnts.len() - j;
        self.learnts.resize(j, CRef::UNDEF);

        debug!("reduce_db.done (deleted {})", _deleted);

        self.check_garbage();
    }

    /// Shrink the given set to contain only non-satisfied clauses.
    fn remove_satisfied(&mut self, which: ClauseSetSelect) {
        debug_assert_eq!(self.v.decision_level(), 0);
        let cs: &mut Vec<CRef> = match which {
            ClauseSetSelect::Learnt => &mut self.learnts,
            ClauseSetSelect::Original => &mut self.clauses,
        };
        let self_v = &mut self.v;
        cs.retain(|&cr| {
            let satisfied = self_v.satisfied(cr);
            if satisfied {
                debug!("remove satisfied clause {:?}", self_v.ca.get_ref(cr).lits());
                self_v.remove_clause(cr);
            }
            !satisfied
        });
    }

    /// Revert to the state at given level (keeping all assignment at `level` but not beyond).
    fn cancel_until(&mut self, level: u32) {
        if self.v.decision_level() > level {
            trace!("solver.cancel-until {}", level);
            self.v.cancel_until(level);
        }
    }

    /// Garbage collect the clause allocator by moving alive clauses into
    /// another allocator.
    fn garbage_collect(&mut self) {
        debug_assert!(!self.v.log_proof);
        // Initialize the next region to a size corresponding to the estimated utilization degree. This
        // is not precise but should avoid some unnecessary reallocations for the new region:
        let mut to = ClauseAllocator::with_start_cap(self.v.ca.len() - self.v.ca.wasted());

        self.v
            .reloc_all(&mut self.learnts, &mut self.clauses, &mut to);

        self.cb.on_gc(
            self.v.ca.len() * ClauseAllocator::UNIT_SIZE as usize,
            to.len() * ClauseAllocator::UNIT_SIZE as usize,
        );
        self.v.ca = to;
    }

    /// Check whether the space wasted by dead clauses in the clause allocator exceeds
    /// the threshold. Disabled while proof logging is active: the proof
    /// refers to deleted clauses that must remain addressable.
    fn check_garbage(&mut self) {
        if !self.v.log_proof
            && self.v.ca.wasted() as f64 > self.v.ca.len() as f64 * self.v.garbage_frac
        {
            self.garbage_collect();
        }
    }

    /// Temporary access to the callbacks
    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    /// Temporary access to the callbacks
    pub fn cb(&self) -> &Cb {
        &self.cb
    }

    /// Interrupt search asynchronously
    pub fn interrupt_async(&self) {
        self.asynch_interrupt.store(true, Ordering::Relaxed);
    }

    fn has_been_interrupted(&self) -> bool {
        self.asynch_interrupt.load(Ordering::Relaxed)
    }

    /// Allow at most `x` more conflicts before `solve_limited` gives up.
    pub fn set_conflict_budget(&mut self, x: i64) {
        self.v.conflict_budget = self.v.conflicts as i64 + x;
    }

    /// Allow at most `x` more propagations before `solve_limited` gives up.
    pub fn set_propagation_budget(&mut self, x: i64) {
        self.v.propagation_budget = self.v.propagations as i64 + x;
    }

    /// Remove all resource budgets.
    pub fn budget_off(&mut self) {
        self.v.conflict_budget = -1;
        self.v.propagation_budget = -1;
    }

    fn within_budget(&self) -> bool {
        !self.has_been_interrupted()
            && (self.v.conflict_budget < 0 || self.v.conflicts < self.v.conflict_budget as u64)
            && (self.v.propagation_budget < 0
                || self.v.propagations < self.v.propagation_budget as u64)
            && !self.cb.stop()
    }

    /// Add clause; performs top-level simplifications.
    fn add_clause_(&mut self, clause: &mut Vec<Lit>, part: Range) -> bool {
        debug_assert_eq!(self.v.decision_level(), 0);
        debug_assert!(
            !self.v.log_proof || !part.undef(),
            "input clauses must carry a partition when logging"
        );
        if !self.v.ok {
            return false;
        }

        clause.sort_unstable();

        let mut last_lit = Lit::UNDEF;
        let mut j = 0;
        if self.v.log_proof {
            // drop satisfied clauses and duplicate literals; false literals
            // stay, the clause body is proof evidence
            for i in 0..clause.len() {
                let lit_i = clause[i];
                if self.v.value_lit(lit_i) == lbool::TRUE || lit_i == !last_lit {
                    return true; // tauto or satisfied already
                } else if lit_i != last_lit {
                    last_lit = lit_i;
                    clause[j] = lit_i;
                    j += 1;
                }
            }
            clause.truncate(j);

            // move false literals behind the watched positions
            let mut sz = clause.len();
            let mut i = 0;
            while i < sz {
                if self.v.value_lit(clause[i]) == lbool::FALSE {
                    sz -= 1;
                    clause.swap(i, sz);
                } else {
                    i += 1;
                }
            }
        } else {
            for i in 0..clause.len() {
                let lit_i = clause[i];
                if self.v.value_lit(lit_i) == lbool::TRUE || lit_i == !last_lit {
                    return true; // tauto or satisfied already
                } else if self.v.value_lit(lit_i) != lbool::FALSE && lit_i != last_lit {
                    last_lit = lit_i;
                    clause[j] = lit_i;
                    j += 1;
                }
            }
            clause.truncate(j);
        }

        if clause.len() == 0 {
            self.v.ok = false;
            return false;
        } else if self.v.log_proof && self.v.value_lit(clause[0]) == lbool::FALSE {
            // all literals false at input: log the conflict clause, the
            // proof ends here
            let cr = self.v.ca.alloc_with_learnt(&clause, false);
            self.v.ca.get_mut(cr).join_part(part);
            self.v.proof.push(cr);
            if part.is_singleton() {
                for &l in clause.iter() {
                    self.v.part_info[l.var()].join(part);
                }
            }
            self.v.ok = false;
            return false;
        } else if clause.len() == 1 || (self.v.log_proof && self.v.value_lit(clause[1]) == lbool::FALSE)
        {
            // unit under the current top-level assignment
            if self.v.log_proof {
                let cr = self.v.ca.alloc_with_learnt(&clause, false);
                self.v.ca.get_mut(cr).join_part(part);
                self.clauses.push(cr);
                self.v.total_part.join(part);
                self.v.unchecked_enqueue(clause[0], cr);
            } else {
                self.v.unchecked_enqueue(clause[0], CRef::UNDEF);
            }
            if part.is_singleton() {
                for &l in clause.iter() {
                    self.v.part_info[l.var()].join(part);
                }
            }
            if let Some(confl) = self.v.propagate(false) {
                if self.v.log_proof {
                    self.v.proof.push(confl);
                }
                self.v.ok = false;
            }
            return self.v.ok;
        } else {
            let cr = self.v.ca.alloc_with_learnt(&clause, false);
            self.v.ca.get_mut(cr).join_part(part);
            self.clauses.push(cr);
            self.v.total_part.join(part);
            self.v.attach_clause(cr);
            if part.is_singleton() {
                for &l in clause.iter() {
                    self.v.part_info[l.var()].join(part);
                }
            }
        }

        true
    }

    /// Write the current set of live, unsatisfied clauses as DIMACS, with
    /// the given assumptions as unit clauses. Variables are renumbered
    /// compactly; satisfied clauses and false literals are left out.
    pub fn to_dimacs<W: io::Write>(&self, out: &mut W, assumps: &[Lit]) -> io::Result<()> {
        // Handle case when solver is in contradictory state:
        if !self.v.ok {
            return write!(out, "p cnf 1 2\n1 0\n-1 0\n");
        }

        fn map_var(x: Var, map: &mut VMap<i32>, max: &mut i32) -> i32 {
            map.reserve(x, -1);
            if map[x] == -1 {
                map[x] = *max;
                *max += 1;
            }
            map[x]
        }

        let mut map: VMap<i32> = VMap::new();
        let mut max: i32 = 0;

        let mut cnt = 0;
        for &cr in &self.clauses {
            if !self.v.satisfied(cr) {
                cnt += 1;
                let c = self.v.ca.get_ref(cr);
                for &l in c.lits() {
                    if self.v.value_lit(l) != lbool::FALSE {
                        map_var(l.var(), &mut map, &mut max);
                    }
                }
            }
        }

        // Assumptions are added as unit clauses:
        cnt += assumps.len();

        writeln!(out, "p cnf {} {}", max, cnt)?;

        for &a in assumps {
            debug_assert!(self.v.value_lit(a) != lbool::FALSE);
            writeln!(
                out,
                "{}{} 0",
                if a.sign() { "" } else { "-" },
                map_var(a.var(), &mut map, &mut max) + 1
            )?;
        }

        for &cr in &self.clauses {
            if self.v.satisfied(cr) {
                continue;
            }
            let c = self.v.ca.get_ref(cr);
            for &l in c.lits() {
                if self.v.value_lit(l) != lbool::FALSE {
                    write!(
                        out,
                        "{}{} ",
                        if l.sign() { "" } else { "-" },
                        map_var(l.var(), &mut map, &mut max) + 1
                    )?;
                }
            }
            writeln!(out, "0")?;
        }
        Ok(())
    }
}

impl SolverV {
    #[inline(always)]
    pub fn num_assigns(&self) -> u32 {
        self.vars.num_assigns()
    }

    #[inline(always)]
    fn num_vars(&self) -> u32 {
        self.next_var.idx()
    }
    fn num_clauses(&self) -> u64 {
        self.num_clauses
    }
    fn num_conflicts(&self) -> u64 {
        self.conflicts
    }
    fn num_props(&self) -> u64 {
        self.propagations
    }
    fn num_learnts(&self) -> u64 {
        self.num_learnts
    }

    #[inline(always)]
    pub fn level(&self, x: Var) -> i32 {
        self.vars.level(x)
    }

    #[inline(always)]
    pub fn level_lit(&self, x: Lit) -> i32 {
        self.level(x.var())
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.vars.value(x)
    }

    #[inline(always)]
    pub fn value_lit(&self, x: Lit) -> lbool {
        self.vars.value_lit(x)
    }

    fn set_decision_var(&mut self, v: Var, b: bool) {
        if b && !self.decision[v] {
            self.dec_vars += 1;
        } else if !b && self.decision[v] {
            self.dec_vars -= 1;
        }
        self.decision[v] = b;
        self.insert_var_order(v);
    }

    fn insert_var_order(&mut self, x: Var) {
        if !self.order_heap.in_heap(x) && self.decision[x] {
            self.order_heap.insert(&self.vars.activity, x);
        }
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.clause_decay;
    }

    fn cla_bump_activity(&mut self, learnts: &[CRef], cr: CRef) {
        let new_activity = {
            let mut c = self.ca.get_mut(cr);
            let r = c.activity() + self.cla_inc as f32;
            c.set_activity(r);
            r
        };
        if new_activity > 1e20 {
            // Rescale:
            for &learnt in learnts.iter() {
                let mut c = self.ca.get_mut(learnt);
                let r = c.activity() * 1e-20;
                c.set_activity(r);
            }
            self.cla_inc *= 1e-20;
        }
    }

    /// Pick a literal to make a decision with
    fn pick_branch_lit(&mut self) -> Lit {
        let mut next = Var::UNDEF;

        // Random decision:
        if utils::drand(&mut self.random_seed) < self.random_var_freq
            && !self.order_heap.is_empty()
        {
            let idx_tmp =
                utils::irand(&mut self.random_seed, self.order_heap.len() as i32) as usize;
            next = self.order_heap.at(idx_tmp);
            if self.value(next) == lbool::UNDEF && self.decision[next] {
                self.rnd_decisions += 1;
            }
        }

        // Activity based decision:
        while next == Var::UNDEF || self.value(next) != lbool::UNDEF || !self.decision[next] {
            if self.order_heap.is_empty() {
                next = Var::UNDEF;
                break;
            } else {
                next = self.order_heap.pop_max(&self.vars.activity);
            }
        }

        // Choose polarity based on different polarity modes (global or per-variable):
        if next == Var::UNDEF {
            Lit::UNDEF
        } else if self.user_pol[next] != lbool::UNDEF {
            Lit::new(next, self.user_pol[next] == lbool::TRUE)
        } else if self.rnd_pol {
            Lit::new(next, utils::drand(&mut self.random_seed) < 0.5)
        } else {
            Lit::new(next, self.polarity[next])
        }
    }

    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var {
        let v = self.free_vars.pop().unwrap_or_else(|| {
            let v = self.next_var;
            self.next_var = Var::from_idx(self.next_var.idx() + 1);
            v
        });
        self.watches.init(Lit::new(v, false));
        self.watches.init(Lit::new(v, true));
        self.vars.ass.insert_default(v, lbool::UNDEF);
        self.vars
            .vardata
            .insert_default(v, VarData::new(CRef::UNDEF, 0));
        if self.rnd_init_act {
            self.vars
                .activity
                .insert_default(v, utils::drand(&mut self.random_seed) * 0.00001);
        } else {
            self.vars.activity.insert_default(v, 0.0);
        }
        self.vars.trail_part.insert_default(v, Range::UNDEF);
        self.part_info.insert_default(v, Range::UNDEF);
        self.seen.insert_default(v, Seen::UNDEF);
        self.polarity.insert_default(v, false);
        self.user_pol.insert_default(v, upol);
        self.decision.reserve_default(v);
        let len = self.vars.trail.len();
        if v.idx() as usize > len {
            self.vars.trail.reserve(v.idx() as usize + 1 - len);
        }
        self.set_decision_var(v, dvar);
        v
    }

    fn enqueue(&mut self, p: Lit, from: CRef) -> bool {
        let val = self.vars.value_lit(p);
        if val == lbool::FALSE {
            false
        } else {
            if val == lbool::UNDEF {
                self.unchecked_enqueue(p, from);
            }
            true
        }
    }

    fn unchecked_enqueue(&mut self, p: Lit, from: CRef) {
        debug_assert_eq!(
            self.vars.value_lit(p),
            lbool::UNDEF,
            "lit {:?} should be undef",
            p
        );
        self.vars.assign(p, from);
        if self.log_proof && self.vars.decision_level() == 0 {
            debug_assert_ne!(
                from,
                CRef::UNDEF,
                "level-0 assignments must have a reason when logging"
            );
            Self::update_trail_part(&self.ca, &mut self.vars, p, from);
        }
    }

    /// Provenance of a level-0 assignment: the reason's partition joined
    /// with the provenance of every variable the reason depends on.
    fn update_trail_part(ca: &ClauseAllocator, vars: &mut VarState, p: Lit, from: CRef) {
        let c = ca.get_ref(from);
        debug_assert!(!c.part().undef());
        let mut r = c.part();
        for &q in &c.lits()[1..] {
            debug_assert!(!vars.trail_part[q.var()].undef());
            r.join(vars.trail_part[q.var()]);
        }
        vars.trail_part[p.var()] = r;
    }

    /// Analyze conflict and produce a reason clause.
    ///
    /// # Pre-conditions:
    ///
    /// - `out_learnt` is cleared by the callee.
    /// - current decision level must be greater than root level.
    ///
    /// # Post-conditions:
    ///
    /// - the backtrack level and the partition of the learnt clause are returned.
    /// - `out_learnt[0]` is the asserting literal at the backtrack level.
    /// - if `out_learnt.len() > 1` then `out_learnt[1]` has the greatest decision level of the
    ///   rest of literals. There may be others from the same level though.
    fn analyze(&mut self, orig: CRef, learnts: &[CRef], out_learnt: &mut Vec<Lit>) -> (i32, Range) {
        out_learnt.clear();

        debug!("analyze.start {:?}", orig);

        let mut path_c: i32 = 0;
        let mut p = Lit::UNDEF;
        let mut confl = orig;

        out_learnt.push(Lit::UNDEF); // (leave room for the asserting literal)
        let mut index = self.vars.trail.len();

        let mut part = Range::UNDEF;
        if self.log_proof {
            part = self.ca.get_ref(confl).part();
        }

        loop {
            debug_assert_ne!(confl, CRef::UNDEF); // (otherwise should be UIP)

            if self.ca.get_ref(confl).learnt() {
                self.cla_bump_activity(learnts, confl);
            }
            if self.log_proof {
                let cp = self.ca.get_ref(confl).part();
                part.join(cp);
            }

            let c = self.ca.get_ref(confl);
            let lits = c.lits();
            let start = if p == Lit::UNDEF { 0 } else { 1 };
            for j in start..lits.len() {
                let q = lits[j];
                if !self.seen[q.var()].is_seen() {
                    if self.vars.level(q.var()) > 0 {
                        self.vars.var_bump_activity(&mut self.order_heap, q.var());
                        self.seen[q.var()] = Seen::SOURCE;
                        if self.vars.level(q.var()) >= self.decision_level() as i32 {
                            path_c += 1;
                        } else {
                            out_learnt.push(q);
                        }
                    } else if self.log_proof {
                        // resolution with the unit chain that forced `q`
                        debug_assert!(!self.vars.trail_part[q.var()].undef());
                        part.join(self.vars.trail_part[q.var()]);
                    }
                }
            }

            // Select next literal in the trail to look at:
            while !self.seen[self.vars.trail[index - 1].var()].is_seen() {
                index -= 1;
            }
            p = self.vars.trail[index - 1];
            index -= 1;
            confl = self.vars.reason(p.var());
            self.seen[p.var()] = Seen::UNDEF;
            path_c -= 1;

            if path_c <= 0 {
                break;
            }
        }
        out_learnt[0] = !p;

        trace!("analyze-learnt: {:?} (before minimization)", &out_learnt);
        self.max_literals += out_learnt.len() as u64;

        self.minimize_conflict(out_learnt, &mut part);

        self.tot_literals += out_learnt.len() as u64;

        // Find correct backtrack level:
        let btlevel = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            let mut max_level = self.level(out_learnt[max_i].var());
            // Find the first literal assigned at the next-highest level:
            for i in 2..out_learnt.len() {
                let level = self.level(out_learnt[i].var());
                if level > max_level {
                    max_i = i;
                    max_level = level;
                }
            }
            // Swap-in this literal at index 1:
            out_learnt.swap(max_i, 1);
            self.level_lit(out_learnt[1])
        };

        for &lit in &self.analyze_toclear {
            self.seen[lit.var()] = Seen::UNDEF; // (`seen[]` is now cleared)
        }
        debug_assert!(out_learnt
            .iter()
            .all(|&l| self.value_lit(l) == lbool::FALSE));
        (btlevel, part)
    }

    /// An abstraction of the level of a variable
    #[inline]
    fn abstract_level(&self, v: Var) -> u32 {
        1 << (self.level(v) & 31)
    }

    fn minimize_conflict(&mut self, out_learnt: &mut Vec<Lit>, part: &mut Range) {
        // Simplify conflict clause:
        self.analyze_toclear.clear();
        self.analyze_toclear.extend_from_slice(&out_learnt);
        let new_size = if self.ccmin_mode == 2 {
            let mut abstract_levels = 0;
            for a in out_learnt[1..].iter() {
                abstract_levels |= self.abstract_level(a.var())
            }

            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                // can eliminate `lit` only if it's redundant *and* not a decision
                if self.reason(lit.var()) == CRef::UNDEF
                    || !self.lit_redundant(lit, abstract_levels, part)
                {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else if self.ccmin_mode == 1 {
            debug_assert!(!self.log_proof, "basic minimization loses proof steps");
            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                let x = lit.var();
                let reason = self.reason(x);

                let retain = if reason == CRef::UNDEF {
                    debug_assert!(self.level(x) > 0);
                    true
                } else {
                    let lits = self.ca.get_ref(reason).lits();
                    let mut keep = false;
                    for k in 1..lits.len() {
                        let v = lits[k].var();
                        if !self.seen[v].is_seen() && self.level(v) > 0 {
                            keep = true;
                            break;
                        }
                    }
                    keep
                };
                if retain {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else {
            out_learnt.len()
        };

        debug_assert!(new_size <= out_learnt.len());
        out_learnt.truncate(new_size);
    }

    /// Check if `p` can be removed from a conflict clause `C`.
    ///
    /// It can be removed from `C` if it is propagation-implied
    /// by literals of level 0 exclusively or if `C x p.reason` subsumes `C`.
    /// The partitions of every clause visited by a successful derivation
    /// are joined into `part`.
    fn lit_redundant(&mut self, p: Lit, abstract_levels: u32, part: &mut Range) -> bool {
        self.minimize_stack.clear();
        self.minimize_stack.push(p);

        // partition of all clauses used in the derivation that replaces `p`
        let mut l_part = Range::UNDEF;
        let top = self.analyze_toclear.len();

        while let Some(q) = self.minimize_stack.pop() {
            let cr = self.reason(q.var());
            debug_assert_ne!(cr, CRef::UNDEF);
            if self.log_proof {
                l_part.join(self.ca.get_ref(cr).part());
            }

            let c = self.ca.get_ref(cr);
            let lits = c.lits();
            for i in 1..lits.len() {
                let l = lits[i];
                if self.seen[l.var()].is_seen() {
                    continue;
                }
                if self.vars.level(l.var()) > 0 {
                    if self.reason(l.var()) != CRef::UNDEF
                        && (self.abstract_level(l.var()) & abstract_levels) != 0
                    {
                        self.seen[l.var()] = Seen::SOURCE;
                        self.minimize_stack.push(l);
                        self.analyze_toclear.push(l);
                    } else {
                        // cannot remove `l`, cancel
                        for a in self.analyze_toclear[top..].iter() {
                            self.seen[a.var()] = Seen::UNDEF;
                        }
                        self.analyze_toclear.truncate(top);
                        return false;
                    }
                } else if self.log_proof {
                    debug_assert!(!self.vars.trail_part[l.var()].undef());
                    l_part.join(self.vars.trail_part[l.var()]);
                }
            }
        }

        if self.log_proof {
            part.join(l_part);
        }

        true
    }

    /// Specialized analysis procedure to express the final conflict in terms of assumptions.
    /// Calculates the (possibly empty) set of assumptions that led to the assignment of `p`, and
    /// stores the result in `out_conflict`.
    fn analyze_final(&mut self, p: Lit, out_conflict: &mut LSet) {
        out_conflict.clear();
        out_conflict.insert(p);
        debug!("analyze_final lit={:?}", p);

        if self.decision_level() == 0 {
            return; // no assumptions
        }

        self.seen[p.var()] = Seen::SOURCE;

        for i in (self.vars.trail_lim[0] as usize..self.vars.trail.len()).rev() {
            let lit = self.vars.trail[i];
            let x = lit.var();
            if self.seen[x].is_seen() {
                let reason = self.reason(x);
                if reason == CRef::UNDEF {
                    debug_assert!(self.level(x) > 0);
                    out_conflict.insert(!lit);
                } else {
                    let c = self.ca.get_ref(reason);
                    let lits = c.lits();
                    for j in 1..lits.len() {
                        if self.level(lits[j].var()) > 0 {
                            self.seen[lits[j].var()] = Seen::SOURCE;
                        }
                    }
                }
                self.seen[x] = Seen::UNDEF;
            }
        }

        self.seen[p.var()] = Seen::UNDEF;
        debug_assert!(self.seen.iter().all(|(_, &s)| s == Seen::UNDEF));
    }

    /// Propagates all enqueued facts.
    ///
    /// If a conflict arises, the conflicting clause is returned,
    /// otherwise `None`. With `core_only` set (proof replay), clauses whose
    /// core bit is unset are skipped.
    ///
    /// # Post-conditions:
    ///
    /// - the propagation queue is empty, even if there was a conflict.
    fn propagate(&mut self, core_only: bool) -> Option<CRef> {
        let mut confl = None;
        let mut num_props: u32 = 0;

        while (self.qhead as usize) < self.vars.trail.len() {
            // `p` is the next enqueued fact to propagate.
            let p = self.vars.trail[self.qhead as usize];
            self.qhead += 1;
            let watches_ptr: *mut Watches = &mut self.watches;
            let ws = self.watches.lookup_mut(p, &self.ca);
            let mut i: usize = 0;
            let mut j: usize = 0;
            let end: usize = ws.len();
            num_props += 1;
            'clauses: while i < end {
                // Try to avoid inspecting the clause:
                let blocker = ws[i].blocker;
                if self.vars.value_lit(blocker) == lbool::TRUE {
                    ws[j] = ws[i];
                    j += 1;
                    i += 1;
                    continue;
                }

                let cr = ws[i].cref;
                // In replay mode only core clauses take part:
                if core_only && !self.ca.get_ref(cr).core() {
                    ws[j] = ws[i];
                    j += 1;
                    i += 1;
                    continue;
                }

                // Make sure the false literal is data[1]:
                let mut c = self.ca.get_mut(cr);
                let false_lit = !p;
                if c[0] == false_lit {
                    c[0] = c[1];
                    c[1] = false_lit;
                }
                debug_assert_eq!(c[1], false_lit);
                i += 1;

                // If 0th watch is true, then clause is already satisfied.
                let first = c[0];
                let w = Watcher::new(cr, first);
                if first != blocker && self.vars.value_lit(first) == lbool::TRUE {
                    ws[j] = w;
                    j += 1;
                    continue;
                }

                // Look for new watch:
                let c_size = c.size();
                for k in 2..c_size {
                    if self.vars.value_lit(c[k]) != lbool::FALSE {
                        c[1] = c[k];
                        c[k] = false_lit;

                        // safe because `!c[1] != p`, so watches are not aliased
                        debug_assert_ne!(!c[1], p);
                        let watches_ref: &mut Watches = unsafe { &mut *watches_ptr };
                        watches_ref.index_mut(!c[1]).push(w);
                        continue 'clauses;
                    }
                }

                // Did not find watch -- clause is unit under assignment:
                ws[j] = w;
                j += 1;
                if self.vars.value_lit(first) == lbool::FALSE {
                    confl = Some(cr);
                    self.qhead = self.vars.trail.len() as i32;
                    // Copy the remaining watches:
                    while i < end {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.vars.assign(first, cr);
                    if self.log_proof && self.vars.decision_level() == 0 {
                        Self::update_trail_part(&self.ca, &mut self.vars, first, cr);
                    }
                }
            }
            let dummy = Watcher::DUMMY;
            ws.resize(j, dummy);
        }
        self.propagations += num_props as u64;
        self.simp_db_props -= num_props as i64;

        confl
    }

    fn rebuild_order_heap(&mut self) {
        let mut vs = vec![];
        for v in (0..self.num_vars()).map(Var::from_idx) {
            if self.decision[v] && self.value(v) == lbool::UNDEF {
                vs.push(v);
            }
        }
        self.order_heap.rebuild(&self.vars.activity, &vs);
    }

    /// Move to the given clause allocator, where clause indices might differ
    fn reloc_all(
        &mut self,
        learnts: &mut Vec<CRef>,
        clauses: &mut Vec<CRef>,
        to: &mut ClauseAllocator,
    ) {
        macro_rules! is_removed {
            ($ca:expr, $cr:expr) => {
                $ca.get_ref($cr).mark() == 1
            };
        }
        // All watchers:
        self.watches.clean_all(&self.ca);
        for v in (0..self.num_vars()).map(Var::from_idx) {
            for s in 0..2 {
                let p = Lit::new(v, s != 0);
                for watch in self.watches[p].iter_mut() {
                    self.ca.reloc(&mut watch.cref, to);
                }
            }
        }

        // All reasons:
        for i in 0..self.vars.trail.len() {
            let v = self.vars.trail[i].var();

            // Note: it is not safe to call `locked()` on a relocated clause. This is why we keep
            // `dangling` reasons here. It is safe and does not hurt.
            let reason = self.reason(v);
            if reason != CRef::UNDEF {
                let cond = {
                    let c = self.ca.get_ref(reason);
                    c.reloced() || self.locked(reason)
                };
                if cond {
                    debug_assert!(!is_removed!(self.ca, reason));
                    self.ca.reloc(&mut self.vars.vardata[v].reason, to);
                }
            }
        }

        // All learnt:
        {
            let mut j = 0;
            for i in 0..learnts.len() {
                let mut cr = learnts[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    learnts[j] = cr;
                    j += 1;
                }
            }
            learnts.resize(j, CRef::UNDEF);
        }

        // All original:
        {
            let mut j = 0;
            for i in 0..clauses.len() {
                let mut cr = clauses[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    clauses[j] = cr;
                    j += 1;
                }
            }
            clauses.resize(j, CRef::UNDEF);
        }

        // Clausal proof (empty whenever compaction is allowed to run):
        for i in 0..self.proof.len() {
            let mut cr = self.proof[i];
            self.ca.reloc(&mut cr, to);
            self.proof[i] = cr;
        }
    }

    /// Attach a clause to watcher lists
    fn attach_clause(&mut self, cr: CRef) {
        let (c0, c1, learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1], c.learnt(), c.size())
        };
        self.watches[!c0].push(Watcher::new(cr, c1));
        self.watches[!c1].push(Watcher::new(cr, c0));
        if learnt {
            self.num_learnts += 1;
            self.learnts_literals += size as u64;
        } else {
            self.num_clauses += 1;
            self.clauses_literals += size as u64;
        }
    }

    /// Revert to the state at given level (keeping all assignment at `level` but not beyond).
    fn cancel_until(&mut self, level: u32) {
        debug_assert!(self.decision_level() > level);
        let trail_lim_last = *self.vars.trail_lim.last().expect("trail_lim is empty") as usize;
        let trail_lim_level = self.vars.trail_lim[level as usize] as usize;
        for c in (trail_lim_level..self.vars.trail.len()).rev() {
            let x = self.vars.trail[c].var();
            self.vars.ass[x] = lbool::UNDEF;
            if self.phase_saving > 1 || (self.phase_saving == 1 && c > trail_lim_last) {
                self.polarity[x] = self.vars.trail[c].sign();
            }
            self.insert_var_order(x);
        }
        self.qhead = trail_lim_level as i32;
        self.vars.trail.resize(trail_lim_level, Lit::UNDEF);
        self.vars.trail_lim.resize(level as usize, 0);
    }

    /// Detach a clause from watcher lists.
    ///
    /// param `strict` means we remove the clause from watchers eagerly, instead
    /// of just marking the watchlist as "dirty"
    fn detach_clause(&mut self, cr: CRef, strict: bool) {
        let (c0, c1, csize, clearnt) = {
            let c = self.ca.get_ref(cr);
            (c[0], c[1], c.size(), c.learnt())
        };
        debug_assert!(csize > 1);

        // Strict or lazy detaching:
        if strict {
            let pos = self.watches[!c0]
                .iter()
                .position(|x| x == &Watcher::new(cr, c1))
                .expect("Watcher not found");
            self.watches[!c0].remove(pos);
            let pos = self.watches[!c1]
                .iter()
                .position(|x| x == &Watcher::new(cr, c0))
                .expect("Watcher not found");
            self.watches[!c1].remove(pos);
        } else {
            self.watches.smudge(!c0);
            self.watches.smudge(!c1);
        }

        if clearnt {
            self.num_learnts -= 1;
            self.learnts_literals -= csize as u64;
        } else {
            self.num_clauses -= 1;
            self.clauses_literals -= csize as u64;
        }
    }

    /// Detach a clause and mark it deleted.
    ///
    /// With proof logging the deletion is recorded, the reason pointer is
    /// kept, and the arena storage is not reclaimed: the proof still refers
    /// to the clause body.
    fn remove_clause(&mut self, cr: CRef) {
        if self.log_proof {
            self.proof.push(cr);
        }
        if self.ca.get_ref(cr).size() > 1 {
            self.detach_clause(cr, false);
        }
        // Don't leave pointers to free'd memory!
        if !self.log_proof && self.locked(cr) {
            let c0 = self.ca.get_ref(cr)[0];
            self.vars.vardata[c0.var()].reason = CRef::UNDEF;
        }
        self.ca.get_mut(cr).set_mark(1); // used in reloc
        if !self.log_proof {
            self.ca.free(cr);
        }
    }

    pub fn satisfied(&self, cr: CRef) -> bool {
        self.ca
            .get_ref(cr)
            .iter()
            .any(|&lit| self.value_lit(lit) == lbool::TRUE)
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.vars.decision_level()
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vars.reason(x)
    }

    /// Returns `true` if a clause is a reason for some implication in the current state.
    fn locked(&self, cr: CRef) -> bool {
        let c0 = self.ca.get_ref(cr)[0];
        self.value_lit(c0) == lbool::TRUE && self.reason(c0.var()) == cr
    }

    fn progress_estimate(&self) -> f64 {
        let mut progress = 0.0;
        let f = 1.0 / self.num_vars() as f64;

        for i in 0..self.decision_level() + 1 {
            let beg: i32 = if i == 0 {
                0
            } else {
                self.vars.trail_lim[i as usize - 1]
            };
            let end: i32 = if i == self.decision_level() {
                self.vars.trail.len() as i32
            } else {
                self.vars.trail_lim[i as usize]
            };
            progress += f64::powi(f, i as i32) * (end - beg) as f64;
        }

        progress / self.num_vars() as f64
    }

    // ===== Proof validation =====

    /// Replay the proof backwards, rewinding the search: deleted clauses
    /// are resurrected, learnt clauses are removed again, the transitive
    /// unsatisfiable core is marked, and every core lemma is checked to
    /// follow from the earlier clauses by unit propagation.
    fn validate(&mut self) -> bool {
        debug_assert!(self.log_proof);
        debug_assert!(!self.ok);
        debug_assert!(self.proof.len() > 0);

        info!("validate.start ({} proof entries)", self.proof.len());

        // the final conflict clause is in the core, and so is the reason of
        // each of its (false) literals
        let last = self.proof[self.proof.len() - 1];
        self.ca.get_mut(last).set_core(true);
        let last_size = self.ca.get_ref(last).size();
        for i in 0..last_size {
            let l = self.ca.get_ref(last)[i];
            if self.value_lit(l) != lbool::FALSE {
                debug!("validate: proof does not end in a conflict clause");
                return false;
            }
            let r = self.reason(l.var());
            debug_assert_ne!(r, CRef::UNDEF);
            self.ca.get_mut(r).set_core(true);
        }

        let mut trail_sz = self.vars.trail.len();
        self.ok = true;

        // move back through the proof, shrinking the trail and validating
        // the core lemmas
        let mut i = self.proof.len() as i32 - 2;
        while i >= 0 {
            let cr = self.proof[i as usize];
            debug_assert_ne!(cr, CRef::UNDEF);
            i -= 1;
            let (mark, size) = {
                let c = self.ca.get_ref(cr);
                (c.mark(), c.size())
            };

            if mark == 1 {
                // a deletion record: undelete
                self.ca.get_mut(cr).set_mark(0);
                if size > 1 {
                    self.attach_clause(cr);
                } else {
                    let c0 = self.ca.get_ref(cr)[0];
                    if !self.enqueue(c0, cr) {
                        return false;
                    }
                }
                continue;
            }

            debug_assert_eq!(mark, 0);
            if self.locked(cr) {
                // undo the bcp this clause is responsible for
                let c0 = self.ca.get_ref(cr)[0];
                while self.vars.trail[trail_sz - 1] != c0 {
                    let x = self.vars.trail[trail_sz - 1].var();
                    self.vars.ass[x] = lbool::UNDEF;
                    self.insert_var_order(x);
                    trail_sz -= 1;

                    let r = self.reason(x);
                    debug_assert_ne!(r, CRef::UNDEF);
                    // a core reason pulls the reasons of its tail into the core
                    if self.ca.get_ref(r).core() {
                        let rsize = self.ca.get_ref(r).size();
                        for j in 1..rsize {
                            let y = self.ca.get_ref(r)[j].var();
                            let ry = self.reason(y);
                            debug_assert_ne!(ry, CRef::UNDEF);
                            self.ca.get_mut(ry).set_core(true);
                        }
                    }
                }
                debug_assert_eq!(self.vars.trail[trail_sz - 1], c0);
                self.vars.ass[c0.var()] = lbool::UNDEF;
                self.insert_var_order(c0.var());
                trail_sz -= 1;
            }
            // unit clauses don't need to be detached from watched literals
            if size > 1 {
                self.detach_clause(cr, false);
            }
            let core = self.ca.get_ref(cr).core();
            self.ca.get_mut(cr).set_mark(1);

            if core && size > 1 {
                debug_assert_eq!(self.value_lit(self.ca.get_ref(cr)[0]), lbool::UNDEF);
                // put the trail in a good state
                self.vars.trail.truncate(trail_sz);
                self.qhead = self.vars.trail.len() as i32;
                if self.vars.trail_lim.len() > 0 {
                    self.vars.trail_lim[0] = self.vars.trail.len() as i32;
                }
                if !self.validate_lemma(cr) {
                    return false;
                }
            }
        }

        // update trail and qhead
        self.vars.trail.truncate(trail_sz);
        self.qhead = self.vars.trail.len() as i32;
        if self.vars.trail_lim.len() > 0 {
            self.vars.trail_lim[0] = self.vars.trail.len() as i32;
        }

        // find core clauses in the rest of the trail
        for idx in (0..self.vars.trail.len()).rev() {
            let x = self.vars.trail[idx].var();
            let r = self.reason(x);
            debug_assert_ne!(r, CRef::UNDEF);
            if self.ca.get_ref(r).core() {
                let rsize = self.ca.get_ref(r).size();
                for j in 1..rsize {
                    let y = self.ca.get_ref(r)[j].var();
                    let ry = self.reason(y);
                    self.ca.get_mut(ry).set_core(true);
                }
            }
        }

        info!("validate.done");
        true
    }

    /// Check one core lemma: assume its negation on a fresh decision level,
    /// propagate, and require a conflict. Everything the conflict depends
    /// on is marked core.
    fn validate_lemma(&mut self, cr: CRef) -> bool {
        debug_assert_eq!(self.decision_level(), 0);
        debug_assert!(self.ok);
        debug_assert!(self.ca.get_ref(cr).core());
        debug_assert!(!self.locked(cr));

        // level 1 holds the negated lemma
        self.vars.new_decision_level();
        let size = self.ca.get_ref(cr).size();
        for j in 0..size {
            let l = self.ca.get_ref(cr)[j];
            self.enqueue(!l, CRef::UNDEF);
        }
        // level 2 holds everything the negated lemma forces
        self.vars.new_decision_level();

        let confl = match self.propagate(false) {
            Some(c) => c,
            None => {
                debug!("validate: lemma not derivable by propagation");
                return false;
            }
        };

        self.ca.get_mut(confl).set_core(true);
        let csize = self.ca.get_ref(confl).size();
        for i in 0..csize {
            let x = self.ca.get_ref(confl)[i].var();
            let lvl = self.vars.level(x);
            if lvl > 1 {
                // forced by propagation, mark it to be unrolled
                self.seen[x] = Seen::SOURCE;
            } else if lvl <= 0 {
                let r = self.reason(x);
                self.ca.get_mut(r).set_core(true);
            }
        }

        let bottom = self.vars.trail_lim[1] as usize;
        for idx in (bottom..self.vars.trail.len()).rev() {
            let x = self.vars.trail[idx].var();
            if !self.seen[x].is_seen() {
                continue;
            }
            self.seen[x] = Seen::UNDEF;
            let r = self.reason(x);
            debug_assert_ne!(r, CRef::UNDEF);
            self.ca.get_mut(r).set_core(true);

            debug_assert_eq!(self.value_lit(self.ca.get_ref(r)[0]), lbool::TRUE);
            let rsize = self.ca.get_ref(r).size();
            for j in 1..rsize {
                let q = self.ca.get_ref(r)[j];
                debug_assert_eq!(self.value_lit(q), lbool::FALSE);
                let y = q.var();
                let ylvl = self.vars.level(y);
                if ylvl > 1 {
                    self.seen[y] = Seen::SOURCE;
                } else if ylvl <= 0 {
                    let ry = self.reason(y);
                    self.ca.get_mut(ry).set_core(true);
                }
            }
        }

        // reset
        self.cancel_until(0);
        self.ok = true;
        true
    }

    // ===== Proof replay =====

    /// Walk the proof forwards, re-deriving every core lemma and emitting
    /// its resolution chain to the visitor. Deletions the search performed
    /// are mirrored here, but only once the core no longer needs the
    /// clause.
    fn replay<V: ProofVisitor>(&mut self, vis: &mut V) -> bool {
        debug_assert!(self.log_proof);
        debug_assert!(self.proof.len() > 0);

        info!("replay.start");
        let confl = self.propagate(true);
        debug_assert!(confl.is_none(), "replay expects a consistent database");

        self.label_level0(vis);

        for i in 0..self.proof.len() {
            let cr = self.proof[i];
            debug_assert_ne!(cr, CRef::UNDEF);
            let (mark, core, size) = {
                let c = self.ca.get_ref(cr);
                (c.mark(), c.core(), c.size())
            };

            // delete clause that was deleted before, except for locked and
            // core clauses
            if mark == 0 && !self.locked(cr) && !core {
                if size > 1 {
                    self.detach_clause(cr, false);
                }
                self.ca.get_mut(cr).set_mark(1);
                continue;
            }
            // if current clause is not core or already present, continue
            if !core || mark == 0 {
                continue;
            }

            // at least the asserting literal must be undefined
            debug_assert_eq!(self.value_lit(self.ca.get_ref(cr)[0]), lbool::UNDEF);

            self.vars.new_decision_level(); // decision level 1
            for j in 0..size {
                let l = self.ca.get_ref(cr)[j];
                self.enqueue(!l, CRef::UNDEF);
            }
            self.vars.new_decision_level(); // decision level 2
            let p = match self.propagate(true) {
                Some(p) => p,
                None => {
                    debug!("replay: no conflict for core lemma");
                    return false;
                }
            };
            // the trail at decision level 0 is implied by the database, at
            // level 1 it is the negated lemma, at level 2 everything derived
            // from it

            if self.traverse_proof(vis, cr, p) {
                self.cancel_until(0);
                self.ca.get_mut(cr).set_mark(0);
                // if unit (or unit under the level-0 trail), add to trail
                // and propagate
                if size <= 1 || self.value_lit(self.ca.get_ref(cr)[1]) == lbool::FALSE {
                    let c0 = self.ca.get_ref(cr)[0];
                    debug_assert_eq!(self.value_lit(c0), lbool::UNDEF);
                    self.unchecked_enqueue(c0, cr);
                    let confl = self.propagate(true);
                    self.label_level0(vis);
                    if let Some(confl) = confl {
                        // conflict at level 0: the empty clause is derived
                        self.label_final(vis, confl);
                        info!("replay.done (empty clause)");
                        return true;
                    }
                } else {
                    self.attach_clause(cr);
                }
            } else {
                self.cancel_until(0);
            }
        }

        if self.proof.len() == 1 {
            self.label_final(vis, self.proof[0]);
        }
        info!("replay.done");
        true
    }

    /// Walk the level-0 trail forward from the last labeled position and
    /// emit a resolution step for every propagated literal with a non-unit
    /// reason.
    fn label_level0<V: ProofVisitor>(&mut self, vis: &mut V) {
        let end = self.vars.trail.len();
        for i in self.replay_start..end {
            let p = self.vars.trail[i];
            let r = self.reason(p.var());
            if r == CRef::UNDEF || self.ca.get_ref(r).size() == 1 {
                continue;
            }
            let rsize = self.ca.get_ref(r).size();
            // size - 1 resolution steps derive the unit `p` from its reason
            if rsize == 2 {
                let piv = !self.ca.get_ref(r)[1];
                vis.visit_resolvent(&self.ca, p, piv, r);
            } else {
                self.chain_clauses.clear();
                self.chain_pivots.clear();
                self.chain_clauses.push(r);
                // the first literal is the result of the resolution, start from 1
                for j in 1..rsize {
                    let piv = !self.ca.get_ref(r)[j];
                    self.chain_pivots.push(piv);
                }
                vis.visit_chain_resolvent(
                    &self.ca,
                    Resolvent::Unit(p),
                    Chain::new(&self.chain_clauses, &self.chain_pivots),
                );
            }
        }
        self.replay_start = end;
    }

    /// Reconstruct the resolution chain deriving `lemma` from the conflict
    /// `confl`, walking the trail the way conflict analysis does. Returns
    /// `false` if the derivation is trivial (no resolution step).
    fn traverse_proof<V: ProofVisitor>(&mut self, vis: &mut V, lemma: CRef, confl: CRef) -> bool {
        let csize = self.ca.get_ref(confl).size();
        let mut path_c = csize as i32;
        for i in 0..csize {
            let x = self.ca.get_ref(confl)[i].var();
            self.seen[x] = Seen::SOURCE;
        }

        self.chain_clauses.clear();
        self.chain_pivots.clear();
        self.chain_clauses.push(confl);

        // walk up the trail
        let mut i = self.vars.trail.len();
        while path_c > 0 {
            debug_assert!(i > 0);
            i -= 1;
            let p = self.vars.trail[i];
            let x = p.var();
            if !self.seen[x].is_seen() {
                continue;
            }
            self.seen[x] = Seen::UNDEF;
            path_c -= 1;

            // literals at level 1 are the lemma's own assumptions
            if self.vars.level(x) == 1 {
                continue;
            }

            debug_assert_ne!(self.reason(x), CRef::UNDEF);
            self.chain_pivots.push(p);
            if self.vars.level(x) > 0 {
                let r = self.reason(x);
                self.chain_clauses.push(r);
            } else {
                // a level-0 pivot resolves with its own unit, no antecedent
                continue;
            }

            let r = self.reason(x);
            debug_assert_eq!(self.value_lit(self.ca.get_ref(r)[0]), lbool::TRUE);
            let rsize = self.ca.get_ref(r).size();
            for j in 1..rsize {
                let y = self.ca.get_ref(r)[j].var();
                if !self.seen[y].is_seen() {
                    self.seen[y] = Seen::SOURCE;
                    path_c += 1;
                }
            }
        }

        if self.chain_pivots.is_empty() {
            return false;
        }
        vis.visit_chain_resolvent(
            &self.ca,
            Resolvent::Clause(lemma),
            Chain::new(&self.chain_clauses, &self.chain_pivots),
        );
        true
    }

    /// Resolve the final conflict clause with the units of all its
    /// literals, yielding the empty clause.
    fn label_final<V: ProofVisitor>(&mut self, vis: &mut V, confl: CRef) {
        self.chain_clauses.clear();
        self.chain_pivots.clear();
        self.chain_clauses.push(confl);
        // the clause is false, all its literals are resolved away
        let csize = self.ca.get_ref(confl).size();
        for i in 0..csize {
            let piv = !self.ca.get_ref(confl)[i];
            self.chain_pivots.push(piv);
        }
        vis.visit_chain_resolvent(
            &self.ca,
            Resolvent::Empty,
            Chain::new(&self.chain_clauses, &self.chain_pivots),
        );
    }

    fn new(opts: &SolverOpts) -> Self {
        Self {
            vars: VarState::new(opts),
            num_clauses: 0,
            num_learnts: 0,
            clauses_literals: 0,
            learnts_literals: 0,

            clause_decay: opts.clause_decay,
            random_var_freq: opts.random_var_freq,
            random_seed: opts.random_seed,
            luby_restart: opts.luby_restart,
            ccmin_mode: opts.ccmin_mode,
            phase_saving: opts.phase_saving,
            rnd_pol: false,
            rnd_init_act: opts.rnd_init_act,
            garbage_frac: opts.garbage_frac,
            min_learnts_lim: opts.min_learnts_lim,
            log_proof: opts.log_proof,
            restart_first: opts.restart_first,
            restart_inc: opts.restart_inc,

            // Parameters (experimental):
            learntsize_adjust_start_confl: 100,
            learntsize_adjust_inc: 1.5,

            // Statistics: (formerly in 'SolverStats')
            solves: 0,
            starts: 0,
            decisions: 0,
            rnd_decisions: 0,
            propagations: 0,
            conflicts: 0,
            dec_vars: 0,
            max_literals: 0,
            tot_literals: 0,

            // Parameters (the rest):
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,

            polarity: VMap::new(),
            user_pol: VMap::new(),
            decision: VMap::new(),
            watches: Watches::new(),
            order_heap: ActivityHeap::new(),
            ok: true,
            cla_inc: 1.0,
            qhead: 0,
            simp_db_assigns: -1,
            simp_db_props: 0,
            progress_estimate: 0.0,
            remove_satisfied: true,
            next_var: Var::from_idx(0),

            ca: ClauseAllocator::new(),
            free_vars: vec![],
            assumptions: vec![],

            proof: vec![],
            part_info: VMap::new(),
            total_part: Range::UNDEF,
            replay_start: 0,
            chain_clauses: vec![],
            chain_pivots: vec![],

            seen: VMap::new(),
            minimize_stack: vec![],
            analyze_toclear: vec![],
            max_learnts: 0.0,
            learntsize_adjust_confl: 0.0,
            learntsize_adjust_cnt: 0,

            // Resource constraints:
            conflict_budget: -1,
            propagation_budget: -1,
        }
    }
}

impl VarState {
    fn new(opts: &SolverOpts) -> Self {
        Self {
            ass: VMap::new(),
            vardata: VMap::new(),
            activity: VMap::new(),
            var_inc: 1.0,
            var_decay: opts.var_decay,
            trail: vec![],
            trail_lim: vec![],
            trail_part: VMap::new(),
        }
    }

    #[inline(always)]
    pub fn num_assigns(&self) -> u32 {
        self.trail.len() as u32
    }

    /// Begins a new decision level.
    fn new_decision_level(&mut self) {
        let lvl = self.trail.len() as i32;
        self.trail_lim.push(lvl);
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        // find where the end of the level-0 part of the trail is
        let end = self
            .trail_lim
            .get(0)
            .map_or(self.trail.len(), |&x| x as usize);
        &self.trail[..end]
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vardata[x].reason
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    /// Record the assignment `p` with the given justification.
    fn assign(&mut self, p: Lit, from: CRef) {
        self.ass[p.var()] = lbool::new(p.sign());
        self.vardata[p.var()] = VarData::new(from, self.decision_level() as i32);
        self.trail.push(p);
    }

    /// Increase a variable with the current 'bump' value.
    fn var_bump_activity(&mut self, order_heap: &mut ActivityHeap, v: Var) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            // Rescale:
            for (_, x) in self.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }

        // Restore the branching order under the new activity:
        if order_heap.in_heap(v) {
            order_heap.bumped(&self.activity, v);
        }
    }
}

#[derive(Debug)]
enum ClauseSetSelect {
    Original,
    Learnt,
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: CRef,
    level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Seen {
    UNDEF,
    SOURCE,
}

/// Max-heap of variables ordered by activity, used for branching.
///
/// The heap does not own the activity scores; callers pass the activity
/// map in, so that bumping and rescaling stay with the rest of the
/// per-variable state.
#[derive(Debug)]
struct ActivityHeap {
    heap: Vec<Var>,
    indices: VMap<i32>,
}

impl ActivityHeap {
    fn new() -> Self {
        Self {
            heap: Vec::new(),
            indices: VMap::new(),
        }
    }
    fn len(&self) -> usize {
        self.heap.len()
    }
    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    fn in_heap(&self, v: Var) -> bool {
        self.indices.has(v) && self.indices[v] >= 0
    }
    /// The variable stored at heap position `i` (for random picking).
    fn at(&self, i: usize) -> Var {
        self.heap[i]
    }

    fn percolate_up(&mut self, activity: &VMap<f64>, mut i: u32) {
        let x = self.heap[i as usize];
        let mut p = parent_index(i);

        while i != 0 && activity[x] > activity[self.heap[p as usize]] {
            self.heap[i as usize] = self.heap[p as usize];
            let tmp = self.heap[p as usize];
            self.indices[tmp] = i as i32;
            i = p;
            p = parent_index(p);
        }
        self.heap[i as usize] = x;
        self.indices[x] = i as i32;
    }

    fn percolate_down(&mut self, activity: &VMap<f64>, mut i: u32) {
        let x = self.heap[i as usize];
        while (left_index(i) as usize) < self.heap.len() {
            let child = if (right_index(i) as usize) < self.heap.len()
                && activity[self.heap[right_index(i) as usize]]
                    > activity[self.heap[left_index(i) as usize]]
            {
                right_index(i)
            } else {
                left_index(i)
            };
            if activity[self.heap[child as usize]] <= activity[x] {
                break;
            }
            self.heap[i as usize] = self.heap[child as usize];
            let tmp = self.heap[i as usize];
            self.indices[tmp] = i as i32;
            i = child;
        }
        self.heap[i as usize] = x;
        self.indices[x] = i as i32;
    }

    /// Restore the order after `v`'s activity was bumped.
    fn bumped(&mut self, activity: &VMap<f64>, v: Var) {
        debug_assert!(self.in_heap(v));
        let i = self.indices[v];
        self.percolate_up(activity, i as u32);
    }

    fn insert(&mut self, activity: &VMap<f64>, v: Var) {
        self.indices.reserve(v, -1);
        debug_assert!(!self.in_heap(v));

        self.indices[v] = self.heap.len() as i32;
        self.heap.push(v);
        self.percolate_up(activity, self.indices[v] as u32);
    }

    /// Remove and return the most active variable.
    fn pop_max(&mut self, activity: &VMap<f64>) -> Var {
        let x = *self.heap.first().expect("heap is empty");
        let lastval = *self.heap.last().expect("heap is empty");
        self.heap[0] = lastval;
        self.indices[lastval] = 0;
        self.indices[x] = -1;
        self.heap.pop().expect("cannot pop from empty heap");
        if self.heap.len() > 1 {
            self.percolate_down(activity, 0);
        }
        x
    }

    /// Rebuild the heap from scratch, using the variables in `vs`.
    fn rebuild(&mut self, activity: &VMap<f64>, vs: &[Var]) {
        for i in 0..self.heap.len() {
            let x = self.heap[i];
            self.indices[x] = -1;
        }
        self.heap.clear();

        for (i, &x) in vs.iter().enumerate() {
            debug_assert!(self.indices.has(x));
            self.indices[x] = i as i32;
            self.heap.push(x);
        }

        let mut i = self.heap.len() as i32 / 2 - 1;
        while i >= 0 {
            self.percolate_down(activity, i as u32);
            i -= 1;
        }
    }
}

#[inline(always)]
fn left_index(i: u32) -> u32 {
    i * 2 + 1
}
#[inline(always)]
fn right_index(i: u32) -> u32 {
    (i + 1) * 2
}
#[inline(always)]
fn parent_index(i: u32) -> u32 {
    (i.wrapping_sub(1)) >> 1
}

mod utils {
    /// Finite subsequences of the Luby-sequence:
    ///
    /// > 0: 1
    /// > 1: 1 1 2
    /// > 2: 1 1 2 1 1 2 4
    /// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
    /// ...
    pub(super) fn luby(y: f64, mut x: i32) -> f64 {
        // Find the finite subsequence that contains index 'x', and the
        // size of that subsequence:
        let mut size = 1;
        let mut seq = 0;
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }

        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x = x % size;
        }

        f64::powi(y, seq)
    }

    /// Generate a random double:
    pub(super) fn drand(seed: &mut f64) -> f64 {
        *seed *= 1389796.0;
        let q = (*seed / 2147483647.0) as i32;
        *seed -= q as f64 * 2147483647.0;
        *seed / 2147483647.0
    }

    /// Generate a random integer:
    pub(super) fn irand(seed: &mut f64, size: i32) -> i32 {
        (drand(seed) * size as f64) as i32
    }

    #[cfg(test)]
    mod test {
        #[test]
        fn luby_prefix() {
            let t: Vec<i32> = (0..15).map(|i| super::luby(2.0, i) as i32).collect();
            assert_eq!(t, vec![1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8]);
        }
    }
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            reason: CRef::UNDEF,
            level: 0,
        }
    }
}

impl VarData {
    #[inline(always)]
    pub(super) fn new(reason: CRef, level: i32) -> Self {
        Self { reason, level }
    }
}

impl Default for Seen {
    #[inline]
    fn default() -> Self {
        Seen::UNDEF
    }
}

impl Seen {
    #[inline(always)]
    fn is_seen(&self) -> bool {
        *self != Seen::UNDEF
    }
}

pub struct SolverOpts {
    pub var_decay: f64,
    pub clause_decay: f64,
    pub random_var_freq: f64,
    pub random_seed: f64,
    pub ccmin_mode: i32,
    pub phase_saving: i32,
    pub rnd_init_act: bool,
    pub luby_restart: bool,
    pub restart_first: i32,
    pub restart_inc: f64,
    pub garbage_frac: f64,
    pub min_learnts_lim: i32,
    /// Record the resolution proof; enables `validate` and `replay` after
    /// an UNSAT answer. Disables clause-arena compaction.
    pub log_proof: bool,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        Self {
            var_decay: 0.95,
            clause_decay: 0.999,
            random_var_freq: 0.0,
            random_seed: 91648253.0,
            ccmin_mode: 2,
            phase_saving: 2,
            rnd_init_act: false,
            luby_restart: true,
            restart_first: 100,
            restart_inc: 2.0,
            garbage_frac: 0.20,
            min_learnts_lim: 0,
            log_proof: false,
        }
    }
}

impl SolverOpts {
    /// A solver that records a resolution proof of its UNSAT answers.
    pub fn proof_logging() -> Self {
        Self {
            log_proof: true,
            ..Self::default()
        }
    }

    /// Check that options are valid.
    pub fn check(&self) -> bool {
        (0.0 < self.var_decay && self.var_decay < 1.0)
            && (0.0 < self.clause_decay && self.clause_decay < 1.0)
            && (0.0 <= self.random_var_freq && self.random_var_freq <= 1.0)
            && (0.0 < self.random_seed && self.random_seed < f64::INFINITY)
            && (0 <= self.ccmin_mode && self.ccmin_mode <= 2)
            && !(self.log_proof && self.ccmin_mode == 1)
            && (0 <= self.phase_saving && self.phase_saving <= 2)
            && 1 <= self.restart_first
            && (1.0 < self.restart_inc && self.restart_inc < f64::INFINITY)
            && (0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY)
            && 0 <= self.min_learnts_lim
    }
}

use tracesat::{lbool, BasicCallbacks, BasicSolver, Lit, Range, Solver, SolverInterface, SolverOpts};

fn mk_solver(log_proof: bool) -> BasicSolver {
    let opts = SolverOpts {
        log_proof,
        ..SolverOpts::default()
    };
    Solver::new(opts, BasicCallbacks::new())
}

fn mk_lit(s: &mut BasicSolver, x: i32) -> Lit {
    assert_ne!(x, 0);
    let v = s.var_of_int((x.abs() - 1) as u32);
    Lit::new(v, x > 0)
}

fn add(s: &mut BasicSolver, lits: &[i32], part: u32) -> bool {
    let lits: Vec<Lit> = lits.iter().map(|&x| mk_lit(s, x)).collect();
    s.add_clause(&lits, Range::singleton(part))
}

/// 3 pigeons, 2 holes: every pigeon in some hole, no two pigeons share one.
/// Variable `3*j + i + 1` is "pigeon i sits in hole j".
fn pigeonhole_3_2(s: &mut BasicSolver) {
    let mut part = 1;
    for i in 0..3 {
        add(s, &[i + 1, i + 4], part);
        part += 1;
    }
    for j in 0..2i32 {
        for i in 0..3 {
            for k in (i + 1)..3 {
                add(s, &[-(3 * j + i + 1), -(3 * j + k + 1)], part);
                part += 1;
            }
        }
    }
}

#[test]
fn trivial_unsat() {
    let mut s = mk_solver(true);
    assert!(add(&mut s, &[1], 1));
    assert!(!add(&mut s, &[-1], 2));
    assert!(!s.is_ok());
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert_eq!(s.proof().len(), 1);
    assert!(s.validate());
}

#[test]
fn trivial_unsat_without_logging() {
    let mut s = mk_solver(false);
    add(&mut s, &[1], 1);
    add(&mut s, &[-1], 2);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(!s.is_ok());
    // no proof was recorded, validation must refuse
    assert!(!s.validate());
}

#[test]
fn pigeonhole_unsat_validates() {
    let mut s = mk_solver(true);
    pigeonhole_3_2(&mut s);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(!s.is_ok());

    // a tiny instance must not blow up the lemma count
    assert!(s.proof().len() <= 1000);

    // the proof ends with a clause false at level 0 (the empty clause witness)
    let &last = s.proof().last().unwrap();
    for &l in s.ca().get_ref(last).lits() {
        assert_eq!(s.value_lvl_0(l), lbool::FALSE);
    }

    assert!(s.validate());
}

#[test]
fn pigeonhole_core_is_closed_under_reasons() {
    let mut s = mk_solver(true);
    pigeonhole_3_2(&mut s);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(s.validate());

    // at least one clause was marked core
    let n_core = s
        .proof()
        .iter()
        .filter(|&&cr| s.ca().get_ref(cr).core())
        .count();
    assert!(n_core >= 1);
    assert!(n_core <= s.proof().len());

    // the core is closed under "reason of a core clause's tail literal"
    // over the level-0 trail
    for &l in s.proved_at_lvl_0() {
        let r = s.var_reason(l.var());
        if r == tracesat::CRef::UNDEF || !s.ca().get_ref(r).core() {
            continue;
        }
        for &q in &s.ca().get_ref(r).lits()[1..] {
            let rq = s.var_reason(q.var());
            assert_ne!(rq, tracesat::CRef::UNDEF);
            assert!(
                s.ca().get_ref(rq).core(),
                "reason of {:?} should be core",
                q
            );
        }
    }
}

#[test]
fn pigeonhole_learnt_partitions_stay_within_bounds() {
    let mut s = mk_solver(true);
    pigeonhole_3_2(&mut s);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);

    let total = s.total_partitions();
    assert!(!total.undef());
    for &cr in s.proof() {
        let c = s.ca().get_ref(cr);
        if c.learnt() {
            let p = c.part();
            assert!(!p.undef(), "learnt clauses must carry a partition");
            assert!(total.contains(p));
        }
    }
}

#[test]
fn assumptions_unsat_core() {
    let mut s = mk_solver(false);
    add(&mut s, &[1, 2], 1);
    add(&mut s, &[-1, 3], 1);
    add(&mut s, &[-2, 3], 1);

    let a = mk_lit(&mut s, -3);
    assert_eq!(s.solve_limited(&[a]), lbool::FALSE);
    // the conflict is exactly {3}: the negation of the failed assumption
    assert_eq!(s.unsat_core(), &[!a]);
    assert!(s.unsat_core_contains_lit(!a));
    assert!(s.unsat_core_contains_var(a.var()));

    // without the assumption the instance is satisfiable and the solver
    // remains usable
    assert!(s.is_ok());
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
}

#[test]
fn assumptions_unsat_keeps_proof_unused() {
    let mut s = mk_solver(true);
    add(&mut s, &[1, 2], 1);
    add(&mut s, &[-1, 3], 2);
    add(&mut s, &[-2, 3], 3);

    let a = mk_lit(&mut s, -3);
    assert_eq!(s.solve_limited(&[a]), lbool::FALSE);
    assert_eq!(s.unsat_core(), &[!a]);
    // `ok` is still true, so there is nothing to validate
    assert!(s.is_ok());
    assert!(!s.validate());
}

fn sat_instance() -> Vec<Vec<i32>> {
    vec![
        vec![-1, 2],
        vec![-2, 3],
        vec![-3, 4],
        vec![-4, 5],
        vec![1, 5],
        vec![-5, 6],
        vec![2, -6, 7],
        vec![-7, 1, 3],
    ]
}

fn check_model(s: &mut BasicSolver, clauses: &[Vec<i32>]) {
    for c in clauses {
        let sat = c.iter().any(|&x| {
            let l = mk_lit(s, x);
            s.value_lit(l) == lbool::TRUE
        });
        assert!(sat, "model must satisfy {:?}", c);
    }
}

#[test]
fn restart_luby_finds_model() {
    let mut s = mk_solver(false);
    let clauses = sat_instance();
    for c in &clauses {
        add(&mut s, c, 1);
    }
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
    check_model(&mut s, &clauses);
}

#[test]
fn restart_geometric_finds_model() {
    let opts = SolverOpts {
        luby_restart: false,
        restart_first: 1,
        ..SolverOpts::default()
    };
    let mut s = Solver::new(opts, BasicCallbacks::new());
    let clauses = sat_instance();
    for c in &clauses {
        add(&mut s, c, 1);
    }
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
    check_model(&mut s, &clauses);
}

#[test]
fn duplicate_literals_are_merged() {
    let mut s = mk_solver(false);
    assert!(add(&mut s, &[1, 1, 2], 1));
    assert_eq!(s.num_clauses(), 1);
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
}

#[test]
fn tautologies_are_dropped() {
    let mut s = mk_solver(false);
    assert!(add(&mut s, &[1, -1], 1));
    assert!(add(&mut s, &[2, -2, 3], 1));
    assert_eq!(s.num_clauses(), 0);
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
}

#[test]
fn almost_false_clause_enqueues_unit() {
    let mut s = mk_solver(true);
    assert!(add(&mut s, &[1], 1));
    // all but one literal false on input: an immediate unit, not attached
    assert!(add(&mut s, &[-1, 2], 2));
    let l2 = mk_lit(&mut s, 2);
    assert_eq!(s.value_lvl_0(l2), lbool::TRUE);
    assert!(s.proved_at_lvl_0().contains(&l2));
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
}

#[test]
fn unit_clauses_on_input() {
    let mut s = mk_solver(true);
    assert!(add(&mut s, &[3], 1));
    assert!(add(&mut s, &[-3, 1], 1));
    assert!(add(&mut s, &[-1, -3, 2], 2));
    let l1 = mk_lit(&mut s, 1);
    let l2 = mk_lit(&mut s, 2);
    assert_eq!(s.value_lvl_0(l1), lbool::TRUE);
    assert_eq!(s.value_lvl_0(l2), lbool::TRUE);
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
}

#[test]
fn disabled_decision_var() {
    let mut s = mk_solver(false);
    add(&mut s, &[1, 2], 1);
    let v2 = mk_lit(&mut s, 2).var();
    s.set_decision_var(v2, false);
    let clauses = vec![vec![1, 2]];
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
    check_model(&mut s, &clauses);
}

#[test]
fn conflict_budget_interrupts() {
    let mut s = mk_solver(false);
    pigeonhole_3_2(&mut s);
    s.set_conflict_budget(0);
    assert_eq!(s.solve_limited(&[]), lbool::UNDEF);
    // state stays usable; with the budget lifted the answer is UNSAT
    assert!(s.is_ok());
    s.budget_off();
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
}

#[test]
fn empty_clause_on_input() {
    let mut s = mk_solver(false);
    assert!(!add(&mut s, &[], 1));
    assert!(!s.is_ok());
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(s.unsat_core().is_empty());
}

#[test]
fn to_dimacs_smoke() {
    let mut s = mk_solver(false);
    add(&mut s, &[1, 2], 1);
    add(&mut s, &[-1, 3], 1);
    let mut out = Vec::new();
    s.to_dimacs(&mut out, &[]).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("p cnf "));
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn to_dimacs_unsat_state() {
    let mut s = mk_solver(false);
    add(&mut s, &[], 1);
    let mut out = Vec::new();
    s.to_dimacs(&mut out, &[]).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("p cnf 1 2"));
}

#[test]
fn solve_twice_is_stable() {
    let mut s = mk_solver(false);
    let clauses = sat_instance();
    for c in &clauses {
        add(&mut s, c, 1);
    }
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
    check_model(&mut s, &clauses);
}

#[test]
fn sticky_unsat_flag() {
    let mut s = mk_solver(true);
    add(&mut s, &[1], 1);
    add(&mut s, &[-1], 2);
    assert!(!s.is_ok());
    // everything after the latch is UNSAT with an empty conflict
    assert!(!add(&mut s, &[2, 3], 3));
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(s.unsat_core().is_empty());
}

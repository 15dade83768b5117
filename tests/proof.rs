//! Replay scenarios: the emitted chains, interpreted as resolutions on the
//! clauses they reference, must re-derive every lemma and end in the empty
//! clause.

use std::collections::HashSet;
use tracesat::{
    lbool, BasicCallbacks, BasicSolver, CRef, Chain, ClauseAllocator, Lit, ProofVisitor, Range,
    Resolvent, ResolutionTraceVisitor, Solver, SolverInterface, SolverOpts, TraceVisitor,
};

fn mk_solver() -> BasicSolver {
    Solver::new(SolverOpts::proof_logging(), BasicCallbacks::new())
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

/// Re-executes every emitted chain as a sequence of resolutions and checks
/// the resolvent against the announced parent.
#[derive(Default)]
struct CheckingVisitor {
    chains: usize,
    resolvents: usize,
    derived_empty: bool,
}

fn clause_set(ca: &ClauseAllocator, cr: CRef) -> HashSet<Lit> {
    ca.get_ref(cr).lits().iter().cloned().collect()
}

impl ProofVisitor for CheckingVisitor {
    fn visit_resolvent(&mut self, ca: &ClauseAllocator, parent: Lit, pivot: Lit, antecedent: CRef) {
        // resolving the antecedent with the unit `pivot` must leave `parent`
        let mut res = clause_set(ca, antecedent);
        assert!(res.remove(&!pivot), "antecedent lacks the negated pivot");
        assert_eq!(res, [parent].iter().cloned().collect());
        self.resolvents += 1;
    }

    fn visit_chain_resolvent(&mut self, ca: &ClauseAllocator, parent: Resolvent, chain: Chain) {
        assert!(!chain.clauses.is_empty());
        let mut cur = clause_set(ca, chain.clauses[0]);
        for i in 0..chain.pivots.len() {
            let piv = chain.pivots[i];
            let other: HashSet<Lit> = if i + 1 < chain.clauses.len() {
                clause_set(ca, chain.clauses[i + 1])
            } else {
                // trailing pivots stand for their unit fact
                [piv].iter().cloned().collect()
            };
            assert!(
                cur.remove(&!piv),
                "running resolvent lacks the negated pivot {:?}",
                piv
            );
            assert!(other.contains(&piv), "antecedent lacks the pivot {:?}", piv);
            for &l in other.iter() {
                if l != piv {
                    cur.insert(l);
                }
            }
        }
        match parent {
            Resolvent::Empty => {
                assert!(cur.is_empty(), "final chain must derive the empty clause");
                self.derived_empty = true;
            }
            Resolvent::Unit(l) => {
                assert_eq!(cur, [l].iter().cloned().collect());
            }
            Resolvent::Clause(cr) => {
                let lemma = clause_set(ca, cr);
                // the chain may derive a strict subset of the lemma
                assert!(
                    cur.is_subset(&lemma),
                    "chain resolvent {:?} must be within the lemma {:?}",
                    cur,
                    lemma
                );
            }
        }
        self.chains += 1;
    }
}

#[test]
fn replay_trivial_unsat() {
    let mut s = mk_solver();
    add(&mut s, &[1], 1);
    add(&mut s, &[-1], 2);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(s.validate());

    let mut vis = CheckingVisitor::default();
    assert!(s.replay(&mut vis));
    // a single chain resolves the two input units into the empty clause
    assert_eq!(vis.chains, 1);
    assert!(vis.derived_empty);
}

#[test]
fn replay_pigeonhole_derives_empty_clause() {
    let mut s = mk_solver();
    pigeonhole_3_2(&mut s);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(s.validate());

    let mut vis = CheckingVisitor::default();
    assert!(s.replay(&mut vis));
    assert!(vis.chains >= 1);
    assert!(vis.derived_empty);
}

#[test]
fn replay_chained_units() {
    // a unit chain: 1, 1->2, 2->3, and 3 is forbidden
    let mut s = mk_solver();
    add(&mut s, &[1], 1);
    add(&mut s, &[-1, 2], 1);
    add(&mut s, &[-2, 3], 2);
    add(&mut s, &[-3], 2);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(s.validate());

    let mut vis = CheckingVisitor::default();
    assert!(s.replay(&mut vis));
    assert!(vis.derived_empty);
    // the forced units 2 and 3 come from binary reasons
    assert!(vis.resolvents + vis.chains >= 2);
}

#[test]
fn replay_refuses_without_proof() {
    let mut s = mk_solver();
    add(&mut s, &[1, 2], 1);
    assert_eq!(s.solve_limited(&[]), lbool::TRUE);
    let mut vis = CheckingVisitor::default();
    assert!(!s.replay(&mut vis));
    assert!(!s.validate());
}

#[test]
fn trace_visitor_output_shape() {
    let mut s = mk_solver();
    pigeonhole_3_2(&mut s);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(s.validate());

    let mut vis = TraceVisitor::new();
    assert!(s.replay(&mut vis));
    assert!(!vis.is_empty());

    let text = vis.to_string();
    // every chain line references antecedents announced beforehand
    assert!(text.lines().any(|l| l.starts_with("vL (c")));
    assert!(text.lines().any(|l| l.starts_with("vH (")));
    for line in text.lines() {
        assert!(line.starts_with("vL (") || line.starts_with("vR (") || line.starts_with("vH ("));
    }
}

#[test]
fn resolution_trace_ends_with_empty_clause() {
    let mut s = mk_solver();
    pigeonhole_3_2(&mut s);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(s.validate());

    let mut vis = ResolutionTraceVisitor::new();
    assert!(s.replay(&mut vis));
    assert!(!vis.is_empty());

    let text = vis.to_string();
    let mut ids = Vec::new();
    let mut empty_seen = false;
    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        assert!(tokens.len() >= 2);
        let id: u64 = tokens[0].parse().expect("line starts with a clause id");
        ids.push(id);
        // an empty literal section means the empty clause was emitted
        if tokens[1] == "0" {
            empty_seen = true;
            // a derived empty clause must list antecedents
            assert!(tokens.len() > 3);
        }
    }
    assert!(empty_seen, "trace must contain the empty clause");
    // fresh ids increase monotonically
    for w in ids.windows(2) {
        assert!(w[0] < w[1]);
    }
}

#[test]
fn trace_visitor_trivial_chain() {
    let mut s = mk_solver();
    add(&mut s, &[1], 1);
    add(&mut s, &[-1], 2);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(s.validate());

    let mut vis = TraceVisitor::new();
    assert!(s.replay(&mut vis));
    let text = vis.to_string();
    // one leaf announcement for the conflict clause, one for the unit,
    // then the closing chain
    assert!(text.lines().any(|l| l.starts_with("vH (e 0 ")));
}

#[test]
fn partition_provenance_survives_replay() {
    let mut s = mk_solver();
    add(&mut s, &[1], 1);
    add(&mut s, &[-1, 2], 2);
    add(&mut s, &[-2], 3);
    assert_eq!(s.solve_limited(&[]), lbool::FALSE);
    assert!(s.validate());

    assert!(s.total_partitions().contains(Range::new(1, 2)));
    // the variable of the shared unit occurs in partitions 1 and 2
    let v1 = mk_lit(&mut s, 1).var();
    assert_eq!(s.var_partitions(v1), Range::new(1, 2));

    let mut vis = CheckingVisitor::default();
    assert!(s.replay(&mut vis));
    assert!(vis.derived_empty);
}

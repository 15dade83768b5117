//! Resolution proof traversal.
//!
//! During replay the solver re-derives every core lemma by unit propagation
//! and reports the underlying resolution steps to a [`ProofVisitor`].
//! Downstream consumers (interpolation, unsat-core extraction, trace
//! printers) implement the visitor and never touch solver internals beyond
//! the read-only clause arena handed to each visit call.

use crate::clause::{CRef, ClauseAllocator, Lit, VMap};
use std::collections::HashMap;
use std::fmt;

/// The clause produced by a chain of resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolvent {
    /// A clause of the database, given by its id.
    Clause(CRef),
    /// A unit fact, given as the literal it forces.
    Unit(Lit),
    /// The empty clause.
    Empty,
}

/// A chain of resolution steps.
///
/// `clauses[0]` is resolved with `clauses[1]` on `pivots[0]`, the result
/// with `clauses[2]` on `pivots[1]`, and so on. Once the clauses are
/// exhausted, every remaining pivot stands for the unit fact of that
/// literal: the running resolvent is resolved with the unit `pivots[i]`.
/// Pivots are given as the literal that is true on the trail, so the
/// running resolvent contains its negation.
#[derive(Debug, Clone, Copy)]
pub struct Chain<'a> {
    pub clauses: &'a [CRef],
    pub pivots: &'a [Lit],
}

impl<'a> Chain<'a> {
    pub(crate) fn new(clauses: &'a [CRef], pivots: &'a [Lit]) -> Self {
        Chain { clauses, pivots }
    }
}

/// Consumer of resolution steps emitted during proof replay.
///
/// All methods default to doing nothing so a visitor only implements the
/// shapes it cares about. Each call receives the clause arena for read-only
/// access to clause bodies by id.
pub trait ProofVisitor {
    /// A single binary resolution deriving the unit `parent` by resolving
    /// the unit fact `pivot` with the clause `antecedent` on the pivot's
    /// variable.
    fn visit_resolvent(&mut self, _ca: &ClauseAllocator, _parent: Lit, _pivot: Lit, _antecedent: CRef) {
    }

    /// A chain of resolutions deriving `parent`.
    fn visit_chain_resolvent(&mut self, _ca: &ClauseAllocator, _parent: Resolvent, _chain: Chain) {}
}

/// Human-readable proof trace.
///
/// Announces every leaf clause (`vL (c..)`) and every unit (`vL (l..)`)
/// once, then one `vR` line per binary resolvent and one `vH` line per
/// chain. Literals are keyed by their packed index, clauses by their arena
/// id. The trace is buffered and rendered through `Display`.
pub struct TraceVisitor {
    steps: Vec<TraceStep>,
    units: VMap<bool>,
    visited: HashMap<CRef, bool>,
}

#[derive(Debug)]
enum TraceStep {
    LeafClause(CRef),
    LeafUnit(Lit),
    Resolvent {
        parent: Lit,
        pivot: Lit,
        antecedent: CRef,
    },
    ChainResolvent {
        parent: Resolvent,
        clauses: Vec<CRef>,
        pivots: Vec<Lit>,
    },
}

impl TraceVisitor {
    pub fn new() -> Self {
        Self {
            steps: vec![],
            units: VMap::new(),
            visited: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn announce_unit(&mut self, lit: Lit) {
        self.units.reserve(lit.var(), false);
        if !self.units[lit.var()] {
            self.units[lit.var()] = true;
            self.steps.push(TraceStep::LeafUnit(lit));
        }
    }

    fn announce_clause(&mut self, cr: CRef) {
        if !self.visited.contains_key(&cr) {
            self.visited.insert(cr, true);
            self.steps.push(TraceStep::LeafClause(cr));
        }
    }

    fn announce_antecedents(&mut self, chain: Chain) {
        self.announce_clause(chain.clauses[0]);
        for i in 0..chain.pivots.len() {
            if i + 1 < chain.clauses.len() {
                self.announce_clause(chain.clauses[i + 1]);
            } else {
                self.announce_unit(chain.pivots[i]);
            }
        }
    }
}

impl Default for TraceVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofVisitor for TraceVisitor {
    fn visit_resolvent(&mut self, _ca: &ClauseAllocator, parent: Lit, pivot: Lit, antecedent: CRef) {
        self.announce_unit(pivot);
        self.announce_clause(antecedent);
        self.units.reserve(parent.var(), false);
        self.units[parent.var()] = true;
        self.steps.push(TraceStep::Resolvent {
            parent,
            pivot,
            antecedent,
        });
    }

    fn visit_chain_resolvent(&mut self, _ca: &ClauseAllocator, parent: Resolvent, chain: Chain) {
        self.announce_antecedents(chain);
        match parent {
            Resolvent::Unit(l) => {
                self.units.reserve(l.var(), false);
                self.units[l.var()] = true;
            }
            Resolvent::Clause(cr) => {
                self.visited.insert(cr, true);
            }
            Resolvent::Empty => (),
        }
        self.steps.push(TraceStep::ChainResolvent {
            parent,
            clauses: chain.clauses.to_vec(),
            pivots: chain.pivots.to_vec(),
        });
    }
}

impl fmt::Display for TraceVisitor {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use crate::intmap::AsIndex;
        for step in &self.steps {
            match step {
                TraceStep::LeafClause(cr) => writeln!(out, "vL (c{})", cr.as_index())?,
                TraceStep::LeafUnit(l) => writeln!(out, "vL (l{})", l.idx())?,
                TraceStep::Resolvent {
                    parent,
                    pivot,
                    antecedent,
                } => writeln!(
                    out,
                    "vR (l{}, l{}, c{})",
                    parent.idx(),
                    pivot.idx(),
                    antecedent.as_index()
                )?,
                TraceStep::ChainResolvent {
                    parent,
                    clauses,
                    pivots,
                } => {
                    match parent {
                        Resolvent::Unit(l) => write!(out, "vH (l{} 0 ", l.idx())?,
                        Resolvent::Clause(cr) => write!(out, "vH (c{} 0 ", cr.as_index())?,
                        Resolvent::Empty => write!(out, "vH (e 0 ")?,
                    }
                    write!(out, "c{} ", clauses[0].as_index())?;
                    for i in 0..pivots.len() {
                        if i + 1 < clauses.len() {
                            write!(out, "c{} ", clauses[i + 1].as_index())?;
                        } else {
                            write!(out, "l{} ", pivots[i].idx())?;
                        }
                    }
                    writeln!(out, " 0)")?;
                }
            }
        }
        Ok(())
    }
}

/// Numeric resolution trace indexed by fresh clause ids.
///
/// Every emitted clause, leaves included, gets a monotonically increasing
/// id. Each line lists the id, the clause literals in DIMACS convention
/// and, for derived clauses, the antecedent ids. Leaves referenced for the
/// first time are emitted on demand, before the step that uses them.
pub struct ResolutionTraceVisitor {
    steps: Vec<NumStep>,
    next_id: u64,
    clause_ids: HashMap<CRef, u64>,
    unit_ids: VMap<u64>, // 0 = not emitted yet
}

#[derive(Debug)]
struct NumStep {
    id: u64,
    lits: Vec<Lit>,
    antecedents: Vec<u64>,
}

impl ResolutionTraceVisitor {
    pub fn new() -> Self {
        Self {
            steps: vec![],
            next_id: 1,
            clause_ids: HashMap::new(),
            unit_ids: VMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn clause_id(&mut self, ca: &ClauseAllocator, cr: CRef) -> u64 {
        if let Some(&id) = self.clause_ids.get(&cr) {
            return id;
        }
        let id = self.fresh_id();
        self.clause_ids.insert(cr, id);
        self.steps.push(NumStep {
            id,
            lits: ca.get_ref(cr).lits().to_vec(),
            antecedents: vec![],
        });
        id
    }

    fn unit_id(&mut self, lit: Lit) -> u64 {
        self.unit_ids.reserve(lit.var(), 0);
        if self.unit_ids[lit.var()] != 0 {
            return self.unit_ids[lit.var()];
        }
        let id = self.fresh_id();
        self.unit_ids[lit.var()] = id;
        self.steps.push(NumStep {
            id,
            lits: vec![lit],
            antecedents: vec![],
        });
        id
    }

    fn set_unit_id(&mut self, lit: Lit, id: u64) {
        self.unit_ids.reserve(lit.var(), 0);
        self.unit_ids[lit.var()] = id;
    }
}

impl Default for ResolutionTraceVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofVisitor for ResolutionTraceVisitor {
    fn visit_resolvent(&mut self, ca: &ClauseAllocator, parent: Lit, pivot: Lit, antecedent: CRef) {
        let a0 = self.clause_id(ca, antecedent);
        let a1 = self.unit_id(pivot);
        let id = self.fresh_id();
        self.set_unit_id(parent, id);
        self.steps.push(NumStep {
            id,
            lits: vec![parent],
            antecedents: vec![a0, a1],
        });
    }

    fn visit_chain_resolvent(&mut self, ca: &ClauseAllocator, parent: Resolvent, chain: Chain) {
        let mut antecedents = Vec::with_capacity(chain.pivots.len() + 1);
        antecedents.push(self.clause_id(ca, chain.clauses[0]));
        for i in 0..chain.pivots.len() {
            if i + 1 < chain.clauses.len() {
                let a = self.clause_id(ca, chain.clauses[i + 1]);
                antecedents.push(a);
            } else {
                let a = self.unit_id(chain.pivots[i]);
                antecedents.push(a);
            }
        }
        let id = self.fresh_id();
        let lits = match parent {
            Resolvent::Unit(l) => {
                self.set_unit_id(l, id);
                vec![l]
            }
            Resolvent::Clause(cr) => {
                self.clause_ids.insert(cr, id);
                ca.get_ref(cr).lits().to_vec()
            }
            Resolvent::Empty => vec![],
        };
        self.steps.push(NumStep { id, lits, antecedents });
    }
}

impl fmt::Display for ResolutionTraceVisitor {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        for step in &self.steps {
            write!(out, "{}", step.id)?;
            for &lit in &step.lits {
                write!(
                    out,
                    " {}{}",
                    if lit.sign() { "" } else { "-" },
                    lit.var().idx() + 1
                )?;
            }
            write!(out, " 0")?;
            for &a in &step.antecedents {
                write!(out, " {}", a)?;
            }
            writeln!(out, " 0")?;
        }
        Ok(())
    }
}

//! Watchlists to detect clauses that became unit.
//!
//! Every clause of size two or more watches two of its literals. The watch
//! index maps each literal to the set of clause ids currently watching it and
//! is kept the exact inverse of the clauses' watch positions. A clause only
//! has to be re-examined when one of its watched literals is assigned false,
//! which is when the propagation scans the literal's watcher set.
//!
//! Only membership matters here. The scan order over a watcher set has no
//! influence on the final assignment produced by propagation, and the sets
//! support cheap single id insertion and removal while a scan over a
//! snapshot of the ids is in progress.
use rustc_hash::FxHashSet;

use marl_formula::Lit;

use crate::clause::ClauseId;

/// Watchlists to detect clauses that became unit.
#[derive(Default)]
pub struct Watchlists {
    /// Watcher sets indexed by the code of the watched literal.
    watches: Vec<FxHashSet<ClauseId>>,
}

impl Watchlists {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.watches.resize(count * 2, FxHashSet::default());
    }

    /// Start watching a clause with its two watched literals.
    pub fn watch_clause(&mut self, id: ClauseId, lits: [Lit; 2]) {
        debug_assert!(lits[0] != lits[1]);
        for &lit in lits.iter() {
            self.add_watch(lit, id);
        }
    }

    /// Make a literal watch a clause.
    pub fn add_watch(&mut self, lit: Lit, id: ClauseId) {
        self.watches[lit.code()].insert(id);
    }

    /// Stop watching a clause through the given literal.
    pub fn remove_watch(&mut self, lit: Lit, id: ClauseId) {
        let removed = self.watches[lit.code()].remove(&id);
        debug_assert!(removed);
    }

    /// Ids of the clauses watching a given literal.
    pub fn watched_by(&self, lit: Lit) -> &FxHashSet<ClauseId> {
        &self.watches[lit.code()]
    }

    /// Whether the given literal watches the given clause.
    pub fn contains(&self, lit: Lit, id: ClauseId) -> bool {
        self.watches[lit.code()].contains(&id)
    }
}

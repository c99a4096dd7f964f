//! A VSIDS style branching heuristic.
//!
//! Every literal carries an integer count that starts at its number of
//! occurrences in the input clauses and grows by one for each occurrence in a
//! learned clause. Decisions branch on the literal with the highest count
//! among the literals whose variable is unassigned. Unlike the classic
//! decaying variant the counts are never scaled down, so recent conflicts and
//! old ones weigh the same.
//!
//! Besides the counts the heuristic keeps an ordered pool of `(count,
//! literal)` candidates. Popping its maximum is cheap and entries are
//! repositioned when their count changes. The pool is not eagerly pruned when
//! a variable is assigned during propagation; such stale entries are filtered
//! out when a decision is requested, and backtracking reinstates both
//! polarities of every variable it unassigns.
use std::collections::BTreeSet;

use marl_formula::{Lit, Var};

use super::DecisionHeuristic;
use crate::prop::Assignment;

/// A VSIDS style branching heuristic without score decay.
#[derive(Default)]
pub struct Vsids {
    /// The occurrence count of each literal, indexed by literal code.
    count: Vec<u64>,
    /// Branching candidates ordered by count, then literal.
    ///
    /// Entries always carry the literal's current count, so membership can be
    /// checked without a scan.
    pool: BTreeSet<(u64, Lit)>,
}

impl DecisionHeuristic for Vsids {
    fn set_var_count(&mut self, count: usize) {
        let old_count = self.count.len();
        self.count.resize(count * 2, 0);

        for code in old_count..count * 2 {
            self.pool.insert((0, Lit::from_code(code)));
        }
    }

    fn bump_clause(&mut self, lits: &[Lit]) {
        for &lit in lits.iter() {
            let count = &mut self.count[lit.code()];
            let old = *count;
            *count += 1;

            // Only entries currently in the pool are repositioned.
            if self.pool.remove(&(old, lit)) {
                self.pool.insert((old + 1, lit));
            }
        }
    }

    fn pick_decision(&mut self, assignment: &Assignment) -> Option<Lit> {
        while let Some(&entry) = self.pool.iter().next_back() {
            self.pool.remove(&entry);

            let (_, lit) = entry;
            if assignment.var_value(lit.var()).is_none() {
                return Some(lit);
            }
            // A stale entry for a variable assigned by propagation, drop it.
        }
        None
    }

    fn make_available(&mut self, var: Var) {
        for &lit in [var.positive(), var.negative()].iter() {
            self.pool.insert((self.count[lit.code()], lit));
        }
    }
}

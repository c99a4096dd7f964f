//! Temporary data.
use marl_formula::Lit;

use crate::clause::ClauseId;

/// Temporary data used by various parts of the solver.
///
/// Make sure to check any documented invariants when using this. Also make
/// sure to check all existing users when adding invariants.
#[derive(Default)]
pub struct TmpData {
    pub lits: Vec<Lit>,
    pub simplified: Vec<Lit>,
    /// Snapshot of a literal's watcher ids during propagation.
    pub watchers: Vec<ClauseId>,
}

//! Central solver data structure.
//!
//! This module defines the `Context` data structure which holds all data used
//! by the solver. It also contains global notification functions that likely
//! need to be extended when new parts are added to the solver.
use partial_ref::{part, partial, PartialRef, PartialRefTarget};

use crate::analyze_conflict::AnalyzeConflict;
use crate::clause::ClauseDb;
use crate::decision::Decider;
use crate::prop::{Assignment, ImplGraph, PropQueue, Watchlists};
use crate::state::SolverState;
use crate::tmp::TmpData;

/// Part declarations for the [`Context`] struct.
pub mod parts {
    use super::*;

    part!(pub AnalyzeConflictP: AnalyzeConflict);
    part!(pub AssignmentP: Assignment);
    part!(pub ClauseDbP: ClauseDb);
    part!(pub DeciderP: Decider);
    part!(pub ImplGraphP: ImplGraph);
    part!(pub PropQueueP: PropQueue);
    part!(pub SolverStateP: SolverState);
    part!(pub TmpDataP: TmpData);
    part!(pub WatchlistsP: Watchlists);
}

pub use parts::*;

/// Central solver data structure.
///
/// This struct contains all data kept by the solver. Most functions operating
/// on multiple fields of the context use partial references provided by the
/// `partial_ref` crate. This documents the data dependencies and makes the
/// borrow checker happy without the overhead of passing individual references.
#[derive(PartialRefTarget, Default)]
pub struct Context {
    #[part(AnalyzeConflictP)]
    pub analyze_conflict: AnalyzeConflict,
    #[part(AssignmentP)]
    pub assignment: Assignment,
    #[part(ClauseDbP)]
    pub clause_db: ClauseDb,
    #[part(DeciderP)]
    pub decider: Decider,
    #[part(ImplGraphP)]
    pub impl_graph: ImplGraph,
    #[part(PropQueueP)]
    pub prop_queue: PropQueue,
    #[part(SolverStateP)]
    pub solver_state: SolverState,
    #[part(TmpDataP)]
    pub tmp_data: TmpData,
    #[part(WatchlistsP)]
    pub watchlists: Watchlists,
}

/// Update structures for a new variable count.
pub fn set_var_count(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut DeciderP,
        mut ImplGraphP,
        mut WatchlistsP,
    ),
    count: usize,
) {
    ctx.part_mut(AssignmentP).set_var_count(count);
    ctx.part_mut(DeciderP).set_var_count(count);
    ctx.part_mut(ImplGraphP).set_var_count(count);
    ctx.part_mut(WatchlistsP).set_var_count(count);
}

/// Increases the variable count to at least the given value.
pub fn ensure_var_count(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut DeciderP,
        mut ImplGraphP,
        mut WatchlistsP,
    ),
    count: usize,
) {
    if count > ctx.part(AssignmentP).var_count() {
        set_var_count(ctx.borrow(), count)
    }
}

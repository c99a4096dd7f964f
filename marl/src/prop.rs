//! Unit propagation.
pub mod assignment;
pub mod watch;

pub use assignment::{backtrack, enqueue_assignment, Assignment, ImplGraph, ImplNode, PropQueue};
pub use watch::Watchlists;

use partial_ref::{partial, PartialRef};

use marl_formula::{Lit, Var};

use crate::clause::ClauseId;
use crate::context::{
    AssignmentP, ClauseDbP, Context, ImplGraphP, PropQueueP, TmpDataP, WatchlistsP,
};

/// Propagation that ran into a falsified clause.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Conflict {
    /// The clause whose literals are all false.
    pub clause: ClauseId,
    /// The variable whose attempted second assignment collided.
    pub var: Var,
}

/// Extend the current assignment by all unit propagation consequences.
///
/// Drains the propagation queue, scanning for each dequeued literal the
/// watchers of its negation. On conflict the queue is left as is, the caller
/// resets it while recovering.
pub fn propagate(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut PropQueueP,
        mut TmpDataP,
        mut WatchlistsP,
    ),
) -> Result<(), Conflict> {
    while let Some(lit) = ctx.part_mut(PropQueueP).pop() {
        propagate_literal(ctx.borrow(), lit)?;
    }
    Ok(())
}

/// Scan the clauses watching the negation of a just assigned literal.
///
/// Each watcher either finds a replacement watched literal that is not
/// false, keeps watching because its other watched literal is already true,
/// propagates that other literal, or reports a conflict.
fn propagate_literal(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut PropQueueP,
        mut TmpDataP,
        mut WatchlistsP,
    ),
    lit: Lit,
) -> Result<(), Conflict> {
    let false_lit = !lit;

    // Replacement watches move to non-false literals only, so no id can be
    // added to this literal's watcher set during the scan below. A snapshot
    // of the ids makes the removals safe.
    let (tmp, mut ctx) = ctx.split_part_mut(TmpDataP);
    tmp.watchers.clear();
    tmp.watchers
        .extend(ctx.part(WatchlistsP).watched_by(false_lit).iter().copied());

    let (db, mut ctx) = ctx.split_part_mut(ClauseDbP);

    for &id in tmp.watchers.iter() {
        let clause = db.clause_mut(id);

        let mut replacement = None;
        for (position, &candidate) in clause.lits().iter().enumerate() {
            if clause.is_watch(position) {
                continue;
            }
            if !ctx.part(AssignmentP).lit_is_false(candidate) {
                replacement = Some((position, candidate));
                break;
            }
        }

        match replacement {
            Some((position, new_watched)) => {
                clause.move_watch(false_lit, position);
                let watchlists = ctx.part_mut(WatchlistsP);
                watchlists.remove_watch(false_lit, id);
                watchlists.add_watch(new_watched, id);
            }
            None => {
                // No replacement, the clause is unit or falsified.
                let other = clause.other_watched(false_lit);
                match ctx.part(AssignmentP).lit_value(other) {
                    Some(true) => {}
                    Some(false) => {
                        return Err(Conflict {
                            clause: id,
                            var: other.var(),
                        })
                    }
                    None => enqueue_assignment(ctx.borrow(), other, Some(id)),
                }
            }
        }
    }

    Ok(())
}

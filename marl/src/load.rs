//! Loading a formula into the solver.
use partial_ref::{partial, PartialRef};

use marl_formula::Lit;

use crate::context::{
    AssignmentP, ClauseDbP, Context, DeciderP, ImplGraphP, PropQueueP, SolverStateP, TmpDataP,
    WatchlistsP,
};
use crate::prop::enqueue_assignment;
use crate::state::SatState;

/// Adds a clause to the current formula.
///
/// Removes duplicated literals, ignores tautological clauses (eg. x v -x v y)
/// and literals already false at the root, handles empty clauses and
/// dispatches among unit and watched clauses. This establishes what the
/// search core expects of its input: every stored clause is a set of distinct
/// non-complementary literals.
///
/// Clauses can only be added before the search has made decisions. The
/// solver's variable count has to cover the clause, if necessary adjust it
/// before calling this.
pub fn load_clause(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut DeciderP,
        mut ImplGraphP,
        mut PropQueueP,
        mut SolverStateP,
        mut TmpDataP,
        mut WatchlistsP,
    ),
    lits: &[Lit],
) {
    if ctx.part(SolverStateP).sat_state == SatState::Unsat {
        return;
    }

    debug_assert_eq!(ctx.part(AssignmentP).current_level(), 0);

    let (tmp, mut ctx) = ctx.split_part_mut(TmpDataP);

    tmp.lits.clear();
    tmp.lits.extend_from_slice(lits);

    tmp.lits.sort_unstable();
    tmp.lits.dedup();

    // Complementary literals are adjacent after sorting by code
    let mut last = None;

    for &lit in tmp.lits.iter() {
        if last == Some(!lit) {
            return;
        }
        last = Some(lit);
    }

    // Remove literals false at the root and skip clauses already satisfied
    tmp.simplified.clear();

    for &lit in tmp.lits.iter() {
        match ctx.part(AssignmentP).lit_value(lit) {
            Some(true) => return,
            Some(false) => (),
            None => tmp.simplified.push(lit),
        }
    }

    ctx.part_mut(DeciderP).bump_clause(&tmp.simplified);

    match tmp.simplified[..] {
        [] => ctx.part_mut(SolverStateP).sat_state = SatState::Unsat,
        [lit] => enqueue_assignment(ctx.borrow(), lit, None),
        _ => {
            let id = ctx
                .part_mut(ClauseDbP)
                .add_clause(tmp.simplified.clone());
            let watched = [tmp.simplified[0], tmp.simplified[1]];
            ctx.part_mut(WatchlistsP).watch_clause(id, watched);
        }
    }
}

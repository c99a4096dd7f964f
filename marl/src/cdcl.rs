//! Conflict driven clause learning.
use log::debug;
use partial_ref::{partial, PartialRef};

use crate::analyze_conflict::analyze_conflict;
use crate::context::{
    AnalyzeConflictP, AssignmentP, ClauseDbP, Context, DeciderP, ImplGraphP, PropQueueP,
    SolverStateP, TmpDataP, WatchlistsP,
};
use crate::decision::make_decision;
use crate::prop::{backtrack, enqueue_assignment, propagate, Conflict};
use crate::state::SatState;

/// Find a conflict, learn a clause and backtrack.
///
/// When no conflict is left to find, the formula is satisfied by the current
/// assignment. When conflict analysis hits the root level, the formula is
/// unsatisfiable.
pub fn conflict_step(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ClauseDbP,
        mut DeciderP,
        mut ImplGraphP,
        mut PropQueueP,
        mut SolverStateP,
        mut TmpDataP,
        mut WatchlistsP,
    ),
) {
    let conflict = match find_conflict(ctx.borrow()) {
        Ok(()) => {
            ctx.part_mut(SolverStateP).sat_state = SatState::Sat;
            return;
        }
        Err(conflict) => conflict,
    };

    ctx.part_mut(SolverStateP).conflicts += 1;
    ctx.part_mut(DeciderP).note_conflict();

    let backjump_level = match analyze_conflict(ctx.borrow(), conflict) {
        Some(level) => level,
        None => {
            ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
            return;
        }
    };

    // Everything still queued was derived above the backjump level
    ctx.part_mut(PropQueueP).clear();

    backtrack(ctx.borrow(), backjump_level);

    let (analyze, mut ctx) = ctx.split_part(AnalyzeConflictP);
    let lits = analyze.clause();

    // After backtracking exactly one literal of the learned clause is not
    // false, the unique implication point the clause asserts.
    let mut asserting = None;
    for (position, &lit) in lits.iter().enumerate() {
        if !ctx.part(AssignmentP).lit_is_false(lit) {
            assert!(
                asserting.is_none(),
                "learned clause asserts more than one literal"
            );
            debug_assert!(ctx.part(AssignmentP).lit_is_unk(lit));
            asserting = Some((position, lit));
        }
    }
    let (uip_position, uip_lit) = match asserting {
        Some(found) => found,
        None => panic!("learned clause asserts no literal"),
    };

    debug!(
        "conflict {}: learned clause of length {}, backjumping to level {}",
        ctx.part(SolverStateP).conflicts,
        lits.len(),
        backjump_level,
    );

    let id = ctx.part_mut(ClauseDbP).add_learned(lits.to_vec());

    if lits.len() >= 2 {
        // Watch the asserting literal and any other position, distinct by
        // construction.
        let other_position = if uip_position == 0 { 1 } else { 0 };
        ctx.part_mut(ClauseDbP)
            .clause_mut(id)
            .set_watches(uip_position, other_position);
        ctx.part_mut(WatchlistsP)
            .watch_clause(id, [uip_lit, lits[other_position]]);
    }

    enqueue_assignment(ctx.borrow(), uip_lit, Some(id));

    ctx.part_mut(DeciderP).bump_clause(lits);
}

/// Find a conflict.
///
/// Propagates to a fixpoint and makes decisions until propagation runs into
/// a falsified clause. Returns `Ok` if all variables were assigned without a
/// conflict, i.e. a satisfying assignment was found.
fn find_conflict(
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
) -> Result<(), Conflict> {
    loop {
        propagate(ctx.borrow())?;

        if !make_decision(ctx.borrow()) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use partial_ref::IntoPartialRefMut;

    use marl_formula::{cnf_formula, CnfFormula};

    use crate::context::set_var_count;
    use crate::load::load_clause;

    use crate::test::{sat_formula, sgen_unsat_formula};

    fn solve_formula(
        mut ctx: partial!(
            Context,
            mut AnalyzeConflictP,
            mut AssignmentP,
            mut ClauseDbP,
            mut DeciderP,
            mut ImplGraphP,
            mut PropQueueP,
            mut SolverStateP,
            mut TmpDataP,
            mut WatchlistsP,
        ),
        formula: &CnfFormula,
    ) -> SatState {
        set_var_count(ctx.borrow(), formula.var_count());

        for clause in formula.iter() {
            load_clause(ctx.borrow(), clause);
        }

        while ctx.part(SolverStateP).sat_state == SatState::Unknown {
            conflict_step(ctx.borrow());
        }

        ctx.part(SolverStateP).sat_state
    }

    /// The watch index must stay the exact inverse of the clauses' watch
    /// positions.
    fn check_watches(
        ctx: partial!(Context, ClauseDbP, WatchlistsP),
    ) {
        for (id, clause) in ctx.part(ClauseDbP).iter() {
            if clause.len() < 2 {
                continue;
            }

            let (w1, w2) = clause.watch_positions();
            assert_ne!(w1, w2);

            // a clause contains each literal only once, so watch membership
            // can be checked per literal
            for (position, &lit) in clause.lits().iter().enumerate() {
                let is_watched = position == w1 || position == w2;
                assert_eq!(ctx.part(WatchlistsP).contains(lit, id), is_watched);
            }
        }
    }

    #[test]
    fn level_0_unsat() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        let formula = cnf_formula![
            1, 2, 3;
            -1;
            1, -2;
            2, -3;
        ];

        assert_eq!(solve_formula(ctx.borrow(), &formula), SatState::Unsat);
    }

    #[test]
    fn learns_clauses_on_conflicts() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        // pigeonhole formula for three pigeons and two holes
        let formula = cnf_formula![
            1, 2;
            3, 4;
            5, 6;
            -1, -3;
            -1, -5;
            -3, -5;
            -2, -4;
            -2, -6;
            -4, -6;
        ];

        assert_eq!(solve_formula(ctx.borrow(), &formula), SatState::Unsat);
        assert!(ctx.part(ClauseDbP).learned_count() > 0);
        check_watches(ctx.borrow());
    }

    proptest! {
        #[test]
        fn sgen_unsat(formula in sgen_unsat_formula(1..7usize)) {
            let mut ctx = Context::default();
            let mut ctx = ctx.into_partial_ref_mut();

            prop_assert_eq!(solve_formula(ctx.borrow(), &formula), SatState::Unsat);
        }

        #[test]
        fn sat(formula in sat_formula(4..20usize, 10..100usize, 0.05..0.2, 0.9..1.0)) {
            let mut ctx = Context::default();
            let mut ctx = ctx.into_partial_ref_mut();

            prop_assert_eq!(solve_formula(ctx.borrow(), &formula), SatState::Sat);

            for clause in formula.iter() {
                prop_assert!(clause.iter().any(|&lit| ctx.part(AssignmentP).lit_is_true(lit)));
            }

            check_watches(ctx.borrow());
        }
    }
}

//! Decision heuristics.
use std::ops;

use partial_ref::{partial, PartialRef};

use marl_formula::{Lit, Var};

use crate::context::{AssignmentP, Context, DeciderP, ImplGraphP, PropQueueP, SolverStateP};
use crate::prop::{enqueue_assignment, Assignment};

pub mod vsids;

/// Operations the CDCL loop needs from a branching heuristic.
///
/// The loop stays independent of the concrete heuristic, which is selected
/// when the solver is constructed.
pub trait DecisionHeuristic {
    /// Update structures for a new variable count.
    fn set_var_count(&mut self, count: usize);

    /// Record one occurrence of every literal of a clause.
    ///
    /// Called for every clause added to the formula, input and learned alike.
    fn bump_clause(&mut self, lits: &[Lit]);

    /// Called once per conflict.
    fn note_conflict(&mut self) {}

    /// The highest ranked literal with an unassigned variable.
    ///
    /// The literal's polarity is the truth value to guess. Returns `None`
    /// only when every variable is assigned.
    fn pick_decision(&mut self, assignment: &Assignment) -> Option<Lit>;

    /// Make an unassigned variable eligible for branching again.
    fn make_available(&mut self, var: Var);
}

/// The branching heuristic selected for this solver instance.
pub struct Decider {
    heuristic: Box<dyn DecisionHeuristic>,
}

impl Decider {
    pub fn new(heuristic: Box<dyn DecisionHeuristic>) -> Decider {
        Decider { heuristic }
    }
}

impl Default for Decider {
    fn default() -> Decider {
        Decider::new(Box::new(vsids::Vsids::default()))
    }
}

impl ops::Deref for Decider {
    type Target = dyn DecisionHeuristic;

    fn deref(&self) -> &(dyn DecisionHeuristic + 'static) {
        &*self.heuristic
    }
}

impl ops::DerefMut for Decider {
    fn deref_mut(&mut self) -> &mut (dyn DecisionHeuristic + 'static) {
        &mut *self.heuristic
    }
}

/// Make a decision and enqueue it.
///
/// Opens a new decision level whose decision is the heuristic's literal.
///
/// Returns `false` if no decision was made because all variables are
/// assigned.
pub fn make_decision(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut DeciderP,
        mut ImplGraphP,
        mut PropQueueP,
        mut SolverStateP,
    ),
) -> bool {
    if ctx.part(AssignmentP).all_assigned() {
        return false;
    }

    let (decider, mut ctx) = ctx.split_part_mut(DeciderP);

    let decision = match decider.pick_decision(ctx.part(AssignmentP)) {
        Some(lit) => lit,
        None => unreachable!("no decision candidate while a variable is unassigned"),
    };

    debug_assert!(ctx.part(PropQueueP).is_empty());

    ctx.part_mut(AssignmentP).new_decision_level();
    enqueue_assignment(ctx.borrow(), decision, None);
    ctx.part_mut(SolverStateP).decisions += 1;

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use marl_formula::lit;

    use crate::context::set_var_count;

    /// Branches on the lowest indexed unassigned variable, guessing true.
    pub struct Sequential;

    impl DecisionHeuristic for Sequential {
        fn set_var_count(&mut self, _count: usize) {}

        fn bump_clause(&mut self, _lits: &[Lit]) {}

        fn pick_decision(&mut self, assignment: &Assignment) -> Option<Lit> {
            assignment
                .values()
                .iter()
                .position(|value| value.is_none())
                .map(|index| Lit::from_index(index, true))
        }

        fn make_available(&mut self, _var: Var) {}
    }

    #[test]
    fn decisions_open_new_levels() {
        let mut ctx = Context::default();
        ctx.decider = Decider::new(Box::new(Sequential));
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 3);

        assert!(make_decision(ctx.borrow()));
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(1)));
        assert_eq!(ctx.part(AssignmentP).current_level(), 1);
        ctx.part_mut(PropQueueP).clear();

        assert!(make_decision(ctx.borrow()));
        ctx.part_mut(PropQueueP).clear();
        assert!(make_decision(ctx.borrow()));
        ctx.part_mut(PropQueueP).clear();
        assert_eq!(ctx.part(AssignmentP).current_level(), 3);

        assert!(!make_decision(ctx.borrow()));
        assert_eq!(ctx.part(SolverStateP).decisions, 3);
    }
}

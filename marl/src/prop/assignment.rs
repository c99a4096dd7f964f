//! Partial assignment, decision levels and backtracking.
use std::collections::VecDeque;

use partial_ref::{partial, PartialRef};

use marl_formula::lit::LitIdx;
use marl_formula::{Lit, Var};

use crate::clause::ClauseId;
use crate::context::{AssignmentP, Context, DeciderP, ImplGraphP, PropQueueP};

/// Current partial assignment.
///
/// Also tracks the current decision level and the chronological step index of
/// the next assignment within that level. The decision of a level is always
/// step 0, propagated literals get the following steps.
#[derive(Default)]
pub struct Assignment {
    values: Vec<Option<bool>>,
    num_assigned: usize,
    level: LitIdx,
    step: LitIdx,
}

impl Assignment {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.values.resize(count, None);
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.values.len()
    }

    /// Current partial assignment as slice.
    pub fn values(&self) -> &[Option<bool>] {
        &self.values
    }

    /// Value assigned to a variable.
    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.values[var.index()]
    }

    /// Value assigned to a literal.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.values[lit.index()].map(|value| value ^ lit.is_negative())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.values[lit.index()] == Some(lit.is_positive())
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.values[lit.index()] == Some(lit.is_negative())
    }

    pub fn lit_is_unk(&self, lit: Lit) -> bool {
        self.values[lit.index()].is_none()
    }

    /// Number of assigned variables.
    pub fn num_assigned(&self) -> usize {
        self.num_assigned
    }

    /// Whether every variable is assigned.
    pub fn all_assigned(&self) -> bool {
        self.num_assigned == self.values.len()
    }

    /// Assign a literal to true.
    ///
    /// The literal's variable must be unassigned. This does not record any
    /// assignment metadata, use
    /// [`enqueue_assignment`](crate::prop::enqueue_assignment) during search.
    pub fn assign_lit(&mut self, lit: Lit) {
        debug_assert!(self.lit_value(lit).is_none());
        self.values[lit.index()] = Some(lit.is_positive());
        self.num_assigned += 1;
    }

    /// The current decision level, 0 before any decision was made.
    pub fn current_level(&self) -> usize {
        self.level as usize
    }

    /// Enter the next decision level.
    ///
    /// The next assignment becomes the level's decision at step 0.
    pub fn new_decision_level(&mut self) {
        self.level += 1;
        self.step = 0;
    }
}

/// Per variable assignment metadata.
///
/// Only valid while the variable is assigned, backtracking leaves stale data
/// behind.
#[derive(Copy, Clone)]
pub struct ImplNode {
    pub level: LitIdx,
    pub step: LitIdx,
    /// Id of the clause that propagated this assignment, `None` for decisions
    /// and for units of the input formula.
    pub reason: Option<ClauseId>,
}

/// The implication graph.
///
/// This is a DAG having all assigned variables as nodes. It has unit clauses
/// and decisions as sources. For each propagated assignment it records the
/// clause whose other literals were all false when the propagation happened.
#[derive(Default)]
pub struct ImplGraph {
    /// Contains only valid data for indices of assigned variables.
    pub nodes: Vec<ImplNode>,
}

impl ImplGraph {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.nodes.resize(
            count,
            ImplNode {
                level: 0,
                step: 0,
                reason: None,
            },
        );
    }

    /// Get the decision level of an assigned variable.
    ///
    /// Returns stale data if the variable isn't assigned.
    pub fn level(&self, var: Var) -> usize {
        self.nodes[var.index()].level as usize
    }

    /// Get the intra-level step of an assigned variable.
    ///
    /// Returns stale data if the variable isn't assigned.
    pub fn step(&self, var: Var) -> usize {
        self.nodes[var.index()].step as usize
    }

    /// Get the reason clause of an assigned variable.
    ///
    /// Returns stale data if the variable isn't assigned.
    pub fn reason(&self, var: Var) -> Option<ClauseId> {
        self.nodes[var.index()].reason
    }
}

/// FIFO of literals that just became true and still need their watchers
/// scanned.
#[derive(Default)]
pub struct PropQueue {
    queue: VecDeque<Lit>,
}

impl PropQueue {
    pub fn push(&mut self, lit: Lit) {
        self.queue.push_back(lit)
    }

    pub fn pop(&mut self) -> Option<Lit> {
        self.queue.pop_front()
    }

    pub fn clear(&mut self) {
        self.queue.clear()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Enqueues the assignment of true to a literal.
///
/// This updates the assignment and the implication graph and places the
/// literal on the propagation queue, but does not perform any propagation.
/// The literal has to be unassigned when calling this.
pub fn enqueue_assignment(
    mut ctx: partial!(Context, mut AssignmentP, mut ImplGraphP, mut PropQueueP),
    lit: Lit,
    reason: Option<ClauseId>,
) {
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    assignment.assign_lit(lit);

    ctx.part_mut(ImplGraphP).nodes[lit.index()] = ImplNode {
        level: assignment.level,
        step: assignment.step,
        reason,
    };
    assignment.step += 1;

    ctx.part_mut(PropQueueP).push(lit);
}

/// Undo all assignments in decision levels above the given level.
///
/// Unset variables are handed back to the decision heuristic. The step
/// counter continues after the last step of the target level, so the next
/// assignment orders correctly behind the surviving ones.
pub fn backtrack(
    mut ctx: partial!(Context, mut AssignmentP, mut DeciderP, ImplGraphP),
    target_level: usize,
) {
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (graph, mut ctx) = ctx.split_part(ImplGraphP);
    let decider = ctx.part_mut(DeciderP);

    debug_assert!(target_level < assignment.level as usize);

    let mut max_step = 0;
    for index in 0..assignment.values.len() {
        if assignment.values[index].is_none() {
            continue;
        }
        let node = graph.nodes[index];
        if node.level as usize > target_level {
            assignment.values[index] = None;
            assignment.num_assigned -= 1;
            decider.make_available(Var::from_index(index));
        } else if node.level as usize == target_level && node.step > max_step {
            max_step = node.step;
        }
    }

    assignment.level = target_level as LitIdx;
    assignment.step = max_step + 1;
}

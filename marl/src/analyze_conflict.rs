//! Learns a new clause by analyzing a conflict.
use partial_ref::{partial, PartialRef};

use marl_formula::{Lit, Var};

use crate::context::{AnalyzeConflictP, ClauseDbP, Context, ImplGraphP};
use crate::prop::Conflict;

/// Temporaries for conflict analysis.
#[derive(Default)]
pub struct AnalyzeConflict {
    /// This is the learned clause after analysis finishes.
    clause: Vec<Lit>,
    /// Scratch buffer for building resolvents.
    resolvent: Vec<Lit>,
}

impl AnalyzeConflict {
    /// The learned clause.
    pub fn clause(&self) -> &[Lit] {
        &self.clause
    }
}

/// Learns a new clause by analyzing a conflict.
///
/// Starting from the falsified clause, the analysis resolves away the most
/// recently assigned literal of the conflict's decision level until a single
/// literal of that level is left, the first unique implication point. The
/// result is left in [`AnalyzeConflict`] and the backjump level is returned:
/// the second largest decision level among the learned clause's literals, or
/// 0 when the learned clause is unit.
///
/// Returns `None` when the conflict does not depend on any decision, which
/// proves the formula unsatisfiable.
pub fn analyze_conflict(
    mut ctx: partial!(Context, mut AnalyzeConflictP, ClauseDbP, ImplGraphP),
    conflict: Conflict,
) -> Option<usize> {
    let (analyze, mut ctx) = ctx.split_part_mut(AnalyzeConflictP);
    let (graph, ctx) = ctx.split_part(ImplGraphP);
    let db = ctx.part(ClauseDbP);

    analyze.clause.clear();
    analyze
        .clause
        .extend_from_slice(db.clause(conflict.clause).lits());

    let conflict_level = analyze
        .clause
        .iter()
        .map(|&lit| graph.level(lit.var()))
        .max()
        .unwrap_or(0);

    if conflict_level == 0 {
        return None;
    }

    loop {
        // Find the most recently assigned literal of the conflict level. On
        // (impossible) equal steps the later literal wins, matching the scan
        // direction.
        let mut at_level = 0;
        let mut pivot: Option<(Var, usize)> = None;
        for &lit in analyze.clause.iter() {
            let var = lit.var();
            if graph.level(var) == conflict_level {
                at_level += 1;
                let step = graph.step(var);
                if pivot.map_or(true, |(_, max_step)| step >= max_step) {
                    pivot = Some((var, step));
                }
            }
        }

        if at_level <= 1 {
            break;
        }

        let pivot_var = match pivot {
            Some((var, _)) => var,
            None => unreachable!("conflict level is not empty"),
        };

        // Everything but the level's decision has an antecedent, and the
        // decision can never be the most recent of two assignments here.
        let reason = match graph.reason(pivot_var) {
            Some(reason) => reason,
            None => unreachable!("pivot has no antecedent"),
        };

        resolve(
            &mut analyze.clause,
            &mut analyze.resolvent,
            db.clause(reason).lits(),
            pivot_var,
        );
    }

    let mut largest = 0;
    let mut second_largest = 0;
    for &lit in analyze.clause.iter() {
        let level = graph.level(lit.var());
        if level > largest {
            second_largest = largest;
            largest = level;
        } else if level > second_largest {
            second_largest = level;
        }
    }

    Some(second_largest)
}

/// Resolve the current clause with an antecedent on the given variable.
///
/// The result is the union of both clauses with both polarities of the pivot
/// variable removed, deduplicated by literal.
fn resolve(clause: &mut Vec<Lit>, scratch: &mut Vec<Lit>, antecedent: &[Lit], pivot: Var) {
    scratch.clear();
    scratch.extend(clause.iter().copied().filter(|lit| lit.var() != pivot));
    scratch.extend(antecedent.iter().copied().filter(|lit| lit.var() != pivot));
    scratch.sort_unstable();
    scratch.dedup();
    std::mem::swap(clause, scratch);
}

#[cfg(test)]
mod tests {
    use super::*;

    use marl_formula::{lit, lits, var};

    #[test]
    fn resolve_is_union_without_the_pivot() {
        let mut clause = lits![1, -2, 3].to_vec();
        let mut scratch = vec![];

        resolve(&mut clause, &mut scratch, &lits![5, 2, 3], var!(2));

        clause.sort_unstable();
        let mut expected = lits![1, 3, 5].to_vec();
        expected.sort_unstable();
        assert_eq!(clause, expected);

        for &lit in clause.iter() {
            assert!(lit.var() != var!(2));
        }
    }

    #[test]
    fn resolve_removes_duplicates() {
        let mut clause = lits![1, -2, 3].to_vec();
        let mut scratch = vec![];

        resolve(&mut clause, &mut scratch, &lits![2, 3, -4], var!(2));

        assert_eq!(clause.len(), 3);
        assert!(clause.contains(&lit!(1)));
        assert!(clause.contains(&lit!(3)));
        assert!(clause.contains(&lit!(-4)));
    }
}

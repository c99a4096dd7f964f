//! Boolean satisfiability solver.
use std::io;

use anyhow::Error;
use log::info;
use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};

use marl_dimacs::DimacsParser;
use marl_formula::{CnfFormula, Lit};

use crate::cdcl::conflict_step;
use crate::context::{ensure_var_count, AssignmentP, ClauseDbP, Context, SolverStateP};
use crate::decision::{Decider, DecisionHeuristic};
use crate::load::load_clause;
use crate::state::SatState;

/// A boolean satisfiability solver.
#[derive(Default)]
pub struct Solver {
    ctx: Box<Context>,
}

/// Search statistics of a [`Solver`].
#[derive(Copy, Clone, Debug, Default)]
pub struct SolverStats {
    pub decisions: u64,
    pub conflicts: u64,
    pub learned_clauses: u64,
}

impl Solver {
    /// Create a new solver branching with the default VSIDS heuristic.
    pub fn new() -> Solver {
        Solver::default()
    }

    /// Create a new solver branching with the given heuristic.
    pub fn with_heuristic(heuristic: Box<dyn DecisionHeuristic>) -> Solver {
        let mut solver = Solver::default();
        solver.ctx.decider = Decider::new(heuristic);
        solver
    }

    /// Add a formula to the solver.
    ///
    /// Clauses have to be added before calling [`solve`](Solver::solve).
    pub fn add_formula(&mut self, formula: &CnfFormula) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ensure_var_count(ctx.borrow(), formula.var_count());
        for clause in formula.iter() {
            load_clause(ctx.borrow(), clause);
        }
    }

    /// Reads and adds a formula in DIMACS CNF format.
    ///
    /// Using this avoids creating a temporary [`CnfFormula`].
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), Error> {
        use io::BufRead;

        let mut buffer = io::BufReader::new(input);
        let mut parser = DimacsParser::new();

        loop {
            let data = buffer.fill_buf()?;
            if data.is_empty() {
                break;
            }
            parser.parse_chunk(data)?;
            let len = data.len();
            buffer.consume(len);

            self.add_formula(&parser.take_formula());
        }
        parser.eof()?;
        self.add_formula(&parser.take_formula());
        parser.check_header()?;

        info!(
            "parsed formula with {} variables and {} clauses",
            parser.var_count(),
            parser.clause_count()
        );

        Ok(())
    }

    /// Check the satisfiability of the current formula.
    pub fn solve(&mut self) -> Option<bool> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        while ctx.part(SolverStateP).sat_state == SatState::Unknown {
            conflict_step(ctx.borrow());
        }

        let state = ctx.part(SolverStateP);
        info!(
            "finished with {} decisions, {} conflicts and {} learned clauses",
            state.decisions,
            state.conflicts,
            ctx.part(ClauseDbP).learned_count()
        );

        match state.sat_state {
            SatState::Unknown => None,
            SatState::Sat => Some(true),
            SatState::Unsat => Some(false),
        }
    }

    /// Set of literals that satisfy the formula.
    ///
    /// The literal at position `i` assigns variable `i + 1`.
    pub fn model(&self) -> Option<Vec<Lit>> {
        let ctx = self.ctx.into_partial_ref();
        if ctx.part(SolverStateP).sat_state == SatState::Sat {
            Some(
                ctx.part(AssignmentP)
                    .values()
                    .iter()
                    .enumerate()
                    .flat_map(|(index, assignment)| {
                        assignment.map(|polarity| Lit::from_index(index, polarity))
                    })
                    .collect(),
            )
        } else {
            None
        }
    }

    /// Statistics of the search so far.
    pub fn stats(&self) -> SolverStats {
        let ctx = self.ctx.into_partial_ref();
        let state = ctx.part(SolverStateP);
        SolverStats {
            decisions: state.decisions,
            conflicts: state.conflicts,
            learned_clauses: ctx.part(ClauseDbP).learned_count() as u64,
        }
    }
}

//! CNF formulas.
use std::borrow::Borrow;
use std::iter::FromIterator;

use crate::lit::Lit;

/// A formula in conjunctive normal form: a conjunction of clauses, each of
/// which is a disjunction of literals.
///
/// The variable count covers every variable a clause mentions, including any
/// unmentioned variables with smaller indices, and can be raised explicitly
/// for variables no clause mentions at all.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CnfFormula {
    var_count: usize,
    clauses: Vec<Vec<Lit>>,
}

impl CnfFormula {
    /// Create a formula without any clauses.
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// Variable count of the formula.
    ///
    /// A vector of this length can be indexed with every variable index the
    /// formula mentions.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Raise the variable count to the given value.
    ///
    /// A count not above the current one is ignored.
    pub fn set_var_count(&mut self, count: usize) {
        if count > self.var_count {
            self.var_count = count;
        }
    }

    /// How many clauses the formula has.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether the formula contains no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Append a clause, growing the variable count to cover it.
    pub fn add_clause<L: Borrow<Lit>>(&mut self, literals: impl IntoIterator<Item = L>) {
        let clause: Vec<Lit> = literals.into_iter().map(|lit| *lit.borrow()).collect();

        for lit in clause.iter() {
            if lit.index() >= self.var_count {
                self.var_count = lit.index() + 1;
            }
        }

        self.clauses.push(clause);
    }

    /// The clauses in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        self.clauses.iter().map(|clause| clause.as_slice())
    }
}

/// Collect an iterator of clauses into a formula.
impl<I: IntoIterator<Item = L>, L: Borrow<Lit>> FromIterator<I> for CnfFormula {
    fn from_iter<T: IntoIterator<Item = I>>(clauses: T) -> CnfFormula {
        let mut formula = CnfFormula::new();
        for clause in clauses {
            formula.add_clause(clause);
        }
        formula
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*};

    use crate::lit::strategy::lit;

    pub fn vec_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = Vec<Vec<Lit>>> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        // ind_flat_map keeps shrinking affordable
        vars.prop_ind_flat_map(move |vars| {
            prop::collection::vec(
                prop::collection::vec(lit(0..vars), clause_len.clone()),
                clauses.clone(),
            )
        })
    }

    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        vec_formula(vars, clauses, clause_len)
            .prop_map(|clauses| clauses.into_iter().collect::<CnfFormula>())
            .no_shrink() // shrinking whole formulas is far too slow
    }
}

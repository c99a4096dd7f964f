//! Variable, literal and formula types for the marl SAT solver.

/// Literal from its signed DIMACS integer, for tests.
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! lit {
    ($lit:expr) => {
        $crate::Lit::from_dimacs($lit)
    };
}

/// Variable from its DIMACS integer, for tests.
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! var {
    ($var:expr) => {
        $crate::Var::from_dimacs($var)
    };
}

/// Array of literals from signed DIMACS integers, for tests.
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! lits {
    ( $( $lit:expr ),* $(,)? ) => {
        [ $( $crate::lit!( $lit ) ),* ]
    };
}

/// Formula from semicolon-separated clauses of DIMACS integers, for tests.
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! cnf_formula {
    ( $( $( $lit:expr ),* );* ; ) => {{
        let mut formula = $crate::cnf::CnfFormula::new();
        $( formula.add_clause(&[ $( $crate::lit!( $lit ) ),* ] as &[$crate::Lit]); )*
        formula
    }};
}

pub mod cnf;
pub mod lit;

pub use cnf::CnfFormula;
pub use lit::{Lit, Var};

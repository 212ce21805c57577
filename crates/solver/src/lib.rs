//! Satisfiability checks for [SymbolicBit] constraints.
//!
//! The [ConstraintSolver] trait is the seam between path exploration and whatever decides
//! satisfiability. `Z3Solver` hands the constraint to Z3 and is available with the default `z3`
//! feature. [SatSolver] is a small self-contained fallback for builds without Z3. It is only
//! practical for narrow constraints: wide multiplication or division can keep it searching for a
//! very long time.

mod cnf;
mod sat;
#[cfg(feature = "z3")]
mod z3_backend;

pub use cnf::*;
pub use sat::*;
#[cfg(feature = "z3")]
pub use z3_backend::*;

use sym::{SymbolicBit, VariableAssignments};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The backend gave up before reaching an answer.
    #[error("solver gave up after {conflicts} conflicts")]
    ResourceLimit { conflicts: usize },

    /// The backend failed or could not be reached.
    #[error("solver unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Answer to a satisfiability query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Satisfiability {
    /// The constraint holds under the given assignment. Variables missing from the model may take
    /// any value.
    Satisfiable(VariableAssignments),

    Unsatisfiable,
}

impl Satisfiability {
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, Self::Satisfiable(_))
    }

    pub fn into_model(self) -> Option<VariableAssignments> {
        match self {
            Self::Satisfiable(model) => Some(model),
            Self::Unsatisfiable => None,
        }
    }
}

/// Decides whether a constraint can be true.
///
/// Implementations must be shareable across threads since paths may be explored in parallel.
pub trait ConstraintSolver: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Checks whether `constraint` has a satisfying assignment.
    fn solve(&self, constraint: &SymbolicBit) -> Result<Satisfiability>;
}

impl<S: ConstraintSolver + ?Sized> ConstraintSolver for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, constraint: &SymbolicBit) -> Result<Satisfiability> {
        (**self).solve(constraint)
    }
}

impl<S: ConstraintSolver + ?Sized> ConstraintSolver for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, constraint: &SymbolicBit) -> Result<Satisfiability> {
        (**self).solve(constraint)
    }
}

#[cfg(test)]
mod tests;

use solver::{ConstraintSolver, Satisfiability};
use sym::SymbolicBit;

/// Conjunction of the branch conditions taken along one path.
///
/// The value is immutable: [Self::and] returns a new constraint and leaves the original intact,
/// so sibling paths can share a common prefix. Cloning is cheap since bits are reference counted.
#[derive(Clone, Debug)]
pub struct PathConstraint {
    condition: SymbolicBit,
    num_conditions: usize,
}

impl PathConstraint {
    pub fn new() -> Self {
        Self {
            condition: SymbolicBit::Literal(true),
            num_conditions: 0,
        }
    }

    pub fn and(&self, condition: SymbolicBit) -> Self {
        Self {
            condition: self.condition.clone() & condition,
            num_conditions: self.num_conditions + 1,
        }
    }

    pub fn condition(&self) -> &SymbolicBit {
        &self.condition
    }

    /// Number of conditions added since [Self::new]
    pub fn len(&self) -> usize {
        self.num_conditions
    }

    pub fn is_empty(&self) -> bool {
        self.num_conditions == 0
    }

    pub fn check(&self, solver: &impl ConstraintSolver) -> solver::Result<Satisfiability> {
        solver.solve(&self.condition)
    }
}

impl Default for PathConstraint {
    fn default() -> Self {
        Self::new()
    }
}

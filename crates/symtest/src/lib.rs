//! Symbolic test generation and replay.
//!
//! A [Program] declares regions of ram symbolic with `MAKE_SYMBOLIC`. [explore] runs every
//! feasible path of the program over symbolic bit-vectors and yields one concrete [TestVector]
//! per path along with the [ExecutionOutcome] of that path. [replay] runs the program concretely
//! with the symbolic regions filled from a vector, reproducing the outcome of the path that
//! generated it.
//!
//! ### Exit status
//!
//! Outcomes keep the full two's complement value returned by the program. The conversion to an
//! 8-bit process status happens only in [ExitStatus].

/// Program representation and its JSON form.
pub mod program;

/// Byte-addressed storage for the `ram` and `tmp` spaces.
pub mod memory;

/// Instruction semantics, generic over [value_ops::ValueOps].
pub mod emulator;

/// Registry of symbolic regions.
pub mod context;

/// Branch conditions accumulated along one path.
pub mod constraint;

/// Path outcomes and the exit status they map to.
pub mod outcome;

/// Concrete test vectors and their KTEST form.
pub mod vector;

/// Path exploration. Forks on symbolic branches when both directions are feasible.
pub mod explorer;

/// Concrete re-execution of a test vector.
pub mod replay;

/// Output directory of an exploration.
pub mod output;

pub use constraint::PathConstraint;
pub use context::{ExecutionContext, InvalidRegion, SymbolicRegion};
pub use explorer::{
    explore, ExplorationStats, ExploreError, Exploration, ExplorerConfig, GeneratedTest,
};
pub use outcome::{ExecutionOutcome, ExitStatus};
pub use program::Program;
pub use replay::{replay, replay_with_limit, ReplayError, VectorMismatch, KTEST_FILE};
pub use vector::{TestVector, VectorEntry};

#[cfg(test)]
mod tests;

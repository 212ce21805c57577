use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use solver::{ConstraintSolver, Satisfiability};
use sym::{Evaluator, SymbolicBit, SymbolicBitVec};

use crate::constraint::PathConstraint;
use crate::context::{ExecutionContext, InvalidRegion};
use crate::emulator::{self, ControlFlow, Emulator};
use crate::memory::Memory;
use crate::outcome::ExecutionOutcome;
use crate::program::Program;
use crate::vector::{TestVector, VectorEntry};

/// Instructions a single path may execute before it is abandoned.
pub const DEFAULT_MAX_INSTRUCTIONS: usize = 100_000;

/// A test vector paired with the outcome of the path that produced it.
pub type GeneratedTest = (TestVector, ExecutionOutcome);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Paths executing more instructions than this are dropped
    pub max_instructions_per_path: usize,

    /// Number of worker threads. Values of 0 or 1 explore on the calling thread.
    pub jobs: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_instructions_per_path: DEFAULT_MAX_INSTRUCTIONS,
            jobs: 1,
        }
    }
}

/// Failure of a single path. Other paths are unaffected.
#[derive(thiserror::Error, Debug)]
pub enum ExploreError {
    #[error("execution failed at instruction {index}: {source}")]
    Execution {
        index: usize,
        source: emulator::Error,
    },

    #[error("invalid symbolic region at instruction {index}: {source}")]
    InvalidRegion { index: usize, source: InvalidRegion },

    #[error("solver unavailable at instruction {index}: {source}")]
    SolverUnavailable { index: usize, source: solver::Error },

    #[error("execution continued past the last instruction from {index}")]
    EndOfProgram { index: usize },
}

/// Counters describing an exploration so far.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationStats {
    /// Paths that reached `RETURN` or `ABORT`
    pub completed_paths: usize,
    pub generated_tests: usize,

    /// Branch directions discarded because their constraint is unsatisfiable
    pub pruned_forks: usize,

    /// Paths abandoned after exceeding the instruction limit
    pub dropped_paths: usize,

    /// Paths that ended with an error
    pub failed_paths: usize,

    pub instructions: usize,
}

#[derive(Debug, Default)]
struct Counters {
    completed_paths: AtomicUsize,
    generated_tests: AtomicUsize,
    pruned_forks: AtomicUsize,
    dropped_paths: AtomicUsize,
    failed_paths: AtomicUsize,
    instructions: AtomicUsize,
}

impl Counters {
    fn increment(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ExplorationStats {
        ExplorationStats {
            completed_paths: self.completed_paths.load(Ordering::Relaxed),
            generated_tests: self.generated_tests.load(Ordering::Relaxed),
            pruned_forks: self.pruned_forks.load(Ordering::Relaxed),
            dropped_paths: self.dropped_paths.load(Ordering::Relaxed),
            failed_paths: self.failed_paths.load(Ordering::Relaxed),
            instructions: self.instructions.load(Ordering::Relaxed),
        }
    }
}

/// Execution state of one live path.
#[derive(Clone, Debug)]
struct PathState {
    memory: Memory<SymbolicBitVec>,
    context: ExecutionContext,
    constraint: PathConstraint,
    index: usize,
    executed: usize,
}

enum Termination {
    Return(SymbolicBitVec),
    Abort(String),
}

enum PathEnd {
    Completed {
        entries: Vec<VectorEntry>,
        outcome: ExecutionOutcome,
    },
    Pruned,
    Dropped,
    Failed(ExploreError),
}

enum Advance {
    Fork(Vec<PathState>),
    End(PathEnd),
}

enum Branch {
    Both { not_taken: PathState, taken: PathState },
    One(PathState),
    Neither,
}

/// Runs paths until they fork or end. Shared by every worker.
struct PathWalker<'a, S: ConstraintSolver> {
    program: &'a Program,
    solver: S,
    config: ExplorerConfig,
    emulator: Emulator,
    counters: Counters,
}

impl<'a, S: ConstraintSolver> PathWalker<'a, S> {
    fn advance(&self, mut state: PathState) -> Advance {
        loop {
            if state.executed >= self.config.max_instructions_per_path {
                tracing::warn!(
                    index = state.index,
                    limit = self.config.max_instructions_per_path,
                    "dropping path that exceeded the instruction limit"
                );
                return Advance::End(PathEnd::Dropped);
            }

            let index = state.index;
            let Some(instruction) = self.program.instruction(index) else {
                return Advance::End(PathEnd::Failed(ExploreError::EndOfProgram { index }));
            };

            state.executed += 1;
            Counters::increment(&self.counters.instructions);
            tracing::trace!(index, "{instruction}");

            let control_flow = match self.emulator.emulate(&mut state.memory, instruction) {
                Ok(control_flow) => control_flow,
                Err(source) => {
                    return Advance::End(PathEnd::Failed(ExploreError::Execution {
                        index,
                        source,
                    }))
                }
            };

            match control_flow {
                ControlFlow::NextInstruction => state.index += 1,
                ControlFlow::Jump(destination) => state.index = destination,
                ControlFlow::ConditionalBranch {
                    condition,
                    destination,
                } => match condition.maybe_literal() {
                    Some(true) => state.index = destination,
                    Some(false) => state.index += 1,
                    None => match self.branch(state, condition, destination) {
                        Ok(Branch::One(next)) => state = next,
                        Ok(Branch::Both { not_taken, taken }) => {
                            tracing::debug!(index, destination, "forking on symbolic branch");
                            return Advance::Fork(vec![not_taken, taken]);
                        }
                        Ok(Branch::Neither) => return Advance::End(PathEnd::Pruned),
                        Err(source) => {
                            return Advance::End(PathEnd::Failed(
                                ExploreError::SolverUnavailable { index, source },
                            ))
                        }
                    },
                },
                ControlFlow::Assume(condition) => {
                    match self.assume(&state.constraint, condition) {
                        Ok(Some(constraint)) => {
                            state.constraint = constraint;
                            state.index += 1;
                        }
                        Ok(None) => {
                            tracing::debug!(index, "pruning path where assumption cannot hold");
                            Counters::increment(&self.counters.pruned_forks);
                            return Advance::End(PathEnd::Pruned);
                        }
                        Err(source) => {
                            return Advance::End(PathEnd::Failed(
                                ExploreError::SolverUnavailable { index, source },
                            ))
                        }
                    }
                }
                ControlFlow::MakeSymbolic {
                    address,
                    size,
                    name,
                } => {
                    let region =
                        match state
                            .context
                            .declare_symbolic_operands(address, size, &name)
                        {
                            Ok(region) => region,
                            Err(source) => {
                                return Advance::End(PathEnd::Failed(
                                    ExploreError::InvalidRegion { index, source },
                                ))
                            }
                        };

                    let value = state.context.fresh_value(&region);
                    if let Err(err) = state.memory.write_ram(region.address, value.into_bytes()) {
                        return Advance::End(PathEnd::Failed(ExploreError::Execution {
                            index,
                            source: err.into(),
                        }));
                    }

                    tracing::debug!(
                        index,
                        name = %region.name,
                        address = region.address,
                        size = region.size,
                        "declared symbolic region"
                    );
                    state.index += 1;
                }
                ControlFlow::Return(value) => {
                    return Advance::End(self.complete(&state, Termination::Return(value)))
                }
                ControlFlow::Abort(message) => {
                    return Advance::End(self.complete(&state, Termination::Abort(message)))
                }
            }
        }
    }

    fn is_feasible(&self, constraint: &PathConstraint) -> solver::Result<bool> {
        Ok(constraint.check(&self.solver)?.is_satisfiable())
    }

    /// Splits the path on a symbolic condition, keeping only feasible directions.
    fn branch(
        &self,
        mut state: PathState,
        condition: SymbolicBit,
        destination: usize,
    ) -> solver::Result<Branch> {
        let taken = state.constraint.and(condition.clone());
        let not_taken = state.constraint.and(!condition);
        let taken_feasible = self.is_feasible(&taken)?;
        let not_taken_feasible = self.is_feasible(&not_taken)?;

        for feasible in [taken_feasible, not_taken_feasible] {
            if !feasible {
                tracing::debug!(index = state.index, "pruning infeasible branch");
                Counters::increment(&self.counters.pruned_forks);
            }
        }

        let branch = match (taken_feasible, not_taken_feasible) {
            (true, true) => {
                let mut taken_state = state.clone();
                taken_state.constraint = taken;
                taken_state.index = destination;

                state.constraint = not_taken;
                state.index += 1;
                Branch::Both {
                    not_taken: state,
                    taken: taken_state,
                }
            }
            (true, false) => {
                state.constraint = taken;
                state.index = destination;
                Branch::One(state)
            }
            (false, true) => {
                state.constraint = not_taken;
                state.index += 1;
                Branch::One(state)
            }
            (false, false) => Branch::Neither,
        };

        Ok(branch)
    }

    /// Returns the strengthened constraint, or `None` if the assumption cannot hold.
    fn assume(
        &self,
        constraint: &PathConstraint,
        condition: SymbolicBit,
    ) -> solver::Result<Option<PathConstraint>> {
        match condition.maybe_literal() {
            Some(true) => Ok(Some(constraint.clone())),
            Some(false) => Ok(None),
            None => {
                let constraint = constraint.and(condition);
                Ok(self.is_feasible(&constraint)?.then_some(constraint))
            }
        }
    }

    /// Solves the final path constraint and evaluates the path result under the model.
    fn complete(&self, state: &PathState, termination: Termination) -> PathEnd {
        let model = match state.constraint.check(&self.solver) {
            Ok(Satisfiability::Satisfiable(model)) => model,
            Ok(Satisfiability::Unsatisfiable) => {
                Counters::increment(&self.counters.pruned_forks);
                return PathEnd::Pruned;
            }
            Err(source) => {
                return PathEnd::Failed(ExploreError::SolverUnavailable {
                    index: state.index,
                    source,
                })
            }
        };

        Counters::increment(&self.counters.completed_paths);
        let entries = state.context.concretize(&model);
        let outcome = match termination {
            Termination::Return(value) => {
                let bytes = Evaluator::new(model).evaluate_bitvec(&value);
                ExecutionOutcome::exit_from_le_bytes(&bytes)
            }
            Termination::Abort(message) => ExecutionOutcome::Abort(message),
        };

        PathEnd::Completed { entries, outcome }
    }
}

/// Lazy sequence of generated tests. Each call to [Iterator::next] runs paths until one of them
/// produces a test or fails.
///
/// With a single job paths are explored depth first and the order of tests is deterministic. With
/// more jobs the frontier advances in waves on a thread pool.
pub struct Exploration<'a, S: ConstraintSolver> {
    walker: PathWalker<'a, S>,
    frontier: Vec<PathState>,
    ready: VecDeque<Result<GeneratedTest, ExploreError>>,
    pool: Option<rayon::ThreadPool>,
    next_ordinal: usize,
}

/// Explores every feasible path of `program`.
pub fn explore<S: ConstraintSolver>(
    program: &Program,
    solver: S,
    config: ExplorerConfig,
) -> Exploration<'_, S> {
    let pool = if config.jobs > 1 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(err) => {
                tracing::warn!("failed to build worker pool, exploring on one thread: {err}");
                None
            }
        }
    } else {
        None
    };

    tracing::info!(
        program = %program.name,
        solver = solver.name(),
        jobs = config.jobs.max(1),
        "exploring"
    );

    let initial = PathState {
        memory: Memory::new(program.memory_size),
        context: ExecutionContext::new(program.memory_size),
        constraint: PathConstraint::new(),
        index: 0,
        executed: 0,
    };

    Exploration {
        walker: PathWalker {
            program,
            solver,
            config,
            emulator: Emulator,
            counters: Counters::default(),
        },
        frontier: vec![initial],
        ready: VecDeque::new(),
        pool,
        next_ordinal: 1,
    }
}

impl<'a, S: ConstraintSolver> Exploration<'a, S> {
    pub fn stats(&self) -> ExplorationStats {
        self.walker.counters.snapshot()
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.walker.config
    }

    pub fn solver(&self) -> &S {
        &self.walker.solver
    }

    fn accept(&mut self, advance: Advance) {
        let counters = &self.walker.counters;
        match advance {
            Advance::Fork(states) => self.frontier.extend(states),
            Advance::End(PathEnd::Completed { entries, outcome }) => {
                let ordinal = self.next_ordinal;
                self.next_ordinal += 1;
                Counters::increment(&counters.generated_tests);
                tracing::info!(ordinal, %outcome, "generated test");
                self.ready
                    .push_back(Ok((TestVector::new(ordinal, entries), outcome)));
            }
            Advance::End(PathEnd::Pruned) => (),
            Advance::End(PathEnd::Dropped) => Counters::increment(&counters.dropped_paths),
            Advance::End(PathEnd::Failed(err)) => {
                Counters::increment(&counters.failed_paths);
                tracing::warn!("path failed: {err}");
                self.ready.push_back(Err(err));
            }
        }
    }
}

impl<'a, S: ConstraintSolver> Iterator for Exploration<'a, S> {
    type Item = Result<GeneratedTest, ExploreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(item);
            }

            let advances = match &self.pool {
                Some(pool) if !self.frontier.is_empty() => {
                    let wave = std::mem::take(&mut self.frontier);
                    let walker = &self.walker;
                    pool.install(|| {
                        wave.into_par_iter()
                            .map(|state| walker.advance(state))
                            .collect::<Vec<_>>()
                    })
                }
                _ => vec![self.walker.advance(self.frontier.pop()?)],
            };

            for advance in advances {
                self.accept(advance);
            }
        }
    }
}

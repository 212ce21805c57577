use value_ops::{ConcreteValue, ValueOps};

use crate::context::{ExecutionContext, InvalidRegion};
use crate::emulator::{self, ControlFlow, Emulator};
use crate::explorer::DEFAULT_MAX_INSTRUCTIONS;
use crate::memory::Memory;
use crate::outcome::ExecutionOutcome;
use crate::program::Program;
use crate::vector::TestVector;

/// Environment variable naming the KTEST file to replay.
pub const KTEST_FILE: &str = "KTEST_FILE";

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error("test vector does not fit the program: {0}")]
    VectorMismatch(#[from] VectorMismatch),

    /// The vector drives execution into an `ASSUME` whose condition is false
    #[error("assumption at instruction {index} does not hold")]
    AssumptionViolated { index: usize },

    #[error("invalid symbolic region at instruction {index}: {source}")]
    InvalidRegion { index: usize, source: InvalidRegion },

    #[error("execution failed at instruction {index}: {source}")]
    Execution {
        index: usize,
        source: emulator::Error,
    },

    #[error("execution continued past the last instruction from {index}")]
    EndOfProgram { index: usize },

    #[error("execution exceeded {limit} instructions")]
    InstructionLimit { limit: usize },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorMismatch {
    #[error("no entry for symbolic region `{name}`")]
    MissingEntry { name: String },

    #[error("entry `{name}` holds {actual} bytes but the region has {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// The program finished without declaring a region for this entry
    #[error("entry `{name}` does not belong to any symbolic region")]
    UnusedEntry { name: String },
}

/// Runs `program` concretely with symbolic regions filled from `vector`.
///
/// Each declared region consumes the entry carrying its name, whose size must agree with the
/// region. Every entry must be consumed by the time the program finishes.
pub fn replay(program: &Program, vector: &TestVector) -> Result<ExecutionOutcome, ReplayError> {
    replay_with_limit(program, vector, DEFAULT_MAX_INSTRUCTIONS)
}

pub fn replay_with_limit(
    program: &Program,
    vector: &TestVector,
    max_instructions: usize,
) -> Result<ExecutionOutcome, ReplayError> {
    let emulator = Emulator;
    let mut memory: Memory<ConcreteValue> = Memory::new(program.memory_size);
    let mut context = ExecutionContext::new(program.memory_size);
    let mut consumed = vec![false; vector.entries.len()];
    let mut index = 0;

    for _ in 0..max_instructions {
        let instruction = program
            .instruction(index)
            .ok_or(ReplayError::EndOfProgram { index })?;

        let control_flow = emulator
            .emulate(&mut memory, instruction)
            .map_err(|source| ReplayError::Execution { index, source })?;

        match control_flow {
            ControlFlow::NextInstruction => index += 1,
            ControlFlow::Jump(destination) => index = destination,
            ControlFlow::ConditionalBranch {
                condition,
                destination,
            } => {
                if condition {
                    index = destination;
                } else {
                    index += 1;
                }
            }
            ControlFlow::Assume(condition) => {
                if !condition {
                    return Err(ReplayError::AssumptionViolated { index });
                }
                index += 1;
            }
            ControlFlow::MakeSymbolic {
                address,
                size,
                name,
            } => {
                let region = context
                    .declare_symbolic_operands(address, size, &name)
                    .map_err(|source| ReplayError::InvalidRegion { index, source })?;

                let position = vector
                    .entries
                    .iter()
                    .enumerate()
                    .position(|(i, entry)| !consumed[i] && entry.name == region.name)
                    .ok_or_else(|| VectorMismatch::MissingEntry {
                        name: region.name.clone(),
                    })?;
                consumed[position] = true;

                let entry = &vector.entries[position];
                if entry.bytes.len() != region.size {
                    return Err(VectorMismatch::SizeMismatch {
                        name: region.name,
                        expected: region.size,
                        actual: entry.bytes.len(),
                    }
                    .into());
                }

                tracing::debug!(index, name = %region.name, "filled symbolic region");
                memory
                    .write_ram(region.address, entry.bytes.clone())
                    .map_err(|err| ReplayError::Execution {
                        index,
                        source: err.into(),
                    })?;
                index += 1;
            }
            ControlFlow::Return(value) => {
                check_consumed(vector, &consumed)?;
                let bytes: Vec<u8> = value.into_le_bytes().collect();
                return Ok(ExecutionOutcome::exit_from_le_bytes(&bytes));
            }
            ControlFlow::Abort(message) => {
                check_consumed(vector, &consumed)?;
                return Ok(ExecutionOutcome::Abort(message));
            }
        }
    }

    Err(ReplayError::InstructionLimit {
        limit: max_instructions,
    })
}

fn check_consumed(vector: &TestVector, consumed: &[bool]) -> Result<(), VectorMismatch> {
    match vector
        .entries
        .iter()
        .zip(consumed)
        .find(|(_, consumed)| !**consumed)
    {
        Some((entry, _)) => Err(VectorMismatch::UnusedEntry {
            name: entry.name.clone(),
        }),
        None => Ok(()),
    }
}

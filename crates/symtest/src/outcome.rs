use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Observable result of running a program along one path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The program returned. The value is the two's complement reading of the returned bytes.
    Exit(i64),

    /// The program reached an `ABORT` instruction
    Abort(String),
}

impl ExecutionOutcome {
    /// Interprets little-endian bytes as a two's complement integer. At most 8 bytes are used.
    pub fn exit_from_le_bytes(bytes: &[u8]) -> Self {
        let bytes = &bytes[..bytes.len().min(8)];
        let mut buffer = [0u8; 8];
        buffer[..bytes.len()].copy_from_slice(bytes);

        let value = i64::from_le_bytes(buffer);
        let unused_bits = 64 - 8 * bytes.len() as u32;
        let value = if unused_bits >= 64 {
            0
        } else {
            (value << unused_bits) >> unused_bits
        };

        Self::Exit(value)
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort(_))
    }

    pub fn exit_status(&self) -> ExitStatus {
        ExitStatus::from(self)
    }
}

impl Display for ExecutionOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exit(value) => write!(f, "exit {value}"),
            Self::Abort(message) if message.is_empty() => write!(f, "abort"),
            Self::Abort(message) => write!(f, "abort: {message}"),
        }
    }
}

/// Process exit status derived from an [ExecutionOutcome].
///
/// This is where a returned value is cut down to 8 bits and read as unsigned, so `Exit(-1)`
/// becomes `255`. Aborts report 134, the status of a process killed by `SIGABRT`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExitStatus(pub u8);

impl ExitStatus {
    pub const ABORT: ExitStatus = ExitStatus(128 + 6);

    pub fn code(&self) -> i32 {
        i32::from(self.0)
    }
}

impl From<&ExecutionOutcome> for ExitStatus {
    fn from(outcome: &ExecutionOutcome) -> Self {
        match outcome {
            ExecutionOutcome::Exit(value) => ExitStatus((*value & 0xff) as u8),
            ExecutionOutcome::Abort(_) => Self::ABORT,
        }
    }
}

impl Display for ExitStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

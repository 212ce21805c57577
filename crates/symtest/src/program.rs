use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Largest varnode an instruction may reference.
pub const MAX_VARNODE_BYTES: usize = 16;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read program: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse program: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid instruction {index} `{instruction}`: {reason}")]
    InvalidInstruction {
        index: usize,
        instruction: Box<Instruction>,
        reason: String,
    },

    #[error("program has no instructions")]
    Empty,
}

/// Error parsing a varnode from its `space:offset#size` text form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid varnode `{text}`: {reason}")]
pub struct VarnodeParseError {
    text: String,
    reason: &'static str,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Space {
    /// The offset is the value itself
    Const,

    /// Byte addressable program memory. The only space reachable through pointers.
    Ram,

    /// Scratch storage for intermediate values
    Tmp,
}

impl Space {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Const => "const",
            Self::Ram => "ram",
            Self::Tmp => "tmp",
        }
    }
}

impl FromStr for Space {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "const" => Ok(Self::Const),
            "ram" => Ok(Self::Ram),
            "tmp" => Ok(Self::Tmp),
            _ => Err(()),
        }
    }
}

/// Reference to `size` bytes at `offset` in a space.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Varnode {
    pub space: Space,
    pub offset: u64,
    pub size: usize,
}

impl Varnode {
    pub fn new(space: Space, offset: u64, size: usize) -> Self {
        Self {
            space,
            offset,
            size,
        }
    }

    pub fn constant(value: u64, size: usize) -> Self {
        Self::new(Space::Const, value, size)
    }

    pub fn ram(offset: u64, size: usize) -> Self {
        Self::new(Space::Ram, offset, size)
    }

    pub fn tmp(offset: u64, size: usize) -> Self {
        Self::new(Space::Tmp, offset, size)
    }

    /// One past the last byte referenced, or `None` on overflow.
    pub fn end(&self) -> Option<u64> {
        u64::try_from(self.size)
            .ok()
            .and_then(|size| self.offset.checked_add(size))
    }
}

impl Display for Varnode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.space {
            Space::Const => write!(f, "const:{:#x}#{}", self.offset, self.size),
            space => write!(f, "{}:{}#{}", space.name(), self.offset, self.size),
        }
    }
}

impl FromStr for Varnode {
    type Err = VarnodeParseError;

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        let err = |reason| VarnodeParseError {
            text: text.to_owned(),
            reason,
        };

        let (space, rest) = text.split_once(':').ok_or_else(|| err("missing `:`"))?;
        let (offset, size) = rest.split_once('#').ok_or_else(|| err("missing `#`"))?;
        let space = space
            .trim()
            .parse::<Space>()
            .map_err(|_| err("unknown space"))?;
        let offset = parse_u64(offset.trim()).ok_or_else(|| err("invalid offset"))?;
        let size = size
            .trim()
            .parse::<usize>()
            .map_err(|_| err("invalid size"))?;

        Ok(Self::new(space, offset, size))
    }
}

fn parse_u64(text: &str) -> Option<u64> {
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

impl TryFrom<String> for Varnode {
    type Error = VarnodeParseError;

    fn try_from(text: String) -> std::result::Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<Varnode> for String {
    fn from(varnode: Varnode) -> Self {
        varnode.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpCode {
    Copy,

    /// `output = *input0`, reading `output.size` bytes of ram
    Load,

    /// `*input0 = input1`
    Store,

    IntAdd,
    IntSub,
    IntMult,
    IntDiv,
    IntRem,
    #[serde(rename = "INT_2COMP")]
    Int2Comp,
    IntNegate,
    IntAnd,
    IntOr,
    IntXor,
    IntLeft,
    IntRight,
    #[serde(rename = "INT_SRIGHT")]
    IntSRight,
    #[serde(rename = "INT_ZEXT")]
    IntZExt,
    #[serde(rename = "INT_SEXT")]
    IntSExt,
    IntEqual,
    #[serde(rename = "INT_NOTEQUAL")]
    IntNotEqual,
    IntLess,
    #[serde(rename = "INT_SLESS")]
    IntSLess,
    #[serde(rename = "INT_LESSEQUAL")]
    IntLessEqual,
    #[serde(rename = "INT_SLESSEQUAL")]
    IntSLessEqual,
    IntCarry,
    #[serde(rename = "INT_SCARRY")]
    IntSCarry,
    #[serde(rename = "INT_SBORROW")]
    IntSBorrow,
    BoolNegate,
    BoolAnd,
    BoolOr,
    BoolXor,

    /// Jump to the instruction index given by the constant input0
    Branch,

    /// Jump to the instruction index in input0 when the 1-byte input1 is true
    #[serde(rename = "CBRANCH")]
    CBranch,

    /// End of program. The exit value is input0.
    Return,

    /// Marks `input1` bytes of ram starting at `input0` as symbolic
    MakeSymbolic { name: String },

    /// Restricts the path to states where the 1-byte input0 is true
    Assume,

    /// Terminates the path abnormally
    Abort {
        #[serde(default)]
        message: String,
    },
}

impl OpCode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Copy => "COPY",
            Self::Load => "LOAD",
            Self::Store => "STORE",
            Self::IntAdd => "INT_ADD",
            Self::IntSub => "INT_SUB",
            Self::IntMult => "INT_MULT",
            Self::IntDiv => "INT_DIV",
            Self::IntRem => "INT_REM",
            Self::Int2Comp => "INT_2COMP",
            Self::IntNegate => "INT_NEGATE",
            Self::IntAnd => "INT_AND",
            Self::IntOr => "INT_OR",
            Self::IntXor => "INT_XOR",
            Self::IntLeft => "INT_LEFT",
            Self::IntRight => "INT_RIGHT",
            Self::IntSRight => "INT_SRIGHT",
            Self::IntZExt => "INT_ZEXT",
            Self::IntSExt => "INT_SEXT",
            Self::IntEqual => "INT_EQUAL",
            Self::IntNotEqual => "INT_NOTEQUAL",
            Self::IntLess => "INT_LESS",
            Self::IntSLess => "INT_SLESS",
            Self::IntLessEqual => "INT_LESSEQUAL",
            Self::IntSLessEqual => "INT_SLESSEQUAL",
            Self::IntCarry => "INT_CARRY",
            Self::IntSCarry => "INT_SCARRY",
            Self::IntSBorrow => "INT_SBORROW",
            Self::BoolNegate => "BOOL_NEGATE",
            Self::BoolAnd => "BOOL_AND",
            Self::BoolOr => "BOOL_OR",
            Self::BoolXor => "BOOL_XOR",
            Self::Branch => "BRANCH",
            Self::CBranch => "CBRANCH",
            Self::Return => "RETURN",
            Self::MakeSymbolic { .. } => "MAKE_SYMBOLIC",
            Self::Assume => "ASSUME",
            Self::Abort { .. } => "ABORT",
        }
    }

    /// Branch targets are instruction indices rather than values.
    fn branch_target_input(&self) -> Option<usize> {
        match self {
            Self::Branch | Self::CBranch => Some(0),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(flatten)]
    pub op_code: OpCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Varnode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Varnode>,
}

impl Instruction {
    pub fn new(op_code: OpCode, output: Option<Varnode>, inputs: Vec<Varnode>) -> Self {
        Self {
            op_code,
            output,
            inputs,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(output) = &self.output {
            write!(f, "{output} = ")?;
        }

        write!(f, "{}", self.op_code.mnemonic())?;
        for (i, input) in self.inputs.iter().enumerate() {
            let separator = if i == 0 { " " } else { ", " };
            write!(f, "{separator}{input}")?;
        }

        match &self.op_code {
            OpCode::MakeSymbolic { name } => write!(f, " \"{name}\""),
            OpCode::Abort { message } if !message.is_empty() => write!(f, " \"{message}\""),
            _ => Ok(()),
        }
    }
}

/// A program is a flat list of instructions executed from index 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,

    /// Size of the ram space in bytes
    pub memory_size: u64,

    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Parses and validates a program.
    pub fn from_json(json: &str) -> Result<Self> {
        let program: Self = serde_json::from_str(json)?;
        program.validate()?;
        Ok(program)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Checks varnode sizes, ram bounds and branch targets. Operand counts are checked when the
    /// instruction executes.
    pub fn validate(&self) -> Result<()> {
        if self.instructions.is_empty() {
            return Err(Error::Empty);
        }

        for (index, instruction) in self.instructions.iter().enumerate() {
            let invalid = |reason: String| Error::InvalidInstruction {
                index,
                instruction: Box::new(instruction.clone()),
                reason,
            };

            for varnode in instruction.output.iter().chain(&instruction.inputs) {
                if varnode.size == 0 || varnode.size > MAX_VARNODE_BYTES {
                    return Err(invalid(format!(
                        "varnode {varnode} must be between 1 and {MAX_VARNODE_BYTES} bytes"
                    )));
                }

                if varnode.space == Space::Ram {
                    let in_bounds = varnode.end().is_some_and(|end| end <= self.memory_size);
                    if !in_bounds {
                        return Err(invalid(format!(
                            "varnode {varnode} exceeds memory size {size}",
                            size = self.memory_size
                        )));
                    }
                }
            }

            if let Some(output) = &instruction.output {
                if output.space == Space::Const {
                    return Err(invalid(String::from("output cannot be a constant")));
                }
            }

            if let Some(target_index) = instruction.op_code.branch_target_input() {
                let Some(target) = instruction.inputs.get(target_index) else {
                    continue;
                };

                if target.space != Space::Const {
                    return Err(invalid(format!("branch target {target} must be a constant")));
                }

                let in_range = usize::try_from(target.offset)
                    .is_ok_and(|target| target < self.instructions.len());
                if !in_range {
                    return Err(invalid(format!(
                        "branch target {offset} is outside the program",
                        offset = target.offset
                    )));
                }
            }
        }

        Ok(())
    }
}

use value_ops::{BitwiseOps, ValueOps};

use crate::memory::{self, Memory};
use crate::program::{Instruction, OpCode, Space, Varnode};

/// Largest value a `RETURN` may produce.
pub const MAX_RETURN_BYTES: usize = 8;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error occurred while accessing a memory location.
    #[error(transparent)]
    MemoryAccess(#[from] memory::Error),

    /// The provided instruction violates an invariant described by the error kind.
    #[error("illegal instruction `{instruction}`: {kind}")]
    IllegalInstruction {
        instruction: Box<Instruction>,
        kind: IllegalInstructionKind,
    },

    /// The pointer operand of a `LOAD` or `STORE` could not be reduced to a single address. This
    /// occurs when the pointer depends on a symbolic value.
    #[error("pointer {pointer} of `{instruction}` is not concrete")]
    IndirectAddress {
        instruction: Box<Instruction>,
        pointer: Varnode,
    },
}

#[derive(Debug)]
pub enum IllegalInstructionKind {
    VarnodeNotPermitted(usize),
    VarnodeMissing(usize),
    InvalidVarnodeSize(usize),
    InvalidVarnodeSpace(usize),
    InvalidBranchTarget,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Describes which instruction should be executed next, or how the path ends.
#[derive(Clone, Debug)]
pub enum ControlFlow<V: ValueOps> {
    NextInstruction,

    /// Execution continues at the given instruction index
    Jump(usize),

    /// Execution continues at `destination` if the condition is true, otherwise with the next
    /// instruction.
    ConditionalBranch {
        condition: V::Bit,
        destination: usize,
    },

    /// The path is only valid if the condition holds. Execution continues with the next
    /// instruction.
    Assume(V::Bit),

    /// A region of ram is to be made symbolic. The operands are passed through as read so the
    /// caller can reject symbolic ones.
    MakeSymbolic { address: V, size: V, name: String },

    /// The program finished with the given value
    Return(V),

    /// The program terminated abnormally
    Abort(String),
}

macro_rules! binary_shift_op {
    ($mem:ident, $instr:ident, $op:ident) => {{
        require_num_inputs($instr, 2)?;
        require_has_output($instr, true)?;
        require_output_size_equals($instr, $instr.inputs[0].size)?;

        let lhs = $mem.read(&$instr.inputs[0])?;
        let rhs = $mem.read(&$instr.inputs[1])?;
        $mem.write(output($instr)?, lhs.$op(rhs))?;
    }};
}

macro_rules! binary_op {
    ($mem:ident, $instr:ident, $op:ident) => {{
        require_num_inputs($instr, 2)?;
        require_has_output($instr, true)?;
        require_input_sizes_match_output($instr)?;

        let lhs = $mem.read(&$instr.inputs[0])?;
        let rhs = $mem.read(&$instr.inputs[1])?;
        $mem.write(output($instr)?, lhs.$op(rhs))?;
    }};
}

macro_rules! unary_op {
    ($mem:ident, $instr:ident, $op:ident) => {{
        require_num_inputs($instr, 1)?;
        require_has_output($instr, true)?;
        require_input_sizes_match_output($instr)?;

        let lhs = $mem.read(&$instr.inputs[0])?;
        $mem.write(output($instr)?, lhs.$op())?;
    }};
}

macro_rules! binary_op_bit {
    ($mem:ident, $instr:ident, $op:ident) => {{
        require_num_inputs($instr, 2)?;
        require_has_output($instr, true)?;
        require_output_size_equals($instr, 1)?;
        require_input_size_equals($instr, 1, $instr.inputs[0].size)?;

        let lhs = $mem.read(&$instr.inputs[0])?;
        let rhs = $mem.read(&$instr.inputs[1])?;
        $mem.write_bit(output($instr)?, lhs.$op(rhs))?;
    }};
}

macro_rules! bool_unary_op {
    ($mem:ident, $instr:ident, $op:ident) => {{
        require_num_inputs($instr, 1)?;
        require_has_output($instr, true)?;
        require_input_sizes_equal($instr, 1)?;
        require_output_size_equals($instr, 1)?;

        let lhs = $mem.read_bit(&$instr.inputs[0])?;
        $mem.write_bit(output($instr)?, lhs.$op())?;
    }};
}

macro_rules! bool_binary_op {
    ($mem:ident, $instr:ident, $op:ident) => {{
        require_num_inputs($instr, 2)?;
        require_has_output($instr, true)?;
        require_input_sizes_equal($instr, 1)?;
        require_output_size_equals($instr, 1)?;

        let lhs = $mem.read_bit(&$instr.inputs[0])?;
        let rhs = $mem.read_bit(&$instr.inputs[1])?;
        $mem.write_bit(output($instr)?, lhs.$op(rhs))?;
    }};
}

/// Executes one instruction at a time against a [Memory]. The emulator holds no state, so the
/// same instance serves both concrete and symbolic execution.
#[derive(Copy, Clone, Debug, Default)]
pub struct Emulator;

impl Emulator {
    pub fn emulate<V: ValueOps>(
        &self,
        memory: &mut Memory<V>,
        instruction: &Instruction,
    ) -> Result<ControlFlow<V>> {
        match &instruction.op_code {
            OpCode::Copy => self.copy(memory, instruction)?,
            OpCode::Load => self.load(memory, instruction)?,
            OpCode::Store => self.store(memory, instruction)?,
            OpCode::IntAnd => binary_op!(memory, instruction, and),
            OpCode::IntOr => binary_op!(memory, instruction, or),
            OpCode::IntXor => binary_op!(memory, instruction, xor),
            OpCode::IntNegate => unary_op!(memory, instruction, not),
            OpCode::IntAdd => binary_op!(memory, instruction, add),
            OpCode::IntCarry => binary_op_bit!(memory, instruction, unsigned_carry),
            OpCode::IntSCarry => binary_op_bit!(memory, instruction, signed_carry),
            OpCode::IntSub => binary_op!(memory, instruction, subtract),
            OpCode::Int2Comp => unary_op!(memory, instruction, negate),
            OpCode::IntSBorrow => binary_op_bit!(memory, instruction, borrow),
            OpCode::IntMult => binary_op!(memory, instruction, multiply),
            OpCode::IntDiv => binary_op!(memory, instruction, unsigned_divide),
            OpCode::IntRem => binary_op!(memory, instruction, unsigned_remainder),
            OpCode::IntZExt => self.int_zext(memory, instruction)?,
            OpCode::IntSExt => self.int_sext(memory, instruction)?,
            OpCode::IntEqual => binary_op_bit!(memory, instruction, equals),
            OpCode::IntNotEqual => binary_op_bit!(memory, instruction, not_equals),
            OpCode::IntSLess => binary_op_bit!(memory, instruction, signed_less_than),
            OpCode::IntSLessEqual => {
                binary_op_bit!(memory, instruction, signed_less_than_or_equals)
            }
            OpCode::IntLess => binary_op_bit!(memory, instruction, unsigned_less_than),
            OpCode::IntLessEqual => {
                binary_op_bit!(memory, instruction, unsigned_less_than_or_equals)
            }
            OpCode::IntLeft => binary_shift_op!(memory, instruction, shift_left),
            OpCode::IntRight => binary_shift_op!(memory, instruction, unsigned_shift_right),
            OpCode::IntSRight => binary_shift_op!(memory, instruction, signed_shift_right),
            OpCode::BoolNegate => bool_unary_op!(memory, instruction, not),
            OpCode::BoolAnd => bool_binary_op!(memory, instruction, and),
            OpCode::BoolOr => bool_binary_op!(memory, instruction, or),
            OpCode::BoolXor => bool_binary_op!(memory, instruction, xor),
            OpCode::Branch => return self.branch(instruction),
            OpCode::CBranch => return self.conditional_branch(memory, instruction),
            OpCode::Return => return self.return_instruction(memory, instruction),
            OpCode::MakeSymbolic { name } => return self.make_symbolic(memory, instruction, name),
            OpCode::Assume => return self.assume(memory, instruction),
            OpCode::Abort { message } => {
                require_num_inputs(instruction, 0)?;
                require_has_output(instruction, false)?;
                return Ok(ControlFlow::Abort(message.clone()));
            }
        }

        Ok(ControlFlow::NextInstruction)
    }

    /// Copy a sequence of contiguous bytes from anywhere to anywhere. Size of input0 and output
    /// must be the same.
    fn copy<V: ValueOps>(&self, memory: &mut Memory<V>, instruction: &Instruction) -> Result<()> {
        require_num_inputs(instruction, 1)?;
        require_has_output(instruction, true)?;
        require_input_sizes_match_output(instruction)?;

        let value = memory.read(&instruction.inputs[0])?;
        memory.write(output(instruction)?, value)?;

        Ok(())
    }

    /// Dereferences the pointer in input0 and loads `output.size` bytes of ram into the output.
    fn load<V: ValueOps>(&self, memory: &mut Memory<V>, instruction: &Instruction) -> Result<()> {
        require_num_inputs(instruction, 1)?;
        require_has_output(instruction, true)?;

        let output = output(instruction)?;
        let address = Self::indirect_address(memory, instruction, 0)?;
        let value = memory.read(&Varnode::ram(address, output.size))?;
        memory.write(output, value)?;

        Ok(())
    }

    /// Stores input1 to ram at the address held by input0.
    fn store<V: ValueOps>(&self, memory: &mut Memory<V>, instruction: &Instruction) -> Result<()> {
        require_num_inputs(instruction, 2)?;
        require_has_output(instruction, false)?;

        let input = &instruction.inputs[1];
        let address = Self::indirect_address(memory, instruction, 0)?;
        let value = memory.read(input)?;
        memory.write(&Varnode::ram(address, input.size), value)?;

        Ok(())
    }

    /// Unconditional jump to the instruction index encoded by the constant input0.
    fn branch<V: ValueOps>(&self, instruction: &Instruction) -> Result<ControlFlow<V>> {
        require_num_inputs(instruction, 1)?;
        require_has_output(instruction, false)?;
        Ok(ControlFlow::Jump(Self::branch_destination(instruction)?))
    }

    /// Jump taken when the 1-byte input1 is true. The destination is interpreted as in `BRANCH`.
    fn conditional_branch<V: ValueOps>(
        &self,
        memory: &mut Memory<V>,
        instruction: &Instruction,
    ) -> Result<ControlFlow<V>> {
        require_num_inputs(instruction, 2)?;
        require_has_output(instruction, false)?;
        require_input_size_equals(instruction, 1, 1)?;

        Ok(ControlFlow::ConditionalBranch {
            condition: memory.read_bit(&instruction.inputs[1])?,
            destination: Self::branch_destination(instruction)?,
        })
    }

    fn branch_destination(instruction: &Instruction) -> Result<usize> {
        require_input_space(instruction, 0, Space::Const)?;
        usize::try_from(instruction.inputs[0].offset).map_err(|_| Error::IllegalInstruction {
            instruction: Box::new(instruction.clone()),
            kind: IllegalInstructionKind::InvalidBranchTarget,
        })
    }

    fn return_instruction<V: ValueOps>(
        &self,
        memory: &mut Memory<V>,
        instruction: &Instruction,
    ) -> Result<ControlFlow<V>> {
        require_num_inputs(instruction, 1)?;
        require_has_output(instruction, false)?;
        require_input_size_at_most(instruction, 0, MAX_RETURN_BYTES)?;

        Ok(ControlFlow::Return(memory.read(&instruction.inputs[0])?))
    }

    fn make_symbolic<V: ValueOps>(
        &self,
        memory: &mut Memory<V>,
        instruction: &Instruction,
        name: &str,
    ) -> Result<ControlFlow<V>> {
        require_num_inputs(instruction, 2)?;
        require_has_output(instruction, false)?;

        Ok(ControlFlow::MakeSymbolic {
            address: memory.read(&instruction.inputs[0])?,
            size: memory.read(&instruction.inputs[1])?,
            name: name.to_owned(),
        })
    }

    fn assume<V: ValueOps>(
        &self,
        memory: &mut Memory<V>,
        instruction: &Instruction,
    ) -> Result<ControlFlow<V>> {
        require_num_inputs(instruction, 1)?;
        require_has_output(instruction, false)?;
        require_input_size_equals(instruction, 0, 1)?;

        Ok(ControlFlow::Assume(
            memory.read_bit(&instruction.inputs[0])?,
        ))
    }

    /// Zero-extend input0 into the strictly larger output.
    fn int_zext<V: ValueOps>(
        &self,
        memory: &mut Memory<V>,
        instruction: &Instruction,
    ) -> Result<()> {
        require_num_inputs(instruction, 1)?;
        require_has_output(instruction, true)?;
        require_output_size_exceeds(instruction, instruction.inputs[0].size)?;
        let output = output(instruction)?;

        let lhs = memory.read(&instruction.inputs[0])?;
        memory.write(output, lhs.zero_extend(output.size))?;

        Ok(())
    }

    /// Sign-extend input0 into the strictly larger output.
    fn int_sext<V: ValueOps>(
        &self,
        memory: &mut Memory<V>,
        instruction: &Instruction,
    ) -> Result<()> {
        require_num_inputs(instruction, 1)?;
        require_has_output(instruction, true)?;
        require_output_size_exceeds(instruction, instruction.inputs[0].size)?;
        let output = output(instruction)?;

        let lhs = memory.read(&instruction.inputs[0])?;
        memory.write(output, lhs.sign_extend(output.size))?;

        Ok(())
    }

    /// Reads a pointer operand. The address must be concrete.
    fn indirect_address<V: ValueOps>(
        memory: &Memory<V>,
        instruction: &Instruction,
        input_index: usize,
    ) -> Result<u64> {
        let pointer = &instruction.inputs[input_index];
        memory
            .read(pointer)?
            .try_into()
            .map_err(|_| Error::IndirectAddress {
                instruction: Box::new(instruction.clone()),
                pointer: pointer.clone(),
            })
    }
}

impl std::fmt::Display for IllegalInstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let varnode_name_lookup = |index: &usize| {
            if *index == 0 {
                "output".to_string()
            } else {
                format!("input {input_index}", input_index = index - 1)
            }
        };

        match self {
            Self::VarnodeNotPermitted(index) => {
                write!(f, "{} varnode not permitted", varnode_name_lookup(index))
            }
            Self::VarnodeMissing(index) => {
                write!(f, "{} varnode missing", varnode_name_lookup(index))
            }
            Self::InvalidVarnodeSize(index) => {
                write!(f, "{} varnode size is invalid", varnode_name_lookup(index))
            }
            Self::InvalidVarnodeSpace(index) => {
                write!(f, "{} varnode space is invalid", varnode_name_lookup(index))
            }
            Self::InvalidBranchTarget => write!(f, "branch target is invalid"),
        }
    }
}

fn illegal(instruction: &Instruction, kind: IllegalInstructionKind) -> Error {
    Error::IllegalInstruction {
        instruction: Box::new(instruction.clone()),
        kind,
    }
}

fn output(instruction: &Instruction) -> Result<&Varnode> {
    instruction
        .output
        .as_ref()
        .ok_or_else(|| illegal(instruction, IllegalInstructionKind::VarnodeMissing(0)))
}

/// Require that the number of inputs matches the number expected by the instruction
fn require_num_inputs(instruction: &Instruction, num_inputs: usize) -> Result<()> {
    match instruction.inputs.len().cmp(&num_inputs) {
        std::cmp::Ordering::Less => Err(illegal(
            instruction,
            IllegalInstructionKind::VarnodeMissing(instruction.inputs.len() + 1),
        )),
        std::cmp::Ordering::Equal => Ok(()),
        std::cmp::Ordering::Greater => Err(illegal(
            instruction,
            IllegalInstructionKind::VarnodeNotPermitted(num_inputs + 1),
        )),
    }
}

/// Require the instruction output existence to match the expected value
fn require_has_output(instruction: &Instruction, has_output: bool) -> Result<()> {
    match (&instruction.output, has_output) {
        (None, true) => Err(illegal(
            instruction,
            IllegalInstructionKind::VarnodeMissing(0),
        )),
        (Some(output), true) if output.space == Space::Const => Err(illegal(
            instruction,
            IllegalInstructionKind::InvalidVarnodeSpace(0),
        )),
        (Some(_), false) => Err(illegal(
            instruction,
            IllegalInstructionKind::VarnodeNotPermitted(0),
        )),
        _ => Ok(()),
    }
}

/// Require that the input sizes match the size of the instruction output
fn require_input_sizes_match_output(instruction: &Instruction) -> Result<()> {
    require_input_sizes_equal(instruction, output(instruction)?.size)
}

/// Require that the input sizes are all equal
fn require_input_sizes_equal(instruction: &Instruction, expected_size: usize) -> Result<()> {
    (0..instruction.inputs.len())
        .try_for_each(|i| require_input_size_equals(instruction, i, expected_size))
}

fn require_input_space(instruction: &Instruction, input_index: usize, space: Space) -> Result<()> {
    if instruction.inputs[input_index].space != space {
        return Err(illegal(
            instruction,
            IllegalInstructionKind::InvalidVarnodeSpace(input_index + 1),
        ));
    }

    Ok(())
}

/// Require that the instruction input identified by its index has the expected size
fn require_input_size_equals(
    instruction: &Instruction,
    input_index: usize,
    expected_size: usize,
) -> Result<()> {
    if instruction.inputs[input_index].size != expected_size {
        Err(illegal(
            instruction,
            IllegalInstructionKind::InvalidVarnodeSize(input_index + 1),
        ))
    } else {
        Ok(())
    }
}

fn require_input_size_at_most(
    instruction: &Instruction,
    input_index: usize,
    max_size: usize,
) -> Result<()> {
    if instruction.inputs[input_index].size > max_size {
        Err(illegal(
            instruction,
            IllegalInstructionKind::InvalidVarnodeSize(input_index + 1),
        ))
    } else {
        Ok(())
    }
}

/// Require that the instruction output size equals the expected value
fn require_output_size_equals(instruction: &Instruction, expected_size: usize) -> Result<()> {
    if output(instruction)?.size != expected_size {
        return Err(illegal(
            instruction,
            IllegalInstructionKind::InvalidVarnodeSize(0),
        ));
    }

    Ok(())
}

/// Require that the instruction output size is strictly greater than the expected size
fn require_output_size_exceeds(instruction: &Instruction, expected_size: usize) -> Result<()> {
    if output(instruction)?.size <= expected_size {
        return Err(illegal(
            instruction,
            IllegalInstructionKind::InvalidVarnodeSize(0),
        ));
    }

    Ok(())
}

mod output;
mod replay;
mod vector;

use crate::program::{Instruction, OpCode, Program, Varnode};

pub(crate) const GET_SIGN: &str = include_str!("../../../../demos/get_sign.json");
pub(crate) const CHECKED_ADD: &str = include_str!("../../../../demos/checked_add.json");
pub(crate) const SUM_FIRST_ELEMENTS: &str =
    include_str!("../../../../demos/sum_first_elements.json");

pub(crate) fn varnode(text: &str) -> Varnode {
    text.parse().expect("varnode should parse")
}

pub(crate) fn instruction(op_code: OpCode, output: Option<&str>, inputs: &[&str]) -> Instruction {
    Instruction::new(
        op_code,
        output.map(varnode),
        inputs.iter().map(|input| varnode(input)).collect(),
    )
}

pub(crate) fn make_symbolic(name: &str, address: u64, size: u64) -> Instruction {
    Instruction::new(
        OpCode::MakeSymbolic {
            name: name.to_owned(),
        },
        None,
        vec![Varnode::constant(address, 8), Varnode::constant(size, 8)],
    )
}

pub(crate) fn program(instructions: Vec<Instruction>) -> Program {
    Program {
        name: String::from("test"),
        memory_size: 64,
        instructions,
    }
}

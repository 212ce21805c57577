use proptest::prelude::*;
use solver::SatSolver;

use crate::explorer::{explore, ExplorerConfig};
use crate::outcome::ExecutionOutcome;
use crate::program::{OpCode, Program};
use crate::replay::*;
use crate::vector::{TestVector, VectorEntry};

use super::{instruction, make_symbolic, program, CHECKED_ADD, GET_SIGN};

fn get_sign() -> Program {
    Program::from_json(GET_SIGN).expect("demo should parse")
}

fn sign_vector(a: i32) -> TestVector {
    TestVector::new(1, vec![VectorEntry::new("a", a.to_le_bytes())])
}

#[test]
fn replay_get_sign() -> Result<(), ReplayError> {
    let program = get_sign();
    assert_eq!(replay(&program, &sign_vector(0))?, ExecutionOutcome::Exit(0));
    assert_eq!(replay(&program, &sign_vector(-7))?, ExecutionOutcome::Exit(-1));
    assert_eq!(replay(&program, &sign_vector(i32::MIN))?, ExecutionOutcome::Exit(-1));
    assert_eq!(replay(&program, &sign_vector(42))?, ExecutionOutcome::Exit(1));
    Ok(())
}

#[test]
fn replay_is_idempotent() -> Result<(), ReplayError> {
    let program = get_sign();
    let vector = sign_vector(-3);
    let first = replay(&program, &vector)?;
    let second = replay(&program, &vector)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn explored_vectors_reproduce_their_outcomes() {
    for json in [GET_SIGN, CHECKED_ADD] {
        let program = Program::from_json(json).expect("demo should parse");
        for result in explore(&program, SatSolver::new(), ExplorerConfig::default()) {
            let (vector, outcome) = result.expect("path should succeed");
            let replayed = replay(&program, &vector).expect("replay should succeed");
            assert_eq!(replayed, outcome, "{} {vector:?}", program.name);
        }
    }
}

#[test]
fn missing_entry() {
    let vector = TestVector::new(1, vec![VectorEntry::new("b", [0u8; 4])]);
    assert!(matches!(
        replay(&get_sign(), &vector),
        Err(ReplayError::VectorMismatch(VectorMismatch::MissingEntry { name })) if name == "a"
    ));
}

#[test]
fn size_mismatch() {
    let vector = TestVector::new(1, vec![VectorEntry::new("a", [0u8; 2])]);
    assert!(matches!(
        replay(&get_sign(), &vector),
        Err(ReplayError::VectorMismatch(VectorMismatch::SizeMismatch {
            expected: 4,
            actual: 2,
            ..
        }))
    ));
}

#[test]
fn unused_entry() {
    let mut vector = sign_vector(1);
    vector.entries.push(VectorEntry::new("undeclared", [1u8]));
    assert!(matches!(
        replay(&get_sign(), &vector),
        Err(ReplayError::VectorMismatch(VectorMismatch::UnusedEntry { name })) if name == "undeclared"
    ));
}

#[test]
fn entries_are_matched_by_name() -> Result<(), ReplayError> {
    let program = Program::from_json(CHECKED_ADD).expect("demo should parse");
    let vector = TestVector::new(
        1,
        vec![VectorEntry::new("b", [2u8]), VectorEntry::new("a", [3u8])],
    );
    assert_eq!(replay(&program, &vector)?, ExecutionOutcome::Exit(5));
    Ok(())
}

#[test]
fn duplicate_names_use_unique_entries() -> Result<(), ReplayError> {
    let program = program(vec![
        make_symbolic("x", 0, 1),
        make_symbolic("x", 1, 1),
        instruction(OpCode::IntSub, Some("tmp:0#1"), &["ram:0#1", "ram:1#1"]),
        instruction(OpCode::Return, None, &["tmp:0#1"]),
    ]);
    let vector = TestVector::new(
        1,
        vec![VectorEntry::new("x", [10u8]), VectorEntry::new("x_1", [4u8])],
    );
    assert_eq!(replay(&program, &vector)?, ExecutionOutcome::Exit(6));
    Ok(())
}

#[test]
fn violated_assumption() {
    let program = program(vec![
        make_symbolic("a", 0, 1),
        instruction(OpCode::IntEqual, Some("tmp:0#1"), &["ram:0#1", "const:0x5#1"]),
        instruction(OpCode::Assume, None, &["tmp:0#1"]),
        instruction(OpCode::Return, None, &["ram:0#1"]),
    ]);

    let vector = TestVector::new(1, vec![VectorEntry::new("a", [4u8])]);
    assert!(matches!(
        replay(&program, &vector),
        Err(ReplayError::AssumptionViolated { index: 2 })
    ));

    let vector = TestVector::new(1, vec![VectorEntry::new("a", [5u8])]);
    assert!(matches!(replay(&program, &vector), Ok(ExecutionOutcome::Exit(5))));
}

#[test]
fn abort() -> Result<(), ReplayError> {
    let program = Program::from_json(CHECKED_ADD).expect("demo should parse");
    let vector = TestVector::new(
        1,
        vec![VectorEntry::new("a", [200u8]), VectorEntry::new("b", [100u8])],
    );
    assert_eq!(
        replay(&program, &vector)?,
        ExecutionOutcome::Abort(String::from("addition overflowed"))
    );
    Ok(())
}

#[test]
fn instruction_limit() {
    let program = program(vec![instruction(OpCode::Branch, None, &["const:0x0#8"])]);
    let vector = TestVector::new(1, Vec::new());
    assert!(matches!(
        replay_with_limit(&program, &vector, 10),
        Err(ReplayError::InstructionLimit { limit: 10 })
    ));
}

#[test]
fn end_of_program() {
    let program = program(vec![instruction(OpCode::Copy, Some("tmp:0#1"), &["const:0x0#1"])]);
    assert!(matches!(
        replay(&program, &TestVector::new(1, Vec::new())),
        Err(ReplayError::EndOfProgram { index: 1 })
    ));
}

/// Returns 1 when `x <op> constant` holds and 0 otherwise, for a 2-byte symbolic `x`.
fn comparison(op_code: OpCode, constant: u16) -> Program {
    let constant = format!("const:{constant:#x}#2");
    program(vec![
        make_symbolic("x", 0, 2),
        instruction(op_code, Some("tmp:0#1"), &["ram:0#2", constant.as_str()]),
        instruction(OpCode::CBranch, None, &["const:0x4#8", "tmp:0#1"]),
        instruction(OpCode::Return, None, &["const:0x0#1"]),
        instruction(OpCode::Return, None, &["const:0x1#1"]),
    ])
}

fn holds(op_code: &OpCode, x: u16, constant: u16) -> bool {
    match op_code {
        OpCode::IntLess => x < constant,
        OpCode::IntSLess => (x as i16) < (constant as i16),
        OpCode::IntLessEqual => x <= constant,
        OpCode::IntSLessEqual => (x as i16) <= (constant as i16),
        OpCode::IntEqual => x == constant,
        _ => unreachable!("not a comparison"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn explored_comparisons_replay(
        op_code in prop_oneof![
            Just(OpCode::IntLess),
            Just(OpCode::IntSLess),
            Just(OpCode::IntLessEqual),
            Just(OpCode::IntSLessEqual),
            Just(OpCode::IntEqual),
        ],
        constant in any::<u16>(),
    ) {
        let program = comparison(op_code.clone(), constant);
        let tests = explore(&program, SatSolver::new(), ExplorerConfig::default())
            .collect::<Result<Vec<_>, _>>()
            .expect("every path should succeed");

        let expected_paths = [0, u16::MAX, constant, constant.wrapping_add(1), constant.wrapping_sub(1)]
            .iter()
            .map(|x| holds(&op_code, *x, constant))
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        prop_assert_eq!(tests.len(), expected_paths);

        for (vector, outcome) in &tests {
            let bytes: [u8; 2] = vector.entries[0].bytes.as_slice().try_into().expect("2 bytes");
            let x = u16::from_le_bytes(bytes);
            let expected = ExecutionOutcome::Exit(i64::from(holds(&op_code, x, constant)));
            prop_assert_eq!(outcome, &expected);
            prop_assert_eq!(&replay(&program, vector).expect("replay should succeed"), outcome);
        }
    }
}

use crate::*;

#[test]
fn evaluate_literal() {
    let mut eval = Evaluator::default();
    assert!(eval.evaluate(&TRUE));
    assert!(!eval.evaluate(&FALSE));
}

#[test]
fn evaluate_variable() {
    let x = SymbolicBit::Variable(0);
    let y = SymbolicBit::Variable(1);
    let mut eval = Evaluator::new(VariableAssignments::from_iter([(0, true), (1, false)]));
    assert!(eval.evaluate(&x));
    assert!(!eval.evaluate(&y));
}

#[test]
fn unassigned_variable_is_false() {
    let mut eval = Evaluator::default();
    assert!(!eval.evaluate(&SymbolicBit::Variable(7)));
    assert!(eval.evaluate(&!SymbolicBit::Variable(7)));
}

#[test]
fn evaluate_expression() {
    let x = SymbolicBit::Variable(0);
    let y = SymbolicBit::Variable(1);
    let mut eval = Evaluator::new(VariableAssignments::from_iter([(0, true), (1, false)]));
    assert!(eval.evaluate(&(x ^ y)));
}

#[test]
fn shared_subgraph_is_evaluated_once() {
    let mut allocator = VariableAllocator::new();
    let x = SymbolicBitVec::with_variables(&mut allocator, 32);
    let y = SymbolicBitVec::with_variables(&mut allocator, 32);

    // The carry chain shares every intermediate carry between two parents. Without caching the
    // evaluation would revisit each carry exponentially often.
    let sum = x + y;
    let assignments = VariableAssignments::from_iter((0..64usize).map(|id| (id, true)));
    let mut eval = Evaluator::new(assignments);
    let bytes = eval.evaluate_bitvec(&sum);
    assert_eq!(bytes, 0xffff_fffeu32.to_le_bytes().to_vec());
}

#[test]
fn evaluate_bytes() {
    let mut allocator = VariableAllocator::new();
    let bytes = SymbolicBitVec::with_variables(&mut allocator, 8).into_bytes();
    let assignments = VariableAssignments::from_iter([(0, true), (3, true), (7, true)]);
    let mut eval = Evaluator::new(assignments);
    assert_eq!(eval.evaluate_byte(&bytes[0]), 0x89);
}

#[test]
fn assignment_bytes_default_to_zero() {
    let assignments = VariableAssignments::from_iter([(8, true), (9, true), (17, true)]);
    assert_eq!(assignments.bytes(8, 2), vec![0x03, 0x02]);
    assert_eq!(assignments.bytes(100, 1), vec![0x00]);
}

#[test]
fn evaluate_deep_graph() {
    let depth = 200_000;
    let bit = (1..depth).fold(SymbolicBit::Variable(0), |bit, id| bit & SymbolicBit::Variable(id));
    let mut eval = Evaluator::new(VariableAssignments::from_iter((0..depth).map(|id| (id, true))));
    assert!(eval.evaluate(&bit));

    let mut eval = Evaluator::new(VariableAssignments::from_iter([(depth - 1, false)]));
    assert!(!eval.evaluate(&bit));
}

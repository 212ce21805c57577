use sym::{Evaluator, SymbolicBit, SymbolicBitVec, VariableAllocator, VariableAssignments, FALSE, TRUE};

use crate::*;

fn solve(constraint: &SymbolicBit) -> Satisfiability {
    Z3Solver::new()
        .solve(constraint)
        .expect("z3 should answer")
}

fn assert_model_satisfies(constraint: &SymbolicBit) -> VariableAssignments {
    let model = solve(constraint)
        .into_model()
        .expect("constraint should be satisfiable");
    assert!(
        Evaluator::new(model.clone()).evaluate(constraint),
        "model does not satisfy constraint"
    );
    model
}

fn le_u64(model: &VariableAssignments, first_variable: usize) -> u64 {
    let bytes: [u8; 8] = model
        .bytes(first_variable, 8)
        .try_into()
        .expect("8 bytes requested");
    u64::from_le_bytes(bytes)
}

#[test]
fn literal_constraints() {
    assert!(solve(&TRUE).is_satisfiable());
    assert_eq!(solve(&FALSE), Satisfiability::Unsatisfiable);
}

#[test]
fn contradiction() {
    let x = SymbolicBit::Variable(0);
    let gate = x.clone() & SymbolicBit::Variable(1);
    let constraint = gate.clone() & !x & gate;
    assert_eq!(solve(&constraint), Satisfiability::Unsatisfiable);
}

#[test]
fn solve_for_equality() {
    let mut allocator = VariableAllocator::new();
    let x = SymbolicBitVec::with_variables(&mut allocator, 32);
    let constraint = x.equals(SymbolicBitVec::constant(0xdead_beef, 32));

    let model = assert_model_satisfies(&constraint);
    assert_eq!(model.bytes(0, 4), 0xdead_beefu32.to_le_bytes().to_vec());
}

#[test]
fn signed_ranges() {
    let mut allocator = VariableAllocator::new();
    let a = SymbolicBitVec::with_variables(&mut allocator, 32);
    let zero = SymbolicBitVec::constant(0, 32);

    let positive = !a.clone().equals(zero.clone()) & !a.clone().signed_less_than(zero.clone());
    let model = assert_model_satisfies(&positive);
    let bytes: [u8; 4] = model.bytes(0, 4).try_into().expect("4 bytes requested");
    assert!(i32::from_le_bytes(bytes) > 0);

    let constraint = positive & a.signed_less_than(zero);
    assert_eq!(solve(&constraint), Satisfiability::Unsatisfiable);
}

#[test]
fn wide_division() {
    let mut allocator = VariableAllocator::new();
    let a = SymbolicBitVec::with_variables(&mut allocator, 64);
    let b = SymbolicBitVec::with_variables(&mut allocator, 64);
    let (quotient, _) = a.divmod(b);
    let constraint = quotient.equals(SymbolicBitVec::constant(7, 64));

    let model = assert_model_satisfies(&constraint);
    let a = le_u64(&model, 0);
    let b = le_u64(&model, 64);
    assert_ne!(b, 0);
    assert_eq!(a / b, 7);
}

#[test]
fn timeout_is_accepted() {
    let solver = Z3Solver::with_timeout(10_000);
    let constraint = SymbolicBit::Variable(0) & !SymbolicBit::Variable(1);
    let model = solver
        .solve(&constraint)
        .expect("z3 should answer")
        .into_model()
        .expect("constraint should be satisfiable");
    assert_eq!(model.get(0), Some(true));
    assert_eq!(model.get(1), Some(false));
    assert_eq!(solver.name(), "z3");
}

#[test]
fn agrees_with_fallback() {
    let x = SymbolicBit::Variable(0);
    let y = SymbolicBit::Variable(1);
    let z = SymbolicBit::Variable(2);
    let constraints = [
        (x.clone() ^ y.clone()) & (y.clone() ^ z.clone()) & (x.clone() ^ z.clone()),
        (x.clone() | y.clone()) & !z.clone() & (z | !x),
        x.clone().equals(y.clone()) & !(x & y),
    ];

    for constraint in &constraints {
        let expected = SatSolver::new()
            .solve(constraint)
            .expect("fallback should answer")
            .is_satisfiable();
        assert_eq!(solve(constraint).is_satisfiable(), expected, "{constraint:?}");
    }
}

use sym::{SymbolicBit, SymbolicBitVec, VariableAllocator};

use crate::cnf::*;

#[test]
fn literal_encoding() {
    let literal = Literal::new(3, true);
    assert_eq!(literal.variable(), 3);
    assert!(literal.is_negated());
    assert_eq!(literal.negated(), Literal::new(3, false));
    assert_eq!(literal.index(), 7);
    assert_eq!(Literal::TRUE.negated(), Literal::FALSE);
}

#[test]
fn inputs_are_allocated_first() {
    let x = SymbolicBit::Variable(10);
    let y = SymbolicBit::Variable(4);
    let cnf = Cnf::from_constraint(&(x & y));

    let inputs: Vec<_> = cnf.inputs().collect();
    assert_eq!(inputs, vec![(4, 1), (10, 2)]);

    // Constant variable, two inputs and one gate
    assert_eq!(cnf.num_variables(), 4);
}

#[test]
fn single_gate_clauses() {
    let x = SymbolicBit::Variable(0);
    let y = SymbolicBit::Variable(1);
    let cnf = Cnf::from_constraint(&(x & y));

    let gate = Literal::new(3, false);
    let x = Literal::new(1, false);
    let y = Literal::new(2, false);
    let clauses = cnf.clauses();
    assert!(clauses.contains(&vec![Literal::TRUE]));
    assert!(clauses.contains(&vec![x, gate.negated()]));
    assert!(clauses.contains(&vec![y, gate.negated()]));
    assert!(clauses.contains(&vec![x.negated(), y.negated(), gate]));
    assert!(clauses.contains(&vec![gate]));
}

#[test]
fn shared_nodes_are_encoded_once() {
    let mut allocator = VariableAllocator::new();
    let x = SymbolicBitVec::with_variables(&mut allocator, 16);
    let y = SymbolicBitVec::with_variables(&mut allocator, 16);
    let constraint = (x + y).equals(SymbolicBitVec::constant(0, 16));

    let cnf = Cnf::from_constraint(&constraint);
    assert_eq!(cnf.inputs().count(), 32);

    // A 16-bit ripple carry adder and comparison is a few hundred gates. Encoding without sharing
    // would be exponential in the carry chain length.
    assert!(cnf.num_variables() < 2000, "{} variables", cnf.num_variables());
}

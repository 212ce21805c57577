//! Tseitin encoding of a [SymbolicBit] into conjunctive normal form.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use sym::SymbolicBit;

/// A CNF literal. The variable index is stored in the upper bits and the lowest bit is set when
/// the literal is negated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal(u32);

impl Literal {
    /// Variable 0 is pinned to `true` by a unit clause.
    pub const TRUE: Literal = Literal::new(0, false);
    pub const FALSE: Literal = Literal::TRUE.negated();

    pub const fn new(variable: u32, negated: bool) -> Self {
        Self((variable << 1) | negated as u32)
    }

    pub const fn variable(self) -> u32 {
        self.0 >> 1
    }

    pub const fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }

    pub const fn negated(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Dense index suitable for per-literal tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A CNF formula equisatisfiable with the encoded constraint.
#[derive(Clone, Debug)]
pub struct Cnf {
    num_variables: u32,
    clauses: Vec<Vec<Literal>>,

    /// Symbolic variable identifier to CNF variable.
    inputs: BTreeMap<usize, u32>,
}

impl Cnf {
    /// Encodes `constraint` so that the formula is satisfiable exactly when the constraint is.
    ///
    /// Each [SymbolicBit::And] node gets one CNF variable. Shared nodes are encoded once,
    /// identified by the address of their [Arc].
    pub fn from_constraint(constraint: &SymbolicBit) -> Self {
        let mut cnf = Self {
            num_variables: 1,
            clauses: vec![vec![Literal::TRUE]],
            inputs: BTreeMap::new(),
        };

        for id in constraint.variables() {
            let variable = cnf.new_variable();
            cnf.inputs.insert(id, variable);
        }

        let root = cnf.encode(constraint);
        cnf.add_clause(vec![root]);
        cnf
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables as usize
    }

    pub fn clauses(&self) -> &[Vec<Literal>] {
        &self.clauses
    }

    /// Pairs of symbolic variable identifier and the CNF variable that represents it.
    pub fn inputs(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.inputs.iter().map(|(id, variable)| (*id, *variable))
    }

    fn new_variable(&mut self) -> u32 {
        let variable = self.num_variables;
        self.num_variables += 1;
        variable
    }

    /// Adds a clause after removing duplicate literals. Tautologies are dropped.
    fn add_clause(&mut self, mut clause: Vec<Literal>) {
        clause.sort();
        clause.dedup();
        let tautology = clause
            .windows(2)
            .any(|pair| pair[0].variable() == pair[1].variable());
        if !tautology {
            self.clauses.push(clause);
        }
    }

    fn input(&self, id: usize) -> Literal {
        self.inputs
            .get(&id)
            .map(|variable| Literal::new(*variable, false))
            .unwrap_or(Literal::FALSE)
    }

    /// Post-order walk with an explicit stack so deep graphs do not exhaust the call stack.
    fn encode(&mut self, root: &SymbolicBit) -> Literal {
        let mut encoded: HashMap<usize, Literal> = HashMap::new();
        let mut results: Vec<Literal> = Vec::new();
        let mut stack: Vec<(&SymbolicBit, Option<usize>, bool)> = vec![(root, None, false)];

        while let Some((bit, key, expanded)) = stack.pop() {
            if !expanded {
                if let Some(literal) = key.and_then(|key| encoded.get(&key)) {
                    results.push(*literal);
                    continue;
                }

                match bit {
                    SymbolicBit::Literal(true) => results.push(Literal::TRUE),
                    SymbolicBit::Literal(false) => results.push(Literal::FALSE),
                    SymbolicBit::Variable(id) => results.push(self.input(*id)),
                    SymbolicBit::Not(x) => {
                        stack.push((bit, key, true));
                        stack.push((&**x, Some(node_key(x)), false));
                    }
                    SymbolicBit::And(x, y) => {
                        stack.push((bit, key, true));
                        stack.push((&**y, Some(node_key(y)), false));
                        stack.push((&**x, Some(node_key(x)), false));
                    }
                }

                continue;
            }

            let literal = match bit {
                SymbolicBit::Not(_) => match results.pop() {
                    Some(literal) => literal.negated(),
                    None => break,
                },
                SymbolicBit::And(_, _) => {
                    let (Some(rhs), Some(lhs)) = (results.pop(), results.pop()) else {
                        break;
                    };

                    let gate = Literal::new(self.new_variable(), false);
                    self.add_clause(vec![gate.negated(), lhs]);
                    self.add_clause(vec![gate.negated(), rhs]);
                    self.add_clause(vec![gate, lhs.negated(), rhs.negated()]);
                    gate
                }
                SymbolicBit::Literal(_) | SymbolicBit::Variable(_) => continue,
            };

            if let Some(key) = key {
                encoded.insert(key, literal);
            }
            results.push(literal);
        }

        results.pop().unwrap_or(Literal::FALSE)
    }
}

fn node_key(bit: &Arc<SymbolicBit>) -> usize {
    Arc::as_ptr(bit) as usize
}

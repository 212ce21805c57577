use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::{SymbolicBit, SymbolicBitVec, SymbolicByte};

/// Evaluates [SymbolicBit]s under fixed [VariableAssignments].
///
/// Variables without an assignment evaluate to `false`, which completes a partial model the same
/// way every time. Results for shared subgraphs are cached since the assignments never change for
/// a given evaluator.
#[derive(Clone, Debug, Default)]
pub struct Evaluator {
    assignments: VariableAssignments,

    /// Keyed by node address. The [Arc] pins the node so the address cannot be reused while the
    /// entry is alive.
    cache: HashMap<usize, (Arc<SymbolicBit>, bool)>,
}

impl Evaluator {
    /// Create a new instance using the given [VariableAssignments]. The assignments are fixed for
    /// the lifetime of this evaluator.
    pub fn new(assignments: impl Into<VariableAssignments>) -> Self {
        Self {
            assignments: assignments.into(),
            cache: HashMap::new(),
        }
    }

    pub fn assignments(&self) -> &VariableAssignments {
        &self.assignments
    }

    pub fn evaluate(&mut self, bit: &SymbolicBit) -> bool {
        let mut results: Vec<bool> = Vec::new();
        let mut stack: Vec<(&SymbolicBit, Option<&Arc<SymbolicBit>>, bool)> =
            vec![(bit, None, false)];

        // Post-order walk with an explicit stack. Graphs may be deeper than the call stack.
        while let Some((node, shared, expanded)) = stack.pop() {
            if !expanded {
                if let Some((_, value)) = shared.and_then(|shared| self.cache.get(&node_key(shared)))
                {
                    results.push(*value);
                    continue;
                }

                match node {
                    SymbolicBit::Literal(x) => results.push(*x),
                    SymbolicBit::Variable(id) => {
                        results.push(self.assignments.get(*id).unwrap_or(false))
                    }
                    SymbolicBit::Not(x) => {
                        stack.push((node, shared, true));
                        stack.push((&**x, Some(x), false));
                    }
                    SymbolicBit::And(lhs, rhs) => {
                        stack.push((node, shared, true));
                        stack.push((&**rhs, Some(rhs), false));
                        stack.push((&**lhs, Some(lhs), false));
                    }
                }

                continue;
            }

            let value = match node {
                SymbolicBit::Not(_) => match results.pop() {
                    Some(value) => !value,
                    None => break,
                },
                SymbolicBit::And(_, _) => {
                    let (Some(rhs), Some(lhs)) = (results.pop(), results.pop()) else {
                        break;
                    };
                    lhs && rhs
                }
                SymbolicBit::Literal(_) | SymbolicBit::Variable(_) => continue,
            };

            if let Some(shared) = shared {
                self.cache
                    .insert(node_key(shared), (Arc::clone(shared), value));
            }
            results.push(value);
        }

        results.pop().unwrap_or(false)
    }

    /// Evaluates every bit of a bit-vector and packs the result into little-endian bytes.
    pub fn evaluate_bitvec(&mut self, value: &SymbolicBitVec) -> Vec<u8> {
        let mut bytes = vec![0u8; value.num_bytes()];
        for (i, bit) in value.iter().enumerate() {
            if self.evaluate(bit) {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }

        bytes
    }

    pub fn evaluate_byte(&mut self, byte: &SymbolicByte) -> u8 {
        byte.bits()
            .iter()
            .enumerate()
            .filter(|(_, bit)| self.evaluate(bit))
            .fold(0u8, |value, (i, _)| value | (1 << i))
    }
}

fn node_key(bit: &Arc<SymbolicBit>) -> usize {
    Arc::as_ptr(bit) as usize
}

impl From<VariableAssignments> for Evaluator {
    fn from(value: VariableAssignments) -> Self {
        Self::new(value)
    }
}

/// Mapping [SymbolicBit::Variable] identifiers to [SymbolicBit::Literal] values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariableAssignments {
    assignments: BTreeMap<usize, bool>,
}

impl VariableAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, variable_id: usize) -> Option<bool> {
        self.assignments.get(&variable_id).copied()
    }

    pub fn insert(&mut self, variable_id: usize, value: bool) -> Option<bool> {
        self.assignments.insert(variable_id, value)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.assignments.iter().map(|(id, value)| (*id, *value))
    }

    /// Reads consecutive variables as little-endian bytes. Unassigned variables read as zero.
    pub fn bytes(&self, first_variable: usize, num_bytes: usize) -> Vec<u8> {
        (0..num_bytes)
            .map(|byte_index| {
                (0..8).fold(0u8, |byte, bit_index| {
                    let id = first_variable + 8 * byte_index + bit_index;
                    if self.get(id).unwrap_or(false) {
                        byte | (1 << bit_index)
                    } else {
                        byte
                    }
                })
            })
            .collect()
    }
}

impl From<BTreeMap<usize, bool>> for VariableAssignments {
    fn from(assignments: BTreeMap<usize, bool>) -> Self {
        Self { assignments }
    }
}

impl FromIterator<(usize, bool)> for VariableAssignments {
    fn from_iter<T: IntoIterator<Item = (usize, bool)>>(iter: T) -> Self {
        Self {
            assignments: iter.into_iter().collect(),
        }
    }
}

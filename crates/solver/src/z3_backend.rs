use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use sym::{SymbolicBit, VariableAssignments};
use z3::ast::Bool;

use crate::{ConstraintSolver, Error, Result, Satisfiability};

/// Backend that asserts the constraint as a boolean formula in Z3.
///
/// A fresh Z3 context is created for every query since contexts cannot be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct Z3Solver {
    timeout_ms: Option<u32>,
}

impl Z3Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout_ms: u32) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
        }
    }
}

impl ConstraintSolver for Z3Solver {
    fn name(&self) -> &str {
        "z3"
    }

    fn solve(&self, constraint: &SymbolicBit) -> Result<Satisfiability> {
        match constraint {
            SymbolicBit::Literal(true) => {
                return Ok(Satisfiability::Satisfiable(VariableAssignments::default()))
            }
            SymbolicBit::Literal(false) => return Ok(Satisfiability::Unsatisfiable),
            _ => (),
        }

        let config = z3::Config::new();
        let ctx = z3::Context::new(&config);
        let solver = z3::Solver::new(&ctx);
        if let Some(timeout_ms) = self.timeout_ms {
            let mut params = z3::Params::new(&ctx);
            params.set_u32("timeout", timeout_ms);
            solver.set_params(&params);
        }

        let mut inputs = BTreeMap::new();
        let formula = encode(&ctx, constraint, &mut inputs);
        solver.assert(&formula);

        match solver.check() {
            z3::SatResult::Unsat => Ok(Satisfiability::Unsatisfiable),
            z3::SatResult::Unknown => Err(Error::Unavailable(
                solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| String::from("unknown")),
            )),
            z3::SatResult::Sat => {
                let model = solver
                    .get_model()
                    .ok_or_else(|| Error::Unavailable(String::from("no model produced")))?;
                let assignments = inputs
                    .iter()
                    .map(|(id, var)| {
                        let value = model.eval(var, true).and_then(|b| b.as_bool());
                        (*id, value.unwrap_or(false))
                    })
                    .collect();
                Ok(Satisfiability::Satisfiable(assignments))
            }
        }
    }
}

fn encode<'ctx>(
    ctx: &'ctx z3::Context,
    root: &SymbolicBit,
    inputs: &mut BTreeMap<usize, Bool<'ctx>>,
) -> Bool<'ctx> {
    let mut encoded: HashMap<usize, Bool<'ctx>> = HashMap::new();
    let mut results: Vec<Bool<'ctx>> = Vec::new();
    let mut stack: Vec<(&SymbolicBit, Option<usize>, bool)> = vec![(root, None, false)];

    while let Some((bit, key, expanded)) = stack.pop() {
        if !expanded {
            if let Some(ast) = key.and_then(|key| encoded.get(&key)) {
                results.push(ast.clone());
                continue;
            }

            match bit {
                SymbolicBit::Literal(value) => results.push(Bool::from_bool(ctx, *value)),
                SymbolicBit::Variable(id) => {
                    let var = inputs
                        .entry(*id)
                        .or_insert_with(|| Bool::new_const(ctx, format!("b{id}")));
                    results.push(var.clone());
                }
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

        let ast = match bit {
            SymbolicBit::Not(_) => match results.pop() {
                Some(ast) => ast.not(),
                None => break,
            },
            SymbolicBit::And(_, _) => {
                let (Some(rhs), Some(lhs)) = (results.pop(), results.pop()) else {
                    break;
                };
                Bool::and(ctx, &[&lhs, &rhs])
            }
            SymbolicBit::Literal(_) | SymbolicBit::Variable(_) => continue,
        };

        if let Some(key) = key {
            encoded.insert(key, ast.clone());
        }
        results.push(ast);
    }

    results
        .pop()
        .unwrap_or_else(|| Bool::from_bool(ctx, false))
}

fn node_key(bit: &Arc<SymbolicBit>) -> usize {
    Arc::as_ptr(bit) as usize
}

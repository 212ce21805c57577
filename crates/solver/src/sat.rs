use sym::{SymbolicBit, VariableAssignments};

use crate::cnf::{Cnf, Literal};
use crate::{ConstraintSolver, Error, Result, Satisfiability};

/// Fallback backend: Tseitin encoding followed by a DPLL search with two watched literals per
/// clause and chronological backtracking. There is no clause learning, so prefer `Z3Solver`
/// whenever the `z3` feature is available.
///
/// Decisions are made on constraint variables first and try `false` before `true`, so models lean
/// toward small values.
#[derive(Clone, Debug)]
pub struct SatSolver {
    max_conflicts: Option<usize>,
}

impl SatSolver {
    pub const DEFAULT_MAX_CONFLICTS: usize = 1_000_000;

    pub fn new() -> Self {
        Self {
            max_conflicts: Some(Self::DEFAULT_MAX_CONFLICTS),
        }
    }

    /// Limits the number of conflicts before giving up with [Error::ResourceLimit]. `None` removes
    /// the limit.
    pub fn with_max_conflicts(max_conflicts: Option<usize>) -> Self {
        Self { max_conflicts }
    }

    pub fn solve_cnf(&self, cnf: &Cnf) -> Result<Satisfiability> {
        let mut search = match Search::new(cnf) {
            Some(search) => search,
            None => return Ok(Satisfiability::Unsatisfiable),
        };

        let satisfiable = search.run(self.max_conflicts)?;
        tracing::trace!(
            variables = cnf.num_variables(),
            clauses = cnf.clauses().len(),
            conflicts = search.conflicts,
            satisfiable,
            "sat search finished"
        );

        if !satisfiable {
            return Ok(Satisfiability::Unsatisfiable);
        }

        let model = cnf
            .inputs()
            .map(|(id, variable)| {
                let value = search.values[variable as usize].unwrap_or(false);
                (id, value)
            })
            .collect();
        Ok(Satisfiability::Satisfiable(model))
    }
}

impl Default for SatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintSolver for SatSolver {
    fn name(&self) -> &str {
        "sat"
    }

    fn solve(&self, constraint: &SymbolicBit) -> Result<Satisfiability> {
        match constraint {
            SymbolicBit::Literal(true) => {
                Ok(Satisfiability::Satisfiable(VariableAssignments::default()))
            }
            SymbolicBit::Literal(false) => Ok(Satisfiability::Unsatisfiable),
            _ => self.solve_cnf(&Cnf::from_constraint(constraint)),
        }
    }
}

struct Decision {
    trail_len: usize,
    literal: Literal,
    flipped: bool,
}

struct Search {
    /// Clauses with at least two literals. The first two literals of each are watched.
    clauses: Vec<Vec<Literal>>,

    /// Literal index to the clauses watching that literal.
    watches: Vec<Vec<usize>>,

    values: Vec<Option<bool>>,
    trail: Vec<Literal>,
    propagated: usize,
    decisions: Vec<Decision>,
    order: Vec<u32>,
    conflicts: usize,
}

fn literal_value(values: &[Option<bool>], literal: Literal) -> Option<bool> {
    values[literal.variable() as usize].map(|value| value != literal.is_negated())
}

impl Search {
    /// Returns `None` if the unit clauses alone are contradictory.
    fn new(cnf: &Cnf) -> Option<Self> {
        let num_variables = cnf.num_variables();
        let mut search = Self {
            clauses: Vec::new(),
            watches: vec![Vec::new(); 2 * num_variables],
            values: vec![None; num_variables],
            trail: Vec::new(),
            propagated: 0,
            decisions: Vec::new(),
            order: Vec::with_capacity(num_variables),
            conflicts: 0,
        };

        for clause in cnf.clauses() {
            match clause.as_slice() {
                [] => return None,
                [unit] => {
                    if !search.enqueue(*unit) {
                        return None;
                    }
                }
                _ => {
                    let index = search.clauses.len();
                    search.watches[clause[0].index()].push(index);
                    search.watches[clause[1].index()].push(index);
                    search.clauses.push(clause.clone());
                }
            }
        }

        let mut inputs: Vec<u32> = cnf.inputs().map(|(_, variable)| variable).collect();
        inputs.sort_unstable();
        search.order.extend(inputs.iter().copied());
        search
            .order
            .extend((1..num_variables as u32).filter(|v| inputs.binary_search(v).is_err()));

        Some(search)
    }

    fn assign(&mut self, literal: Literal) {
        self.values[literal.variable() as usize] = Some(!literal.is_negated());
        self.trail.push(literal);
    }

    /// Returns false if the literal is already false.
    fn enqueue(&mut self, literal: Literal) -> bool {
        match literal_value(&self.values, literal) {
            Some(value) => value,
            None => {
                self.assign(literal);
                true
            }
        }
    }

    fn run(&mut self, max_conflicts: Option<usize>) -> Result<bool> {
        loop {
            if self.propagate() {
                self.conflicts += 1;
                if max_conflicts.is_some_and(|limit| self.conflicts > limit) {
                    return Err(Error::ResourceLimit {
                        conflicts: self.conflicts,
                    });
                }

                if !self.backtrack() {
                    return Ok(false);
                }

                continue;
            }

            let next = self
                .order
                .iter()
                .copied()
                .find(|variable| self.values[*variable as usize].is_none());

            match next {
                Some(variable) => {
                    let literal = Literal::new(variable, true);
                    self.decisions.push(Decision {
                        trail_len: self.trail.len(),
                        literal,
                        flipped: false,
                    });
                    self.assign(literal);
                }
                None => return Ok(true),
            }
        }
    }

    /// Undoes decisions until one can be flipped. Returns false when the search space is
    /// exhausted.
    fn backtrack(&mut self) -> bool {
        while let Some(decision) = self.decisions.pop() {
            for literal in self.trail.drain(decision.trail_len..) {
                self.values[literal.variable() as usize] = None;
            }
            self.propagated = decision.trail_len;

            if !decision.flipped {
                let literal = decision.literal.negated();
                self.decisions.push(Decision {
                    trail_len: decision.trail_len,
                    literal,
                    flipped: true,
                });
                self.assign(literal);
                return true;
            }
        }

        false
    }

    /// Unit propagation over the watch lists. Returns true on conflict.
    fn propagate(&mut self) -> bool {
        while self.propagated < self.trail.len() {
            let false_literal = self.trail[self.propagated].negated();
            self.propagated += 1;

            let mut watching = std::mem::take(&mut self.watches[false_literal.index()]);
            let mut conflict = false;
            let mut i = 0;

            while i < watching.len() {
                let clause_index = watching[i];
                let clause = &mut self.clauses[clause_index];
                if clause[0] == false_literal {
                    clause.swap(0, 1);
                }

                if literal_value(&self.values, clause[0]) == Some(true) {
                    i += 1;
                    continue;
                }

                let replacement = (2..clause.len())
                    .find(|k| literal_value(&self.values, clause[*k]) != Some(false));
                if let Some(k) = replacement {
                    clause.swap(1, k);
                    self.watches[clause[1].index()].push(clause_index);
                    watching.swap_remove(i);
                    continue;
                }

                let unit = clause[0];
                match literal_value(&self.values, unit) {
                    Some(false) => {
                        conflict = true;
                        break;
                    }
                    _ => {
                        self.assign(unit);
                        i += 1;
                    }
                }
            }

            self.watches[false_literal.index()] = watching;
            if conflict {
                self.propagated = self.trail.len();
                return true;
            }
        }

        false
    }
}

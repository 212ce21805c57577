use std::sync::Arc;

pub const FALSE: SymbolicBit = SymbolicBit::Literal(false);
pub const TRUE: SymbolicBit = SymbolicBit::Literal(true);

/// A value that can be used to represent a variable bit, possibly with constraints on its value.
///
/// Bits form an and-inverter graph. Subgraphs are shared through [Arc] so that a bit may be
/// cloned cheaply and moved across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolicBit {
    /// A literal `true` or `false` value.
    Literal(bool),

    /// A variable value. The parameter is the identifier for this variable. Two variables with the
    /// same identifier are equivalent.
    Variable(usize),

    /// The negation of a symbolic bit. The `!` operator should be preferred to this, as it has the
    /// opportunity to perform simplications where a direct construction does not.
    Not(Arc<Self>),

    /// The conjunction of two symbolic bits. The `&` operator should be preferred to this, as it
    /// has the opportunity to perform simplications where a direct construction does not.
    And(Arc<Self>, Arc<Self>),
}

/// Error returned when a bit is not a literal.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("bit is not a literal")]
pub struct NonLiteralBit;

impl SymbolicBit {
    pub fn maybe_literal(&self) -> Option<bool> {
        match self {
            Self::Literal(b) => Some(*b),
            _ => None,
        }
    }

    pub fn maybe_variable(&self) -> Option<usize> {
        match self {
            Self::Variable(id) => Some(*id),
            _ => None,
        }
    }

    pub fn equals(self, rhs: Self) -> Self {
        (self.clone() & rhs.clone()) | (!self & !rhs)
    }

    /// Selects `lhs` when `self` is true and `rhs` otherwise.
    pub fn select(self, lhs: Self, rhs: Self) -> Self {
        (self.clone() & lhs) | (!self & rhs)
    }

    /// Structural identity check. Shared subgraphs compare by pointer, so this never walks the
    /// graph.
    pub fn is_identical(&self, rhs: &Self) -> bool {
        match (self, rhs) {
            (Self::Literal(x), Self::Literal(y)) => x == y,
            (Self::Variable(x), Self::Variable(y)) => x == y,
            (Self::Not(x), Self::Not(y)) => {
                Arc::ptr_eq(x, y)
                    || matches!(
                        (&**x, &**y),
                        (Self::Variable(a), Self::Variable(b)) if a == b
                    )
            }
            (Self::And(x, y), Self::And(u, v)) => {
                (Arc::ptr_eq(x, u) && Arc::ptr_eq(y, v))
                    || (Arc::ptr_eq(x, v) && Arc::ptr_eq(y, u))
            }
            _ => false,
        }
    }

    /// Collects the identifiers of every variable reachable from this bit.
    pub fn variables(&self) -> std::collections::BTreeSet<usize> {
        let mut visited = std::collections::HashSet::new();
        let mut variables = std::collections::BTreeSet::new();
        let mut stack = vec![self];
        while let Some(bit) = stack.pop() {
            match bit {
                Self::Literal(_) => (),
                Self::Variable(id) => {
                    variables.insert(*id);
                }
                Self::Not(x) => {
                    if visited.insert(Arc::as_ptr(x) as usize) {
                        stack.push(x);
                    }
                }
                Self::And(x, y) => {
                    for child in [x, y] {
                        if visited.insert(Arc::as_ptr(child) as usize) {
                            stack.push(child);
                        }
                    }
                }
            }
        }

        variables
    }
}

/// Graphs built from wide arithmetic are far deeper than the call stack allows, so uniquely owned
/// children are released from a work list instead of recursively.
impl Drop for SymbolicBit {
    fn drop(&mut self) {
        if !has_unique_child(self) {
            return;
        }

        let leaf = Arc::new(FALSE);
        let mut pending = Vec::new();
        detach_children(self, &leaf, &mut pending);

        while let Some(child) = pending.pop() {
            if let Ok(mut bit) = Arc::try_unwrap(child) {
                detach_children(&mut bit, &leaf, &mut pending);
            }
        }
    }
}

fn has_unique_child(bit: &SymbolicBit) -> bool {
    let unique = |child: &Arc<SymbolicBit>| {
        Arc::strong_count(child) == 1
            && matches!(**child, SymbolicBit::Not(_) | SymbolicBit::And(_, _))
    };

    match bit {
        SymbolicBit::Not(x) => unique(x),
        SymbolicBit::And(x, y) => unique(x) || unique(y),
        SymbolicBit::Literal(_) | SymbolicBit::Variable(_) => false,
    }
}

/// Moves the children of `bit` onto `pending`, leaving `leaf` in their place.
fn detach_children(
    bit: &mut SymbolicBit,
    leaf: &Arc<SymbolicBit>,
    pending: &mut Vec<Arc<SymbolicBit>>,
) {
    match bit {
        SymbolicBit::Not(x) => pending.push(std::mem::replace(x, Arc::clone(leaf))),
        SymbolicBit::And(x, y) => {
            pending.push(std::mem::replace(x, Arc::clone(leaf)));
            pending.push(std::mem::replace(y, Arc::clone(leaf)));
        }
        SymbolicBit::Literal(_) | SymbolicBit::Variable(_) => (),
    }
}

impl Default for SymbolicBit {
    fn default() -> Self {
        FALSE
    }
}

impl From<bool> for SymbolicBit {
    fn from(value: bool) -> Self {
        SymbolicBit::Literal(value)
    }
}

impl TryFrom<SymbolicBit> for bool {
    type Error = NonLiteralBit;

    fn try_from(bit: SymbolicBit) -> Result<Self, Self::Error> {
        bit.maybe_literal().ok_or(NonLiteralBit)
    }
}

impl std::ops::Not for SymbolicBit {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            SymbolicBit::Literal(x) => SymbolicBit::Literal(!x),
            SymbolicBit::Not(ref y) => SymbolicBit::clone(y),
            _ => SymbolicBit::Not(Arc::new(self)),
        }
    }
}

impl std::ops::BitAnd for SymbolicBit {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        if self.is_identical(&rhs) {
            return self;
        }

        match self {
            SymbolicBit::Literal(false) => return FALSE,
            SymbolicBit::Literal(true) => return rhs,
            SymbolicBit::Not(ref z) if z.is_identical(&rhs) => return FALSE,
            _ => (),
        }

        match rhs {
            SymbolicBit::Literal(false) => return FALSE,
            SymbolicBit::Literal(true) => return self,
            SymbolicBit::Not(ref z) if z.is_identical(&self) => return FALSE,
            _ => (),
        }

        SymbolicBit::And(Arc::new(self), Arc::new(rhs))
    }
}

impl std::ops::BitOr for SymbolicBit {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        !(!self & !rhs)
    }
}

impl std::ops::BitXor for SymbolicBit {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        (self.clone() & !rhs.clone()) | (!self & rhs)
    }
}

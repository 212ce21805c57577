use std::ops::Range;

use serde::{Deserialize, Serialize};
use sym::{SymbolicBitVec, VariableAllocator, VariableAssignments};
use value_ops::ValueOps;

use crate::vector::VectorEntry;

pub type Result<T> = std::result::Result<T, InvalidRegion>;

/// A malformed request to make memory symbolic.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRegion {
    #[error("symbolic region `{name}` has zero size")]
    ZeroSize { name: String },

    #[error("symbolic region `{name}` at {address:#x} with size {size} overflows the address space")]
    Overflow {
        name: String,
        address: u64,
        size: u64,
    },

    #[error("symbolic region `{name}` at {address:#x} with size {size} is outside of ram of size {memory_size}")]
    OutOfBounds {
        name: String,
        address: u64,
        size: u64,
        memory_size: u64,
    },

    /// The pointer or size of the region depends on a symbolic value
    #[error("{operand} of symbolic region `{name}` is not concrete")]
    SymbolicOperand { name: String, operand: &'static str },
}

/// A contiguous extent of ram whose contents are unknowns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicRegion {
    /// Unique within its [ExecutionContext]
    pub name: String,
    pub address: u64,
    pub size: usize,
}

#[derive(Clone, Debug)]
struct Declaration {
    region: SymbolicRegion,

    /// Variables standing for the region contents. Only bound during exploration.
    variables: Option<Range<usize>>,
}

/// Registry of the symbolic regions declared by one run of a program.
///
/// Each path owns its context. Forking a path clones the context, so declarations made after the
/// fork are only visible to the path that made them.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    memory_size: u64,
    declarations: Vec<Declaration>,
    variables: VariableAllocator,
}

impl ExecutionContext {
    pub fn new(memory_size: u64) -> Self {
        Self {
            memory_size,
            declarations: Vec::new(),
            variables: VariableAllocator::new(),
        }
    }

    /// Registers `size` bytes of ram at `address` under `name`.
    ///
    /// A name already used in this context is made unique by appending `_1`, `_2` and so on. The
    /// returned region carries the name actually registered.
    pub fn declare_symbolic(
        &mut self,
        address: u64,
        size: u64,
        name: &str,
    ) -> Result<SymbolicRegion> {
        if size == 0 {
            return Err(InvalidRegion::ZeroSize {
                name: name.to_owned(),
            });
        }

        let overflow = || InvalidRegion::Overflow {
            name: name.to_owned(),
            address,
            size,
        };
        let end = address.checked_add(size).ok_or_else(overflow)?;
        let byte_count = usize::try_from(size).map_err(|_| overflow())?;

        if end > self.memory_size {
            return Err(InvalidRegion::OutOfBounds {
                name: name.to_owned(),
                address,
                size,
                memory_size: self.memory_size,
            });
        }

        let unique_name = self.unique_name(name);
        if unique_name != name {
            tracing::warn!("symbolic region `{name}` already declared, renamed to `{unique_name}`");
        }

        let region = SymbolicRegion {
            name: unique_name,
            address,
            size: byte_count,
        };
        self.declarations.push(Declaration {
            region: region.clone(),
            variables: None,
        });

        Ok(region)
    }

    /// Same as [Self::declare_symbolic] with operands as read by the interpreter. Operands that
    /// are not concrete are rejected.
    pub fn declare_symbolic_operands<V: ValueOps>(
        &mut self,
        address: V,
        size: V,
        name: &str,
    ) -> Result<SymbolicRegion> {
        let concrete = |value: V, operand| {
            value
                .try_into()
                .map_err(|_| InvalidRegion::SymbolicOperand {
                    name: name.to_owned(),
                    operand,
                })
        };

        let address: u64 = concrete(address, "address")?;
        let size: u64 = concrete(size, "size")?;
        self.declare_symbolic(address, size, name)
    }

    /// Creates fresh variables for the contents of `region` and remembers them so a test vector
    /// can later be read back from a model.
    pub fn fresh_value(&mut self, region: &SymbolicRegion) -> SymbolicBitVec {
        let variables = self.variables.allocate(8 * region.size);
        if let Some(declaration) = self
            .declarations
            .iter_mut()
            .rev()
            .find(|declaration| declaration.region.name == region.name)
        {
            declaration.variables = Some(variables.clone());
        }

        SymbolicBitVec::from_variable_ids(variables)
    }

    pub fn regions(&self) -> impl Iterator<Item = &SymbolicRegion> {
        self.declarations.iter().map(|declaration| &declaration.region)
    }

    pub fn region(&self, name: &str) -> Option<&SymbolicRegion> {
        self.regions().find(|region| region.name == name)
    }

    pub fn memory_size(&self) -> u64 {
        self.memory_size
    }

    /// Concrete bytes of every region under `model`, in declaration order. Bits the model does
    /// not mention read as zero.
    pub fn concretize(&self, model: &VariableAssignments) -> Vec<VectorEntry> {
        self.declarations
            .iter()
            .map(|declaration| {
                let bytes = match &declaration.variables {
                    Some(variables) => model.bytes(variables.start, declaration.region.size),
                    None => vec![0; declaration.region.size],
                };
                VectorEntry::new(declaration.region.name.clone(), bytes)
            })
            .collect()
    }

    fn unique_name(&self, name: &str) -> String {
        let taken = |candidate: &str| self.regions().any(|region| region.name == candidate);
        if !taken(name) {
            return name.to_owned();
        }

        (1..)
            .map(|suffix| format!("{name}_{suffix}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| name.to_owned())
    }
}

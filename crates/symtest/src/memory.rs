use std::collections::BTreeMap;

use value_ops::ValueOps;

use crate::program::{Space, Varnode, MAX_VARNODE_BYTES};

/// Memory result type
pub type Result<T> = std::result::Result<T, Error>;

/// Possible memory errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A temporary was read before it was written
    #[error("data not defined at {target} + {relative_offset}")]
    UndefinedData {
        target: Varnode,
        relative_offset: usize,
    },

    /// The access extends past the end of ram
    #[error("{target} is outside of ram of size {memory_size}")]
    OutOfBounds { target: Varnode, memory_size: u64 },

    /// The arguments provided for a given request are invalid
    #[error("arguments provided are not valid: {0}")]
    InvalidArguments(String),
}

/// Byte-addressed storage for the `ram` and `tmp` spaces. Constants are decoded from the varnode
/// itself.
///
/// Ram reads of bytes never written yield zero. Temporaries must be written before being read.
#[derive(Clone, Debug)]
pub struct Memory<V: ValueOps> {
    memory_size: u64,
    data: BTreeMap<Space, BTreeMap<u64, V::Byte>>,
}

impl<V: ValueOps> Memory<V> {
    pub fn new(memory_size: u64) -> Self {
        Self {
            memory_size,
            data: Default::default(),
        }
    }

    pub fn memory_size(&self) -> u64 {
        self.memory_size
    }

    pub fn read(&self, source: &Varnode) -> Result<V> {
        if source.size > MAX_VARNODE_BYTES {
            return Err(Error::InvalidArguments(format!(
                "varnode size {size} exceeds maximum of {MAX_VARNODE_BYTES}",
                size = source.size
            )));
        }

        match source.space {
            Space::Const => Ok(V::from_u64(source.offset, source.size)),
            Space::Ram => Ok(self
                .read_ram(source.offset, source.size)?
                .into_iter()
                .collect()),
            Space::Tmp => Ok(self.read_defined(source)?.into_iter().collect()),
        }
    }

    /// Reads a 1-byte boolean. Only the least significant bit is used.
    pub fn read_bit(&self, source: &Varnode) -> Result<V::Bit> {
        if source.size != 1 {
            return Err(Error::InvalidArguments(format!(
                "expected varnode size to be 1, actual {size}",
                size = source.size
            )));
        }

        self.read(source).map(ValueOps::lsb)
    }

    pub fn write(&mut self, destination: &Varnode, data: V) -> Result<()> {
        if data.num_bytes() != destination.size {
            return Err(Error::InvalidArguments(format!(
                "expected to write {expected} byte(s), got {actual} byte(s)",
                expected = destination.size,
                actual = data.num_bytes()
            )));
        }

        self.write_bytes(destination, data.into_le_bytes())
    }

    pub fn write_bit(&mut self, destination: &Varnode, bit: V::Bit) -> Result<()> {
        self.write_bytes(destination, [V::Byte::from(bit)])
    }

    /// Writes raw bytes to ram. Unlike [Self::write] the extent is not limited to the size of a
    /// single value.
    pub fn write_ram(&mut self, address: u64, bytes: Vec<V::Byte>) -> Result<()> {
        let destination = Varnode::ram(address, bytes.len());
        self.write_bytes(&destination, bytes)
    }

    /// Reads raw bytes from ram.
    pub fn read_ram(&self, address: u64, size: usize) -> Result<Vec<V::Byte>> {
        let source = Varnode::ram(address, size);
        self.check_bounds(&source)?;
        let memory = self.data.get(&Space::Ram);
        Ok((address..)
            .take(size)
            .map(|offset| {
                memory
                    .and_then(|memory| memory.get(&offset))
                    .cloned()
                    .unwrap_or_else(|| V::Byte::from(0u8))
            })
            .collect())
    }

    fn check_bounds(&self, target: &Varnode) -> Result<()> {
        let in_bounds = target.end().is_some_and(|end| end <= self.memory_size);
        if in_bounds {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                target: target.clone(),
                memory_size: self.memory_size,
            })
        }
    }

    fn read_defined(&self, source: &Varnode) -> Result<Vec<V::Byte>> {
        let memory = self.data.get(&source.space).ok_or(Error::UndefinedData {
            target: source.clone(),
            relative_offset: 0,
        })?;

        (0..source.size)
            .map(|i| {
                source
                    .offset
                    .checked_add(i as u64)
                    .and_then(|offset| memory.get(&offset))
                    .cloned()
                    .ok_or(Error::UndefinedData {
                        target: source.clone(),
                        relative_offset: i,
                    })
            })
            .collect()
    }

    fn write_bytes(
        &mut self,
        destination: &Varnode,
        data: impl IntoIterator<IntoIter = impl ExactSizeIterator<Item = V::Byte>>,
    ) -> Result<()> {
        // Make sure data provided matches expected amount for destination
        let data = data.into_iter();
        if data.len() != destination.size {
            return Err(Error::InvalidArguments(format!(
                "expected to write {expected} byte(s), got {actual} byte(s)",
                expected = destination.size,
                actual = data.len()
            )));
        }

        match destination.space {
            Space::Const => {
                return Err(Error::InvalidArguments(format!(
                    "cannot write to constant {destination}"
                )))
            }
            Space::Ram => self.check_bounds(destination)?,
            Space::Tmp => {
                if destination.end().is_none() {
                    return Err(Error::InvalidArguments(format!(
                        "varnode size {size} overflows address offset {offset}",
                        size = destination.size,
                        offset = destination.offset
                    )));
                }
            }
        }

        let memory = self.data.entry(destination.space).or_default();
        for (offset, byte) in (destination.offset..).zip(data) {
            memory.insert(offset, byte);
        }

        Ok(())
    }
}

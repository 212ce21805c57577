use super::SymbolicBitVec;
use crate::bit::SymbolicBit;
use crate::byte::SymbolicByte;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConcretizationError {
    #[error("non-literal bit at index {bit_index}")]
    NonLiteralBit { bit_index: usize },

    #[error("value exceeded maximum number of bytes ({max_bytes})")]
    Overflow { max_bytes: usize },
}

impl IntoIterator for SymbolicBitVec {
    type Item = SymbolicBit;
    type IntoIter = std::collections::vec_deque::IntoIter<SymbolicBit>;

    fn into_iter(self) -> Self::IntoIter {
        self.bits.into_iter()
    }
}

impl FromIterator<SymbolicBit> for SymbolicBitVec {
    fn from_iter<T: IntoIterator<Item = SymbolicBit>>(iter: T) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

/// Collects little-endian bytes.
impl FromIterator<SymbolicByte> for SymbolicBitVec {
    fn from_iter<T: IntoIterator<Item = SymbolicByte>>(iter: T) -> Self {
        iter.into_iter().flat_map(SymbolicByte::into_bits).collect()
    }
}

impl From<SymbolicBit> for SymbolicBitVec {
    fn from(bit: SymbolicBit) -> Self {
        std::iter::once(bit).collect()
    }
}

macro_rules! impl_concrete_conversions {
    ($type:ty) => {
        impl From<$type> for SymbolicBitVec {
            fn from(value: $type) -> Self {
                SymbolicBitVec::constant(value.into(), <$type>::BITS as usize)
            }
        }

        impl TryFrom<&SymbolicBitVec> for $type {
            type Error = ConcretizationError;

            fn try_from(value: &SymbolicBitVec) -> Result<Self, Self::Error> {
                let max_bytes = std::mem::size_of::<$type>();
                let mut result: $type = 0;
                for (bit_index, bit) in value.iter().enumerate() {
                    match bit {
                        SymbolicBit::Literal(false) => (),
                        SymbolicBit::Literal(true) if bit_index < <$type>::BITS as usize => {
                            result |= 1 << bit_index;
                        }
                        SymbolicBit::Literal(true) => {
                            return Err(ConcretizationError::Overflow { max_bytes });
                        }
                        _ => return Err(ConcretizationError::NonLiteralBit { bit_index }),
                    }
                }

                Ok(result)
            }
        }

        impl TryFrom<SymbolicBitVec> for $type {
            type Error = ConcretizationError;

            fn try_from(value: SymbolicBitVec) -> Result<Self, Self::Error> {
                <$type>::try_from(&value)
            }
        }
    };
}

impl_concrete_conversions!(u8);
impl_concrete_conversions!(u16);
impl_concrete_conversions!(u32);
impl_concrete_conversions!(u64);
impl_concrete_conversions!(u128);

use crate::bit::{SymbolicBit, FALSE};
use crate::ConcretizationError;

/// An 8-bit byte of symbolic bits. Index 0 is the least significant bit.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct SymbolicByte {
    bits: [SymbolicBit; 8],
}

impl SymbolicByte {
    pub fn bits(&self) -> &[SymbolicBit; 8] {
        &self.bits
    }

    pub fn into_bits(self) -> [SymbolicBit; 8] {
        self.bits
    }

    pub fn is_literal(&self) -> bool {
        self.bits.iter().all(|bit| bit.maybe_literal().is_some())
    }
}

impl From<[SymbolicBit; 8]> for SymbolicByte {
    fn from(bits: [SymbolicBit; 8]) -> Self {
        Self { bits }
    }
}

/// The bit becomes the least significant bit. The remaining bits are zero.
impl From<SymbolicBit> for SymbolicByte {
    fn from(bit: SymbolicBit) -> Self {
        let mut bits = [FALSE; 8];
        bits[0] = bit;
        Self { bits }
    }
}

impl From<u8> for SymbolicByte {
    fn from(value: u8) -> Self {
        Self {
            bits: std::array::from_fn(|i| SymbolicBit::Literal((value >> i) & 1 == 1)),
        }
    }
}

impl TryFrom<SymbolicByte> for u8 {
    type Error = ConcretizationError;

    fn try_from(byte: SymbolicByte) -> Result<Self, Self::Error> {
        u8::try_from(&byte)
    }
}

impl TryFrom<&SymbolicByte> for u8 {
    type Error = ConcretizationError;

    fn try_from(byte: &SymbolicByte) -> Result<Self, Self::Error> {
        byte.bits
            .iter()
            .enumerate()
            .try_fold(0u8, |value, (bit_index, bit)| match bit {
                SymbolicBit::Literal(true) => Ok(value | (1 << bit_index)),
                SymbolicBit::Literal(false) => Ok(value),
                _ => Err(ConcretizationError::NonLiteralBit { bit_index }),
            })
    }
}

impl std::ops::Index<usize> for SymbolicByte {
    type Output = SymbolicBit;

    fn index(&self, index: usize) -> &Self::Output {
        &self.bits[index]
    }
}

impl IntoIterator for SymbolicByte {
    type Item = SymbolicBit;
    type IntoIter = std::array::IntoIter<SymbolicBit, 8>;

    fn into_iter(self) -> Self::IntoIter {
        self.bits.into_iter()
    }
}

use value_ops::ValueOps;

use crate::{SymbolicBit, SymbolicBitVec, SymbolicByte};

impl ValueOps for SymbolicBitVec {
    type Byte = SymbolicByte;
    type Bit = SymbolicBit;

    fn fill_bytes_with(bit: Self::Bit, num_bytes: usize) -> Self {
        std::iter::repeat(bit).take(8 * num_bytes).collect()
    }

    fn num_bytes(&self) -> usize {
        SymbolicBitVec::num_bytes(self)
    }

    fn into_le_bytes(self) -> impl ExactSizeIterator<Item = Self::Byte> {
        self.into_bytes().into_iter()
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn unsigned_carry(self, rhs: Self) -> Self::Bit {
        let (_, carry) = self.addition_with_carry(rhs);
        carry
    }

    fn signed_carry(self, rhs: Self) -> Self::Bit {
        self.signed_addition_overflow(rhs)
    }

    fn negate(self) -> Self {
        -self
    }

    fn subtract(self, rhs: Self) -> Self {
        self - rhs
    }

    fn borrow(self, rhs: Self) -> Self::Bit {
        self.signed_subtraction_overflow(rhs)
    }

    fn multiply(self, rhs: Self) -> Self {
        self * rhs
    }

    fn unsigned_divide(self, rhs: Self) -> Self {
        let (quotient, _) = self.divmod(rhs);
        quotient
    }

    fn unsigned_remainder(self, rhs: Self) -> Self {
        let (_, remainder) = self.divmod(rhs);
        remainder
    }

    fn zero_extend(self, new_size: usize) -> Self {
        let num_bits = (8 * new_size).saturating_sub(self.len());
        self.extend_zero(num_bits)
    }

    fn sign_extend(self, new_size: usize) -> Self {
        let num_bits = (8 * new_size).saturating_sub(self.len());
        self.extend_sign(num_bits)
    }

    fn lsb(self) -> Self::Bit {
        SymbolicBitVec::lsb(&self).cloned().unwrap_or_default()
    }

    fn shift_left(self, rhs: Self) -> Self {
        self << rhs
    }

    fn unsigned_shift_right(self, rhs: Self) -> Self {
        self >> rhs
    }

    fn signed_shift_right(self, rhs: Self) -> Self {
        SymbolicBitVec::signed_shift_right(self, rhs)
    }

    fn equals(self, rhs: Self) -> Self::Bit {
        SymbolicBitVec::equals(self, rhs)
    }

    fn not_equals(self, rhs: Self) -> Self::Bit {
        !SymbolicBitVec::equals(self, rhs)
    }

    fn unsigned_less_than(self, rhs: Self) -> Self::Bit {
        self.less_than(rhs)
    }

    fn signed_less_than(self, rhs: Self) -> Self::Bit {
        SymbolicBitVec::signed_less_than(self, rhs)
    }

    fn unsigned_less_than_or_equals(self, rhs: Self) -> Self::Bit {
        self.less_than_eq(rhs)
    }

    fn signed_less_than_or_equals(self, rhs: Self) -> Self::Bit {
        self.signed_less_than_eq(rhs)
    }
}

use super::{ShiftDirection, SymbolicBitVec};
use crate::bit::{SymbolicBit, FALSE};

impl std::ops::Index<usize> for SymbolicBitVec {
    type Output = SymbolicBit;

    fn index(&self, index: usize) -> &Self::Output {
        &self.bits[index]
    }
}

impl std::ops::Not for SymbolicBitVec {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.bits.into_iter().map(|bit| !bit).collect()
    }
}

macro_rules! bitwise_op {
    ($trait:ident, $fn:ident, $op:tt) => {
        impl std::ops::$trait for SymbolicBitVec {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self::Output {
                assert_eq!(self.bits.len(), rhs.bits.len());
                self.bits
                    .into_iter()
                    .zip(rhs.bits)
                    .map(|(lhs, rhs)| lhs $op rhs)
                    .collect()
            }
        }
    };
}

bitwise_op!(BitAnd, bitand, &);
bitwise_op!(BitOr, bitor, |);
bitwise_op!(BitXor, bitxor, ^);

impl std::ops::Shl<usize> for SymbolicBitVec {
    type Output = Self;

    fn shl(mut self, rhs: usize) -> Self::Output {
        self.shift_mut(rhs, FALSE, &ShiftDirection::Left);
        self
    }
}

impl std::ops::Shl for SymbolicBitVec {
    type Output = Self;

    fn shl(self, rhs: Self) -> Self::Output {
        self.shift_by(rhs, FALSE, ShiftDirection::Left)
    }
}

/// Performs an _unsigned_ right shift.
impl std::ops::Shr for SymbolicBitVec {
    type Output = Self;

    fn shr(self, rhs: Self) -> Self::Output {
        self.shift_by(rhs, FALSE, ShiftDirection::Right)
    }
}

impl std::ops::Shr<usize> for SymbolicBitVec {
    type Output = Self;

    fn shr(mut self, rhs: usize) -> Self::Output {
        self.shift_mut(rhs, FALSE, &ShiftDirection::Right);
        self
    }
}

impl std::ops::Add for SymbolicBitVec {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        assert_eq!(self.bits.len(), rhs.bits.len());
        let (sum, _) = self.addition_with_carry(rhs);
        sum
    }
}

impl std::ops::Neg for SymbolicBitVec {
    type Output = Self;

    fn neg(self) -> Self::Output {
        let num_bits = self.bits.len();
        !self + SymbolicBitVec::constant(1, num_bits)
    }
}

impl std::ops::Sub for SymbolicBitVec {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert_eq!(self.bits.len(), rhs.bits.len());
        self + (-rhs)
    }
}

/// Wrapping multiplication. The product has the width of the left-hand side.
impl std::ops::Mul for SymbolicBitVec {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let output_bits = self.len();
        self.multiply(rhs, output_bits)
    }
}

use std::collections::VecDeque;
use std::ops::Range;

use crate::bit::{SymbolicBit, FALSE, TRUE};
use crate::byte::SymbolicByte;

mod convert;
mod ops;

pub use convert::ConcretizationError;

/// A little-endian sequence of symbolic bits. Index 0 is the least significant bit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolicBitVec {
    bits: VecDeque<SymbolicBit>,
}

/// Hands out fresh variable identifiers.
///
/// Each execution owns its own allocator, so identifiers are deterministic for a given sequence
/// of allocations.
#[derive(Debug, Clone, Default)]
pub struct VariableAllocator {
    next_id: usize,
}

impl VariableAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `num_bits` consecutive identifiers.
    pub fn allocate(&mut self, num_bits: usize) -> Range<usize> {
        let start = self.next_id;
        self.next_id += num_bits;
        start..self.next_id
    }

    /// Number of identifiers handed out so far.
    pub fn allocated(&self) -> usize {
        self.next_id
    }
}

enum ShiftDirection {
    Left,
    Right,
}

impl SymbolicBitVec {
    pub fn msb(&self) -> Option<&SymbolicBit> {
        self.bits.back()
    }

    pub fn lsb(&self) -> Option<&SymbolicBit> {
        self.bits.front()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn num_bytes(&self) -> usize {
        self.bits.len().div_ceil(8)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolicBit> {
        self.bits.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SymbolicBit> {
        self.bits.iter_mut()
    }

    /// Creates a bit-vector of fresh variables drawn from `allocator`.
    pub fn with_variables(allocator: &mut VariableAllocator, num_bits: usize) -> Self {
        allocator.allocate(num_bits).map(SymbolicBit::Variable).collect()
    }

    /// Creates a bit-vector whose bits are the variables in `ids`, least significant first.
    pub fn from_variable_ids(ids: Range<usize>) -> Self {
        ids.map(SymbolicBit::Variable).collect()
    }

    /// Splits the bits into bytes. Trailing bits that do not fill a byte are zero extended.
    pub fn into_bytes(self) -> Vec<SymbolicByte> {
        let num_bits = self.len();
        let mut bytes = Vec::with_capacity(self.num_bytes());
        let mut bits = [FALSE; 8];

        for (i, bit) in self.bits.into_iter().enumerate() {
            bits[i % 8] = bit;
            if (i + 1) % 8 == 0 {
                bytes.push(std::mem::replace(&mut bits, [FALSE; 8]).into());
            }
        }

        if num_bits % 8 != 0 {
            bytes.push(bits.into());
        }

        bytes
    }

    pub fn empty() -> Self {
        Self {
            bits: VecDeque::new(),
        }
    }

    /// Creates a literal bit-vector from the low `num_bits` bits of `value`.
    pub fn constant(value: u128, num_bits: usize) -> Self {
        (0..num_bits)
            .map(|i| SymbolicBit::Literal(i < 128 && (value >> i) & 1 == 1))
            .collect()
    }

    pub fn contains_variable(&self) -> bool {
        self.bits
            .iter()
            .any(|bit| !matches!(*bit, SymbolicBit::Literal(_)))
    }

    pub fn equals(self, rhs: Self) -> SymbolicBit {
        assert_eq!(self.bits.len(), rhs.bits.len());
        self.bits
            .into_iter()
            .zip(rhs.bits)
            .fold(TRUE, |eq, (lhs, rhs)| eq & lhs.equals(rhs))
    }

    /// Concatenates the left-hand side with the right-hand side. The right-hand side becomes the
    /// most significant bits.
    pub fn concat(mut self, mut rhs: Self) -> Self {
        self.bits.append(&mut rhs.bits);
        self
    }

    /// Keeps the `num_bits` least significant bits.
    pub fn truncate(mut self, num_bits: usize) -> Self {
        self.bits.truncate(num_bits);
        self
    }

    /// Appends `num_bits` zero bits as the most significant bits.
    pub fn extend_zero(self, num_bits: usize) -> Self {
        self.concat(SymbolicBitVec::constant(0, num_bits))
    }

    /// Appends `num_bits` copies of the most significant bit.
    pub fn extend_sign(self, num_bits: usize) -> Self {
        let msb = self.msb().cloned().unwrap_or_default();
        let extension = std::iter::repeat(msb).take(num_bits).collect();
        self.concat(extension)
    }

    /// Returns the wrapping sum together with the unsigned carry out of the most significant bit.
    pub fn addition_with_carry(self, rhs: Self) -> (Self, SymbolicBit) {
        let mut carry = self.clone().addition_carry_bits(rhs.clone());
        let overflow = carry.bits.pop_back().unwrap_or_default();
        let sum = self ^ rhs ^ carry;
        (sum, overflow)
    }

    /// Carry into each bit position plus the final carry out. The result has one more bit than
    /// the operands.
    pub fn addition_carry_bits(self, rhs: Self) -> Self {
        assert_eq!(self.bits.len(), rhs.bits.len());
        let mut carry = VecDeque::with_capacity(self.bits.len() + 1);
        carry.push_back(FALSE);
        for (i, (x, y)) in self.bits.into_iter().zip(rhs.bits).enumerate() {
            let carry_in = carry[i].clone();
            let generate = x.clone() & y.clone();
            let propagate = (x ^ y) & carry_in;
            carry.push_back(generate | propagate);
        }

        Self { bits: carry }
    }

    pub fn signed_addition_overflow(self, rhs: Self) -> SymbolicBit {
        let lhs_sign = self.msb().cloned().unwrap_or_default();
        let rhs_sign = rhs.msb().cloned().unwrap_or_default();
        let sum = self + rhs;
        let sum_sign = sum.msb().cloned().unwrap_or_default();

        // Operands share a sign that the sum does not
        lhs_sign.clone().equals(rhs_sign) & !lhs_sign.equals(sum_sign)
    }

    pub fn signed_subtraction_overflow(self, rhs: Self) -> SymbolicBit {
        let lhs_sign = self.msb().cloned().unwrap_or_default();
        let rhs_sign = rhs.msb().cloned().unwrap_or_default();
        let difference = self - rhs;
        let difference_sign = difference.msb().cloned().unwrap_or_default();

        // Operands differ in sign and the difference does not keep the sign of the minuend
        !lhs_sign.clone().equals(rhs_sign) & !lhs_sign.equals(difference_sign)
    }

    /// Multiplies two integers keeping `output_bits` bits of the product.
    ///
    /// The product is accumulated with one shifted partial sum per bit of `rhs`. Partial sums
    /// that fall entirely above `output_bits` are never built.
    pub fn multiply(self, rhs: Self, output_bits: usize) -> Self {
        let mut product = SymbolicBitVec::constant(0, output_bits);
        for (shift, selector) in rhs.bits.into_iter().enumerate() {
            if shift >= output_bits {
                break;
            }

            let width = output_bits - shift;
            let mut addend: SymbolicBitVec = self
                .bits
                .iter()
                .take(width)
                .map(|bit| selector.clone() & bit.clone())
                .collect();
            addend = addend.extend_zero(width.saturating_sub(self.len()));

            let high: SymbolicBitVec = product.bits.split_off(shift).into_iter().collect();
            let sum = high + addend;
            product.bits.extend(sum.bits);
        }

        product
    }

    /// Restoring division of `self` by `divisor`. Returns `(quotient, remainder)`.
    ///
    /// Division by zero yields a quotient with every bit set and the dividend as remainder.
    pub fn divmod(self, divisor: Self) -> (Self, Self) {
        assert_eq!(self.len(), divisor.len());
        let len = self.len();
        let mut quotient = SymbolicBitVec::constant(0, len);
        let mut remainder = SymbolicBitVec::constant(0, len);

        for next_bit in self.bits.into_iter().rev() {
            remainder.bits.pop_back();
            remainder.bits.push_front(next_bit);

            let selector = remainder.clone().less_than(divisor.clone());
            let difference = remainder.clone() - divisor.clone();
            remainder.mux_mut(difference, selector.clone());

            quotient.bits.pop_back();
            quotient.bits.push_front(!selector);
        }

        (quotient, remainder)
    }

    /// Unsigned comparison `self < rhs`.
    pub fn less_than(self, rhs: Self) -> SymbolicBit {
        assert_eq!(self.len(), rhs.len());

        // Scan from least to most significant. A more significant differing bit overrides the
        // decision made so far.
        self.bits
            .into_iter()
            .zip(rhs.bits)
            .fold(FALSE, |less_than, (lhs, rhs)| {
                let differ = lhs.clone() ^ rhs.clone();
                differ.select(!lhs & rhs, less_than)
            })
    }

    pub fn less_than_eq(self, rhs: Self) -> SymbolicBit {
        !rhs.less_than(self)
    }

    /// Signed (two's complement) comparison `self < rhs`.
    pub fn signed_less_than(self, rhs: Self) -> SymbolicBit {
        assert_eq!(self.len(), rhs.len());
        let lhs_sign = match self.msb() {
            Some(bit) => bit.clone(),
            None => return FALSE,
        };
        let rhs_sign = rhs.msb().cloned().unwrap_or_default();
        let mixed_sign_case = lhs_sign.clone() & !rhs_sign.clone();
        let same_sign_case = lhs_sign.equals(rhs_sign) & self.less_than(rhs);

        mixed_sign_case | same_sign_case
    }

    pub fn signed_less_than_eq(self, rhs: Self) -> SymbolicBit {
        !rhs.signed_less_than(self)
    }

    /// Shift by an amount held in another bit-vector. Amounts of at least the bit width shift in
    /// `fill` everywhere.
    fn shift_by(mut self, rhs: Self, fill: SymbolicBit, direction: ShiftDirection) -> Self {
        let len = self.len();
        let mut overflow = FALSE;
        for (i, shift_bit) in rhs.bits.into_iter().enumerate() {
            let amount = u32::try_from(i)
                .ok()
                .and_then(|i| 1usize.checked_shl(i))
                .filter(|amount| *amount < len);
            match amount {
                Some(amount) => {
                    let mut shifted_value = self.clone();
                    shifted_value.shift_mut(amount, fill.clone(), &direction);
                    self.mux_mut(shifted_value, !shift_bit);
                }
                None => overflow = overflow | shift_bit,
            }
        }

        let filled = std::iter::repeat(fill).take(len).collect();
        self.mux_mut(filled, !overflow);
        self
    }

    pub fn signed_shift_right(self, rhs: Self) -> Self {
        let sign_bit = self.msb().cloned().unwrap_or_default();
        self.shift_by(rhs, sign_bit, ShiftDirection::Right)
    }

    fn shift_mut(&mut self, amount: usize, shift_in: SymbolicBit, direction: &ShiftDirection) {
        let len = self.len();
        let amount = amount.min(len);

        match direction {
            ShiftDirection::Left => {
                // [ 0 1 2 3 4 5 6 7 ] << 3
                // [ x x x 0 1 2 3 4 ]
                self.bits.truncate(len - amount);
                for _ in 0..amount {
                    self.bits.push_front(shift_in.clone());
                }
            }
            ShiftDirection::Right => {
                // [ 0 1 2 3 4 5 6 7 ] >> 3
                // [ 3 4 5 6 7 x x x ]
                self.bits.drain(..amount);
                self.bits.extend(std::iter::repeat(shift_in).take(amount));
            }
        }
    }

    /// Replaces each bit with the corresponding bit of `rhs` where `selector` is false.
    fn mux_mut(&mut self, rhs: Self, selector: SymbolicBit) {
        for (lhs, rhs) in self.bits.iter_mut().zip(rhs.bits) {
            let current = std::mem::take(lhs);
            *lhs = selector.clone().select(current, rhs);
        }
    }
}

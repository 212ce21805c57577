use std::fmt::Debug;

/// Operations over a fixed-width value. The representation of the value is not prescribed, but
/// every value is a sequence of little-endian bytes and may be reduced to a single bit when it is
/// used as a condition.
///
/// Binary operations require both operands to have the same number of bytes. Callers validate
/// operand sizes before invoking these operations.
pub trait ValueOps:
    BitwiseOps + FromIterator<Self::Byte> + TryInto<u64> + Clone + Debug + Send + Sync
{
    /// A representation of a byte (8-bit) value.
    type Byte: From<u8> + TryInto<u8> + From<Self::Bit> + Clone + Debug + Send + Sync;

    /// A representation of a single bit.
    type Bit: BitwiseOps + From<bool> + TryInto<bool> + Clone + Debug + Send + Sync;

    /// Create a value that is the given bit repeated to fill the specified number of bytes.
    fn fill_bytes_with(bit: Self::Bit, num_bytes: usize) -> Self;

    /// Returns the number of bytes used to represent this value.
    fn num_bytes(&self) -> usize;

    /// Returns an iterator of bytes in a little endian sequence.
    fn into_le_bytes(self) -> impl ExactSizeIterator<Item = Self::Byte>;

    /// Creates a value of `num_bytes` bytes from the low bytes of `value`.
    fn from_u64(value: u64, num_bytes: usize) -> Self {
        let bytes = value.to_le_bytes();
        (0..num_bytes)
            .map(|i| Self::Byte::from(bytes.get(i).copied().unwrap_or(0)))
            .collect()
    }

    /// Wrapping integer addition. Valid for both unsigned and two's complement interpretations.
    fn add(self, rhs: Self) -> Self;

    /// True if adding the operands as unsigned integers overflows the value width.
    fn unsigned_carry(self, rhs: Self) -> Self::Bit;

    /// True if adding the operands as signed integers overflows the value width.
    fn signed_carry(self, rhs: Self) -> Self::Bit;

    /// Two's complement negation.
    fn negate(self) -> Self;

    /// Wrapping integer subtraction.
    fn subtract(self, rhs: Self) -> Self;

    /// True if subtracting `rhs` from `self` as signed integers overflows the value width. The
    /// unsigned counterpart is [ValueOps::unsigned_less_than].
    fn borrow(self, rhs: Self) -> Self::Bit;

    /// Wrapping integer multiplication. The low half of the product is identical for signed and
    /// unsigned operands.
    fn multiply(self, rhs: Self) -> Self;

    /// Unsigned division truncating toward zero. Division by zero yields a value with every bit
    /// set.
    fn unsigned_divide(self, rhs: Self) -> Self;

    /// Unsigned remainder. The remainder of a division by zero is the dividend.
    fn unsigned_remainder(self, rhs: Self) -> Self;

    /// Copies the value into the low bytes of a wider value whose remaining bytes are zero.
    fn zero_extend(self, new_size: usize) -> Self;

    /// Copies the value into the low bytes of a wider value whose remaining bytes replicate the
    /// sign bit.
    fn sign_extend(self, new_size: usize) -> Self;

    /// Reduces the value to its least significant bit.
    fn lsb(self) -> Self::Bit;

    /// Shift left by `rhs` bits interpreted as unsigned. Shifting by the width or more yields zero.
    /// The shift amount may have any size.
    fn shift_left(self, rhs: Self) -> Self;

    /// Logical shift right by `rhs` bits interpreted as unsigned.
    fn unsigned_shift_right(self, rhs: Self) -> Self;

    /// Arithmetic shift right by `rhs` bits interpreted as unsigned. Vacated bits replicate the
    /// sign bit.
    fn signed_shift_right(self, rhs: Self) -> Self;

    fn equals(self, rhs: Self) -> Self::Bit;

    fn not_equals(self, rhs: Self) -> Self::Bit;

    fn unsigned_less_than(self, rhs: Self) -> Self::Bit;

    fn signed_less_than(self, rhs: Self) -> Self::Bit;

    fn unsigned_less_than_or_equals(self, rhs: Self) -> Self::Bit;

    fn signed_less_than_or_equals(self, rhs: Self) -> Self::Bit;
}

/// Bitwise operations applied to every bit of a value. Types implementing the standard bitwise
/// operator traits get this for free.
pub trait BitwiseOps {
    fn and(self, rhs: Self) -> Self;
    fn not(self) -> Self;
    fn or(self, rhs: Self) -> Self;
    fn xor(self, rhs: Self) -> Self;
}

impl<T> BitwiseOps for T
where
    T: std::ops::BitAnd<Output = T>
        + std::ops::BitOr<Output = T>
        + std::ops::BitXor<Output = T>
        + std::ops::Not<Output = T>,
{
    fn and(self, rhs: Self) -> Self {
        self & rhs
    }

    fn not(self) -> Self {
        !self
    }

    fn or(self, rhs: Self) -> Self {
        self | rhs
    }

    fn xor(self, rhs: Self) -> Self {
        self ^ rhs
    }
}

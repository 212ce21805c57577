use crate::ValueOps;

/// A concrete value of at most [ConcreteValue::MAX_BYTES] bytes.
///
/// Bits above the value width are always zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConcreteValue {
    value: u128,
    num_bytes: usize,
}

/// Error returned when a concrete value does not fit the requested integer type.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("value {value:#x} does not fit in {target_bytes} bytes")]
pub struct ValueOutOfRange {
    pub value: u128,
    pub target_bytes: usize,
}

impl ConcreteValue {
    pub const MAX_BYTES: usize = std::mem::size_of::<u128>();

    /// Creates a value of `num_bytes` bytes. Bits of `value` beyond that width are discarded and
    /// widths beyond [Self::MAX_BYTES] are clamped.
    pub fn new(value: u128, num_bytes: usize) -> Self {
        let num_bytes = num_bytes.min(Self::MAX_BYTES);
        Self {
            value: value & mask(num_bytes),
            num_bytes,
        }
    }

    /// The value read as an unsigned integer.
    pub fn value(&self) -> u128 {
        self.value
    }

    /// The value read as a two's complement signed integer.
    pub fn signed_value(&self) -> i128 {
        if self.num_bytes == 0 {
            return 0;
        }

        if self.num_bytes == Self::MAX_BYTES {
            return self.value as i128;
        }

        if self.sign_bit() {
            (self.value | !mask(self.num_bytes)) as i128
        } else {
            self.value as i128
        }
    }

    fn bits(&self) -> u32 {
        8 * self.num_bytes as u32
    }

    fn sign_bit(&self) -> bool {
        self.num_bytes > 0 && (self.value >> (self.bits() - 1)) & 1 == 1
    }

    fn map(self, f: impl FnOnce(u128) -> u128) -> Self {
        Self::new(f(self.value), self.num_bytes)
    }

    fn shift_amount(rhs: Self) -> Option<u32> {
        u32::try_from(rhs.value).ok()
    }
}

fn mask(num_bytes: usize) -> u128 {
    match num_bytes {
        0 => 0,
        n if n >= ConcreteValue::MAX_BYTES => u128::MAX,
        n => (1u128 << (8 * n)) - 1,
    }
}

macro_rules! impl_from_unsigned {
    ($type:ty) => {
        impl From<$type> for ConcreteValue {
            fn from(value: $type) -> Self {
                ConcreteValue::new(value.into(), std::mem::size_of::<$type>())
            }
        }

        impl TryFrom<ConcreteValue> for $type {
            type Error = ValueOutOfRange;

            fn try_from(value: ConcreteValue) -> Result<Self, Self::Error> {
                <$type>::try_from(value.value()).map_err(|_| ValueOutOfRange {
                    value: value.value(),
                    target_bytes: std::mem::size_of::<$type>(),
                })
            }
        }
    };
}

impl_from_unsigned!(u8);
impl_from_unsigned!(u16);
impl_from_unsigned!(u32);
impl_from_unsigned!(u64);
impl_from_unsigned!(u128);

impl std::ops::BitAnd for ConcreteValue {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.map(|value| value & rhs.value)
    }
}

impl std::ops::BitOr for ConcreteValue {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.map(|value| value | rhs.value)
    }
}

impl std::ops::BitXor for ConcreteValue {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        self.map(|value| value ^ rhs.value)
    }
}

impl std::ops::Not for ConcreteValue {
    type Output = Self;

    fn not(self) -> Self {
        self.map(|value| !value)
    }
}

impl ValueOps for ConcreteValue {
    type Byte = u8;
    type Bit = bool;

    fn fill_bytes_with(bit: bool, num_bytes: usize) -> Self {
        ConcreteValue::new(if bit { u128::MAX } else { 0 }, num_bytes)
    }

    fn num_bytes(&self) -> usize {
        self.num_bytes
    }

    fn into_le_bytes(self) -> impl ExactSizeIterator<Item = u8> {
        self.value.to_le_bytes().into_iter().take(self.num_bytes)
    }

    fn add(self, rhs: Self) -> Self {
        self.map(|value| value.wrapping_add(rhs.value))
    }

    fn unsigned_carry(self, rhs: Self) -> bool {
        match self.value.checked_add(rhs.value) {
            Some(sum) => sum > mask(self.num_bytes),
            None => true,
        }
    }

    fn signed_carry(self, rhs: Self) -> bool {
        let sum = self.add(rhs);
        self.sign_bit() == rhs.sign_bit() && sum.sign_bit() != self.sign_bit()
    }

    fn negate(self) -> Self {
        self.map(|value| (!value).wrapping_add(1))
    }

    fn subtract(self, rhs: Self) -> Self {
        self.map(|value| value.wrapping_sub(rhs.value))
    }

    fn borrow(self, rhs: Self) -> bool {
        let difference = self.subtract(rhs);
        self.sign_bit() != rhs.sign_bit() && difference.sign_bit() != self.sign_bit()
    }

    fn multiply(self, rhs: Self) -> Self {
        self.map(|value| value.wrapping_mul(rhs.value))
    }

    fn unsigned_divide(self, rhs: Self) -> Self {
        self.map(|value| value.checked_div(rhs.value).unwrap_or(u128::MAX))
    }

    fn unsigned_remainder(self, rhs: Self) -> Self {
        self.map(|value| value.checked_rem(rhs.value).unwrap_or(value))
    }

    fn zero_extend(self, new_size: usize) -> Self {
        ConcreteValue::new(self.value, new_size)
    }

    fn sign_extend(self, new_size: usize) -> Self {
        ConcreteValue::new(self.signed_value() as u128, new_size)
    }

    fn lsb(self) -> bool {
        self.value & 1 == 1
    }

    fn shift_left(self, rhs: Self) -> Self {
        match Self::shift_amount(rhs) {
            Some(amount) if amount < self.bits() => self.map(|value| value << amount),
            _ => ConcreteValue::new(0, self.num_bytes),
        }
    }

    fn unsigned_shift_right(self, rhs: Self) -> Self {
        match Self::shift_amount(rhs) {
            Some(amount) if amount < self.bits() => self.map(|value| value >> amount),
            _ => ConcreteValue::new(0, self.num_bytes),
        }
    }

    fn signed_shift_right(self, rhs: Self) -> Self {
        match Self::shift_amount(rhs) {
            Some(amount) if amount < self.bits() => {
                ConcreteValue::new((self.signed_value() >> amount) as u128, self.num_bytes)
            }
            _ => Self::fill_bytes_with(self.sign_bit(), self.num_bytes),
        }
    }

    fn equals(self, rhs: Self) -> bool {
        self.value == rhs.value
    }

    fn not_equals(self, rhs: Self) -> bool {
        self.value != rhs.value
    }

    fn unsigned_less_than(self, rhs: Self) -> bool {
        self.value < rhs.value
    }

    fn signed_less_than(self, rhs: Self) -> bool {
        self.signed_value() < rhs.signed_value()
    }

    fn unsigned_less_than_or_equals(self, rhs: Self) -> bool {
        self.value <= rhs.value
    }

    fn signed_less_than_or_equals(self, rhs: Self) -> bool {
        self.signed_value() <= rhs.signed_value()
    }
}

/// Collects little-endian bytes. Bytes beyond [ConcreteValue::MAX_BYTES] are ignored.
impl FromIterator<u8> for ConcreteValue {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let mut buffer = [0u8; ConcreteValue::MAX_BYTES];
        let mut num_bytes = 0;
        for (slot, byte) in buffer.iter_mut().zip(iter) {
            *slot = byte;
            num_bytes += 1;
        }

        ConcreteValue::new(u128::from_le_bytes(buffer), num_bytes)
    }
}

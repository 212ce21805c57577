//! Symbolic bits and bit-vectors.
//!
//! A [SymbolicBit] is a node of an and-inverter graph over boolean variables. A [SymbolicBitVec]
//! is a little-endian sequence of bits supporting two's complement arithmetic, comparisons and
//! shifts. Operations on literal bits fold to literals, so a bit-vector built only from constants
//! stays concrete.

mod bit;
mod byte;
mod eval;
mod value;
mod vec;

pub use crate::bit::*;
pub use crate::byte::*;
pub use crate::eval::*;
pub use crate::vec::*;

#[cfg(test)]
mod tests;

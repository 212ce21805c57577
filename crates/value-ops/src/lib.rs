//! Operations over fixed-width values.
//!
//! The interpreter in `symtest` is written once against [ValueOps]. Replay instantiates it with
//! [ConcreteValue] while exploration instantiates it with a symbolic bit-vector.

mod concrete;
mod ops;

pub use concrete::*;
pub use ops::*;

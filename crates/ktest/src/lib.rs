//! KTEST test-vector files.
//!
//! A KTEST file stores the concrete bytes chosen for every symbolic object of one test, along
//! with the program arguments the test ran with. All integers are big-endian `u32`.
//!
//! ```text
//! "KTEST" version
//! num_args (len arg)*
//! sym_argvs sym_argv_len          (version >= 2)
//! num_objects (len name len bytes)*
//! ```

mod dump;
mod file;

pub use dump::*;
pub use file::*;

#[cfg(test)]
mod tests;

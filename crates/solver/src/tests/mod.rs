mod cnf;
#[cfg(feature = "z3")]
mod z3_backend;

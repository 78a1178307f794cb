//! Domain models for the deposit and credit ledgers

pub mod credit;
pub mod deposit;

pub use credit::*;
pub use deposit::*;

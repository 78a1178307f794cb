//! Shared types and models for the SmartDrinkStore ledger backend
//!
//! This crate contains the domain models and pure ledger arithmetic shared
//! between the backend, the desktop frontend (via WASM), and the test suites.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;

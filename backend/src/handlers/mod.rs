//! HTTP handlers for the SmartDrinkStore ledger API

pub mod credit;
pub mod deposit;
pub mod deposit_type;
pub mod health;

pub use credit::*;
pub use deposit::*;
pub use deposit_type::*;
pub use health::*;

use serde::Serialize;

/// Confirmation payload for delete endpoints
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

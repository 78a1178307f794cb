//! Business logic services for the SmartDrinkStore ledger backend

pub mod credit;
pub mod deposit;
pub mod deposit_return;
pub mod deposit_type;

pub use credit::CreditService;
pub use deposit::DepositService;
pub use deposit_return::DepositReturnService;
pub use deposit_type::DepositTypeService;

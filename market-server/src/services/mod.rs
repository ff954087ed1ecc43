//! Business logic
//!
//! Services take `&dyn MarketStore` and return `ServiceResult`; handlers in
//! `crate::api` only translate HTTP to these calls.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order_status;
pub mod orders;
pub mod pricing;
pub mod validation;

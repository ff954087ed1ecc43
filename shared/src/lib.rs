//! Shared types for the food marketplace
//!
//! Wire types, domain models and the error system used by `market-server`
//! and its API clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};

//! Data models
//!
//! Shared between market-server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Row ids are `i64` snowflakes; user ids are opaque identity-provider strings.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

// Re-exports
pub use cart::*;
pub use catalog::*;
pub use order::*;
pub use user::*;

//! market-server: cart and checkout service for a multi-seller food marketplace
//!
//! Customers build a cart across many sellers and check out a subset of them;
//! each seller partition becomes its own order, committed independently.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod state;
pub mod utils;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;

//! Bearer authentication

pub mod jwt;

pub use jwt::{Identity, UserRole, auth_middleware, create_token};

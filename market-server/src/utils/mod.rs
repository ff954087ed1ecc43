//! Request helpers

pub mod validation;

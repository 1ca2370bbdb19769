//! Shared utilities

pub mod multisig;
pub mod validation;
pub mod version;

//! contest-pro-core: Shared types for the contest-pro server and its clients
//!
//! This crate contains the wire types and validation rules both sides agree on.

pub mod errors;
pub mod types;
pub mod validation;

pub use errors::*;
pub use types::*;
pub use validation::*;

//! Common module - errors, shared types and collaborator traits

pub mod errors;
pub mod traits;
pub mod types;

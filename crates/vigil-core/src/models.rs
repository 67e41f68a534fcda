//! Domain models for VIGIL.
//!
//! These are the core types shared across all crates.

pub mod audit;
pub mod record;
pub mod settings;
pub mod user;

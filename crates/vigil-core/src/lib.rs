//! VIGIL Core: domain models, error taxonomy, repository traits,
//! authorization predicates, and derived views.
//!
//! This crate has no I/O: storage backends implement the repository
//! traits defined here, and the service layer composes them.

pub mod authz;
pub mod error;
pub mod models;
pub mod repository;
pub mod views;

pub use error::{VigilError, VigilResult};

//! VIGIL Store: storage backends for the incident record pipeline.
//!
//! Two implementations of the `vigil-core` repository traits:
//! - [`LocalStore`]: one durable JSON blob on disk, read whole, mutated
//!   in memory, and atomically rewritten per operation.
//! - The `repository` module: a remote SurrealDB store with one row per
//!   record and a binary bucket table for images, plus schema
//!   migrations ([`run_migrations`]). Repositories take an
//!   already-connected `Surreal` handle; connecting is the embedding
//!   binary's concern.

mod error;
mod local;
mod schema;

pub mod repository;

pub use error::StoreError;
pub use local::{LocalStore, LocalStoreConfig};
pub use schema::run_migrations;

//! pubharvest-store — the persistence boundary.
//!
//! Exposes the document schema, the narrow [`DocumentStore`] contract
//! (get by id, save with an optimistic-concurrency token, query by
//! secondary index), and a JSON-file-backed in-process implementation.
//! The ingestion and patch pipelines depend only on the trait.

pub mod document;
pub mod error;
pub mod index;
pub mod memory;
pub mod store;

pub use document::{AuthorName, EntityKind, Href, Journal, StoredPublication, Xref};
pub use error::{Result, StoreError};
pub use index::{is_incomplete, IndexName};
pub use memory::JsonStore;
pub use store::{DocumentStore, IndexKey};

//! pubharvest-common — Shared error taxonomy, text folding, and the
//! allowlisted HTTP client used by the other pubharvest crates.

pub mod error;
pub mod net;
pub mod text;

pub use error::{HarvestError, Result};

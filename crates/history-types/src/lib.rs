//! Shared types for the intent history reconciler.
//!
//! This crate holds the record model tracked by the reconciliation engine,
//! the NEAR transaction shapes it consumes, the confirm-swap cache payload,
//! configuration schema validation, and small display helpers.

pub mod cache;
pub mod format;
pub mod record;
pub mod transaction;
pub mod validation;
pub mod view;

pub use cache::*;
pub use record::*;
pub use transaction::*;
pub use validation::*;

//! Typed access to backend collections.
//!
//! A [`Collection`] binds a backend to one collection name and an operation
//! deadline, and converts between documents and serde records.

mod collection;
mod errors;

pub use collection::Collection;
pub use errors::StoreError;

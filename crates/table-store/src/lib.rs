//! Wide-column table store abstraction.
//!
//! This crate defines the `TableStore` trait consumed by the fixture loader.
//! `bigtable-rest` implements it against Cloud Bigtable; [`MemoryStore`]
//! implements it in-process for tests and dry runs.

mod error;
pub mod memory;
mod mutation;
mod traits;

pub use error::StoreError;
pub use memory::{MemoryStore, StoreCall};
pub use mutation::{Mutation, RowMutation};
pub use traits::{RowResult, TableStore};

//! TableStore trait definition.
//!
//! This trait is the whole surface the fixture loader needs from a
//! wide-column store: table administration plus a bulk mutation call.
//! Consistency, retries and transport belong to the implementation.

use crate::error::StoreError;
use crate::mutation::RowMutation;

/// Outcome of a single entry of a bulk apply.
pub type RowResult = Result<(), StoreError>;

/// Administrative and data-plane operations on a wide-column store.
///
/// # Usage Pattern
///
/// Callers are generic over the store so the loader can run against a real
/// backend or the in-memory one:
///
/// ```ignore
/// async fn seed<S: TableStore>(store: &S) -> Result<(), StoreError> {
///     store.create_table("users").await?;
///     store.create_column_family("users", "d").await?;
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait TableStore: Send + Sync {
    /// List the names of all tables in the instance.
    async fn list_tables(&self) -> Result<Vec<String>, StoreError>;

    /// Delete a table and all of its data.
    async fn delete_table(&self, table: &str) -> Result<(), StoreError>;

    /// Create an empty table with no column families.
    async fn create_table(&self, table: &str) -> Result<(), StoreError>;

    /// Add a column family to an existing table.
    async fn create_column_family(&self, table: &str, family: &str) -> Result<(), StoreError>;

    /// Apply a batch of row mutations.
    ///
    /// The outer error reports a failure of the call as a whole. Otherwise
    /// the returned vector holds one outcome per entry, in submission order.
    async fn apply_bulk(
        &self,
        table: &str,
        entries: Vec<RowMutation>,
    ) -> Result<Vec<RowResult>, StoreError>;
}

#[async_trait::async_trait]
impl<S: TableStore + ?Sized> TableStore for std::sync::Arc<S> {
    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_tables().await
    }

    async fn delete_table(&self, table: &str) -> Result<(), StoreError> {
        (**self).delete_table(table).await
    }

    async fn create_table(&self, table: &str) -> Result<(), StoreError> {
        (**self).create_table(table).await
    }

    async fn create_column_family(&self, table: &str, family: &str) -> Result<(), StoreError> {
        (**self).create_column_family(table, family).await
    }

    async fn apply_bulk(
        &self,
        table: &str,
        entries: Vec<RowMutation>,
    ) -> Result<Vec<RowResult>, StoreError> {
        (**self).apply_bulk(table, entries).await
    }
}

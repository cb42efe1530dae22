//! In-memory store implementation.
//!
//! Mirrors the administrative semantics of Bigtable closely enough for tests:
//! creating an existing table or family fails, deleting a missing table
//! fails, writing to an undeclared family fails for that row only, and every
//! cell keeps all of its timestamped versions.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::mutation::{Mutation, RowMutation};
use crate::traits::{RowResult, TableStore};

/// gRPC status code used for injected failures (UNAVAILABLE).
const INJECTED_FAILURE_STATUS: i32 = 14;

/// Versions of one cell, newest timestamp last.
type Versions = BTreeMap<i64, Vec<u8>>;

/// row key -> qualifier -> versions
type FamilyData = BTreeMap<String, BTreeMap<String, Versions>>;

#[derive(Debug, Default)]
struct MemTable {
    families: BTreeMap<String, FamilyData>,
}

/// A call made against a [`MemoryStore`], recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListTables,
    DeleteTable(String),
    CreateTable(String),
    CreateColumnFamily { table: String, family: String },
    ApplyBulk { table: String, entries: usize },
}

#[derive(Debug, Default)]
struct Inner {
    tables: BTreeMap<String, MemTable>,
    calls: Vec<StoreCall>,
    failing_rows: HashSet<String>,
    failing_families: HashSet<String>,
}

/// In-process [`TableStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every bulk entry targeting `row_key` fail.
    pub async fn fail_row(&self, row_key: impl Into<String>) {
        self.inner.write().await.failing_rows.insert(row_key.into());
    }

    /// Make creation of the named column family fail on any table.
    pub async fn fail_family(&self, family: impl Into<String>) {
        self.inner
            .write()
            .await
            .failing_families
            .insert(family.into());
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.inner.read().await.calls.clone()
    }

    pub async fn has_table(&self, table: &str) -> bool {
        self.inner.read().await.tables.contains_key(table)
    }

    /// Column family names of a table, sorted. `None` if the table is missing.
    pub async fn families(&self, table: &str) -> Option<Vec<String>> {
        let inner = self.inner.read().await;
        inner
            .tables
            .get(table)
            .map(|t| t.families.keys().cloned().collect())
    }

    /// All versions of one cell, oldest first.
    pub async fn cell_versions(
        &self,
        table: &str,
        row_key: &str,
        family: &str,
        qualifier: &str,
    ) -> Vec<(i64, Vec<u8>)> {
        let inner = self.inner.read().await;
        inner
            .tables
            .get(table)
            .and_then(|t| t.families.get(family))
            .and_then(|rows| rows.get(row_key))
            .and_then(|cells| cells.get(qualifier))
            .map(|versions| versions.iter().map(|(ts, v)| (*ts, v.clone())).collect())
            .unwrap_or_default()
    }

    /// Newest version of one cell.
    pub async fn read_cell(
        &self,
        table: &str,
        row_key: &str,
        family: &str,
        qualifier: &str,
    ) -> Option<(i64, Vec<u8>)> {
        self.cell_versions(table, row_key, family, qualifier)
            .await
            .pop()
    }

    /// Total number of stored cell versions in a table.
    pub async fn cell_count(&self, table: &str) -> usize {
        let inner = self.inner.read().await;
        inner
            .tables
            .get(table)
            .map(|t| {
                t.families
                    .values()
                    .flat_map(|rows| rows.values())
                    .flat_map(|cells| cells.values())
                    .map(|versions| versions.len())
                    .sum()
            })
            .unwrap_or(0)
    }
}

fn apply_row(table_name: &str, table: &mut MemTable, entry: RowMutation) -> RowResult {
    if entry.row_key.is_empty() {
        return Err(StoreError::InvalidArgument("row key must not be empty".to_string()));
    }

    // Rows are applied atomically: validate every mutation before writing any.
    for mutation in &entry.mutations {
        let Mutation::SetCell { family, .. } = mutation;
        if !table.families.contains_key(family) {
            return Err(StoreError::FamilyNotFound {
                table: table_name.to_string(),
                family: family.clone(),
            });
        }
    }

    for mutation in entry.mutations {
        let Mutation::SetCell {
            family,
            qualifier,
            timestamp_micros,
            value,
        } = mutation;
        if let Some(rows) = table.families.get_mut(&family) {
            rows.entry(entry.row_key.clone())
                .or_default()
                .entry(qualifier)
                .or_default()
                .insert(timestamp_micros, value);
        }
    }
    Ok(())
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(StoreCall::ListTables);
        Ok(inner.tables.keys().cloned().collect())
    }

    async fn delete_table(&self, table: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(StoreCall::DeleteTable(table.to_string()));
        inner
            .tables
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn create_table(&self, table: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(StoreCall::CreateTable(table.to_string()));
        if table.is_empty() {
            return Err(StoreError::InvalidArgument("table name must not be empty".to_string()));
        }
        if inner.tables.contains_key(table) {
            return Err(StoreError::TableAlreadyExists(table.to_string()));
        }
        inner.tables.insert(table.to_string(), MemTable::default());
        tracing::debug!("memory store: created table {table}");
        Ok(())
    }

    async fn create_column_family(&self, table: &str, family: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(StoreCall::CreateColumnFamily {
            table: table.to_string(),
            family: family.to_string(),
        });
        if inner.failing_families.contains(family) {
            return Err(StoreError::Api {
                status: INJECTED_FAILURE_STATUS,
                message: format!("injected failure creating family '{family}'"),
            });
        }
        let t = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        if t.families.contains_key(family) {
            return Err(StoreError::FamilyAlreadyExists {
                table: table.to_string(),
                family: family.to_string(),
            });
        }
        t.families.insert(family.to_string(), FamilyData::new());
        Ok(())
    }

    async fn apply_bulk(
        &self,
        table: &str,
        entries: Vec<RowMutation>,
    ) -> Result<Vec<RowResult>, StoreError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        inner.calls.push(StoreCall::ApplyBulk {
            table: table.to_string(),
            entries: entries.len(),
        });

        let t = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let results = entries
            .into_iter()
            .map(|entry| {
                if inner.failing_rows.contains(&entry.row_key) {
                    return Err(StoreError::Api {
                        status: INJECTED_FAILURE_STATUS,
                        message: format!("injected failure for row '{}'", entry.row_key),
                    });
                }
                apply_row(table, t, entry)
            })
            .collect();
        Ok(results)
    }
}

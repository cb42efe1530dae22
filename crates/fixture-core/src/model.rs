//! In-memory form of a fixture document.
//!
//! ```yaml
//! table: users
//! column_families:
//!   - family: d
//!     columns:
//!       - key: "1"
//!         rows:
//!           name: foo
//!           age: 30
//!         version: "2018-01-02 15:04:05 +09:00"
//! ```

use crate::value::ScalarValue;
use crate::version::Version;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Longest table id Bigtable accepts.
pub const MAX_TABLE_ID_LEN: usize = 50;

/// A parsed fixture: one table and the cells to seed into it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixtureDocument {
    /// Name of the table to (re)create.
    pub table: String,

    /// Column families in declaration order.
    #[serde(default)]
    pub column_families: Vec<ColumnFamilyDef>,
}

/// A column family and the row data written into it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnFamilyDef {
    /// Column family name.
    pub family: String,

    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

/// Cells for one row key within a family.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnDef {
    /// Row key the cells are written to.
    pub key: String,

    /// Column qualifier to value.
    #[serde(default)]
    pub rows: BTreeMap<String, ScalarValue>,

    /// Explicit write timestamp. `None` means the load's shared timestamp.
    #[serde(default)]
    pub version: Option<Version>,
}

impl FixtureDocument {
    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.table.is_empty() {
            return Err("'table' must not be empty".to_string());
        }
        if !is_valid_table_id(&self.table) {
            return Err(format!(
                "'table' must match [_a-zA-Z0-9][-_.a-zA-Z0-9]* (at most {MAX_TABLE_ID_LEN} characters), got '{}'",
                self.table
            ));
        }
        for (i, cf) in self.column_families.iter().enumerate() {
            if cf.family.is_empty() {
                return Err(format!("column_families[{i}]: 'family' must not be empty"));
            }
            for (j, col) in cf.columns.iter().enumerate() {
                if col.key.is_empty() {
                    return Err(format!(
                        "column_families[{i}].columns[{j}]: 'key' must not be empty"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Distinct family names in first-declaration order.
    pub fn family_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.column_families.len());
        for cf in &self.column_families {
            if !names.contains(&cf.family.as_str()) {
                names.push(&cf.family);
            }
        }
        names
    }

    /// Total number of cells the document declares.
    pub fn cell_count(&self) -> usize {
        self.column_families
            .iter()
            .flat_map(|cf| &cf.columns)
            .map(|col| col.rows.len())
            .sum()
    }
}

/// Whether `id` is a Bigtable table id: `[_a-zA-Z0-9][-_.a-zA-Z0-9]*`, at most
/// [`MAX_TABLE_ID_LEN`] characters.
pub fn is_valid_table_id(id: &str) -> bool {
    let mut chars = id.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    id.len() <= MAX_TABLE_ID_LEN
        && (first.is_ascii_alphanumeric() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

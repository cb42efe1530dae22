//! Row mutations submitted through [`TableStore::apply_bulk`](crate::TableStore::apply_bulk).

/// A single change to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Write `value` into the cell `family:qualifier` at `timestamp_micros`.
    SetCell {
        family: String,
        qualifier: String,
        timestamp_micros: i64,
        value: Vec<u8>,
    },
}

impl Mutation {
    pub fn set_cell(
        family: impl Into<String>,
        qualifier: impl Into<String>,
        timestamp_micros: i64,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Mutation::SetCell {
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp_micros,
            value: value.into(),
        }
    }
}

/// Mutations targeted at one row key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMutation {
    pub row_key: String,
    pub mutations: Vec<Mutation>,
}

impl RowMutation {
    pub fn new(row_key: impl Into<String>, mutations: Vec<Mutation>) -> Self {
        Self {
            row_key: row_key.into(),
            mutations,
        }
    }
}

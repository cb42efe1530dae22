//! JSON bodies of the Bigtable v2 REST API.
//!
//! Byte fields (row keys, qualifiers, values) travel base64-encoded and
//! int64 fields travel as decimal strings, per the proto3 JSON mapping.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use table_store::{Mutation, RowMutation, RowResult, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    pub table_id: String,
    #[serde(default)]
    pub table: Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyColumnFamiliesRequest {
    pub modifications: Vec<Modification>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<Empty>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTablesResponse {
    #[serde(default)]
    pub tables: Vec<TableResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableResource {
    /// Full resource name: `projects/{p}/instances/{i}/tables/{t}`.
    pub name: String,
}

impl TableResource {
    /// Trailing table id of the resource name.
    pub fn table_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutateRowsRequest {
    pub entries: Vec<MutateRowsEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateRowsEntry {
    pub row_key: String,
    pub mutations: Vec<WireMutation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMutation {
    pub set_cell: SetCell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCell {
    pub family_name: String,
    pub column_qualifier: String,
    pub timestamp_micros: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutateRowsResponse {
    #[serde(default)]
    pub entries: Vec<EntryStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryStatus {
    #[serde(deserialize_with = "int64_from_json")]
    pub index: u64,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Google API error envelope: `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

fn int64_from_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Number(u64),
        Text(String),
    }

    match Int64::deserialize(deserializer)? {
        Int64::Number(n) => Ok(n),
        Int64::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

impl From<&RowMutation> for MutateRowsEntry {
    fn from(row: &RowMutation) -> Self {
        MutateRowsEntry {
            row_key: STANDARD.encode(row.row_key.as_bytes()),
            mutations: row
                .mutations
                .iter()
                .map(|m| match m {
                    Mutation::SetCell {
                        family,
                        qualifier,
                        timestamp_micros,
                        value,
                    } => WireMutation {
                        set_cell: SetCell {
                            family_name: family.clone(),
                            column_qualifier: STANDARD.encode(qualifier.as_bytes()),
                            timestamp_micros: timestamp_micros.to_string(),
                            value: STANDARD.encode(value),
                        },
                    },
                })
                .collect(),
        }
    }
}

impl MutateRowsRequest {
    pub fn from_rows(rows: &[RowMutation]) -> Self {
        MutateRowsRequest {
            entries: rows.iter().map(MutateRowsEntry::from).collect(),
        }
    }
}

/// Decode a base64 field of a request or response.
pub fn decode_bytes(field: &str) -> Result<Vec<u8>, StoreError> {
    STANDARD
        .decode(field)
        .map_err(|e| StoreError::Decode(format!("invalid base64 '{field}': {e}")))
}

/// Parse a mutateRows response body.
///
/// Server-streaming methods answer with a JSON array of messages over REST;
/// a single message object is accepted too.
pub fn parse_mutate_rows_body(body: &[u8]) -> Result<Vec<MutateRowsResponse>, StoreError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<MutateRowsResponse>),
        One(MutateRowsResponse),
    }

    match serde_json::from_slice::<OneOrMany>(body) {
        Ok(OneOrMany::Many(messages)) => Ok(messages),
        Ok(OneOrMany::One(message)) => Ok(vec![message]),
        Err(e) => Err(StoreError::Decode(format!("mutateRows response: {e}"))),
    }
}

/// Fold streamed entry statuses into one outcome per submitted entry.
///
/// Entries the server never reported on are failures.
pub fn collect_row_results(
    entry_count: usize,
    messages: Vec<MutateRowsResponse>,
) -> Result<Vec<RowResult>, StoreError> {
    let mut results: Vec<RowResult> = (0..entry_count)
        .map(|i| Err(StoreError::Decode(format!("no status reported for entry {i}"))))
        .collect();

    for entry in messages.into_iter().flat_map(|m| m.entries) {
        let slot = usize::try_from(entry.index)
            .ok()
            .and_then(|i| results.get_mut(i))
            .ok_or_else(|| {
                StoreError::Decode(format!(
                    "status for entry {} but only {entry_count} submitted",
                    entry.index
                ))
            })?;
        *slot = if entry.status.code == 0 {
            Ok(())
        } else {
            Err(StoreError::Api {
                status: entry.status.code,
                message: entry.status.message,
            })
        };
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_table_body() {
        let body = CreateTableRequest {
            table_id: "users".to_string(),
            table: Empty {},
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"tableId": "users", "table": {}})
        );
    }

    #[test]
    fn test_modify_column_families_body() {
        let body = ModifyColumnFamiliesRequest {
            modifications: vec![Modification {
                id: "d".to_string(),
                create: Some(Empty {}),
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"modifications": [{"id": "d", "create": {}}]})
        );
    }

    #[test]
    fn test_mutate_rows_body() {
        let rows = vec![RowMutation::new(
            "1",
            vec![Mutation::set_cell("d", "name", 1_500_000, b"foo".to_vec())],
        )];
        let body = MutateRowsRequest::from_rows(&rows);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "entries": [{
                    "rowKey": "MQ==",
                    "mutations": [{
                        "setCell": {
                            "familyName": "d",
                            "columnQualifier": "bmFtZQ==",
                            "timestampMicros": "1500000",
                            "value": "Zm9v"
                        }
                    }]
                }]
            })
        );
    }

    #[test]
    fn test_table_id_from_resource_name() {
        let t = TableResource {
            name: "projects/p/instances/i/tables/users".to_string(),
        };
        assert_eq!(t.table_id(), "users");
    }

    #[test]
    fn test_list_tables_response_defaults() {
        let parsed: ListTablesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.tables.is_empty());
        assert!(parsed.next_page_token.is_none());
    }

    #[test]
    fn test_parse_stream_and_single() {
        let stream = br#"[{"entries":[{"index":"0","status":{}}]},{"entries":[{"index":1,"status":{"code":5,"message":"nope"}}]}]"#;
        let messages = parse_mutate_rows_body(stream).unwrap();
        assert_eq!(messages.len(), 2);

        let results = collect_row_results(2, messages).unwrap();
        assert!(results[0].is_ok());
        assert_eq!(
            results[1],
            Err(StoreError::Api {
                status: 5,
                message: "nope".to_string()
            })
        );

        let single = br#"{"entries":[{"index":"0","status":{"code":0}}]}"#;
        let results = collect_row_results(1, parse_mutate_rows_body(single).unwrap()).unwrap();
        assert!(results[0].is_ok());
    }

    #[test]
    fn test_missing_and_out_of_range_statuses() {
        let results = collect_row_results(2, vec![]).unwrap();
        assert!(results.iter().all(|r| matches!(r, Err(StoreError::Decode(_)))));

        let messages = parse_mutate_rows_body(br#"[{"entries":[{"index":"7"}]}]"#).unwrap();
        assert!(collect_row_results(1, messages).is_err());

        assert!(parse_mutate_rows_body(b"not json").is_err());
    }

    #[test]
    fn test_decode_bytes() {
        assert_eq!(decode_bytes("Zm9v").unwrap(), b"foo");
        assert!(matches!(decode_bytes("***"), Err(StoreError::Decode(_))));
    }
}

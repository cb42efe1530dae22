//! In-process mock of the Bigtable REST surface used by this crate.
//!
//! Serves table listing (paged two names at a time), table create/delete,
//! `:modifyColumnFamilies` and `:mutateRows` on a random local port. Only
//! available with the `mock-server` feature.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::wire::{
    decode_bytes, CreateTableRequest, EntryStatus, ListTablesResponse, ModifyColumnFamiliesRequest,
    MutateRowsRequest, MutateRowsResponse, Status, TableResource,
};

const LIST_PAGE_SIZE: usize = 2;

/// (row key, family, qualifier) -> timestamp -> value
type Cells = BTreeMap<(String, String, String), BTreeMap<i64, Vec<u8>>>;

#[derive(Debug, Default)]
struct MockTable {
    families: BTreeSet<String>,
    cells: Cells,
}

#[derive(Debug, Default)]
struct MockState {
    tables: BTreeMap<String, MockTable>,
    requests: Vec<String>,
    authorization: Vec<Option<String>>,
    failing_rows: HashSet<String>,
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn record(state: &Shared, request: String, headers: &HeaderMap) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let mut s = lock(state);
    s.requests.push(request);
    s.authorization.push(auth);
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({
        "error": {
            "code": status.as_u16(),
            "message": message.into(),
            "status": status.canonical_reason().unwrap_or("UNKNOWN"),
        }
    });
    (status, Json(body)).into_response()
}

#[derive(Debug, serde::Deserialize)]
struct ListParams {
    #[serde(rename = "pageToken")]
    page_token: Option<String>,
}

async fn list_tables(
    State(state): State<Shared>,
    Path((project, instance)): Path<(String, String)>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Response {
    record(&state, "GET tables".to_string(), &headers);
    let offset: usize = params
        .page_token
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);

    let s = lock(&state);
    let names: Vec<&String> = s.tables.keys().collect();
    let page: Vec<TableResource> = names
        .iter()
        .skip(offset)
        .take(LIST_PAGE_SIZE)
        .map(|name| TableResource {
            name: format!("projects/{project}/instances/{instance}/tables/{name}"),
        })
        .collect();
    let next = offset + LIST_PAGE_SIZE;
    let response = ListTablesResponse {
        tables: page,
        next_page_token: (next < names.len()).then(|| next.to_string()),
    };
    Json(response).into_response()
}

async fn create_table(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CreateTableRequest>,
) -> Response {
    record(&state, format!("POST tables {}", body.table_id), &headers);
    let mut s = lock(&state);
    if s.tables.contains_key(&body.table_id) {
        return error_response(StatusCode::CONFLICT, format!("table {} exists", body.table_id));
    }
    s.tables.insert(body.table_id.clone(), MockTable::default());
    Json(json!({ "name": body.table_id })).into_response()
}

async fn delete_table(
    State(state): State<Shared>,
    Path((_, _, table)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    record(&state, format!("DELETE {table}"), &headers);
    let mut s = lock(&state);
    match s.tables.remove(&table) {
        Some(_) => Json(json!({})).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("table {table} not found")),
    }
}

async fn table_action(
    State(state): State<Shared>,
    Path((_, _, target)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record(&state, format!("POST {target}"), &headers);
    let Some((table, action)) = target.split_once(':') else {
        return error_response(StatusCode::NOT_FOUND, format!("unknown path {target}"));
    };
    match action {
        "modifyColumnFamilies" => modify_column_families(&state, table, &body),
        "mutateRows" => mutate_rows(&state, table, &body),
        _ => error_response(StatusCode::NOT_FOUND, format!("unknown action {action}")),
    }
}

fn modify_column_families(state: &Shared, table: &str, body: &[u8]) -> Response {
    let request: ModifyColumnFamiliesRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let mut s = lock(state);
    let Some(t) = s.tables.get_mut(table) else {
        return error_response(StatusCode::NOT_FOUND, format!("table {table} not found"));
    };
    for m in request.modifications {
        if m.create.is_some() && !t.families.insert(m.id.clone()) {
            return error_response(StatusCode::CONFLICT, format!("family {} exists", m.id));
        }
    }
    Json(json!({ "name": table })).into_response()
}

fn mutate_rows(state: &Shared, table: &str, body: &[u8]) -> Response {
    let request: MutateRowsRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let mut guard = lock(state);
    let s = &mut *guard;
    let Some(t) = s.tables.get_mut(table) else {
        return error_response(StatusCode::NOT_FOUND, format!("table {table} not found"));
    };

    let mut entries = Vec::with_capacity(request.entries.len());
    for (index, entry) in request.entries.into_iter().enumerate() {
        let status = match apply_entry(t, &s.failing_rows, entry) {
            Ok(()) => Status::default(),
            Err((code, message)) => Status { code, message },
        };
        entries.push(EntryStatus {
            index: index as u64,
            status,
        });
    }
    Json(vec![MutateRowsResponse { entries }]).into_response()
}

fn apply_entry(
    table: &mut MockTable,
    failing_rows: &HashSet<String>,
    entry: crate::wire::MutateRowsEntry,
) -> Result<(), (i32, String)> {
    let invalid = |e: table_store::StoreError| (3, e.to_string());
    let row_key_bytes = decode_bytes(&entry.row_key).map_err(invalid)?;
    let row_key = String::from_utf8_lossy(&row_key_bytes).into_owned();
    if failing_rows.contains(&row_key) {
        return Err((14, format!("row {row_key} unavailable")));
    }

    let mut staged = Vec::with_capacity(entry.mutations.len());
    for m in entry.mutations {
        let cell = m.set_cell;
        if !table.families.contains(&cell.family_name) {
            return Err((5, format!("family {} not found", cell.family_name)));
        }
        let qualifier =
            String::from_utf8_lossy(&decode_bytes(&cell.column_qualifier).map_err(invalid)?)
                .into_owned();
        let ts: i64 = cell
            .timestamp_micros
            .parse()
            .map_err(|_| (3, format!("bad timestamp {}", cell.timestamp_micros)))?;
        let value = decode_bytes(&cell.value).map_err(invalid)?;
        staged.push(((row_key.clone(), cell.family_name, qualifier), ts, value));
    }
    for (coord, ts, value) in staged {
        table.cells.entry(coord).or_default().insert(ts, value);
    }
    Ok(())
}

/// A running mock server. Stops when dropped.
pub struct MockBigtable {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockBigtable {
    /// Bind to a random local port and start serving.
    pub async fn start() -> std::io::Result<Self> {
        let state: Shared = Arc::default();
        let base = "/v2/projects/:project/instances/:instance/tables";
        let app = Router::new()
            .route(base, get(list_tables).post(create_table))
            .route(
                &format!("{base}/:table"),
                post(table_action).delete(delete_table),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("mock Bigtable server stopped: {e}");
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Base URL to use for both the admin and data endpoints.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Seed a table directly, bypassing the HTTP surface.
    pub fn insert_table(&self, table: &str, families: &[&str]) {
        let mut s = lock(&self.state);
        let t = s.tables.entry(table.to_string()).or_default();
        t.families.extend(families.iter().map(|f| f.to_string()));
    }

    pub fn fail_row(&self, row_key: &str) {
        lock(&self.state).failing_rows.insert(row_key.to_string());
    }

    pub fn tables(&self) -> Vec<String> {
        lock(&self.state).tables.keys().cloned().collect()
    }

    pub fn families(&self, table: &str) -> Option<Vec<String>> {
        lock(&self.state)
            .tables
            .get(table)
            .map(|t| t.families.iter().cloned().collect())
    }

    /// Newest version of a cell.
    pub fn read_cell(
        &self,
        table: &str,
        row_key: &str,
        family: &str,
        qualifier: &str,
    ) -> Option<(i64, Vec<u8>)> {
        let s = lock(&self.state);
        let key = (
            row_key.to_string(),
            family.to_string(),
            qualifier.to_string(),
        );
        s.tables
            .get(table)?
            .cells
            .get(&key)?
            .iter()
            .next_back()
            .map(|(ts, v)| (*ts, v.clone()))
    }

    /// Request log, e.g. `GET tables`, `DELETE users`, `POST users:mutateRows`.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// `Authorization` header of every request, in order.
    pub fn authorization_headers(&self) -> Vec<Option<String>> {
        lock(&self.state).authorization.clone()
    }
}

impl Drop for MockBigtable {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

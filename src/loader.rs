//! Fixture loading pipeline.
//!
//! One call to [`Fixture::load`] reads a file, parses it, drops the table
//! if it exists, recreates it with its column families and writes every
//! declared cell. Each step finishes before the next begins.

use std::path::Path;
use std::sync::Arc;

use bigtable_rest::BigtableRestStore;
use chrono::Utc;
use fixture_core::{
    parse, timestamp_micros, ColumnDef, FixtureDocument, FixtureFormat, ValueEncoder,
};
use table_store::{Mutation, RowMutation, TableStore};
use tracing::{debug, field, info, info_span, Instrument, Span};

use crate::config::FixtureConfig;
use crate::error::LoadError;
use crate::phase::LoadPhase;

/// Outcome of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: String,
    /// Whether a table with the same name existed and was deleted.
    pub replaced_existing: bool,
    pub families_created: usize,
    pub bulk_applies: usize,
    pub cells_written: usize,
    /// Timestamp (microseconds) given to every cell without an explicit version.
    pub write_timestamp_micros: i64,
}

/// Loads fixture files into a table store.
pub struct Fixture<S> {
    store: S,
    encoder: Arc<dyn ValueEncoder>,
}

impl Fixture<BigtableRestStore> {
    /// Create a fixture loader for a Cloud Bigtable instance.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let fixture = Fixture::new("test-project", "test-instance", FixtureConfig::default())?;
    /// fixture.load("testdata/test.yml").await?;
    /// ```
    pub fn new(
        project_id: &str,
        instance_id: &str,
        config: FixtureConfig,
    ) -> Result<Self, LoadError> {
        let store = BigtableRestStore::connect(config.bigtable.to_config(project_id, instance_id))?;
        Ok(Self::with_store(store, config))
    }
}

impl<S: TableStore> Fixture<S> {
    /// Create a fixture loader on top of any store.
    pub fn with_store(store: S, config: FixtureConfig) -> Self {
        Self {
            store,
            encoder: config.encoder,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load one fixture file, replacing the table it describes.
    ///
    /// On failure the target table may be left partially configured; run the
    /// load again to start from a clean slate.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<LoadSummary, LoadError> {
        self.load_traced(path.as_ref()).await.map_err(|(_, e)| e)
    }

    /// Load several files in order, stopping at the first failure.
    pub async fn load_all<P: AsRef<Path>>(
        &self,
        paths: &[P],
    ) -> Result<Vec<LoadSummary>, LoadError> {
        let mut summaries = Vec::with_capacity(paths.len());
        for path in paths {
            summaries.push(self.load(path).await?);
        }
        Ok(summaries)
    }

    /// Replace the table described by an already parsed document.
    pub async fn load_document(
        &self,
        document: &FixtureDocument,
    ) -> Result<LoadSummary, LoadError> {
        self.load_document_traced(document).await.map_err(|(_, e)| e)
    }

    /// [`load`](Self::load), reporting the phase a failure happened in.
    pub(crate) async fn load_traced(
        &self,
        path: &Path,
    ) -> Result<LoadSummary, (LoadPhase, LoadError)> {
        let span = info_span!(
            "load",
            path = %path.display(),
            phase = field::Empty,
            failed_in = field::Empty
        );
        async {
            let mut phase = PhaseTracker::start();
            let result = self.run(path, &mut phase).await;
            phase.finish(result)
        }
        .instrument(span)
        .await
    }

    pub(crate) async fn load_document_traced(
        &self,
        document: &FixtureDocument,
    ) -> Result<LoadSummary, (LoadPhase, LoadError)> {
        let span = info_span!(
            "load",
            table = %document.table,
            phase = field::Empty,
            failed_in = field::Empty
        );
        async {
            let mut phase = PhaseTracker::start();
            let result = self.apply_document(document, &mut phase).await;
            phase.finish(result)
        }
        .instrument(span)
        .await
    }

    async fn run(&self, path: &Path, phase: &mut PhaseTracker) -> Result<LoadSummary, LoadError> {
        phase.advance(LoadPhase::ReadingFile);
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| LoadError::FailedReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        let format = FixtureFormat::from_path(path)
            .map_err(|ext| LoadError::UnknownFileExtension { ext })?;
        debug!("Read {} bytes from {}", data.len(), path.display());

        phase.advance(LoadPhase::Parsing);
        let document = parse(format, &data)?;

        self.apply_document(&document, phase).await
    }

    async fn apply_document(
        &self,
        document: &FixtureDocument,
        phase: &mut PhaseTracker,
    ) -> Result<LoadSummary, LoadError> {
        phase.advance(LoadPhase::Clearing);
        let replaced_existing = self.clear_table(&document.table).await?;

        phase.advance(LoadPhase::Creating);
        let families_created = self.create_schema(document).await?;

        phase.advance(LoadPhase::Writing);
        let write_timestamp_micros = timestamp_micros(&Utc::now());
        debug!("Writing {} cells to table '{}'", document.cell_count(), document.table);
        let (bulk_applies, cells_written) =
            self.write_cells(document, write_timestamp_micros).await?;

        Ok(LoadSummary {
            table: document.table.clone(),
            replaced_existing,
            families_created,
            bulk_applies,
            cells_written,
            write_timestamp_micros,
        })
    }

    /// Delete the table if it exists. Returns whether it did.
    async fn clear_table(&self, table: &str) -> Result<bool, LoadError> {
        let tables = self.store.list_tables().await?;
        if !tables.iter().any(|t| t == table) {
            return Ok(false);
        }
        debug!("Deleting existing table '{table}'");
        self.store.delete_table(table).await?;
        Ok(true)
    }

    /// Create the table and each distinct column family, in declaration order.
    async fn create_schema(&self, document: &FixtureDocument) -> Result<usize, LoadError> {
        self.store.create_table(&document.table).await?;

        // A family declared twice is created once; its columns are still all written.
        let families = document.family_names();
        for family in &families {
            self.store
                .create_column_family(&document.table, family)
                .await?;
        }
        debug!(
            "Created table '{}' with families {:?}",
            document.table, families
        );
        Ok(families.len())
    }

    /// Write every column as one bulk apply. Returns (bulk applies, cells).
    async fn write_cells(
        &self,
        document: &FixtureDocument,
        now_micros: i64,
    ) -> Result<(usize, usize), LoadError> {
        let mut bulk_applies = 0;
        let mut cells = 0;

        for cf in &document.column_families {
            for column in &cf.columns {
                if column.rows.is_empty() {
                    continue;
                }
                let entries = self.column_mutations(&cf.family, column, now_micros)?;
                let count = entries.len();

                let results = self.store.apply_bulk(&document.table, entries).await?;
                bulk_applies += 1;
                if let Some(err) = results.into_iter().find_map(Result::err) {
                    return Err(err.into());
                }
                cells += count;
                debug!(
                    "Wrote {} cells to row '{}' in family '{}'",
                    count, column.key, cf.family
                );
            }
        }
        Ok((bulk_applies, cells))
    }

    /// One single-cell mutation per qualifier, all targeting the column's row key.
    fn column_mutations(
        &self,
        family: &str,
        column: &ColumnDef,
        now_micros: i64,
    ) -> Result<Vec<RowMutation>, LoadError> {
        let timestamp = column
            .version
            .map(|v| v.timestamp_micros())
            .unwrap_or(now_micros);

        column
            .rows
            .iter()
            .map(|(qualifier, value)| -> Result<RowMutation, LoadError> {
                let bytes = self.encoder.encode(value)?;
                Ok(RowMutation::new(
                    column.key.clone(),
                    vec![Mutation::set_cell(family, qualifier, timestamp, bytes)],
                ))
            })
            .collect()
    }
}

/// Current phase of one load, mirrored into the `phase` field of the
/// enclosing `load` span.
struct PhaseTracker {
    phase: LoadPhase,
}

impl PhaseTracker {
    fn start() -> Self {
        let mut tracker = Self {
            phase: LoadPhase::Idle,
        };
        tracker.advance(LoadPhase::Idle);
        tracker
    }

    fn advance(&mut self, next: LoadPhase) {
        self.phase = next;
        Span::current().record("phase", next.as_str());
    }

    fn finish(
        mut self,
        result: Result<LoadSummary, LoadError>,
    ) -> Result<LoadSummary, (LoadPhase, LoadError)> {
        match result {
            Ok(summary) => {
                self.advance(LoadPhase::Done);
                info!(
                    "Loaded table '{}': {} families, {} cells",
                    summary.table, summary.families_created, summary.cells_written
                );
                Ok(summary)
            }
            Err(e) => {
                let failed_in = self.phase;
                self.advance(LoadPhase::Failed);
                Span::current().record("failed_in", failed_in.as_str());
                debug!("Load failed while {failed_in}: {e}");
                Err((failed_in, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadErrorKind;
    use fixture_core::{decode_i64, from_yaml, EncodeError, ScalarValue};
    use table_store::{MemoryStore, StoreCall, StoreError};

    const SCENARIO: &str = r#"
table: test
column_families:
  - family: d
    columns:
      - key: "1"
        rows:
          name: foo
          age: "1"
"#;

    fn fixture() -> Fixture<Arc<MemoryStore>> {
        Fixture::with_store(Arc::new(MemoryStore::new()), FixtureConfig::default())
    }

    #[tokio::test]
    async fn test_load_document_scenario() {
        let fixture = fixture();
        let doc = from_yaml(SCENARIO).unwrap();
        let summary = fixture.load_document(&doc).await.unwrap();

        assert_eq!(summary.table, "test");
        assert!(!summary.replaced_existing);
        assert_eq!(summary.families_created, 1);
        assert_eq!(summary.bulk_applies, 1);
        assert_eq!(summary.cells_written, 2);

        let store = fixture.store();
        assert_eq!(store.families("test").await, Some(vec!["d".to_string()]));
        let (ts_name, name) = store.read_cell("test", "1", "d", "name").await.unwrap();
        let (ts_age, age) = store.read_cell("test", "1", "d", "age").await.unwrap();
        assert_eq!(name, b"foo");
        assert_eq!(age, b"1");
        assert_eq!(ts_name, ts_age);
        assert_eq!(ts_name, summary.write_timestamp_micros);
        assert_eq!(ts_name % 1000, 0);
    }

    #[tokio::test]
    async fn test_call_sequence() {
        let fixture = fixture();
        let doc = from_yaml(SCENARIO).unwrap();
        fixture.load_document(&doc).await.unwrap();
        fixture.load_document(&doc).await.unwrap();

        let calls = fixture.store().calls().await;
        let second: Vec<StoreCall> = calls[4..].to_vec();
        assert_eq!(
            second,
            vec![
                StoreCall::ListTables,
                StoreCall::DeleteTable("test".to_string()),
                StoreCall::CreateTable("test".to_string()),
                StoreCall::CreateColumnFamily {
                    table: "test".to_string(),
                    family: "d".to_string()
                },
                StoreCall::ApplyBulk {
                    table: "test".to_string(),
                    entries: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_explicit_version_is_used() {
        let fixture = fixture();
        let doc = from_yaml(
            r#"
table: v
column_families:
  - family: d
    columns:
      - key: pinned
        rows: {n: 7}
        version: "1970-01-01 09:00:01 +09:00"
      - key: floating
        rows: {n: 8}
"#,
        )
        .unwrap();
        let summary = fixture.load_document(&doc).await.unwrap();

        let store = fixture.store();
        let (ts, value) = store.read_cell("v", "pinned", "d", "n").await.unwrap();
        assert_eq!(ts, 1_000_000);
        assert_eq!(decode_i64(&value).unwrap(), 7);

        let (ts, _) = store.read_cell("v", "floating", "d", "n").await.unwrap();
        assert_eq!(ts, summary.write_timestamp_micros);
    }

    #[tokio::test]
    async fn test_duplicate_family_created_once() {
        let fixture = fixture();
        let doc = from_yaml(
            r#"
table: dup
column_families:
  - family: d
    columns:
      - key: "1"
        rows: {a: x}
  - family: d
    columns:
      - key: "2"
        rows: {b: y}
"#,
        )
        .unwrap();
        let summary = fixture.load_document(&doc).await.unwrap();
        assert_eq!(summary.families_created, 1);
        assert_eq!(summary.cells_written, 2);

        let store = fixture.store();
        assert!(store.read_cell("dup", "1", "d", "a").await.is_some());
        assert!(store.read_cell("dup", "2", "d", "b").await.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_qualifier_writes_one_cell() {
        let fixture = fixture();
        let doc = from_yaml(
            r#"
table: q
column_families:
  - family: d
    columns:
      - key: "1"
        rows:
          a: first
          a: second
"#,
        )
        .unwrap();
        let summary = fixture.load_document(&doc).await.unwrap();
        assert_eq!(summary.cells_written, 1);

        let store = fixture.store();
        assert_eq!(store.cell_count("q").await, 1);
        let (_, value) = store.read_cell("q", "1", "d", "a").await.unwrap();
        assert_eq!(value, b"second");
    }

    #[tokio::test]
    async fn test_failure_reports_phase() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = fixture();

        let missing = dir.path().join("missing.yml");
        let (phase, err) = fixture.load_traced(&missing).await.unwrap_err();
        assert_eq!(phase, LoadPhase::ReadingFile);
        assert_eq!(err.kind(), LoadErrorKind::FailedReadFile);

        let txt = dir.path().join("fixture.txt");
        std::fs::write(&txt, SCENARIO).unwrap();
        let (phase, err) = fixture.load_traced(&txt).await.unwrap_err();
        assert_eq!(phase, LoadPhase::ReadingFile);
        assert_eq!(err.kind(), LoadErrorKind::UnknownFileExtension);

        let bad_table = dir.path().join("bad.yml");
        std::fs::write(&bad_table, "table: 'a?b'\n").unwrap();
        let (phase, err) = fixture.load_traced(&bad_table).await.unwrap_err();
        assert_eq!(phase, LoadPhase::Parsing);
        assert_eq!(err.kind(), LoadErrorKind::InvalidFixtureFormat);
        assert!(fixture.store().calls().await.is_empty());

        let good = dir.path().join("test.yml");
        std::fs::write(&good, SCENARIO).unwrap();
        fixture.store().fail_family("d").await;
        let (phase, err) = fixture.load_traced(&good).await.unwrap_err();
        assert_eq!(phase, LoadPhase::Creating);
        assert_eq!(err.kind(), LoadErrorKind::Store);
    }

    #[tokio::test]
    async fn test_row_failure_reports_writing_phase() {
        let fixture = fixture();
        fixture.store().fail_row("1").await;
        let doc = from_yaml(SCENARIO).unwrap();

        let (phase, _) = fixture.load_document_traced(&doc).await.unwrap_err();
        assert_eq!(phase, LoadPhase::Writing);
    }

    #[tokio::test]
    async fn test_empty_rows_skip_bulk_apply() {
        let fixture = fixture();
        let doc =
            from_yaml("table: e\ncolumn_families:\n  - family: d\n    columns:\n      - key: k\n")
                .unwrap();
        let summary = fixture.load_document(&doc).await.unwrap();
        assert_eq!(summary.bulk_applies, 0);
        assert_eq!(fixture.store().families("e").await, Some(vec!["d".to_string()]));
    }

    #[tokio::test]
    async fn test_first_row_failure_aborts() {
        let fixture = fixture();
        fixture.store().fail_row("1").await;
        let doc = from_yaml(SCENARIO).unwrap();

        let err = fixture.load_document(&doc).await.unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Store);
        assert!(matches!(
            err.as_store_error(),
            Some(StoreError::Api { .. })
        ));
    }

    #[tokio::test]
    async fn test_family_failure_leaves_table_without_rollback() {
        let fixture = fixture();
        fixture.store().fail_family("d").await;
        let doc = from_yaml(SCENARIO).unwrap();

        let err = fixture.load_document(&doc).await.unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Store);
        assert!(fixture.store().has_table("test").await);
        assert_eq!(fixture.store().families("test").await, Some(vec![]));
    }

    #[tokio::test]
    async fn test_encoder_failure_surfaces() {
        let reject_all = |v: &ScalarValue| -> Result<Vec<u8>, EncodeError> {
            Err(EncodeError::Unsupported {
                type_name: v.type_name(),
                value: v.to_string(),
                reason: "rejected".to_string(),
            })
        };
        let fixture = Fixture::with_store(
            Arc::new(MemoryStore::new()),
            FixtureConfig::new().with_encoder(reject_all),
        );
        let doc = from_yaml(SCENARIO).unwrap();
        let err = fixture.load_document(&doc).await.unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Encode);
    }
}

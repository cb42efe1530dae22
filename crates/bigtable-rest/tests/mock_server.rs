//! Integration tests for the REST store against the in-process mock server.

use bigtable_rest::testing::MockBigtable;
use bigtable_rest::{BigtableConfig, BigtableRestStore};
use table_store::{Mutation, RowMutation, StoreError, TableStore};

async fn setup() -> (MockBigtable, BigtableRestStore) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .try_init();

    let mock = MockBigtable::start().await.unwrap();
    let config = BigtableConfig::new("test-project", "test-instance")
        .with_endpoint(mock.endpoint())
        .with_access_token("test-token");
    let store = BigtableRestStore::connect(config).unwrap();
    (mock, store)
}

#[tokio::test]
async fn test_list_tables_follows_pages() {
    let (mock, store) = setup().await;
    for name in ["a", "b", "c", "d", "e"] {
        mock.insert_table(name, &[]);
    }

    let tables = store.list_tables().await.unwrap();
    assert_eq!(tables, vec!["a", "b", "c", "d", "e"]);

    // Five tables at two per page
    let gets = mock
        .requests()
        .iter()
        .filter(|r| r.as_str() == "GET tables")
        .count();
    assert_eq!(gets, 3);
}

#[tokio::test]
async fn test_admin_round_trip() {
    let (mock, store) = setup().await;

    store.create_table("users").await.unwrap();
    store.create_column_family("users", "d").await.unwrap();
    assert_eq!(mock.families("users"), Some(vec!["d".to_string()]));

    assert_eq!(
        store.create_table("users").await,
        Err(StoreError::TableAlreadyExists("users".to_string()))
    );
    assert!(matches!(
        store.create_column_family("users", "d").await,
        Err(StoreError::FamilyAlreadyExists { .. })
    ));
    assert!(matches!(
        store.create_column_family("missing", "d").await,
        Err(StoreError::TableNotFound(_))
    ));

    store.delete_table("users").await.unwrap();
    assert!(mock.tables().is_empty());
    assert_eq!(
        store.delete_table("users").await,
        Err(StoreError::TableNotFound("users".to_string()))
    );
}

#[tokio::test]
async fn test_apply_bulk_reports_each_entry() {
    let (mock, store) = setup().await;
    mock.insert_table("t", &["d"]);
    mock.fail_row("bad");

    let results = store
        .apply_bulk(
            "t",
            vec![
                RowMutation::new(
                    "1",
                    vec![Mutation::set_cell("d", "name", 5_000, b"foo".to_vec())],
                ),
                RowMutation::new(
                    "bad",
                    vec![Mutation::set_cell("d", "name", 5_000, b"x".to_vec())],
                ),
                RowMutation::new("2", vec![Mutation::set_cell("zz", "name", 5_000, b"y".to_vec())]),
            ],
        )
        .await
        .unwrap();

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(StoreError::Api { status: 14, .. })));
    assert!(matches!(results[2], Err(StoreError::Api { status: 5, .. })));

    assert_eq!(
        mock.read_cell("t", "1", "d", "name"),
        Some((5_000, b"foo".to_vec()))
    );
    assert_eq!(mock.read_cell("t", "bad", "d", "name"), None);
}

#[tokio::test]
async fn test_apply_bulk_missing_table() {
    let (_mock, store) = setup().await;
    let result = store.apply_bulk("nope", vec![]).await;
    assert_eq!(result, Err(StoreError::TableNotFound("nope".to_string())));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let (mock, store) = setup().await;
    store.list_tables().await.unwrap();
    assert_eq!(
        mock.authorization_headers(),
        vec![Some("Bearer test-token".to_string())]
    );
}

#[tokio::test]
async fn test_unreachable_endpoint_is_http_error() {
    let config = BigtableConfig::new("p", "i").with_endpoint("http://127.0.0.1:1");
    let store = BigtableRestStore::connect(config).unwrap();
    assert!(matches!(
        store.list_tables().await,
        Err(StoreError::Http(_))
    ));
}

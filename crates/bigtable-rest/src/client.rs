//! `TableStore` implementation over the Bigtable v2 REST endpoints.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use table_store::{RowMutation, RowResult, StoreError, TableStore};

use crate::config::BigtableConfig;
use crate::wire::{
    collect_row_results, parse_mutate_rows_body, CreateTableRequest, Empty, ErrorEnvelope,
    ListTablesResponse, Modification, ModifyColumnFamiliesRequest, MutateRowsRequest,
};

/// Cloud Bigtable client speaking the Admin and Data REST APIs.
pub struct BigtableRestStore {
    http: Client,
    config: BigtableConfig,
}

impl BigtableRestStore {
    /// Build a client for the configured instance.
    ///
    /// No request is made here. The first store call is the first request.
    pub fn connect(config: BigtableConfig) -> Result<Self, StoreError> {
        if config.project_id.is_empty() {
            return Err(StoreError::Connect("project id must not be empty".to_string()));
        }
        if config.instance_id.is_empty() {
            return Err(StoreError::Connect("instance id must not be empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        tracing::debug!(
            "Bigtable REST client for {} (admin: {}, data: {})",
            config.instance_path(),
            config.admin_endpoint,
            config.data_endpoint
        );

        Ok(Self { http, config })
    }

    /// `{admin}/v2/projects/{p}/instances/{i}/tables`
    pub fn tables_url(&self) -> String {
        format!(
            "{}/v2/{}/tables",
            self.config.admin_endpoint.trim_end_matches('/'),
            self.config.instance_path()
        )
    }

    /// `{admin}/v2/projects/{p}/instances/{i}/tables/{t}`
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{table}", self.tables_url())
    }

    /// `{data}/v2/projects/{p}/instances/{i}/tables/{t}:mutateRows`
    pub fn mutate_rows_url(&self, table: &str) -> String {
        format!(
            "{}/v2/{}/tables/{table}:mutateRows",
            self.config.data_endpoint.trim_end_matches('/'),
            self.config.instance_path()
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let request = match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Turn a non-success response into an API error carrying the server's message.
async fn api_error(response: Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) if envelope.error.status.is_empty() => envelope.error.message,
        Ok(envelope) => format!("{}: {}", envelope.error.status, envelope.error.message),
        Err(_) => body,
    };
    StoreError::Api {
        status: i32::from(status.as_u16()),
        message,
    }
}

#[async_trait]
impl TableStore for BigtableRestStore {
    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(self.tables_url()).query(&[("view", "NAME_ONLY")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = self.send(request).await?;
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }
            let page: ListTablesResponse = Self::read_json(response).await?;
            names.extend(page.tables.iter().map(|t| t.table_id().to_string()));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!("Listed {} tables in {}", names.len(), self.config.instance_path());
        Ok(names)
    }

    async fn delete_table(&self, table: &str) -> Result<(), StoreError> {
        let response = self.send(self.http.delete(self.table_url(table))).await?;
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StoreError::TableNotFound(table.to_string())),
            _ => Err(api_error(response).await),
        }
    }

    async fn create_table(&self, table: &str) -> Result<(), StoreError> {
        let body = CreateTableRequest {
            table_id: table.to_string(),
            table: Empty {},
        };
        let response = self
            .send(self.http.post(self.tables_url()).json(&body))
            .await?;
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(StoreError::TableAlreadyExists(table.to_string())),
            _ => Err(api_error(response).await),
        }
    }

    async fn create_column_family(&self, table: &str, family: &str) -> Result<(), StoreError> {
        let body = ModifyColumnFamiliesRequest {
            modifications: vec![Modification {
                id: family.to_string(),
                create: Some(Empty {}),
            }],
        };
        let url = format!("{}:modifyColumnFamilies", self.table_url(table));
        let response = self.send(self.http.post(url).json(&body)).await?;
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StoreError::TableNotFound(table.to_string())),
            StatusCode::CONFLICT => Err(StoreError::FamilyAlreadyExists {
                table: table.to_string(),
                family: family.to_string(),
            }),
            _ => Err(api_error(response).await),
        }
    }

    async fn apply_bulk(
        &self,
        table: &str,
        entries: Vec<RowMutation>,
    ) -> Result<Vec<RowResult>, StoreError> {
        let body = MutateRowsRequest::from_rows(&entries);
        let response = self
            .send(self.http.post(self.mutate_rows_url(table)).json(&body))
            .await?;
        match response.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(StoreError::TableNotFound(table.to_string())),
            _ => return Err(api_error(response).await),
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        collect_row_results(entries.len(), parse_mutate_rows_body(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> BigtableRestStore {
        BigtableRestStore::connect(BigtableConfig::new("my-project", "my-instance")).unwrap()
    }

    #[test]
    fn test_urls() {
        let store = store();
        assert_eq!(
            store.tables_url(),
            "https://bigtableadmin.googleapis.com/v2/projects/my-project/instances/my-instance/tables"
        );
        assert_eq!(
            store.table_url("users"),
            "https://bigtableadmin.googleapis.com/v2/projects/my-project/instances/my-instance/tables/users"
        );
        assert_eq!(
            store.mutate_rows_url("users"),
            "https://bigtable.googleapis.com/v2/projects/my-project/instances/my-instance/tables/users:mutateRows"
        );
    }

    #[test]
    fn test_trailing_slash_in_endpoint() {
        let store = BigtableRestStore::connect(
            BigtableConfig::new("p", "i").with_endpoint("http://localhost:8086/"),
        )
        .unwrap();
        assert_eq!(
            store.tables_url(),
            "http://localhost:8086/v2/projects/p/instances/i/tables"
        );
    }

    #[test]
    fn test_connect_requires_ids() {
        assert!(matches!(
            BigtableRestStore::connect(BigtableConfig::new("", "i")),
            Err(StoreError::Connect(_))
        ));
        assert!(matches!(
            BigtableRestStore::connect(BigtableConfig::new("p", "")),
            Err(StoreError::Connect(_))
        ));
    }
}

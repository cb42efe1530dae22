//! Connection settings for the REST client.

use std::time::Duration;

/// Default endpoint of the Bigtable Admin API.
pub const DEFAULT_ADMIN_ENDPOINT: &str = "https://bigtableadmin.googleapis.com";

/// Default endpoint of the Bigtable Data API.
pub const DEFAULT_DATA_ENDPOINT: &str = "https://bigtable.googleapis.com";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for [`BigtableRestStore`](crate::BigtableRestStore).
#[derive(Debug, Clone)]
pub struct BigtableConfig {
    pub project_id: String,
    pub instance_id: String,

    /// Base URL of the Admin API (tables and column families).
    pub admin_endpoint: String,

    /// Base URL of the Data API (mutateRows).
    pub data_endpoint: String,

    /// OAuth2 bearer token. Requests are sent unauthenticated when `None`.
    pub access_token: Option<String>,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl BigtableConfig {
    pub fn new(project_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            instance_id: instance_id.into(),
            admin_endpoint: DEFAULT_ADMIN_ENDPOINT.to_string(),
            data_endpoint: DEFAULT_DATA_ENDPOINT.to_string(),
            access_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Point both APIs at the same base URL, as with a local proxy or mock.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.admin_endpoint = endpoint.clone();
        self.data_endpoint = endpoint;
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// `projects/{project}/instances/{instance}`
    pub fn instance_path(&self) -> String {
        format!(
            "projects/{}/instances/{}",
            self.project_id, self.instance_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BigtableConfig::new("p", "i");
        assert_eq!(config.admin_endpoint, DEFAULT_ADMIN_ENDPOINT);
        assert_eq!(config.data_endpoint, DEFAULT_DATA_ENDPOINT);
        assert!(config.access_token.is_none());
        assert_eq!(config.instance_path(), "projects/p/instances/i");
    }

    #[test]
    fn test_with_endpoint() {
        let config = BigtableConfig::new("p", "i")
            .with_endpoint("http://127.0.0.1:9000")
            .with_access_token("secret");
        assert_eq!(config.admin_endpoint, "http://127.0.0.1:9000");
        assert_eq!(config.data_endpoint, "http://127.0.0.1:9000");
        assert_eq!(config.access_token.as_deref(), Some("secret"));
    }
}

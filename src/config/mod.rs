//! Fixture loader configuration.

mod duration;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bigtable_rest::BigtableConfig;
use fixture_core::{BigEndianEncoder, ValueEncoder};

pub use duration::parse_duration;

/// Overrides applied to the Bigtable client built by [`Fixture::new`](crate::Fixture::new).
///
/// `None` keeps the client default.
#[derive(Debug, Clone, Default)]
pub struct BigtableOptions {
    pub admin_endpoint: Option<String>,
    pub data_endpoint: Option<String>,
    pub access_token: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl BigtableOptions {
    /// Build the client configuration for a project and instance.
    pub fn to_config(&self, project_id: &str, instance_id: &str) -> BigtableConfig {
        let mut config = BigtableConfig::new(project_id, instance_id);
        if let Some(endpoint) = &self.admin_endpoint {
            config.admin_endpoint = endpoint.clone();
        }
        if let Some(endpoint) = &self.data_endpoint {
            config.data_endpoint = endpoint.clone();
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }
        config.access_token = self.access_token.clone();
        config
    }
}

/// Configuration for a [`Fixture`](crate::Fixture).
#[derive(Clone)]
pub struct FixtureConfig {
    /// Strategy used to turn fixture scalars into cell bytes.
    pub encoder: Arc<dyn ValueEncoder>,

    /// Client settings, used only by [`Fixture::new`](crate::Fixture::new).
    pub bigtable: BigtableOptions,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            encoder: Arc::new(BigEndianEncoder),
            bigtable: BigtableOptions::default(),
        }
    }
}

impl FixtureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value encoder.
    pub fn with_encoder(mut self, encoder: impl ValueEncoder + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    pub fn with_bigtable(mut self, bigtable: BigtableOptions) -> Self {
        self.bigtable = bigtable;
        self
    }
}

impl fmt::Debug for FixtureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureConfig")
            .field("encoder", &"<dyn ValueEncoder>")
            .field("bigtable", &self.bigtable)
            .finish()
    }
}

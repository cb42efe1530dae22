//! bt-fixture
//!
//! Seeds Cloud Bigtable tables from YAML fixture files for tests.
//!
//! Each load replaces the table named in the fixture: an existing table of
//! that name is deleted, the table and its column families are recreated,
//! and every declared cell is written at the fixture's explicit `version`
//! or at one timestamp shared by the whole load.
//!
//! # Fixture format
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
//!         version: "2018-01-02 15:04:05 +09:00"   # optional
//! ```
//!
//! Integers and floats are written as 8-byte big-endian values and strings
//! as raw bytes, unless another encoder is configured.
//!
//! # CLI Usage
//!
//! ```bash
//! # Load fixtures into an instance
//! bt-fixture load --project my-project --instance my-instance testdata/test.yml
//!
//! # Parse and apply against an in-memory store only
//! bt-fixture load --dry-run testdata/test.yml testdata/version.yaml
//! ```

use clap::{Parser, ValueEnum};
use std::sync::Arc;

use fixture_core::{BigEndianEncoder, TextEncoder, ValueEncoder};

pub mod config;
pub mod error;
pub mod loader;
pub mod phase;

pub use config::{BigtableOptions, FixtureConfig};
pub use error::{LoadError, LoadErrorKind};
pub use loader::{Fixture, LoadSummary};
pub use phase::LoadPhase;

pub use fixture_core;
pub use table_store;

/// Bigtable connection options.
#[derive(Parser, Clone, Debug)]
pub struct BigtableOpts {
    /// Google Cloud project id
    #[arg(long, env = "BIGTABLE_PROJECT")]
    pub project: Option<String>,

    /// Bigtable instance id
    #[arg(long, env = "BIGTABLE_INSTANCE")]
    pub instance: Option<String>,

    /// Admin API endpoint
    #[arg(
        long,
        default_value = bigtable_rest::DEFAULT_ADMIN_ENDPOINT,
        env = "BIGTABLE_ADMIN_ENDPOINT"
    )]
    pub admin_endpoint: String,

    /// Data API endpoint
    #[arg(
        long,
        default_value = bigtable_rest::DEFAULT_DATA_ENDPOINT,
        env = "BIGTABLE_DATA_ENDPOINT"
    )]
    pub data_endpoint: String,

    /// OAuth2 access token (e.g. from `gcloud auth print-access-token`)
    #[arg(long, env = "BIGTABLE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Dry run mode - apply fixtures to an in-memory store instead of Bigtable
    #[arg(long)]
    pub dry_run: bool,
}

impl From<&BigtableOpts> for BigtableOptions {
    fn from(opts: &BigtableOpts) -> Self {
        Self {
            admin_endpoint: Some(opts.admin_endpoint.clone()),
            data_endpoint: Some(opts.data_endpoint.clone()),
            access_token: opts.access_token.clone(),
            request_timeout: None,
        }
    }
}

/// Cell value encodings selectable from the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Encoding {
    /// Numbers as 8-byte big-endian, strings as raw bytes
    #[default]
    #[value(name = "big-endian")]
    BigEndian,
    /// Every value as its text representation
    #[value(name = "text")]
    Text,
}

impl Encoding {
    pub fn encoder(self) -> Arc<dyn ValueEncoder> {
        match self {
            Encoding::BigEndian => Arc::new(BigEndianEncoder),
            Encoding::Text => Arc::new(TextEncoder),
        }
    }
}

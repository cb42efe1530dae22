//! Cloud Bigtable REST client.
//!
//! Implements [`table_store::TableStore`] against the v2 Admin API
//! (`bigtableadmin.googleapis.com`) and Data API (`bigtable.googleapis.com`):
//!
//! | Operation              | Request                                             |
//! |------------------------|-----------------------------------------------------|
//! | `list_tables`          | `GET    .../instances/{i}/tables`                    |
//! | `delete_table`         | `DELETE .../instances/{i}/tables/{t}`                |
//! | `create_table`         | `POST   .../instances/{i}/tables`                    |
//! | `create_column_family` | `POST   .../tables/{t}:modifyColumnFamilies`         |
//! | `apply_bulk`           | `POST   .../tables/{t}:mutateRows`                   |
//!
//! Authentication is a plain bearer token (for example the output of
//! `gcloud auth print-access-token`).

mod client;
mod config;
pub mod wire;

#[cfg(feature = "mock-server")]
pub mod testing;

pub use client::BigtableRestStore;
pub use config::{
    BigtableConfig, DEFAULT_ADMIN_ENDPOINT, DEFAULT_DATA_ENDPOINT, DEFAULT_REQUEST_TIMEOUT,
};

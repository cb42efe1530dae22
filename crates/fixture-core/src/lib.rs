//! Fixture model, parser and value encoders.
//!
//! This crate knows nothing about the store. It turns fixture files into a
//! [`FixtureDocument`] and scalars into cell payloads:
//!
//! ```text
//! bytes ──parse──▶ FixtureDocument ──▶ ScalarValue ──ValueEncoder──▶ Vec<u8>
//! ```
//!
//! # Example
//!
//! ```rust
//! use fixture_core::{from_yaml, BigEndianEncoder, ScalarValue, ValueEncoder};
//!
//! let doc = from_yaml("table: t\ncolumn_families:\n  - family: d\n").unwrap();
//! assert_eq!(doc.table, "t");
//!
//! let bytes = BigEndianEncoder.encode(&ScalarValue::Integer(1)).unwrap();
//! assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0, 0, 1]);
//! ```

pub mod encoder;
pub mod model;
pub mod parse;
pub mod value;
pub mod version;

pub use encoder::{
    decode_f64, decode_i64, BigEndianEncoder, EncodeError, TextEncoder, ValueEncoder,
};
pub use model::{ColumnDef, ColumnFamilyDef, FixtureDocument};
pub use parse::{from_yaml, parse, FixtureFormat, FormatError};
pub use value::ScalarValue;
pub use version::{timestamp_micros, Version, VersionParseError};

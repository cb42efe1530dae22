//! Cell value encoders.
//!
//! Cell values are opaque bytes to the store. How a scalar becomes bytes is
//! a contract between the fixture author and whoever reads the cells back,
//! so the strategy is pluggable through [`ValueEncoder`].

use crate::value::ScalarValue;

/// Error produced by a [`ValueEncoder`].
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The encoder does not accept this kind of value.
    #[error("cannot encode {type_name} value '{value}': {reason}")]
    Unsupported {
        type_name: &'static str,
        value: String,
        reason: String,
    },

    /// A byte payload could not be decoded back into a number.
    #[error("expected 8 bytes, got {0}")]
    InvalidLength(usize),
}

/// Strategy that turns a fixture scalar into a cell payload.
pub trait ValueEncoder: Send + Sync {
    fn encode(&self, value: &ScalarValue) -> Result<Vec<u8>, EncodeError>;
}

/// Closures can be used as encoders directly.
impl<F> ValueEncoder for F
where
    F: Fn(&ScalarValue) -> Result<Vec<u8>, EncodeError> + Send + Sync,
{
    fn encode(&self, value: &ScalarValue) -> Result<Vec<u8>, EncodeError> {
        self(value)
    }
}

/// Default encoder.
///
/// - integers: 8-byte big-endian two's complement
/// - floats: 8-byte big-endian IEEE-754 double
/// - text: raw UTF-8 bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct BigEndianEncoder;

impl ValueEncoder for BigEndianEncoder {
    fn encode(&self, value: &ScalarValue) -> Result<Vec<u8>, EncodeError> {
        Ok(match value {
            ScalarValue::Integer(v) => v.to_be_bytes().to_vec(),
            ScalarValue::Float(v) => v.to_bits().to_be_bytes().to_vec(),
            ScalarValue::Text(s) => s.as_bytes().to_vec(),
        })
    }
}

/// Writes every scalar as its textual representation.
///
/// Useful when the cells are inspected with tools that print values as strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEncoder;

impl ValueEncoder for TextEncoder {
    fn encode(&self, value: &ScalarValue) -> Result<Vec<u8>, EncodeError> {
        Ok(value.to_string().into_bytes())
    }
}

/// Read back an integer written by [`BigEndianEncoder`].
pub fn decode_i64(bytes: &[u8]) -> Result<i64, EncodeError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| EncodeError::InvalidLength(bytes.len()))?;
    Ok(i64::from_be_bytes(raw))
}

/// Read back a float written by [`BigEndianEncoder`].
pub fn decode_f64(bytes: &[u8]) -> Result<f64, EncodeError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| EncodeError::InvalidLength(bytes.len()))?;
    Ok(f64::from_bits(u64::from_be_bytes(raw)))
}

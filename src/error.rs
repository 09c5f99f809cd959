//! # Error Types
//!
//! Error handling for the binary wire codec.
//!
//! Every failure is surfaced synchronously to the caller of the encode/decode
//! operation. Nothing is retried and no default value is ever substituted for
//! a failed read.
//!
//! ## Error Categories
//! - **Version Errors**: strict read without a version header, unknown version word
//! - **Size Limit Errors**: decoded string or container length above the configured ceiling
//! - **End Of Stream**: the transport ran dry in the middle of a field
//! - **Malformed Values**: values that cannot be expressed in their wire type
//!
//! ## Example Usage
//! ```rust
//! use binary_protocol::error::{ProtocolError, Result};
//! use binary_protocol::{BinaryProtocol, MemoryTransport, ProtocolConfig};
//! use tracing::error;
//!
//! fn first_i32(bytes: &[u8]) -> Result<i32> {
//!     let mut proto = BinaryProtocol::new(MemoryTransport::from_slice(bytes), ProtocolConfig::default());
//!     proto.read_i32()
//! }
//!
//! match first_i32(&[0, 0]) {
//!     Err(ProtocolError::UnexpectedEof { needed }) => assert_eq!(needed, 4),
//!     Err(e) => error!(error = %e, "unexpected failure"),
//!     Ok(v) => panic!("short read produced {v}"),
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Header errors
    pub const ERR_MISSING_VERSION: &str = "No protocol version header";
    pub const ERR_BAD_VERSION: &str = "Bad version in message header";

    /// Encoding errors
    pub const ERR_LENGTH_OVERFLOW: &str = "Length does not fit in a 32-bit signed length prefix";
    pub const ERR_INVALID_UTF8: &str = "String payload is not valid UTF-8";
    pub const ERR_TYPE_MISMATCH: &str = "Element does not match the declared container type";

    /// Fast path errors
    pub const ERR_ACCELERATOR_UNAVAILABLE: &str = "Fast-path codec unavailable and fallback disabled";
}

// ProtocolError is the primary error type for all codec operations
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Unexpected end of stream: a {needed}-byte read could not be satisfied")]
    UnexpectedEof { needed: usize },

    #[error("No protocol version header")]
    MissingVersionHeader,

    #[error("Bad version in message header: {0:#010x}")]
    BadVersion(i32),

    #[error("String length {length} exceeds limit {limit}")]
    StringLimitExceeded { length: usize, limit: usize },

    #[error("Container length {length} exceeds limit {limit}")]
    ContainerLimitExceeded { length: usize, limit: usize },

    #[error("Negative length: {0}")]
    NegativeLength(i32),

    #[error("Nesting depth exceeds limit {0}")]
    DepthLimitExceeded(usize),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Fast-path codec unavailable and fallback disabled")]
    AcceleratorUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Whether this error was raised by a resource guard
    pub fn is_size_limit(&self) -> bool {
        matches!(
            self,
            ProtocolError::StringLimitExceeded { .. } | ProtocolError::ContainerLimitExceeded { .. }
        )
    }

    /// Whether this error is a header version failure
    pub fn is_version_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::MissingVersionHeader | ProtocolError::BadVersion(_)
        )
    }

    /// Map a transport error, turning short reads into `UnexpectedEof`
    pub(crate) fn from_read(err: io::Error, needed: usize) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ProtocolError::UnexpectedEof { needed }
        } else {
            ProtocolError::Io(err)
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

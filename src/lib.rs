//! # binary-protocol
//!
//! Binary wire-format codec for RPC messages.
//!
//! Serializes primitives, strings, structs and containers to exact big-endian
//! byte layouts and parses them back, accepting both the versioned (strict)
//! message header and the older unversioned conventions without negotiation.
//! Attacker-controlled lengths are checked against configurable ceilings
//! before anything is allocated, and an optional bulk fast path produces the
//! same bytes as the generic per-field codec.
//!
//! ## Example
//! ```rust
//! use binary_protocol::{
//!     read_message, write_message, BinaryProtocol, Field, MemoryTransport, Message,
//!     MessageEnvelope, ProtocolConfig, Value,
//! };
//!
//! let mut proto = BinaryProtocol::new(MemoryTransport::new(), ProtocolConfig::default());
//! let message = Message::new(
//!     MessageEnvelope::new("ping", 1, 42),
//!     Value::Struct(vec![Field::new(1, Value::string("hello"))]),
//! );
//! write_message(&mut proto, &message).unwrap();
//!
//! let decoded = read_message(&mut proto).unwrap();
//! assert_eq!(decoded, message);
//! ```

pub mod accel;
pub mod config;
pub mod core;
pub mod error;
pub mod factory;
pub mod utils;

pub use crate::accel::{AcceleratedProtocol, BulkCodec, FastCodec};
pub use crate::config::{AcceleratedConfig, LegacyHeaderLayout, ProtocolConfig};
pub use crate::core::framing::{FieldHeader, ListHeader, MapHeader, SetHeader};
pub use crate::core::limits::DecodeLimits;
pub use crate::core::message::{DecodedHeader, HeaderShape, MessageEnvelope};
pub use crate::core::protocol::{BinaryProtocol, InputProtocol, OutputProtocol};
pub use crate::core::transport::MemoryTransport;
pub use crate::core::types::{MessageType, TType};
pub use crate::core::value::{read_message, read_value, skip, write_message, write_value, Field, Message, Value};
pub use crate::error::{ProtocolError, Result};
pub use crate::factory::{AcceleratedProtocolFactory, BinaryProtocolFactory};

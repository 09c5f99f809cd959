//! # Core Codec Components
//!
//! Primitive encoding, field/container framing, message headers and the
//! resource guards that protect every decode path.
//!
//! ## Components
//! - **Protocol**: `BinaryProtocol` and the per-field protocol traits
//! - **Framing**: field, map, list and set headers
//! - **Message**: versioned and legacy message envelopes
//! - **Limits**: string/container/depth guards
//! - **Value**: dynamic value tree and generic walker
//! - **Transport**: in-memory byte stream
//!
//! ## Security
//! - Length prefixes are validated before any proportional allocation
//! - Negative lengths are rejected outright
//! - Nested decoding is depth-limited

pub mod framing;
pub mod limits;
pub mod message;
pub mod protocol;
pub mod transport;
pub mod types;
pub mod value;

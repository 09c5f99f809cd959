//! # Accelerated Fast Path
//!
//! Optional delegation of whole-value encode/decode to a bulk codec.
//!
//! A [`FastCodec`] is bound once, when an [`AcceleratedProtocol`] is
//! constructed. If none can be bound the protocol either runs on the generic
//! codec (`fallback = true`) or construction fails. No per-call capability
//! checks happen after that.
//!
//! The generic codec is authoritative. A bound fast path must write the same
//! bytes, accept the same input and enforce the same limits; message headers
//! always go through the generic codec.
//!
//! ## Decoding From A Stream
//! The bulk decoder only sees what the transport has already buffered
//! (`BufRead::fill_buf`). When that window ends before the value does,
//! nothing is consumed and the generic codec reads the value from the stream.

pub mod bulk;

pub use bulk::BulkCodec;

use crate::config::AcceleratedConfig;
use crate::core::limits::DecodeLimits;
use crate::core::message::{DecodedHeader, MessageEnvelope};
use crate::core::protocol::BinaryProtocol;
use crate::core::types::TType;
use crate::core::value::{self, Message, Value};
use crate::error::{constants, ProtocolError, Result};
use crate::utils::metrics::global_metrics;
use bytes::BytesMut;
use std::fmt;
use std::io::{BufRead, Write};
use std::ops::{Deref, DerefMut};
use tracing::{debug, info, warn};

/// Bulk encode/decode routine for complete values
pub trait FastCodec: Send + Sync + fmt::Debug {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Append the wire encoding of `value` to `out`
    fn encode(&self, value: &Value, out: &mut BytesMut) -> Result<()>;

    /// Decode one value of type `ttype` from the front of `input`.
    ///
    /// Returns the value and the number of bytes it occupied. Must return
    /// `UnexpectedEof` when `input` ends before the value does.
    fn decode(&self, input: &[u8], ttype: TType, limits: &DecodeLimits) -> Result<(Value, usize)>;
}

/// Attempts to bind a fast-path codec
pub type FastCodecLoader = fn() -> Option<Box<dyn FastCodec>>;

/// Built-in codec, present when the `fast-path` feature is enabled
pub fn native_loader() -> Option<Box<dyn FastCodec>> {
    #[cfg(feature = "fast-path")]
    {
        Some(Box::new(BulkCodec))
    }
    #[cfg(not(feature = "fast-path"))]
    {
        None
    }
}

/// Loader that never binds, forcing the generic codec
pub fn no_fast_path() -> Option<Box<dyn FastCodec>> {
    None
}

/// Binary protocol with an optional bound fast path.
///
/// Dereferences to the generic [`BinaryProtocol`] for per-field calls.
#[derive(Debug)]
pub struct AcceleratedProtocol<T> {
    inner: BinaryProtocol<T>,
    fast: Option<Box<dyn FastCodec>>,
}

impl<T> AcceleratedProtocol<T> {
    /// Bind the built-in fast path
    pub fn new(transport: T, config: AcceleratedConfig) -> Result<Self> {
        Self::with_loader(transport, config, native_loader)
    }

    /// Bind whatever `loader` provides
    pub fn with_loader<F>(transport: T, config: AcceleratedConfig, loader: F) -> Result<Self>
    where
        F: FnOnce() -> Option<Box<dyn FastCodec>>,
    {
        let fast = loader();
        match &fast {
            Some(codec) => info!(codec = codec.name(), "Fast-path codec bound"),
            None if config.fallback => {
                info!("No fast-path codec available, using generic codec")
            }
            None => {
                warn!("{}", constants::ERR_ACCELERATOR_UNAVAILABLE);
                return Err(ProtocolError::AcceleratorUnavailable);
            }
        }

        Ok(Self {
            inner: BinaryProtocol::new(transport, config.protocol),
            fast,
        })
    }

    pub fn is_accelerated(&self) -> bool {
        self.fast.is_some()
    }

    pub fn fast_codec_name(&self) -> Option<&'static str> {
        self.fast.as_deref().map(|codec| codec.name())
    }

    pub fn generic(&self) -> &BinaryProtocol<T> {
        &self.inner
    }

    pub fn generic_mut(&mut self) -> &mut BinaryProtocol<T> {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T> Deref for AcceleratedProtocol<T> {
    type Target = BinaryProtocol<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> DerefMut for AcceleratedProtocol<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<T: Write> AcceleratedProtocol<T> {
    /// Encode a complete value, in one transport write when accelerated
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        if let Some(codec) = self.fast.as_deref() {
            let mut scratch = BytesMut::new();
            codec.encode(value, &mut scratch)?;
            self.inner.write_raw(&scratch)?;
            global_metrics().fast_encode();
            return Ok(());
        }
        value::write_value(&mut self.inner, value)
    }

    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        self.inner.write_message_begin(&message.envelope)?;
        self.write_value(&message.body)?;
        self.inner.write_message_end()?;
        self.inner.flush()
    }
}

impl<T: BufRead> AcceleratedProtocol<T> {
    /// Decode a complete value of type `ttype`
    pub fn read_value(&mut self, ttype: TType) -> Result<Value> {
        if let Some(codec) = self.fast.as_deref() {
            let limits = *self.inner.limits();
            let window = self.inner.transport_mut().fill_buf()?;
            let buffered = window.len();
            match codec.decode(window, ttype, &limits) {
                Ok((value, used)) => {
                    self.inner.transport_mut().consume(used);
                    global_metrics().fast_decode();
                    return Ok(value);
                }
                Err(ProtocolError::UnexpectedEof { needed }) => {
                    debug!(
                        codec = codec.name(),
                        buffered,
                        needed,
                        "Buffered window ends mid-value, decoding from stream"
                    );
                    global_metrics().fast_fallback();
                }
                Err(e) => return Err(e),
            }
        }
        value::read_value(&mut self.inner, ttype)
    }

    /// Read a header and its struct body; an absent header yields an empty body
    pub fn read_message(&mut self) -> Result<Message> {
        let envelope = match self.inner.read_message_header()? {
            DecodedHeader::Absent => {
                return Ok(Message::new(MessageEnvelope::empty(), Value::Struct(Vec::new())))
            }
            DecodedHeader::Versioned(envelope) | DecodedHeader::Legacy(envelope) => envelope,
        };
        let body = self.read_value(TType::Struct)?;
        self.inner.read_message_end()?;
        Ok(Message::new(envelope, body))
    }
}

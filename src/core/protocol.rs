//! # Binary Protocol
//!
//! Generic per-field codec over any byte-stream transport.
//!
//! Generated or hand-written schema code drives a protocol through the
//! [`OutputProtocol`] and [`InputProtocol`] traits, one call per header and
//! primitive, in field-definition order. [`BinaryProtocol`] realises those
//! calls as exact big-endian byte layouts:
//!
//! ```text
//! bool    [0|1]                 1 byte
//! byte    [i8]                  1 byte
//! i16     [i16 BE]              2 bytes
//! i32     [i32 BE]              4 bytes
//! i64     [i64 BE]              8 bytes
//! double  [IEEE-754 BE]         8 bytes
//! binary  [len: i32 BE][bytes]  4 + len bytes
//! ```
//!
//! Reads never substitute defaults: a transport that runs dry mid-field
//! yields [`ProtocolError::UnexpectedEof`].

use crate::config::ProtocolConfig;
use crate::core::framing::{FieldHeader, ListHeader, MapHeader, SetHeader};
use crate::core::limits::{wire_length, DecodeLimits};
use crate::core::message::{DecodedHeader, MessageEnvelope};
use crate::core::types::TType;
use crate::error::{constants, ProtocolError, Result};
use std::io::{Read, Write};

/// Largest buffer reserved up front for a length-prefixed read
pub(crate) const PREALLOC_BYTES: usize = 64 * 1024;

/// Write half of the protocol contract
pub trait OutputProtocol {
    fn write_message_begin(&mut self, envelope: &MessageEnvelope) -> Result<()>;
    fn write_message_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn write_struct_begin(&mut self) -> Result<()> {
        Ok(())
    }
    fn write_struct_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn write_field_begin(&mut self, field_type: TType, id: i16) -> Result<()>;
    fn write_field_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn write_field_stop(&mut self) -> Result<()>;
    fn write_map_begin(&mut self, header: &MapHeader) -> Result<()>;
    fn write_map_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn write_list_begin(&mut self, header: &ListHeader) -> Result<()>;
    fn write_list_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn write_set_begin(&mut self, header: &SetHeader) -> Result<()>;
    fn write_set_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn write_byte(&mut self, value: i8) -> Result<()>;
    fn write_i16(&mut self, value: i16) -> Result<()>;
    fn write_i32(&mut self, value: i32) -> Result<()>;
    fn write_i64(&mut self, value: i64) -> Result<()>;
    fn write_double(&mut self, value: f64) -> Result<()>;
    fn write_binary(&mut self, value: &[u8]) -> Result<()>;
    fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_binary(value.as_bytes())
    }
    fn flush(&mut self) -> Result<()>;
}

/// Read half of the protocol contract
pub trait InputProtocol {
    /// Decode a message header, keeping track of which wire shape it had
    fn read_message_header(&mut self) -> Result<DecodedHeader>;
    fn read_message_begin(&mut self) -> Result<MessageEnvelope> {
        Ok(self.read_message_header()?.into_envelope())
    }
    fn read_message_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn read_struct_begin(&mut self) -> Result<()> {
        Ok(())
    }
    fn read_struct_end(&mut self) -> Result<()> {
        Ok(())
    }
    /// Returns [`FieldHeader::Stop`] without reading a field id at the end of a struct
    fn read_field_begin(&mut self) -> Result<FieldHeader>;
    fn read_field_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn read_map_begin(&mut self) -> Result<MapHeader>;
    fn read_map_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn read_list_begin(&mut self) -> Result<ListHeader>;
    fn read_list_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn read_set_begin(&mut self) -> Result<SetHeader>;
    fn read_set_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn read_bool(&mut self) -> Result<bool>;
    fn read_byte(&mut self) -> Result<i8>;
    fn read_i16(&mut self) -> Result<i16>;
    fn read_i32(&mut self) -> Result<i32>;
    fn read_i64(&mut self) -> Result<i64>;
    fn read_double(&mut self) -> Result<f64>;
    fn read_binary(&mut self) -> Result<Vec<u8>>;
    fn read_string(&mut self) -> Result<String> {
        String::from_utf8(self.read_binary()?)
            .map_err(|_| ProtocolError::InvalidValue(constants::ERR_INVALID_UTF8.to_string()))
    }
    /// Ceilings applied while decoding
    fn limits(&self) -> &DecodeLimits;
}

/// Binary wire codec bound to one transport.
///
/// Configuration is fixed at construction. An instance is meant for one
/// connection and sequential use; after any error the stream position is
/// undefined and the instance should be discarded.
#[derive(Debug)]
pub struct BinaryProtocol<T> {
    transport: T,
    config: ProtocolConfig,
    limits: DecodeLimits,
}

impl<T> BinaryProtocol<T> {
    pub fn new(transport: T, config: ProtocolConfig) -> Self {
        let limits = DecodeLimits::from_config(&config);
        Self {
            transport,
            config,
            limits,
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: Write> BinaryProtocol<T> {
    #[inline]
    pub(crate) fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.transport.write_all(bytes)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_byte(if value { 1 } else { 0 })
    }

    pub fn write_byte(&mut self, value: i8) -> Result<()> {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.write_raw(&value.to_be_bytes())
    }

    /// Length-prefixed bytes. Payloads longer than `i32::MAX` cannot be expressed.
    pub fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        self.write_i32(wire_length(value.len())?)?;
        self.write_raw(value)
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_binary(value.as_bytes())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.transport.flush()?;
        Ok(())
    }
}

impl<T: Read> BinaryProtocol<T> {
    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.transport
            .read_exact(&mut buf)
            .map_err(|e| ProtocolError::from_read(e, N))?;
        Ok(buf)
    }

    /// Read exactly `length` bytes that have already passed a resource guard.
    ///
    /// The buffer grows with the data actually received, so a lying length
    /// prefix on a short stream never reserves more than `PREALLOC_BYTES`.
    pub(crate) fn read_raw(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(length.min(PREALLOC_BYTES));
        let read = self
            .transport
            .by_ref()
            .take(length as u64)
            .read_to_end(&mut buf)
            .map_err(|e| ProtocolError::from_read(e, length))?;
        if read < length {
            return Err(ProtocolError::UnexpectedEof { needed: length });
        }
        Ok(buf)
    }

    /// Any non-zero byte decodes as true
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_byte()? != 0)
    }

    pub fn read_byte(&mut self) -> Result<i8> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    pub fn read_double(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    /// Length-prefixed bytes; the length is guarded before any payload is read
    pub fn read_binary(&mut self) -> Result<Vec<u8>> {
        let declared = self.read_i32()?;
        let length = self.limits.check_string_length(declared)?;
        self.read_raw(length)
    }

    pub fn read_string(&mut self) -> Result<String> {
        String::from_utf8(self.read_binary()?)
            .map_err(|_| ProtocolError::InvalidValue(constants::ERR_INVALID_UTF8.to_string()))
    }

    /// Read a type tag byte
    pub(crate) fn read_ttype(&mut self) -> Result<TType> {
        TType::try_from(self.read_byte()? as u8)
    }
}

impl<T: Write> OutputProtocol for BinaryProtocol<T> {
    fn write_message_begin(&mut self, envelope: &MessageEnvelope) -> Result<()> {
        BinaryProtocol::write_message_begin(self, envelope)
    }

    fn write_message_end(&mut self) -> Result<()> {
        BinaryProtocol::write_message_end(self)
    }

    fn write_field_begin(&mut self, field_type: TType, id: i16) -> Result<()> {
        BinaryProtocol::write_field_begin(self, field_type, id)
    }

    fn write_field_stop(&mut self) -> Result<()> {
        BinaryProtocol::write_field_stop(self)
    }

    fn write_map_begin(&mut self, header: &MapHeader) -> Result<()> {
        BinaryProtocol::write_map_begin(self, header)
    }

    fn write_list_begin(&mut self, header: &ListHeader) -> Result<()> {
        BinaryProtocol::write_list_begin(self, header)
    }

    fn write_set_begin(&mut self, header: &SetHeader) -> Result<()> {
        BinaryProtocol::write_set_begin(self, header)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        BinaryProtocol::write_bool(self, value)
    }

    fn write_byte(&mut self, value: i8) -> Result<()> {
        BinaryProtocol::write_byte(self, value)
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        BinaryProtocol::write_i16(self, value)
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        BinaryProtocol::write_i32(self, value)
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        BinaryProtocol::write_i64(self, value)
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        BinaryProtocol::write_double(self, value)
    }

    fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        BinaryProtocol::write_binary(self, value)
    }

    fn flush(&mut self) -> Result<()> {
        BinaryProtocol::flush(self)
    }
}

impl<T: Read> InputProtocol for BinaryProtocol<T> {
    fn read_message_header(&mut self) -> Result<DecodedHeader> {
        BinaryProtocol::read_message_header(self)
    }

    fn read_message_end(&mut self) -> Result<()> {
        BinaryProtocol::read_message_end(self)
    }

    fn read_field_begin(&mut self) -> Result<FieldHeader> {
        BinaryProtocol::read_field_begin(self)
    }

    fn read_map_begin(&mut self) -> Result<MapHeader> {
        BinaryProtocol::read_map_begin(self)
    }

    fn read_list_begin(&mut self) -> Result<ListHeader> {
        BinaryProtocol::read_list_begin(self)
    }

    fn read_set_begin(&mut self) -> Result<SetHeader> {
        BinaryProtocol::read_set_begin(self)
    }

    fn read_bool(&mut self) -> Result<bool> {
        BinaryProtocol::read_bool(self)
    }

    fn read_byte(&mut self) -> Result<i8> {
        BinaryProtocol::read_byte(self)
    }

    fn read_i16(&mut self) -> Result<i16> {
        BinaryProtocol::read_i16(self)
    }

    fn read_i32(&mut self) -> Result<i32> {
        BinaryProtocol::read_i32(self)
    }

    fn read_i64(&mut self) -> Result<i64> {
        BinaryProtocol::read_i64(self)
    }

    fn read_double(&mut self) -> Result<f64> {
        BinaryProtocol::read_double(self)
    }

    fn read_binary(&mut self) -> Result<Vec<u8>> {
        BinaryProtocol::read_binary(self)
    }

    fn read_string(&mut self) -> Result<String> {
        BinaryProtocol::read_string(self)
    }

    fn limits(&self) -> &DecodeLimits {
        &self.limits
    }
}

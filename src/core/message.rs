//! # Message Header Protocol
//!
//! Outer envelope `(name, kind, sequence id)` written before every message.
//!
//! ## Wire Format
//! ```text
//! strict:     [VERSION_1 | kind: i32 BE][name len: i32 BE][name][seq id: i32 BE]
//! non-strict: [name len: i32 BE][name][kind: i8][seq id: i32 BE]
//! ```
//!
//! Peers do not negotiate which convention they use, so the reader classifies
//! the first 32-bit word (the probe) into a [`HeaderShape`] and decodes the
//! rest according to that shape:
//!
//! | probe                 | shape            | remaining bytes                           |
//! |-----------------------|------------------|-------------------------------------------|
//! | `0`                   | `Empty`          | none                                      |
//! | `0x01000000`          | `LegacySentinel` | one length byte; `0` means empty          |
//! | negative              | `Versioned`      | length-prefixed name, i32 seq id          |
//! | other positive        | `Legacy`         | `probe` Latin-1 name bytes, kind, seq id  |
//!
//! With `strict_read`, a negative probe whose high 16 bits are not
//! `VERSION_1` is rejected, as is every legacy shape. Lenient readers take any
//! negative probe as a version word.

use crate::config::{LegacyHeaderLayout, LEGACY_SENTINEL, TYPE_MASK, VERSION_1, VERSION_MASK};
use crate::core::limits::wire_length;
use crate::core::protocol::BinaryProtocol;
use crate::core::types::MessageType;
use crate::error::{constants, ProtocolError, Result};
use crate::utils::metrics::global_metrics;
use std::io::{Read, Write};
use tracing::{debug, trace, warn};

/// Message header values, live only while a header is read or written
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageEnvelope {
    pub name: String,
    pub kind: u8,
    pub sequence_id: i32,
}

impl MessageEnvelope {
    pub fn new(name: impl Into<String>, kind: u8, sequence_id: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            sequence_id,
        }
    }

    /// `("", 0, 0)`, the result of reading an absent header
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_kind(self.kind)
    }
}

/// Combine the version constant with a kind tag
#[inline]
pub fn version_word(kind: u8) -> i32 {
    VERSION_1 | i32::from(kind)
}

/// Header layout identified from the probe word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderShape {
    Empty,
    LegacySentinel,
    Versioned { kind: u8 },
    Legacy { name_length: i32 },
}

impl HeaderShape {
    /// Classify the first 32-bit word of a message header
    pub fn classify(probe: i32) -> Self {
        match probe {
            0 => HeaderShape::Empty,
            LEGACY_SENTINEL => HeaderShape::LegacySentinel,
            p if p < 0 => HeaderShape::Versioned {
                kind: (p & TYPE_MASK) as u8,
            },
            p => HeaderShape::Legacy { name_length: p },
        }
    }
}

/// Whether a version word carries `VERSION_1` in its high 16 bits
#[inline]
pub fn is_known_version(word: i32) -> bool {
    word & VERSION_MASK == VERSION_1
}

/// Decoded header together with the convention it arrived in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedHeader {
    /// Zero probe (or sentinel followed by a zero length): no message
    Absent,
    Versioned(MessageEnvelope),
    Legacy(MessageEnvelope),
}

impl DecodedHeader {
    pub fn is_absent(&self) -> bool {
        matches!(self, DecodedHeader::Absent)
    }

    pub fn envelope(&self) -> Option<&MessageEnvelope> {
        match self {
            DecodedHeader::Absent => None,
            DecodedHeader::Versioned(envelope) | DecodedHeader::Legacy(envelope) => Some(envelope),
        }
    }

    pub fn into_envelope(self) -> MessageEnvelope {
        match self {
            DecodedHeader::Absent => MessageEnvelope::empty(),
            DecodedHeader::Versioned(envelope) | DecodedHeader::Legacy(envelope) => envelope,
        }
    }
}

impl<T: Write> BinaryProtocol<T> {
    pub fn write_message_begin(&mut self, envelope: &MessageEnvelope) -> Result<()> {
        if self.config().strict_write {
            self.write_i32(version_word(envelope.kind))?;
            self.write_string(&envelope.name)?;
            self.write_i32(envelope.sequence_id)?;
        } else {
            // A legacy name length of 0 or 0x01000000 would read back as an absent header
            let length = wire_length(envelope.name.len())?;
            if length == 0 || length == LEGACY_SENTINEL {
                return Err(ProtocolError::InvalidValue(format!(
                    "legacy header cannot carry a name of {length} bytes"
                )));
            }
            self.write_string(&envelope.name)?;
            self.write_byte(envelope.kind as i8)?;
            self.write_i32(envelope.sequence_id)?;
        }
        trace!(
            name = %envelope.name,
            kind = envelope.kind,
            seq_id = envelope.sequence_id,
            strict = self.config().strict_write,
            "Message header written"
        );
        Ok(())
    }

    pub fn write_message_end(&mut self) -> Result<()> {
        global_metrics().message_written();
        Ok(())
    }
}

impl<T: Read> BinaryProtocol<T> {
    /// Read a header and report which convention it used
    pub fn read_message_header(&mut self) -> Result<DecodedHeader> {
        let probe = self.read_i32()?;
        let shape = HeaderShape::classify(probe);
        debug!(probe, ?shape, "Message header probed");

        let header = match shape {
            HeaderShape::Empty => DecodedHeader::Absent,
            HeaderShape::LegacySentinel => {
                let secondary = self.read_byte()? as u8;
                if secondary == 0 {
                    DecodedHeader::Absent
                } else {
                    self.read_legacy_header(i32::from(secondary))?
                }
            }
            HeaderShape::Versioned { kind } => {
                if self.config().strict_read && !is_known_version(probe) {
                    warn!(probe, "{}", constants::ERR_BAD_VERSION);
                    global_metrics().version_rejection();
                    return Err(ProtocolError::BadVersion(probe));
                }
                let name = self.read_string()?;
                let sequence_id = self.read_i32()?;
                DecodedHeader::Versioned(MessageEnvelope::new(name, kind, sequence_id))
            }
            HeaderShape::Legacy { name_length } => self.read_legacy_header(name_length)?,
        };

        if header.is_absent() {
            global_metrics().empty_message();
        }
        Ok(header)
    }

    pub fn read_message_begin(&mut self) -> Result<MessageEnvelope> {
        Ok(self.read_message_header()?.into_envelope())
    }

    pub fn read_message_end(&mut self) -> Result<()> {
        global_metrics().message_read();
        Ok(())
    }

    fn read_legacy_header(&mut self, name_length: i32) -> Result<DecodedHeader> {
        if self.config().strict_read {
            warn!(name_length, "{}", constants::ERR_MISSING_VERSION);
            global_metrics().version_rejection();
            return Err(ProtocolError::MissingVersionHeader);
        }
        global_metrics().legacy_header();

        let length = self.limits().check_string_length(name_length)?;
        // Legacy peers send ISO-8859-1 names; every byte maps to one char
        let name: String = self.read_raw(length)?.into_iter().map(char::from).collect();

        let (kind, sequence_id) = match self.config().legacy_header_layout {
            LegacyHeaderLayout::Canonical => (self.read_byte()? as u8, self.read_i32()?),
            LegacyHeaderLayout::Narrow => {
                let kind = self.read_i16()?;
                let kind = u8::try_from(kind).map_err(|_| {
                    ProtocolError::InvalidValue(format!("message kind {kind} out of range"))
                })?;
                (kind, i32::from(self.read_i16()?))
            }
        };

        Ok(DecodedHeader::Legacy(MessageEnvelope::new(
            name,
            kind,
            sequence_id,
        )))
    }
}

//! Wire type tags and message kinds.

use crate::error::{ProtocolError, Result};
use std::fmt;

/// Type tag written in field and container headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TType {
    Stop = 0,
    Void = 1,
    Bool = 2,
    Byte = 3,
    Double = 4,
    I16 = 6,
    I32 = 8,
    I64 = 10,
    String = 11,
    Struct = 12,
    Map = 13,
    Set = 14,
    List = 15,
    Utf8 = 16,
    Utf16 = 17,
}

impl TType {
    /// Tag byte as written on the wire
    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parse a tag byte read from the wire
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => TType::Stop,
            1 => TType::Void,
            2 => TType::Bool,
            3 => TType::Byte,
            4 => TType::Double,
            6 => TType::I16,
            8 => TType::I32,
            10 => TType::I64,
            11 => TType::String,
            12 => TType::Struct,
            13 => TType::Map,
            14 => TType::Set,
            15 => TType::List,
            16 => TType::Utf8,
            17 => TType::Utf16,
            _ => return None,
        })
    }

    /// String and its text-encoding aliases share the length-prefixed layout
    #[inline]
    pub fn is_binary(self) -> bool {
        matches!(self, TType::String | TType::Utf8 | TType::Utf16)
    }

    /// Width in bytes for fixed-size types
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            TType::Bool | TType::Byte => Some(1),
            TType::I16 => Some(2),
            TType::I32 => Some(4),
            TType::Double | TType::I64 => Some(8),
            _ => None,
        }
    }
}

impl TryFrom<u8> for TType {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self> {
        TType::from_byte(byte)
            .ok_or_else(|| ProtocolError::InvalidValue(format!("unknown type tag {byte}")))
    }
}

impl fmt::Display for TType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TType::Stop => "stop",
            TType::Void => "void",
            TType::Bool => "bool",
            TType::Byte => "byte",
            TType::Double => "double",
            TType::I16 => "i16",
            TType::I32 => "i32",
            TType::I64 => "i64",
            TType::String => "string",
            TType::Struct => "struct",
            TType::Map => "map",
            TType::Set => "set",
            TType::List => "list",
            TType::Utf8 => "utf8",
            TType::Utf16 => "utf16",
        };
        f.write_str(name)
    }
}

/// RPC-level meaning of a message kind tag. The codec itself carries the raw tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Call = 1,
    Reply = 2,
    Exception = 3,
    Oneway = 4,
}

impl MessageType {
    pub fn from_kind(kind: u8) -> Option<Self> {
        match kind {
            1 => Some(MessageType::Call),
            2 => Some(MessageType::Reply),
            3 => Some(MessageType::Exception),
            4 => Some(MessageType::Oneway),
            _ => None,
        }
    }

    #[inline]
    pub fn kind(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for byte in 0u8..=17 {
            if let Some(ttype) = TType::from_byte(byte) {
                assert_eq!(ttype.as_byte(), byte);
            }
        }
        assert!(TType::from_byte(5).is_none());
        assert!(TType::try_from(7).is_err());
        assert!(TType::try_from(18).is_err());
    }

    #[test]
    fn test_binary_aliases() {
        assert_eq!(TType::from_byte(16), Some(TType::Utf8));
        assert_eq!(TType::from_byte(17), Some(TType::Utf16));
        assert!(TType::Utf8.is_binary() && TType::Utf16.is_binary() && TType::String.is_binary());
        assert!(!TType::Struct.is_binary());
        assert_eq!(TType::Utf16.fixed_width(), None);
    }

    #[test]
    fn test_message_kinds() {
        assert_eq!(MessageType::from_kind(1), Some(MessageType::Call));
        assert_eq!(MessageType::Oneway.kind(), 4);
        assert_eq!(MessageType::from_kind(0), None);
    }
}

//! # Dynamic Values
//!
//! A self-describing value tree and the generic walker that drives any
//! [`OutputProtocol`]/[`InputProtocol`] one header and primitive at a time.
//!
//! This is the reference path: the bulk fast path must produce exactly the
//! bytes [`write_value`] produces and accept exactly what [`read_value`]
//! accepts.

use crate::core::framing::{FieldHeader, ListHeader, MapHeader, SetHeader};
use crate::core::message::{DecodedHeader, MessageEnvelope};
use crate::core::protocol::{InputProtocol, OutputProtocol};
use crate::core::types::TType;
use crate::error::{constants, ProtocolError, Result};
use crate::utils::metrics::Timer;
use bytes::Bytes;

/// Elements reserved up front for a decoded container
pub(crate) const PREALLOC_ELEMENTS: usize = 1024;

/// A struct field: id plus value
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: i16,
    pub value: Value,
}

impl Field {
    pub fn new(id: i16, value: Value) -> Self {
        Self { id, value }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    Binary(Bytes),
    Struct(Vec<Field>),
    Map {
        key_type: TType,
        value_type: TType,
        entries: Vec<(Value, Value)>,
    },
    Set {
        element_type: TType,
        elements: Vec<Value>,
    },
    List {
        element_type: TType,
        elements: Vec<Value>,
    },
}

impl Value {
    /// Wire type tag of this value
    pub fn ttype(&self) -> TType {
        match self {
            Value::Bool(_) => TType::Bool,
            Value::Byte(_) => TType::Byte,
            Value::I16(_) => TType::I16,
            Value::I32(_) => TType::I32,
            Value::I64(_) => TType::I64,
            Value::Double(_) => TType::Double,
            Value::Binary(_) => TType::String,
            Value::Struct(_) => TType::Struct,
            Value::Map { .. } => TType::Map,
            Value::Set { .. } => TType::Set,
            Value::List { .. } => TType::List,
        }
    }

    pub fn string(value: &str) -> Self {
        Value::Binary(Bytes::copy_from_slice(value.as_bytes()))
    }

    pub fn list(element_type: TType, elements: Vec<Value>) -> Self {
        Value::List {
            element_type,
            elements,
        }
    }

    pub fn set(element_type: TType, elements: Vec<Value>) -> Self {
        Value::Set {
            element_type,
            elements,
        }
    }

    pub fn map(key_type: TType, value_type: TType, entries: Vec<(Value, Value)>) -> Self {
        Value::Map {
            key_type,
            value_type,
            entries,
        }
    }

    /// UTF-8 view of a binary value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Binary(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Look up a struct field by id
    pub fn field(&self, id: i16) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|f| f.id == id).map(|f| &f.value),
            _ => None,
        }
    }
}

/// A complete message: envelope plus struct body
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub envelope: MessageEnvelope,
    pub body: Value,
}

impl Message {
    pub fn new(envelope: MessageEnvelope, body: Value) -> Self {
        Self { envelope, body }
    }
}

/// Fail unless `value` has the type declared in its container header
pub(crate) fn expect_type(value: &Value, declared: TType) -> Result<()> {
    let found = value.ttype();
    if found != declared && !(found.is_binary() && declared.is_binary()) {
        return Err(ProtocolError::InvalidValue(format!(
            "{}: expected {declared}, found {}",
            constants::ERR_TYPE_MISMATCH,
            value.ttype()
        )));
    }
    Ok(())
}

/// Encode a value through the per-field protocol calls
pub fn write_value<P: OutputProtocol + ?Sized>(proto: &mut P, value: &Value) -> Result<()> {
    match value {
        Value::Bool(v) => proto.write_bool(*v),
        Value::Byte(v) => proto.write_byte(*v),
        Value::I16(v) => proto.write_i16(*v),
        Value::I32(v) => proto.write_i32(*v),
        Value::I64(v) => proto.write_i64(*v),
        Value::Double(v) => proto.write_double(*v),
        Value::Binary(v) => proto.write_binary(v),
        Value::Struct(fields) => {
            proto.write_struct_begin()?;
            for field in fields {
                proto.write_field_begin(field.value.ttype(), field.id)?;
                write_value(proto, &field.value)?;
                proto.write_field_end()?;
            }
            proto.write_field_stop()?;
            proto.write_struct_end()
        }
        Value::Map {
            key_type,
            value_type,
            entries,
        } => {
            proto.write_map_begin(&MapHeader::new(*key_type, *value_type, entries.len()))?;
            for (key, val) in entries {
                expect_type(key, *key_type)?;
                write_value(proto, key)?;
                expect_type(val, *value_type)?;
                write_value(proto, val)?;
            }
            proto.write_map_end()
        }
        Value::Set {
            element_type,
            elements,
        } => {
            proto.write_set_begin(&SetHeader::new(*element_type, elements.len()))?;
            for element in elements {
                expect_type(element, *element_type)?;
                write_value(proto, element)?;
            }
            proto.write_set_end()
        }
        Value::List {
            element_type,
            elements,
        } => {
            proto.write_list_begin(&ListHeader::new(*element_type, elements.len()))?;
            for element in elements {
                expect_type(element, *element_type)?;
                write_value(proto, element)?;
            }
            proto.write_list_end()
        }
    }
}

/// Decode a value of type `ttype` through the per-field protocol calls
pub fn read_value<P: InputProtocol + ?Sized>(proto: &mut P, ttype: TType) -> Result<Value> {
    read_value_at(proto, ttype, 1)
}

fn read_value_at<P: InputProtocol + ?Sized>(
    proto: &mut P,
    ttype: TType,
    depth: usize,
) -> Result<Value> {
    match ttype {
        TType::Bool => Ok(Value::Bool(proto.read_bool()?)),
        TType::Byte => Ok(Value::Byte(proto.read_byte()?)),
        TType::I16 => Ok(Value::I16(proto.read_i16()?)),
        TType::I32 => Ok(Value::I32(proto.read_i32()?)),
        TType::I64 => Ok(Value::I64(proto.read_i64()?)),
        TType::Double => Ok(Value::Double(proto.read_double()?)),
        TType::String | TType::Utf8 | TType::Utf16 => {
            Ok(Value::Binary(Bytes::from(proto.read_binary()?)))
        }
        TType::Struct => {
            proto.limits().check_depth(depth)?;
            proto.read_struct_begin()?;
            let mut fields = Vec::new();
            loop {
                match proto.read_field_begin()? {
                    FieldHeader::Stop => break,
                    FieldHeader::Field { field_type, id } => {
                        let value = read_value_at(proto, field_type, depth + 1)?;
                        proto.read_field_end()?;
                        fields.push(Field::new(id, value));
                    }
                }
            }
            proto.read_struct_end()?;
            Ok(Value::Struct(fields))
        }
        TType::Map => {
            proto.limits().check_depth(depth)?;
            let header = proto.read_map_begin()?;
            let mut entries = Vec::with_capacity(header.size.min(PREALLOC_ELEMENTS));
            for _ in 0..header.size {
                let key = read_value_at(proto, header.key_type, depth + 1)?;
                let val = read_value_at(proto, header.value_type, depth + 1)?;
                entries.push((key, val));
            }
            proto.read_map_end()?;
            Ok(Value::map(header.key_type, header.value_type, entries))
        }
        TType::Set => {
            proto.limits().check_depth(depth)?;
            let header = proto.read_set_begin()?;
            let mut elements = Vec::with_capacity(header.size.min(PREALLOC_ELEMENTS));
            for _ in 0..header.size {
                elements.push(read_value_at(proto, header.element_type, depth + 1)?);
            }
            proto.read_set_end()?;
            Ok(Value::set(header.element_type, elements))
        }
        TType::List => {
            proto.limits().check_depth(depth)?;
            let header = proto.read_list_begin()?;
            let mut elements = Vec::with_capacity(header.size.min(PREALLOC_ELEMENTS));
            for _ in 0..header.size {
                elements.push(read_value_at(proto, header.element_type, depth + 1)?);
            }
            proto.read_list_end()?;
            Ok(Value::list(header.element_type, elements))
        }
        TType::Stop | TType::Void => Err(ProtocolError::InvalidValue(format!(
            "no value can be decoded as {ttype}"
        ))),
    }
}

/// Consume a value of type `ttype` without keeping it, e.g. an unknown field
pub fn skip<P: InputProtocol + ?Sized>(proto: &mut P, ttype: TType) -> Result<()> {
    skip_at(proto, ttype, 1)
}

fn skip_at<P: InputProtocol + ?Sized>(proto: &mut P, ttype: TType, depth: usize) -> Result<()> {
    match ttype {
        TType::Bool => proto.read_bool().map(drop),
        TType::Byte => proto.read_byte().map(drop),
        TType::I16 => proto.read_i16().map(drop),
        TType::I32 => proto.read_i32().map(drop),
        TType::I64 => proto.read_i64().map(drop),
        TType::Double => proto.read_double().map(drop),
        TType::String | TType::Utf8 | TType::Utf16 => proto.read_binary().map(drop),
        TType::Struct => {
            proto.limits().check_depth(depth)?;
            proto.read_struct_begin()?;
            while let FieldHeader::Field { field_type, .. } = proto.read_field_begin()? {
                skip_at(proto, field_type, depth + 1)?;
                proto.read_field_end()?;
            }
            proto.read_struct_end()
        }
        TType::Map => {
            proto.limits().check_depth(depth)?;
            let header = proto.read_map_begin()?;
            for _ in 0..header.size {
                skip_at(proto, header.key_type, depth + 1)?;
                skip_at(proto, header.value_type, depth + 1)?;
            }
            proto.read_map_end()
        }
        TType::Set => {
            proto.limits().check_depth(depth)?;
            let header = proto.read_set_begin()?;
            for _ in 0..header.size {
                skip_at(proto, header.element_type, depth + 1)?;
            }
            proto.read_set_end()
        }
        TType::List => {
            proto.limits().check_depth(depth)?;
            let header = proto.read_list_begin()?;
            for _ in 0..header.size {
                skip_at(proto, header.element_type, depth + 1)?;
            }
            proto.read_list_end()
        }
        TType::Stop | TType::Void => Err(ProtocolError::InvalidValue(format!(
            "no value can be skipped as {ttype}"
        ))),
    }
}

/// Header, struct body, end marker, flush
pub fn write_message<P: OutputProtocol + ?Sized>(proto: &mut P, message: &Message) -> Result<()> {
    let _timer = Timer::start("write_message");
    proto.write_message_begin(&message.envelope)?;
    write_value(proto, &message.body)?;
    proto.write_message_end()?;
    proto.flush()
}

/// Read a header and its struct body.
///
/// An absent header yields an empty envelope and an empty struct body without
/// consuming any further bytes.
pub fn read_message<P: InputProtocol + ?Sized>(proto: &mut P) -> Result<Message> {
    let _timer = Timer::start("read_message");
    let envelope = match proto.read_message_header()? {
        DecodedHeader::Absent => {
            return Ok(Message::new(MessageEnvelope::empty(), Value::Struct(Vec::new())))
        }
        DecodedHeader::Versioned(envelope) | DecodedHeader::Legacy(envelope) => envelope,
    };
    let body = read_value(proto, TType::Struct)?;
    proto.read_message_end()?;
    Ok(Message::new(envelope, body))
}

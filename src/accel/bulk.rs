//! # Bulk Codec
//!
//! Whole-value encoder/decoder working directly on contiguous memory.
//!
//! Encoding sizes the output once and writes the complete value into a single
//! buffer with `BufMut`, so the transport sees one write instead of one per
//! primitive. Decoding walks a borrowed slice with `Buf` and reports how many
//! bytes it consumed. The layouts, guards and error kinds are those of the
//! generic codec in `core`.

use crate::accel::FastCodec;
use crate::core::limits::{wire_length, DecodeLimits};
use crate::core::types::TType;
use crate::core::value::{expect_type, Field, Value, PREALLOC_ELEMENTS};
use crate::error::{ProtocolError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Built-in fast-path codec
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkCodec;

impl BulkCodec {
    pub fn new() -> Self {
        Self
    }
}

impl FastCodec for BulkCodec {
    fn name(&self) -> &'static str {
        "bulk"
    }

    fn encode(&self, value: &Value, out: &mut BytesMut) -> Result<()> {
        out.reserve(encoded_len(value));
        encode_value(value, out)
    }

    fn decode(&self, input: &[u8], ttype: TType, limits: &DecodeLimits) -> Result<(Value, usize)> {
        let mut decoder = Decoder { input, limits };
        let value = decoder.value(ttype, 1)?;
        Ok((value, input.len() - decoder.input.len()))
    }
}

/// Exact number of bytes `value` occupies on the wire
pub fn encoded_len(value: &Value) -> usize {
    match value {
        Value::Bool(_) | Value::Byte(_) => 1,
        Value::I16(_) => 2,
        Value::I32(_) => 4,
        Value::I64(_) | Value::Double(_) => 8,
        Value::Binary(bytes) => 4 + bytes.len(),
        Value::Struct(fields) => {
            fields.iter().map(|f| 3 + encoded_len(&f.value)).sum::<usize>() + 1
        }
        Value::Map { entries, .. } => {
            6 + entries
                .iter()
                .map(|(k, v)| encoded_len(k) + encoded_len(v))
                .sum::<usize>()
        }
        Value::Set { elements, .. } | Value::List { elements, .. } => {
            5 + elements.iter().map(encoded_len).sum::<usize>()
        }
    }
}

fn encode_value(value: &Value, out: &mut BytesMut) -> Result<()> {
    match value {
        Value::Bool(v) => out.put_u8(u8::from(*v)),
        Value::Byte(v) => out.put_i8(*v),
        Value::I16(v) => out.put_i16(*v),
        Value::I32(v) => out.put_i32(*v),
        Value::I64(v) => out.put_i64(*v),
        Value::Double(v) => out.put_f64(*v),
        Value::Binary(bytes) => {
            out.put_i32(wire_length(bytes.len())?);
            out.put_slice(bytes);
        }
        Value::Struct(fields) => {
            for field in fields {
                out.put_u8(field.value.ttype().as_byte());
                out.put_i16(field.id);
                encode_value(&field.value, out)?;
            }
            out.put_u8(TType::Stop.as_byte());
        }
        Value::Map {
            key_type,
            value_type,
            entries,
        } => {
            let size = wire_length(entries.len())?;
            out.put_u8(key_type.as_byte());
            out.put_u8(value_type.as_byte());
            out.put_i32(size);
            for (key, val) in entries {
                expect_type(key, *key_type)?;
                encode_value(key, out)?;
                expect_type(val, *value_type)?;
                encode_value(val, out)?;
            }
        }
        Value::Set {
            element_type,
            elements,
        }
        | Value::List {
            element_type,
            elements,
        } => {
            let size = wire_length(elements.len())?;
            out.put_u8(element_type.as_byte());
            out.put_i32(size);
            for element in elements {
                expect_type(element, *element_type)?;
                encode_value(element, out)?;
            }
        }
    }
    Ok(())
}

struct Decoder<'a, 'l> {
    input: &'a [u8],
    limits: &'l DecodeLimits,
}

impl Decoder<'_, '_> {
    #[inline]
    fn ensure(&self, needed: usize) -> Result<()> {
        if self.input.remaining() < needed {
            return Err(ProtocolError::UnexpectedEof { needed });
        }
        Ok(())
    }

    fn byte(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.input.get_i8())
    }

    fn i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.input.get_i16())
    }

    fn i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.input.get_i32())
    }

    fn i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.input.get_i64())
    }

    fn double(&mut self) -> Result<f64> {
        self.ensure(8)?;
        Ok(self.input.get_f64())
    }

    fn ttype(&mut self) -> Result<TType> {
        TType::try_from(self.byte()? as u8)
    }

    fn binary(&mut self) -> Result<Bytes> {
        let declared = self.i32()?;
        let length = self.limits.check_string_length(declared)?;
        self.ensure(length)?;
        Ok(self.input.copy_to_bytes(length))
    }

    fn container_size(&mut self) -> Result<usize> {
        let declared = self.i32()?;
        self.limits.check_container_length(declared)
    }

    fn value(&mut self, ttype: TType, depth: usize) -> Result<Value> {
        match ttype {
            TType::Bool => Ok(Value::Bool(self.byte()? != 0)),
            TType::Byte => Ok(Value::Byte(self.byte()?)),
            TType::I16 => Ok(Value::I16(self.i16()?)),
            TType::I32 => Ok(Value::I32(self.i32()?)),
            TType::I64 => Ok(Value::I64(self.i64()?)),
            TType::Double => Ok(Value::Double(self.double()?)),
            TType::String | TType::Utf8 | TType::Utf16 => Ok(Value::Binary(self.binary()?)),
            TType::Struct => {
                self.limits.check_depth(depth)?;
                let mut fields = Vec::new();
                loop {
                    let field_type = self.ttype()?;
                    if field_type == TType::Stop {
                        break;
                    }
                    let id = self.i16()?;
                    fields.push(Field::new(id, self.value(field_type, depth + 1)?));
                }
                Ok(Value::Struct(fields))
            }
            TType::Map => {
                self.limits.check_depth(depth)?;
                let key_type = self.ttype()?;
                let value_type = self.ttype()?;
                let size = self.container_size()?;
                let mut entries = Vec::with_capacity(size.min(PREALLOC_ELEMENTS));
                for _ in 0..size {
                    let key = self.value(key_type, depth + 1)?;
                    let val = self.value(value_type, depth + 1)?;
                    entries.push((key, val));
                }
                Ok(Value::map(key_type, value_type, entries))
            }
            TType::Set | TType::List => {
                self.limits.check_depth(depth)?;
                let element_type = self.ttype()?;
                let size = self.container_size()?;
                let mut elements = Vec::with_capacity(size.min(PREALLOC_ELEMENTS));
                for _ in 0..size {
                    elements.push(self.value(element_type, depth + 1)?);
                }
                if ttype == TType::Set {
                    Ok(Value::set(element_type, elements))
                } else {
                    Ok(Value::list(element_type, elements))
                }
            }
            TType::Stop | TType::Void => Err(ProtocolError::InvalidValue(format!(
                "no value can be decoded as {ttype}"
            ))),
        }
    }
}

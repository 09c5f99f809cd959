//! # Field And Container Framing
//!
//! Fixed-layout headers that precede struct fields and container bodies.
//!
//! ## Wire Format
//! ```text
//! field   [type: u8][id: i16 BE]
//! stop    [0x00]                          (no id)
//! map     [key type: u8][value type: u8][count: i32 BE]
//! list    [element type: u8][count: i32 BE]
//! set     [element type: u8][count: i32 BE]
//! ```
//!
//! Structs have no begin/end bytes; they end with exactly one stop marker.
//! Containers carry no terminator, the count is authoritative. Decoded counts
//! pass through the container guard before they are handed to the caller.

use crate::core::limits::wire_length;
use crate::core::protocol::BinaryProtocol;
use crate::core::types::TType;
use crate::error::Result;
use std::io::{Read, Write};

/// Header preceding a struct field, or the stop marker ending the struct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldHeader {
    Stop,
    Field { field_type: TType, id: i16 },
}

impl FieldHeader {
    pub fn is_stop(&self) -> bool {
        matches!(self, FieldHeader::Stop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeader {
    pub key_type: TType,
    pub value_type: TType,
    pub size: usize,
}

impl MapHeader {
    pub fn new(key_type: TType, value_type: TType, size: usize) -> Self {
        Self {
            key_type,
            value_type,
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHeader {
    pub element_type: TType,
    pub size: usize,
}

impl ListHeader {
    pub fn new(element_type: TType, size: usize) -> Self {
        Self { element_type, size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetHeader {
    pub element_type: TType,
    pub size: usize,
}

impl SetHeader {
    pub fn new(element_type: TType, size: usize) -> Self {
        Self { element_type, size }
    }
}

impl<T: Write> BinaryProtocol<T> {
    pub fn write_field_begin(&mut self, field_type: TType, id: i16) -> Result<()> {
        self.write_byte(field_type.as_byte() as i8)?;
        self.write_i16(id)
    }

    pub fn write_field_stop(&mut self) -> Result<()> {
        self.write_byte(TType::Stop.as_byte() as i8)
    }

    pub fn write_map_begin(&mut self, header: &MapHeader) -> Result<()> {
        let size = wire_length(header.size)?;
        self.write_byte(header.key_type.as_byte() as i8)?;
        self.write_byte(header.value_type.as_byte() as i8)?;
        self.write_i32(size)
    }

    pub fn write_list_begin(&mut self, header: &ListHeader) -> Result<()> {
        let size = wire_length(header.size)?;
        self.write_byte(header.element_type.as_byte() as i8)?;
        self.write_i32(size)
    }

    pub fn write_set_begin(&mut self, header: &SetHeader) -> Result<()> {
        let size = wire_length(header.size)?;
        self.write_byte(header.element_type.as_byte() as i8)?;
        self.write_i32(size)
    }
}

impl<T: Read> BinaryProtocol<T> {
    pub fn read_field_begin(&mut self) -> Result<FieldHeader> {
        let field_type = self.read_ttype()?;
        if field_type == TType::Stop {
            return Ok(FieldHeader::Stop);
        }
        let id = self.read_i16()?;
        Ok(FieldHeader::Field { field_type, id })
    }

    pub fn read_map_begin(&mut self) -> Result<MapHeader> {
        let key_type = self.read_ttype()?;
        let value_type = self.read_ttype()?;
        let declared = self.read_i32()?;
        let size = self.limits().check_container_length(declared)?;
        Ok(MapHeader::new(key_type, value_type, size))
    }

    pub fn read_list_begin(&mut self) -> Result<ListHeader> {
        let element_type = self.read_ttype()?;
        let declared = self.read_i32()?;
        let size = self.limits().check_container_length(declared)?;
        Ok(ListHeader::new(element_type, size))
    }

    pub fn read_set_begin(&mut self) -> Result<SetHeader> {
        let element_type = self.read_ttype()?;
        let declared = self.read_i32()?;
        let size = self.limits().check_container_length(declared)?;
        Ok(SetHeader::new(element_type, size))
    }
}

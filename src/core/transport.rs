//! # In-Memory Transport
//!
//! The codec talks to any `std::io::Read`/`Write` byte stream; this module
//! provides the in-memory one used for buffering whole messages, for the
//! fast path, and in tests.
//!
//! Bytes written to a [`MemoryTransport`] are appended to the same buffer that
//! reads drain from the front of, so a message can be encoded and decoded
//! through a single instance.

use bytes::{Buf, Bytes, BytesMut};
use std::io::{self, BufRead, Read, Write};

/// Growable in-memory byte stream
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    buffer: BytesMut,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Transport pre-loaded with bytes to read
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            buffer: BytesMut::from(data),
        }
    }

    /// Unread bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Take every unread byte, leaving the transport empty
    pub fn take_bytes(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }
}

impl From<Bytes> for MemoryTransport {
    fn from(bytes: Bytes) -> Self {
        Self::from_slice(&bytes)
    }
}

impl From<Vec<u8>> for MemoryTransport {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            buffer: BytesMut::from(&bytes[..]),
        }
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.buffer.len());
        buf[..n].copy_from_slice(&self.buffer[..n]);
        self.buffer.advance(n);
        Ok(n)
    }
}

impl BufRead for MemoryTransport {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(&self.buffer)
    }

    fn consume(&mut self, amt: usize) {
        self.buffer.advance(amt.min(self.buffer.len()));
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

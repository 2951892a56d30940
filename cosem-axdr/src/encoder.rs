//! A-XDR encoder

use crate::types::AxdrTag;
use cosem_core::{BitString, ByteBuffer, CosemResult, DataObject};

/// A-XDR encoder writing COSEM data types
pub struct AxdrEncoder {
    buffer: ByteBuffer,
}

impl AxdrEncoder {
    pub fn new() -> Self {
        Self {
            buffer: ByteBuffer::new(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_vec()
    }

    pub fn encode_u8(&mut self, value: u8) {
        self.buffer.set_u8(value);
    }

    pub fn encode_u16(&mut self, value: u16) {
        self.buffer.set_u16(value);
    }

    pub fn encode_u32(&mut self, value: u32) {
        self.buffer.set_u32(value);
    }

    pub fn encode_length(&mut self, count: usize) {
        self.buffer.set_object_count(count);
    }

    fn tagged_bytes(&mut self, tag: AxdrTag, bytes: &[u8]) {
        self.buffer.set_u8(tag.value());
        self.buffer.set_object_count(bytes.len());
        self.buffer.set(bytes);
    }

    /// Encode a complete data object, tag included.
    pub fn encode_data_object(&mut self, value: &DataObject) -> CosemResult<()> {
        match value {
            DataObject::Null => self.buffer.set_u8(AxdrTag::Null.value()),
            DataObject::Boolean(v) => {
                self.buffer.set_u8(AxdrTag::Boolean.value());
                self.buffer.set_u8(*v as u8);
            }
            DataObject::Integer8(v) => {
                self.buffer.set_u8(AxdrTag::Integer8.value());
                self.buffer.set_u8(*v as u8);
            }
            DataObject::Integer16(v) => {
                self.buffer.set_u8(AxdrTag::Integer16.value());
                self.buffer.set_u16(*v as u16);
            }
            DataObject::Integer32(v) => {
                self.buffer.set_u8(AxdrTag::Integer32.value());
                self.buffer.set_u32(*v as u32);
            }
            DataObject::Integer64(v) => {
                self.buffer.set_u8(AxdrTag::Integer64.value());
                self.buffer.set_u64(*v as u64);
            }
            DataObject::Unsigned8(v) => {
                self.buffer.set_u8(AxdrTag::Unsigned8.value());
                self.buffer.set_u8(*v);
            }
            DataObject::Unsigned16(v) => {
                self.buffer.set_u8(AxdrTag::Unsigned16.value());
                self.buffer.set_u16(*v);
            }
            DataObject::Unsigned32(v) => {
                self.buffer.set_u8(AxdrTag::Unsigned32.value());
                self.buffer.set_u32(*v);
            }
            DataObject::Unsigned64(v) => {
                self.buffer.set_u8(AxdrTag::Unsigned64.value());
                self.buffer.set_u64(*v);
            }
            DataObject::Float32(v) => {
                self.buffer.set_u8(AxdrTag::Float32.value());
                self.buffer.set_u32(v.to_bits());
            }
            DataObject::Float64(v) => {
                self.buffer.set_u8(AxdrTag::Float64.value());
                self.buffer.set_u64(v.to_bits());
            }
            DataObject::Enumerate(v) => {
                self.buffer.set_u8(AxdrTag::Enumerate.value());
                self.buffer.set_u8(*v);
            }
            DataObject::Bcd(v) => {
                self.buffer.set_u8(AxdrTag::Bcd.value());
                self.buffer.set_u8(*v);
            }
            DataObject::OctetString(bytes) => self.tagged_bytes(AxdrTag::OctetString, bytes),
            DataObject::VisibleString(bytes) => self.tagged_bytes(AxdrTag::VisibleString, bytes),
            DataObject::Utf8String(bytes) => self.tagged_bytes(AxdrTag::Utf8String, bytes),
            DataObject::BitString(bits) => self.encode_bit_string(bits),
            DataObject::Array(items) => self.encode_sequence(AxdrTag::Array, items)?,
            DataObject::Structure(items) => self.encode_sequence(AxdrTag::Structure, items)?,
            DataObject::Date(bytes) => {
                self.buffer.set_u8(AxdrTag::Date.value());
                self.buffer.set(bytes);
            }
            DataObject::Time(bytes) => {
                self.buffer.set_u8(AxdrTag::Time.value());
                self.buffer.set(bytes);
            }
            DataObject::DateTime(bytes) => {
                self.buffer.set_u8(AxdrTag::DateTime.value());
                self.buffer.set(bytes);
            }
        }
        Ok(())
    }

    fn encode_bit_string(&mut self, bits: &BitString) {
        self.buffer.set_u8(AxdrTag::BitString.value());
        self.buffer.set_object_count(bits.num_bits());
        self.buffer.set(bits.as_bytes());
    }

    fn encode_sequence(&mut self, tag: AxdrTag, items: &[DataObject]) -> CosemResult<()> {
        self.buffer.set_u8(tag.value());
        self.buffer.set_object_count(items.len());
        for item in items {
            self.encode_data_object(item)?;
        }
        Ok(())
    }
}

impl Default for AxdrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a single data object into a fresh byte vector.
pub fn encode(value: &DataObject) -> CosemResult<Vec<u8>> {
    let mut encoder = AxdrEncoder::new();
    encoder.encode_data_object(value)?;
    Ok(encoder.into_bytes())
}

//! A-XDR decoder

use crate::types::AxdrTag;
use cosem_core::{BitString, ByteBuffer, CosemError, CosemResult, DataObject};

/// A-XDR decoder reading COSEM data types from a buffer at its cursor.
///
/// The decoder borrows the buffer mutably so a partial read of a streamed
/// value can resume from the same cursor once more bytes have arrived.
pub struct AxdrDecoder<'a> {
    buffer: &'a mut ByteBuffer,
}

impl<'a> AxdrDecoder<'a> {
    pub fn new(buffer: &'a mut ByteBuffer) -> Self {
        Self { buffer }
    }

    /// Decode one complete data object, tag included.
    pub fn decode_data_object(&mut self) -> CosemResult<DataObject> {
        let tag = AxdrTag::from_value(self.buffer.get_u8()?)?;
        self.decode_value(tag)
    }

    /// Decode one data object if its bytes are fully present.
    ///
    /// Returns `Ok(None)` and restores the cursor when the buffer ends in the
    /// middle of the value; any other failure is final.
    pub fn try_decode_data_object(&mut self) -> CosemResult<Option<DataObject>> {
        let start = self.buffer.position();
        match self.decode_data_object() {
            Ok(value) => Ok(Some(value)),
            Err(CosemError::OutOfData) => {
                self.buffer.set_position(start);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn decode_value(&mut self, tag: AxdrTag) -> CosemResult<DataObject> {
        let value = match tag {
            AxdrTag::Null => DataObject::Null,
            AxdrTag::Boolean => DataObject::Boolean(self.buffer.get_u8()? != 0),
            AxdrTag::Integer8 => DataObject::Integer8(self.buffer.get_u8()? as i8),
            AxdrTag::Integer16 => DataObject::Integer16(self.buffer.get_u16()? as i16),
            AxdrTag::Integer32 => DataObject::Integer32(self.buffer.get_u32()? as i32),
            AxdrTag::Integer64 => DataObject::Integer64(self.buffer.get_u64()? as i64),
            AxdrTag::Unsigned8 => DataObject::Unsigned8(self.buffer.get_u8()?),
            AxdrTag::Unsigned16 => DataObject::Unsigned16(self.buffer.get_u16()?),
            AxdrTag::Unsigned32 => DataObject::Unsigned32(self.buffer.get_u32()?),
            AxdrTag::Unsigned64 => DataObject::Unsigned64(self.buffer.get_u64()?),
            AxdrTag::Float32 => DataObject::Float32(f32::from_bits(self.buffer.get_u32()?)),
            AxdrTag::Float64 => DataObject::Float64(f64::from_bits(self.buffer.get_u64()?)),
            AxdrTag::Enumerate => DataObject::Enumerate(self.buffer.get_u8()?),
            AxdrTag::Bcd => DataObject::Bcd(self.buffer.get_u8()?),
            AxdrTag::OctetString => DataObject::OctetString(self.decode_counted_bytes()?),
            AxdrTag::VisibleString => DataObject::VisibleString(self.decode_counted_bytes()?),
            AxdrTag::Utf8String => DataObject::Utf8String(self.decode_counted_bytes()?),
            AxdrTag::BitString => {
                let num_bits = self.buffer.get_object_count()?;
                let bytes = self.buffer.get_bytes(num_bits.div_ceil(8))?;
                DataObject::BitString(BitString::from_bytes(bytes, num_bits))
            }
            AxdrTag::Array => DataObject::Array(self.decode_sequence()?),
            AxdrTag::Structure => DataObject::Structure(self.decode_sequence()?),
            AxdrTag::CompactArray => {
                return Err(CosemError::InvalidData(
                    "compact array decoding is not supported".to_string(),
                ));
            }
            AxdrTag::Date => {
                let mut bytes = [0u8; 5];
                bytes.copy_from_slice(&self.buffer.get_bytes(5)?);
                DataObject::Date(bytes)
            }
            AxdrTag::Time => {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(&self.buffer.get_bytes(4)?);
                DataObject::Time(bytes)
            }
            AxdrTag::DateTime => {
                let mut bytes = [0u8; 12];
                bytes.copy_from_slice(&self.buffer.get_bytes(12)?);
                DataObject::DateTime(bytes)
            }
        };
        Ok(value)
    }

    fn decode_counted_bytes(&mut self) -> CosemResult<Vec<u8>> {
        let count = self.buffer.get_object_count()?;
        self.buffer.get_bytes(count)
    }

    fn decode_sequence(&mut self) -> CosemResult<Vec<DataObject>> {
        let count = self.buffer.get_object_count()?;
        let mut items = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            items.push(self.decode_data_object()?);
        }
        Ok(items)
    }
}

/// Decode a single data object from a byte slice.
pub fn decode(data: &[u8]) -> CosemResult<DataObject> {
    let mut buffer = ByteBuffer::from(data);
    AxdrDecoder::new(&mut buffer).decode_data_object()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;

    fn round_trip(value: DataObject) {
        let encoded = encode(&value).unwrap();
        assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_round_trip_scalars() {
        round_trip(DataObject::Null);
        round_trip(DataObject::Boolean(false));
        round_trip(DataObject::Integer8(-100));
        round_trip(DataObject::Integer64(i64::MIN));
        round_trip(DataObject::Unsigned32(0xCAFEBABE));
        round_trip(DataObject::Enumerate(30));
        round_trip(DataObject::Float64(1.5));
        round_trip(DataObject::DateTime([0x07, 0xE4, 1, 1, 0xFF, 0, 0, 0, 0, 0x80, 0, 0]));
    }

    #[test]
    fn test_round_trip_nested() {
        round_trip(DataObject::Array(vec![
            DataObject::Structure(vec![
                DataObject::OctetString(vec![0, 0, 1, 0, 0, 255]),
                DataObject::Unsigned16(3),
            ]),
            DataObject::Structure(vec![
                DataObject::OctetString(vec![1, 0, 1, 8, 0, 255]),
                DataObject::Unsigned16(3),
            ]),
        ]));
    }

    #[test]
    fn test_round_trip_long_octet_string() {
        round_trip(DataObject::OctetString(vec![0x55; 300]));
    }

    #[test]
    fn test_try_decode_restores_cursor_on_short_input() {
        let encoded = encode(&DataObject::OctetString(vec![9; 40])).unwrap();
        for cut in 1..encoded.len() {
            let mut buffer = ByteBuffer::from(&encoded[..cut]);
            let mut decoder = AxdrDecoder::new(&mut buffer);
            assert!(decoder.try_decode_data_object().unwrap().is_none());
            assert_eq!(buffer.position(), 0);
        }
        let mut buffer = ByteBuffer::from(encoded.as_slice());
        let mut decoder = AxdrDecoder::new(&mut buffer);
        assert!(decoder.try_decode_data_object().unwrap().is_some());
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        assert!(decode(&[0x30, 0x00]).is_err());
    }
}

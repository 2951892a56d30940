//! Data object container

use crate::datatypes::bit_string::BitString;
use serde::{Deserialize, Serialize};

/// Container for a value sent to or received from a meter.
///
/// Date, time and date-time values are kept in their raw COSEM octet
/// encodings (5, 4 and 12 bytes); calendar interpretation belongs to the
/// object model, not to this engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataObject {
    Null,
    Boolean(bool),
    Integer8(i8),
    Integer16(i16),
    Integer32(i32),
    Integer64(i64),
    Unsigned8(u8),
    Unsigned16(u16),
    Unsigned32(u32),
    Unsigned64(u64),
    Float32(f32),
    Float64(f64),
    Enumerate(u8),
    Bcd(u8),
    OctetString(Vec<u8>),
    VisibleString(Vec<u8>),
    Utf8String(Vec<u8>),
    BitString(BitString),
    Array(Vec<DataObject>),
    Structure(Vec<DataObject>),
    Date([u8; 5]),
    Time([u8; 4]),
    DateTime([u8; 12]),
}

impl DataObject {
    pub fn is_null(&self) -> bool {
        matches!(self, DataObject::Null)
    }

    /// Element count for arrays and structures, 1 otherwise.
    pub fn count(&self) -> usize {
        match self {
            DataObject::Array(items) | DataObject::Structure(items) => items.len(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count() {
        assert_eq!(DataObject::Unsigned32(7).count(), 1);
        let arr = DataObject::Array(vec![DataObject::Null, DataObject::Boolean(true)]);
        assert_eq!(arr.count(), 2);
    }
}

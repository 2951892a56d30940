use crate::error::{CosemError, CosemResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OBIS (Object Identification System) code identifying a COSEM object
///
/// Six bytes, conventionally written "A.B.C.D.E.F".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObisCode {
    bytes: [u8; 6],
}

impl ObisCode {
    pub fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        Self {
            bytes: [a, b, c, d, e, f],
        }
    }

    pub fn from_bytes(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(data: &[u8]) -> CosemResult<Self> {
        if data.len() != 6 {
            return Err(CosemError::InvalidData(format!(
                "OBIS code must be 6 bytes, got {}",
                data.len()
            )));
        }
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(data);
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }

    pub fn to_bytes(self) -> [u8; 6] {
        self.bytes
    }
}

impl FromStr for ObisCode {
    type Err = CosemError;

    fn from_str(s: &str) -> CosemResult<Self> {
        let mut bytes = [0u8; 6];
        let mut count = 0;
        for part in s.split('.') {
            if count == 6 {
                count += 1;
                break;
            }
            bytes[count] = part.parse::<u8>().map_err(|_| {
                CosemError::InvalidData(format!("invalid OBIS group value: {part}"))
            })?;
            count += 1;
        }
        if count != 6 {
            return Err(CosemError::InvalidData(format!(
                "invalid OBIS code format: {s}"
            )));
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}",
            self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3], self.bytes[4], self.bytes[5]
        )
    }
}

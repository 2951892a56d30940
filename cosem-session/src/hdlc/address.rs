//! HDLC station addresses
//!
//! An address value is packed into 1, 2 or 4 bytes of 7-bit groups; the low
//! bit of each byte marks the final group. A combined address value splits
//! into logical and physical parts at bit 7 below 0x4000 and at bit 14 from
//! 0x4000 upward (2-byte addresses carry 7+7 bits, 4-byte addresses 14+14).

use cosem_core::{CosemError, CosemResult};
use std::fmt;

const ONE_BYTE_BOUND: u32 = 0x7F;
const TWO_BYTE_BOUND: u32 = 0x3FFF;
const FOUR_BYTE_BOUND: u32 = 0x0FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HdlcAddress {
    logical: u16,
    physical: u16,
    size: u8,
}

impl HdlcAddress {
    /// Build an address from explicit logical/physical parts.
    pub fn new(logical: u16, physical: u16, size: u8) -> CosemResult<Self> {
        let address = Self {
            logical,
            physical,
            size,
        };
        address.validate()?;
        Ok(address)
    }

    /// Split a combined address value. `size` forces the byte length
    /// (1, 2 or 4); 0 selects the shortest encoding that fits.
    pub fn from_value(value: u32, size: u8) -> CosemResult<Self> {
        let size = match size {
            0 => {
                if value <= ONE_BYTE_BOUND {
                    1
                } else if value <= TWO_BYTE_BOUND {
                    2
                } else {
                    4
                }
            }
            1 | 2 | 4 => size,
            _ => {
                return Err(CosemError::InvalidData(format!(
                    "invalid HDLC address size: {size}"
                )));
            }
        };
        let (logical, physical) = match size {
            1 => (value, 0),
            2 => (value >> 7, value & 0x7F),
            _ => (value >> 14, value & 0x3FFF),
        };
        if value > FOUR_BYTE_BOUND {
            return Err(CosemError::InvalidData(format!(
                "address 0x{value:X} exceeds the 4-byte upper bound"
            )));
        }
        Self::new(logical as u16, physical as u16, size)
    }

    fn validate(&self) -> CosemResult<()> {
        let (max_logical, max_physical) = match self.size {
            1 => (0x7F, 0),
            2 => (0x7F, 0x7F),
            4 => (0x3FFF, 0x3FFF),
            _ => {
                return Err(CosemError::InvalidData(format!(
                    "invalid HDLC address size: {}",
                    self.size
                )));
            }
        };
        if u32::from(self.logical) > max_logical || u32::from(self.physical) > max_physical {
            return Err(CosemError::InvalidData(format!(
                "HDLC address out of range: logical={}, physical={}, size={}",
                self.logical, self.physical, self.size
            )));
        }
        Ok(())
    }

    pub fn logical(&self) -> u16 {
        self.logical
    }

    pub fn physical(&self) -> u16 {
        self.physical
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    /// Combined address value, inverse of `from_value`.
    pub fn value(&self) -> u32 {
        match self.size {
            1 => u32::from(self.logical),
            2 => (u32::from(self.logical) << 7) | u32::from(self.physical),
            _ => (u32::from(self.logical) << 14) | u32::from(self.physical),
        }
    }

    /// Pack into wire bytes, final-group marker on the last byte.
    pub fn encode(&self) -> Vec<u8> {
        match self.size {
            1 => vec![(self.logical as u8) << 1 | 1],
            2 => vec![(self.logical as u8) << 1, (self.physical as u8) << 1 | 1],
            _ => vec![
                ((self.logical >> 7) as u8 & 0x7F) << 1,
                (self.logical as u8 & 0x7F) << 1,
                ((self.physical >> 7) as u8 & 0x7F) << 1,
                (self.physical as u8 & 0x7F) << 1 | 1,
            ],
        }
    }

    /// Unpack an address from the start of `data`, returning it with the
    /// number of bytes consumed.
    pub fn decode(data: &[u8]) -> CosemResult<(Self, usize)> {
        let mut length = 0;
        loop {
            if length >= data.len() {
                return Err(CosemError::OutOfData);
            }
            let byte = data[length];
            length += 1;
            if byte & 0x01 != 0 {
                break;
            }
            if length == 4 {
                return Err(CosemError::Framing(
                    "HDLC address missing final-group marker".to_string(),
                ));
            }
        }
        let (logical, physical) = match length {
            1 => (u16::from(data[0] >> 1), 0),
            2 => (u16::from(data[0] >> 1), u16::from(data[1] >> 1)),
            4 => (
                u16::from(data[0] >> 1) << 7 | u16::from(data[1] >> 1),
                u16::from(data[2] >> 1) << 7 | u16::from(data[3] >> 1),
            ),
            _ => {
                return Err(CosemError::Framing(format!(
                    "invalid HDLC address length: {length}"
                )));
            }
        };
        Ok((Self::new(logical, physical, length as u8)?, length))
    }
}

impl fmt::Display for HdlcAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.size == 1 {
            write!(f, "{:02X}", self.logical)
        } else {
            write!(f, "{:02X}-{:02X}", self.logical, self.physical)
        }
    }
}

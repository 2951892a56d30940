//! DLMS application layer command tags

use crate::error::{CosemError, CosemResult};

/// Application layer command byte.
///
/// The value of each variant is the tag that appears as the first byte of the
/// corresponding APDU on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    InitiateRequest = 0x01,
    ReadRequest = 0x05,
    WriteRequest = 0x06,
    InitiateResponse = 0x08,
    ReadResponse = 0x0C,
    WriteResponse = 0x0D,
    ConfirmedServiceError = 0x0E,
    DataNotification = 0x0F,
    GloReadRequest = 0x25,
    GloWriteRequest = 0x26,
    GloReadResponse = 0x2C,
    GloWriteResponse = 0x2D,
    Aarq = 0x60,
    Aare = 0x61,
    ReleaseRequest = 0x62,
    ReleaseResponse = 0x63,
    GetRequest = 0xC0,
    SetRequest = 0xC1,
    EventNotification = 0xC2,
    MethodRequest = 0xC3,
    GetResponse = 0xC4,
    SetResponse = 0xC5,
    MethodResponse = 0xC7,
    GloGetRequest = 0xC8,
    GloSetRequest = 0xC9,
    GloEventNotification = 0xCA,
    GloMethodRequest = 0xCB,
    GloGetResponse = 0xCC,
    GloSetResponse = 0xCD,
    GloMethodResponse = 0xCF,
    DedGetRequest = 0xD0,
    DedSetRequest = 0xD1,
    DedEventNotification = 0xD2,
    DedMethodRequest = 0xD3,
    DedGetResponse = 0xD4,
    DedSetResponse = 0xD5,
    DedMethodResponse = 0xD7,
    ExceptionResponse = 0xD8,
    GeneralGloCiphering = 0xDB,
    GeneralDedCiphering = 0xDC,
    GeneralBlockTransfer = 0xE0,
}

impl Command {
    /// Parse a command byte.
    pub fn from_value(value: u8) -> CosemResult<Self> {
        let cmd = match value {
            0x01 => Command::InitiateRequest,
            0x05 => Command::ReadRequest,
            0x06 => Command::WriteRequest,
            0x08 => Command::InitiateResponse,
            0x0C => Command::ReadResponse,
            0x0D => Command::WriteResponse,
            0x0E => Command::ConfirmedServiceError,
            0x0F => Command::DataNotification,
            0x25 => Command::GloReadRequest,
            0x26 => Command::GloWriteRequest,
            0x2C => Command::GloReadResponse,
            0x2D => Command::GloWriteResponse,
            0x60 => Command::Aarq,
            0x61 => Command::Aare,
            0x62 => Command::ReleaseRequest,
            0x63 => Command::ReleaseResponse,
            0xC0 => Command::GetRequest,
            0xC1 => Command::SetRequest,
            0xC2 => Command::EventNotification,
            0xC3 => Command::MethodRequest,
            0xC4 => Command::GetResponse,
            0xC5 => Command::SetResponse,
            0xC7 => Command::MethodResponse,
            0xC8 => Command::GloGetRequest,
            0xC9 => Command::GloSetRequest,
            0xCA => Command::GloEventNotification,
            0xCB => Command::GloMethodRequest,
            0xCC => Command::GloGetResponse,
            0xCD => Command::GloSetResponse,
            0xCF => Command::GloMethodResponse,
            0xD0 => Command::DedGetRequest,
            0xD1 => Command::DedSetRequest,
            0xD2 => Command::DedEventNotification,
            0xD3 => Command::DedMethodRequest,
            0xD4 => Command::DedGetResponse,
            0xD5 => Command::DedSetResponse,
            0xD7 => Command::DedMethodResponse,
            0xD8 => Command::ExceptionResponse,
            0xDB => Command::GeneralGloCiphering,
            0xDC => Command::GeneralDedCiphering,
            0xE0 => Command::GeneralBlockTransfer,
            _ => {
                return Err(CosemError::Protocol(format!(
                    "unknown command tag: 0x{value:02X}"
                )));
            }
        };
        Ok(cmd)
    }

    /// Get the wire tag
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Map a plain command to its ciphered counterpart.
    ///
    /// Defined for the five service commands and their responses only; asking
    /// for the ciphered form of anything else is a caller bug and reported as
    /// a protocol error.
    pub fn ciphered(self, dedicated: bool) -> CosemResult<Command> {
        let cmd = if dedicated {
            match self {
                Command::GetRequest => Command::DedGetRequest,
                Command::SetRequest => Command::DedSetRequest,
                Command::MethodRequest => Command::DedMethodRequest,
                Command::GetResponse => Command::DedGetResponse,
                Command::SetResponse => Command::DedSetResponse,
                Command::MethodResponse => Command::DedMethodResponse,
                _ => {
                    return Err(CosemError::Protocol(format!(
                        "command {self:?} has no dedicated ciphered form"
                    )));
                }
            }
        } else {
            match self {
                Command::GetRequest => Command::GloGetRequest,
                Command::SetRequest => Command::GloSetRequest,
                Command::MethodRequest => Command::GloMethodRequest,
                Command::GetResponse => Command::GloGetResponse,
                Command::SetResponse => Command::GloSetResponse,
                Command::MethodResponse => Command::GloMethodResponse,
                Command::ReadRequest => Command::GloReadRequest,
                Command::WriteRequest => Command::GloWriteRequest,
                Command::ReadResponse => Command::GloReadResponse,
                Command::WriteResponse => Command::GloWriteResponse,
                _ => {
                    return Err(CosemError::Protocol(format!(
                        "command {self:?} has no ciphered form"
                    )));
                }
            }
        };
        Ok(cmd)
    }

    /// Is this one of the ciphered (glo/ded/general) tags?
    pub fn is_ciphered(self) -> bool {
        matches!(
            self,
            Command::GloReadRequest
                | Command::GloWriteRequest
                | Command::GloReadResponse
                | Command::GloWriteResponse
                | Command::GloGetRequest
                | Command::GloSetRequest
                | Command::GloEventNotification
                | Command::GloMethodRequest
                | Command::GloGetResponse
                | Command::GloSetResponse
                | Command::GloMethodResponse
                | Command::DedGetRequest
                | Command::DedSetRequest
                | Command::DedEventNotification
                | Command::DedMethodRequest
                | Command::DedGetResponse
                | Command::DedSetResponse
                | Command::DedMethodResponse
                | Command::GeneralGloCiphering
                | Command::GeneralDedCiphering
        )
    }

    /// Is this a client-originated request that advances the invoke id?
    pub fn is_request(self) -> bool {
        matches!(
            self,
            Command::GetRequest
                | Command::SetRequest
                | Command::MethodRequest
                | Command::ReadRequest
                | Command::WriteRequest
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_round_trip() {
        for v in [0x05u8, 0x0C, 0x0F, 0x60, 0xC0, 0xC4, 0xD8, 0xDB, 0xE0] {
            assert_eq!(Command::from_value(v).unwrap().value(), v);
        }
        assert!(Command::from_value(0x44).is_err());
    }

    #[test]
    fn test_glo_mapping() {
        assert_eq!(
            Command::GetRequest.ciphered(false).unwrap(),
            Command::GloGetRequest
        );
        assert_eq!(
            Command::SetResponse.ciphered(false).unwrap(),
            Command::GloSetResponse
        );
        assert_eq!(
            Command::MethodRequest.ciphered(true).unwrap(),
            Command::DedMethodRequest
        );
        assert_eq!(
            Command::ReadRequest.ciphered(false).unwrap(),
            Command::GloReadRequest
        );
        assert!(Command::Aarq.ciphered(false).is_err());
        assert!(Command::DataNotification.ciphered(false).is_err());
    }
}

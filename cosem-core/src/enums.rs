//! Common protocol enumerations

use crate::error::{CosemError, CosemResult};

/// Physical framing used by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterfaceType {
    /// HDLC framing over a serial line or TCP (IEC 62056-46)
    #[default]
    Hdlc,
    /// Length-prefixed TCP/UDP wrapper (IEC 62056-47)
    Wrapper,
    /// S-FSK power line carrier
    Plc,
    /// HDLC framing carried over power line carrier
    PlcHdlc,
    /// Wired M-Bus (EN 13757-2)
    WiredMBus,
    /// Wireless M-Bus (EN 13757-4)
    WirelessMBus,
    /// Short message service transport
    Sms,
}

/// Request priority carried in the invoke-id byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Normal,
    #[default]
    High,
}

/// Confirmation class carried in the invoke-id byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceClass {
    Unconfirmed,
    #[default]
    Confirmed,
}

/// Data access result codes reported by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Ok,
    HardwareFault,
    TemporaryFailure,
    ReadWriteDenied,
    ObjectUndefined,
    InconsistentClass,
    ObjectUnavailable,
    TypeUnmatched,
    AccessViolated,
    DataBlockUnavailable,
    LongGetAborted,
    NoLongGetInProgress,
    LongSetAborted,
    NoLongSetInProgress,
    DataBlockNumberInvalid,
    OtherReason,
}

impl ErrorCode {
    /// Map a wire value to an error code. Unknown values collapse to
    /// `OtherReason`, the catch-all the standard reserves for them.
    pub fn from_value(value: u8) -> Self {
        match value {
            0 => ErrorCode::Ok,
            1 => ErrorCode::HardwareFault,
            2 => ErrorCode::TemporaryFailure,
            3 => ErrorCode::ReadWriteDenied,
            4 => ErrorCode::ObjectUndefined,
            9 => ErrorCode::InconsistentClass,
            11 => ErrorCode::ObjectUnavailable,
            12 => ErrorCode::TypeUnmatched,
            13 => ErrorCode::AccessViolated,
            14 => ErrorCode::DataBlockUnavailable,
            15 => ErrorCode::LongGetAborted,
            16 => ErrorCode::NoLongGetInProgress,
            17 => ErrorCode::LongSetAborted,
            18 => ErrorCode::NoLongSetInProgress,
            19 => ErrorCode::DataBlockNumberInvalid,
            _ => ErrorCode::OtherReason,
        }
    }

    /// Get the wire value
    pub fn value(self) -> u8 {
        match self {
            ErrorCode::Ok => 0,
            ErrorCode::HardwareFault => 1,
            ErrorCode::TemporaryFailure => 2,
            ErrorCode::ReadWriteDenied => 3,
            ErrorCode::ObjectUndefined => 4,
            ErrorCode::InconsistentClass => 9,
            ErrorCode::ObjectUnavailable => 11,
            ErrorCode::TypeUnmatched => 12,
            ErrorCode::AccessViolated => 13,
            ErrorCode::DataBlockUnavailable => 14,
            ErrorCode::LongGetAborted => 15,
            ErrorCode::NoLongGetInProgress => 16,
            ErrorCode::LongSetAborted => 17,
            ErrorCode::NoLongSetInProgress => 18,
            ErrorCode::DataBlockNumberInvalid => 19,
            ErrorCode::OtherReason => 250,
        }
    }
}

/// State error reported in an ExceptionResponse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionStateError {
    ServiceNotAllowed,
    ServiceUnknown,
}

impl ExceptionStateError {
    pub fn from_value(value: u8) -> CosemResult<Self> {
        match value {
            1 => Ok(ExceptionStateError::ServiceNotAllowed),
            2 => Ok(ExceptionStateError::ServiceUnknown),
            _ => Err(CosemError::Protocol(format!(
                "unknown exception state error: {value}"
            ))),
        }
    }
}

/// Service error reported in an ExceptionResponse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionServiceError {
    OperationNotPossible,
    ServiceNotSupported,
    OtherReason,
    PduTooLong,
    DecipheringError,
    InvocationCounterError,
}

impl ExceptionServiceError {
    pub fn from_value(value: u8) -> CosemResult<Self> {
        match value {
            1 => Ok(ExceptionServiceError::OperationNotPossible),
            2 => Ok(ExceptionServiceError::ServiceNotSupported),
            3 => Ok(ExceptionServiceError::OtherReason),
            4 => Ok(ExceptionServiceError::PduTooLong),
            5 => Ok(ExceptionServiceError::DecipheringError),
            6 => Ok(ExceptionServiceError::InvocationCounterError),
            _ => Err(CosemError::Protocol(format!(
                "unknown exception service error: {value}"
            ))),
        }
    }
}

/// Flags describing what is still outstanding for the current exchange.
///
/// `FRAME` means more transport frames of the same PDU are expected,
/// `BLOCK` means more data blocks of the same logical value are expected.
/// A PDU is complete iff no flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoreData(u8);

impl MoreData {
    pub const NONE: MoreData = MoreData(0);
    pub const FRAME: MoreData = MoreData(0x01);
    pub const BLOCK: MoreData = MoreData(0x02);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: MoreData) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: MoreData) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: MoreData) {
        self.0 &= !other.0;
    }
}

use thiserror::Error;

use crate::enums::{ExceptionServiceError, ExceptionStateError};

/// Main error type for COSEM protocol operations
#[derive(Error, Debug)]
pub enum CosemError {
    #[error("framing error: {0}")]
    Framing(String),

    #[error("address mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    AddressMismatch { expected: u32, received: u32 },

    #[error("invalid data block number: expected {expected}, received {received}")]
    BlockSequence { expected: u32, received: u32 },

    #[error("security error: {0}")]
    Security(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("exception response: state error {state:?}, service error {service:?}")]
    Exception {
        state: ExceptionStateError,
        service: ExceptionServiceError,
    },

    /// Not enough bytes in the buffer to finish a read. Back-pressure marker,
    /// converted into an `Incomplete`/partial-value signal by callers instead
    /// of reaching the application as a fatal error.
    #[error("buffer underflow")]
    OutOfData,
}

/// Result type alias for COSEM protocol operations
pub type CosemResult<T> = Result<T, CosemError>;

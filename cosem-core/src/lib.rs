//! Core types and utilities for the COSEM protocol engine
//!
//! This crate holds the pieces every layer shares: the error taxonomy, the
//! command tags, the read-cursor byte buffer, OBIS codes, the application
//! data container, the per-connection session state and the cipher
//! collaborator trait.

pub mod buffer;
pub mod command;
pub mod datatypes;
pub mod enums;
pub mod error;
pub mod obis_code;
pub mod security;
pub mod settings;

pub use buffer::{ByteBuffer, object_count_size};
pub use command::Command;
pub use datatypes::{BitString, DataObject};
pub use enums::{
    ErrorCode, ExceptionServiceError, ExceptionStateError, InterfaceType, MoreData, Priority,
    ServiceClass,
};
pub use error::{CosemError, CosemResult};
pub use obis_code::ObisCode;
pub use security::{Cipher, Security, SystemTitle};
pub use settings::{HdlcSettings, INITIAL_BLOCK_INDEX, Settings};

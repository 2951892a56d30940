//! Security layer for the COSEM protocol engine
//!
//! Implements the `Cipher` collaborator the segmenter and dispatcher call
//! into: AES-128-GCM ciphering of glo/ded APDUs (suite 0). Key management
//! and high-level-security authentication belong to association negotiation
//! and are out of scope here.

pub mod control;
pub mod gcm;

pub use control::SecurityControl;
pub use gcm::GcmCipher;

//! A-XDR encoding and decoding for COSEM application data
//!
//! The protocol engine treats this codec as a collaborator: the dispatcher
//! decodes response payloads through it and request builders encode
//! parameters with it.

pub mod decoder;
pub mod encoder;
pub mod types;

pub use decoder::{AxdrDecoder, decode};
pub use encoder::{AxdrEncoder, encode};
pub use types::AxdrTag;

//! COSEM protocol engine - main entry point
//!
//! Re-exports the layered crates: core types, the A-XDR value codec, the
//! HDLC/Wrapper session codecs, glo/ded ciphering and the application layer
//! (segmenter, reassembler, dispatcher).

pub use cosem_application as application;
pub use cosem_axdr as axdr;
pub use cosem_security as security;
pub use cosem_session as session;

pub use cosem_application::{
    FeedStatus, LnParameters, ReplyData, SnParameters, get_data, get_ln_messages, get_sn_messages,
};
pub use cosem_core::{
    ByteBuffer, Command, CosemError, CosemResult, DataObject, InterfaceType, MoreData, ObisCode,
    Security, Settings, SystemTitle,
};
pub use cosem_security::GcmCipher;

//! Application layer of the COSEM protocol engine
//!
//! Three cooperating pieces drive an exchange:
//!
//! - the [`segmenter`] turns one logical APDU into size-bounded, optionally
//!   ciphered wire frames;
//! - the [`reassembler`] consumes received bytes through the framing codecs
//!   and accumulates fragments into a complete PDU;
//! - the [`dispatcher`] interprets the assembled PDU, transparently
//!   unwrapping ciphered and general-block-transfer envelopes.
//!
//! The engine is synchronous and sans-io: one `Settings` plus one
//! [`reply::ReplyData`] serialize all activity for a logical link, and
//! "not enough bytes yet" is a return value, never a blocking wait.

pub mod dispatcher;
pub mod objects;
pub mod reassembler;
pub mod reply;
pub mod segmenter;

pub use dispatcher::get_pdu;
pub use objects::{CosemObject, ObjectType, create_object};
pub use reassembler::{FeedStatus, get_data};
pub use reply::ReplyData;
pub use segmenter::{LnParameters, NO_STATUS, SnParameters, get_ln_messages, get_sn_messages};

//! Session layer for the COSEM protocol engine
//!
//! Sans-io codecs for the two main framings: HDLC (IEC 62056-46) and the
//! TCP/UDP wrapper (IEC 62056-47). "Not enough bytes yet" is returned as a
//! value, never awaited, so the codecs compose with any I/O model.

pub mod hdlc;
pub mod wrapper;

pub use hdlc::{Fcs16, FrameType, HDLC_FLAG, HdlcAddress, HdlcFrame, build_frame, parse_frame};
pub use wrapper::{WRAPPER_HEADER_LENGTH, WRAPPER_VERSION, build_wrapper, parse_wrapper};

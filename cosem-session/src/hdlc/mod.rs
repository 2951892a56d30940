//! HDLC session layer

pub mod address;
pub mod fcs;
pub mod frame;

pub use address::HdlcAddress;
pub use fcs::Fcs16;
pub use frame::{
    FRAME_FORMAT_TYPE3, FrameType, HDLC_FLAG, HdlcFrame, LLC_REQUEST, LLC_RESPONSE,
    SEGMENTATION_BIT, build_frame, parse_frame,
};

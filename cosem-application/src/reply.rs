//! Reply accumulator
//!
//! One `ReplyData` per in-flight exchange. Transport fragments accumulate in
//! `data`, the dispatcher interprets them in place, and data-block fragments
//! merge into `value` until `more_data` is empty. Never reuse an accumulator
//! across unrelated exchanges; a stale cursor or cipher index would corrupt
//! the next decode.

use cosem_core::{ByteBuffer, Command, DataObject, ErrorCode, MoreData};

#[derive(Debug, Default)]
pub struct ReplyData {
    /// Raw PDU bytes with the read cursor.
    pub data: ByteBuffer,
    /// Command of the PDU being interpreted, once known.
    pub command: Option<Command>,
    /// Command subtype (normal / with-datablock / with-list).
    pub command_type: u8,
    /// Outstanding transport frames and data blocks.
    pub more_data: MoreData,
    /// Peer-reported data access result, zero when none.
    pub error: u8,
    /// Decoded value, merged element-wise for streamed arrays.
    pub value: Option<DataObject>,
    /// Expected element count of a streamed array.
    pub total_count: usize,
    /// Resume cursor of the value stream across data blocks; `None` until
    /// the stream starts.
    pub read_position: Option<usize>,
    /// Parse without consuming: the cursor is restored after interpretation
    /// and the terminal resets are skipped.
    pub peek: bool,
    /// Offset just past the most recently unwrapped ciphered payload.
    pub cipher_index: usize,
    /// Invoke id echoed by the peer.
    pub invoke_id: u8,
    /// Long invoke id of a DataNotification.
    pub long_invoke_id: u32,
    /// Block number of the latest data block or GBT envelope.
    pub block_number: u32,
    /// Acknowledged block number from a GBT envelope or a set response.
    pub block_number_ack: u32,
    /// GBT streaming flag.
    pub streaming: bool,
    /// GBT window size.
    pub window_size: u8,
    /// Raw date-time octets from a notification header.
    pub time: Option<Vec<u8>>,
}

impl ReplyData {
    pub fn new() -> Self {
        Self::default()
    }

    /// A PDU is complete iff nothing more is outstanding.
    pub fn is_complete(&self) -> bool {
        self.more_data.is_none()
    }

    pub fn has_error(&self) -> bool {
        self.error != 0
    }

    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from_value(self.error)
    }
}

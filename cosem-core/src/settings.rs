//! Per-connection session state
//!
//! One `Settings` value lives for the whole logical link and is threaded
//! through every build and parse call. It is owned by the connection, never
//! global; independent sessions each carry their own instance.

use crate::enums::{InterfaceType, Priority, ServiceClass};
use crate::security::Cipher;
use std::fmt;

/// Starting block number of a multi-block transfer.
pub const INITIAL_BLOCK_INDEX: u32 = 1;

/// Default maximum PDU size before negotiation.
pub const DEFAULT_MAX_PDU_SIZE: u16 = 0xFFFF;

/// Default HDLC information field size before negotiation.
pub const DEFAULT_MAX_INFO_LENGTH: u16 = 128;

/// Negotiated HDLC link parameters and the frame sequence counters.
///
/// The N(S)/N(R) counters are maintained and emitted on every I-frame;
/// window-based retransmission is left to the transport collaborator.
#[derive(Debug, Clone)]
pub struct HdlcSettings {
    pub max_info_tx: u16,
    pub max_info_rx: u16,
    pub window_size_tx: u8,
    pub window_size_rx: u8,
    send_sequence: u8,
    receive_sequence: u8,
}

impl Default for HdlcSettings {
    fn default() -> Self {
        Self {
            max_info_tx: DEFAULT_MAX_INFO_LENGTH,
            max_info_rx: DEFAULT_MAX_INFO_LENGTH,
            window_size_tx: 1,
            window_size_rx: 1,
            send_sequence: 0,
            receive_sequence: 0,
        }
    }
}

impl HdlcSettings {
    /// Control byte for the next outgoing I-frame (final bit set), advancing
    /// N(S).
    pub fn next_send(&mut self) -> u8 {
        let control = 0x10 | (self.receive_sequence << 5) | (self.send_sequence << 1);
        self.send_sequence = (self.send_sequence + 1) % 8;
        control
    }

    /// Control byte for a receiver-ready frame acknowledging the current
    /// N(R).
    pub fn receiver_ready(&self) -> u8 {
        0x11 | (self.receive_sequence << 5)
    }

    /// Record the send sequence number of a received I-frame.
    pub fn update_receive_sequence(&mut self, send_sequence: u8) {
        self.receive_sequence = (send_sequence + 1) % 8;
    }

    pub fn reset_sequences(&mut self) {
        self.send_sequence = 0;
        self.receive_sequence = 0;
    }
}

/// Session state for one logical link.
pub struct Settings {
    pub client_address: u32,
    pub server_address: u32,
    /// Forced server address byte length (1, 2 or 4); 0 selects the shortest
    /// encoding.
    pub server_address_size: u8,
    pub interface_type: InterfaceType,
    pub use_logical_name_referencing: bool,
    pub max_pdu_size: u16,
    pub is_server: bool,
    pub priority: Priority,
    pub service_class: ServiceClass,
    pub gbt_window_size: u8,
    pub cipher: Option<Box<dyn Cipher>>,
    pub hdlc: HdlcSettings,
    invoke_id: u8,
    long_invoke_id: u32,
    block_index: u32,
}

impl Settings {
    /// Client-side session state talking to `server_address`.
    pub fn new(client_address: u32, server_address: u32) -> Self {
        Self {
            client_address,
            server_address,
            server_address_size: 0,
            interface_type: InterfaceType::Hdlc,
            use_logical_name_referencing: true,
            max_pdu_size: DEFAULT_MAX_PDU_SIZE,
            is_server: false,
            priority: Priority::default(),
            service_class: ServiceClass::default(),
            gbt_window_size: 1,
            cipher: None,
            hdlc: HdlcSettings::default(),
            invoke_id: 0,
            long_invoke_id: 1,
            block_index: INITIAL_BLOCK_INDEX,
        }
    }

    /// Server-side session state.
    pub fn new_server(client_address: u32, server_address: u32) -> Self {
        let mut settings = Self::new(client_address, server_address);
        settings.is_server = true;
        settings
    }

    pub fn with_interface_type(mut self, interface_type: InterfaceType) -> Self {
        self.interface_type = interface_type;
        self
    }

    pub fn with_max_pdu_size(mut self, max_pdu_size: u16) -> Self {
        self.max_pdu_size = max_pdu_size;
        self
    }

    pub fn with_short_name_referencing(mut self) -> Self {
        self.use_logical_name_referencing = false;
        self
    }

    pub fn with_cipher(mut self, cipher: Box<dyn Cipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    pub fn invoke_id(&self) -> u8 {
        self.invoke_id
    }

    pub fn set_invoke_id(&mut self, invoke_id: u8) {
        self.invoke_id = invoke_id & 0x0F;
    }

    /// Advance the invoke id (wraps 0-15) and return the new value.
    pub fn next_invoke_id(&mut self) -> u8 {
        self.invoke_id = (self.invoke_id + 1) & 0x0F;
        self.invoke_id
    }

    /// Invoke-id byte: bit 7 priority, bit 6 service class, low nibble id.
    pub fn invoke_id_priority(&self) -> u8 {
        let mut value = self.invoke_id & 0x0F;
        if self.priority == Priority::High {
            value |= 0x80;
        }
        if self.service_class == ServiceClass::Confirmed {
            value |= 0x40;
        }
        value
    }

    /// Long invoke id word for DataNotification: bit 31 priority, bit 30
    /// service class, low 24 bits a wrapping counter.
    pub fn next_long_invoke_id(&mut self) -> u32 {
        let mut value = self.long_invoke_id & 0x00FF_FFFF;
        if self.priority == Priority::High {
            value |= 0x8000_0000;
        }
        if self.service_class == ServiceClass::Confirmed {
            value |= 0x4000_0000;
        }
        self.long_invoke_id = (self.long_invoke_id + 1) & 0x00FF_FFFF;
        value
    }

    pub fn block_index(&self) -> u32 {
        self.block_index
    }

    pub fn set_block_index(&mut self, block_index: u32) {
        self.block_index = block_index;
    }

    pub fn increase_block_index(&mut self) {
        self.block_index = self.block_index.wrapping_add(1);
    }

    pub fn reset_block_index(&mut self) {
        self.block_index = INITIAL_BLOCK_INDEX;
    }

    /// Restore the negotiable state for a reconnect.
    pub fn reset(&mut self) {
        self.invoke_id = 0;
        self.long_invoke_id = 1;
        self.block_index = INITIAL_BLOCK_INDEX;
        self.hdlc.reset_sequences();
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("client_address", &self.client_address)
            .field("server_address", &self.server_address)
            .field("interface_type", &self.interface_type)
            .field("is_server", &self.is_server)
            .field("max_pdu_size", &self.max_pdu_size)
            .field("invoke_id", &self.invoke_id)
            .field("block_index", &self.block_index)
            .field("ciphered", &self.cipher.is_some())
            .finish()
    }
}

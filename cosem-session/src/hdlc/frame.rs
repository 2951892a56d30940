//! HDLC frame building and parsing
//!
//! Sans-io codec: `build_frame` turns a payload chunk into wire bytes and
//! `parse_frame` extracts one frame from a receive buffer, reporting
//! `Ok(None)` when more bytes are needed.

use crate::hdlc::address::HdlcAddress;
use crate::hdlc::fcs::Fcs16;
use bytes::{BufMut, BytesMut};
use cosem_core::{ByteBuffer, CosemError, CosemResult, Settings};
use log::debug;

/// HDLC frame delimiter
pub const HDLC_FLAG: u8 = 0x7E;

/// Frame format type 3
pub const FRAME_FORMAT_TYPE3: u8 = 0xA0;

/// Segmentation bit in the frame format byte
pub const SEGMENTATION_BIT: u8 = 0x08;

/// LLC header on client-to-server information frames
pub const LLC_REQUEST: [u8; 3] = [0xE6, 0xE6, 0x00];

/// LLC header on server-to-client information frames
pub const LLC_RESPONSE: [u8; 3] = [0xE6, 0xE7, 0x00];

/// HDLC frame type, classified from the control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Information,
    ReceiveReady,
    ReceiveNotReady,
    Snrm,
    Disconnect,
    UnnumberedAcknowledge,
    DisconnectMode,
    FrameReject,
    UnnumberedInformation,
}

impl FrameType {
    /// Classify a control byte; the poll/final bit is ignored.
    pub fn from_control_byte(control: u8) -> CosemResult<Self> {
        let frame_type = match control {
            x if x & 0x01 == 0x00 => FrameType::Information,
            x if x & 0x0F == 0x01 => FrameType::ReceiveReady,
            x if x & 0x0F == 0x05 => FrameType::ReceiveNotReady,
            x if x & 0xEF == 0x83 => FrameType::Snrm,
            x if x & 0xEF == 0x43 => FrameType::Disconnect,
            x if x & 0xEF == 0x63 => FrameType::UnnumberedAcknowledge,
            x if x & 0xEF == 0x0F => FrameType::DisconnectMode,
            x if x & 0xEF == 0x87 => FrameType::FrameReject,
            x if x & 0xEF == 0xC0 => FrameType::UnnumberedInformation,
            _ => {
                return Err(CosemError::Framing(format!(
                    "unknown control byte: 0x{control:02X}"
                )));
            }
        };
        Ok(frame_type)
    }

    /// Control byte for an unnumbered frame, poll/final bit set.
    pub fn to_control_byte(self) -> u8 {
        match self {
            FrameType::Information => 0x10,
            FrameType::ReceiveReady => 0x11,
            FrameType::ReceiveNotReady => 0x15,
            FrameType::Snrm => 0x93,
            FrameType::Disconnect => 0x53,
            FrameType::UnnumberedAcknowledge => 0x73,
            FrameType::DisconnectMode => 0x1F,
            FrameType::FrameReject => 0x97,
            FrameType::UnnumberedInformation => 0xD0,
        }
    }
}

/// One parsed HDLC frame. Never persisted beyond the parse call that
/// produced it; the payload has the LLC header already stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct HdlcFrame {
    frame_type: FrameType,
    control: u8,
    segmented: bool,
    source: HdlcAddress,
    destination: HdlcAddress,
    payload: Vec<u8>,
}

impl HdlcFrame {
    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    /// True when the segmentation bit was set: more frames of the same PDU
    /// follow.
    pub fn is_segmented(&self) -> bool {
        self.segmented
    }

    pub fn source(&self) -> HdlcAddress {
        self.source
    }

    pub fn destination(&self) -> HdlcAddress {
        self.destination
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// N(S) of an information frame.
    pub fn send_sequence(&self) -> Option<u8> {
        match self.frame_type {
            FrameType::Information => Some((self.control >> 1) & 0x07),
            _ => None,
        }
    }

    /// N(R) of an information or supervisory frame.
    pub fn receive_sequence(&self) -> Option<u8> {
        match self.frame_type {
            FrameType::Information | FrameType::ReceiveReady | FrameType::ReceiveNotReady => {
                Some((self.control >> 5) & 0x07)
            }
            _ => None,
        }
    }
}

fn station_addresses(settings: &Settings) -> CosemResult<(HdlcAddress, HdlcAddress)> {
    // (destination, source) from the sender's point of view
    let client = HdlcAddress::from_value(settings.client_address, 0)?;
    let server = HdlcAddress::from_value(settings.server_address, settings.server_address_size)?;
    if settings.is_server {
        Ok((client, server))
    } else {
        Ok((server, client))
    }
}

/// Build one HDLC frame.
///
/// `control` of zero produces the next I-frame control byte from the session
/// sequence counters. When `data` holds more than the negotiated information
/// field size, only the first chunk is framed, the segmentation bit is set
/// and the buffer cursor advances past the consumed bytes; the caller loops
/// until the buffer is drained.
pub fn build_frame(
    settings: &mut Settings,
    control: u8,
    data: Option<&mut ByteBuffer>,
) -> CosemResult<Vec<u8>> {
    let (destination, source) = station_addresses(settings)?;
    let control = if control == 0 {
        settings.hdlc.next_send()
    } else {
        control
    };

    let (chunk_len, segmented) = match &data {
        Some(d) => {
            let max_info = settings.hdlc.max_info_tx as usize;
            (d.available().min(max_info), d.available() > max_info)
        }
        None => (0, false),
    };

    let destination_bytes = destination.encode();
    let source_bytes = source.encode();
    // Everything between the flags: format+length, addresses, control, HCS,
    // and the payload with its own FCS when present.
    let mut frame_len = 2 + destination_bytes.len() + source_bytes.len() + 1 + 2;
    if chunk_len > 0 {
        frame_len += chunk_len + 2;
    }
    if frame_len > 0x07FF {
        return Err(CosemError::InvalidData(format!(
            "HDLC frame length {frame_len} exceeds the 11-bit length field"
        )));
    }

    let mut buf = BytesMut::with_capacity(frame_len + 2);
    buf.put_u8(HDLC_FLAG);
    let mut format = FRAME_FORMAT_TYPE3 | ((frame_len >> 8) as u8 & 0x07);
    if segmented {
        format |= SEGMENTATION_BIT;
    }
    buf.put_u8(format);
    buf.put_u8(frame_len as u8);
    buf.put_slice(&destination_bytes);
    buf.put_slice(&source_bytes);
    buf.put_u8(control);
    let hcs = Fcs16::digest(&buf[1..]);
    buf.put_u8((hcs & 0xFF) as u8);
    buf.put_u8((hcs >> 8) as u8);

    if let Some(data) = data {
        if chunk_len > 0 {
            buf.put_slice(&data.remaining()[..chunk_len]);
            let consumed = data.position() + chunk_len;
            data.set_position(consumed);
            let fcs = Fcs16::digest(&buf[1..]);
            buf.put_u8((fcs & 0xFF) as u8);
            buf.put_u8((fcs >> 8) as u8);
        }
    }
    buf.put_u8(HDLC_FLAG);

    Ok(buf.to_vec())
}

/// Extract one HDLC frame from the receive buffer.
///
/// Scans forward for the opening flag, skipping interleaved garbage and
/// frames echoed back by the medium. Returns `Ok(None)` with the cursor
/// restored to the frame start when the frame is not yet complete.
pub fn parse_frame(settings: &Settings, data: &mut ByteBuffer) -> CosemResult<Option<HdlcFrame>> {
    loop {
        let slice = data.as_slice();
        let total = slice.len();
        let mut start = data.position();
        while start < total && slice[start] != HDLC_FLAG {
            start += 1;
        }
        if start >= total || total - start < 9 {
            return Ok(None);
        }
        if start > data.position() {
            debug!("skipped {} bytes of garbage before HDLC flag", start - data.position());
        }

        let format = slice[start + 1];
        if format & 0xF0 != FRAME_FORMAT_TYPE3 {
            // A stray flag, e.g. the closing flag of a previous frame.
            data.set_position(start + 1);
            continue;
        }
        let segmented = format & SEGMENTATION_BIT != 0;
        let frame_len = ((format as usize & 0x07) << 8) | slice[start + 2] as usize;
        // format, length, two one-byte addresses, control and the checksum
        if frame_len < 7 {
            return Err(CosemError::Framing(format!(
                "declared frame length {frame_len} is too short"
            )));
        }
        let eop = start + 1 + frame_len;
        if eop >= total {
            data.set_position(start);
            return Ok(None);
        }
        if slice[eop] != HDLC_FLAG {
            return Err(CosemError::Framing(format!(
                "missing closing flag at offset {eop}"
            )));
        }

        let mut pos = start + 3;
        let (destination, consumed) = decode_address(&slice[pos..eop])?;
        pos += consumed;
        let (source, consumed) = decode_address(&slice[pos..eop])?;
        pos += consumed;
        if pos >= eop {
            return Err(CosemError::Framing("frame too short for control byte".to_string()));
        }
        let control = slice[pos];
        pos += 1;

        // A station on a shared medium may read back its own frame; skip it
        // and keep scanning.
        let (own, peer) = if settings.is_server {
            (settings.server_address, settings.client_address)
        } else {
            (settings.client_address, settings.server_address)
        };
        if destination.value() == peer && source.value() == own {
            debug!("skipping echoed frame to {destination}");
            data.set_position(eop + 1);
            continue;
        }
        if destination.value() != own {
            return Err(CosemError::AddressMismatch {
                expected: own,
                received: destination.value(),
            });
        }
        if source.value() != peer {
            return Err(CosemError::AddressMismatch {
                expected: peer,
                received: source.value(),
            });
        }

        if pos + 2 > eop {
            return Err(CosemError::Framing("frame too short for checksum".to_string()));
        }
        let received_hcs = slice[pos] as u16 | (slice[pos + 1] as u16) << 8;
        if Fcs16::digest(&slice[start + 1..pos]) != received_hcs {
            return Err(CosemError::Framing("header checksum mismatch".to_string()));
        }
        pos += 2;

        let payload = if pos < eop {
            if eop - pos < 2 {
                return Err(CosemError::Framing("malformed information field".to_string()));
            }
            let received_fcs = slice[eop - 2] as u16 | (slice[eop - 1] as u16) << 8;
            if Fcs16::digest(&slice[start + 1..eop - 2]) != received_fcs {
                return Err(CosemError::Framing("frame checksum mismatch".to_string()));
            }
            slice[pos..eop - 2].to_vec()
        } else {
            Vec::new()
        };

        let frame_type = FrameType::from_control_byte(control)?;
        let mut payload = payload;
        if matches!(
            frame_type,
            FrameType::Information | FrameType::UnnumberedInformation
        ) && payload.len() >= 3
            && payload[0] == 0xE6
            && (payload[1] == 0xE6 || payload[1] == 0xE7)
            && payload[2] == 0x00
        {
            payload.drain(..3);
        }

        data.set_position(eop + 1);
        return Ok(Some(HdlcFrame {
            frame_type,
            control,
            segmented,
            source,
            destination,
            payload,
        }));
    }
}

fn decode_address(data: &[u8]) -> CosemResult<(HdlcAddress, usize)> {
    HdlcAddress::decode(data).map_err(|e| match e {
        CosemError::OutOfData => CosemError::Framing("truncated HDLC address".to_string()),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosem_core::InterfaceType;

    fn client_settings() -> Settings {
        Settings::new(16, 1).with_interface_type(InterfaceType::Hdlc)
    }

    fn server_settings() -> Settings {
        Settings::new_server(16, 1).with_interface_type(InterfaceType::Hdlc)
    }

    /// Build on one side, parse on the other.
    fn round_trip(payload_len: usize) {
        let mut server = server_settings();
        let client = client_settings();
        let payload: Vec<u8> = (0..payload_len).map(|i| i as u8).collect();
        let mut data = ByteBuffer::from(payload.as_slice());
        let frame_bytes = build_frame(&mut server, 0, Some(&mut data)).unwrap();

        let mut rx = ByteBuffer::from(frame_bytes.as_slice());
        let frame = parse_frame(&client, &mut rx).unwrap().unwrap();
        let max_info = client.hdlc.max_info_tx as usize;
        let expected = &payload[..payload_len.min(max_info)];
        assert_eq!(frame.payload(), expected);
        assert_eq!(frame.is_segmented(), payload_len > max_info);
        assert_eq!(rx.position(), rx.len());
    }

    #[test]
    fn test_round_trip_payload_sizes() {
        let max_info = Settings::new(16, 1).hdlc.max_info_tx as usize;
        for len in [0, max_info - 1, max_info, max_info + 1] {
            round_trip(len);
        }
    }

    #[test]
    fn test_segmentation_consumes_cursor() {
        let mut client = client_settings();
        let payload = vec![0x42u8; 300];
        let mut data = ByteBuffer::from(payload.as_slice());
        let first = build_frame(&mut client, 0, Some(&mut data)).unwrap();
        assert_eq!(data.position(), 128);
        assert_ne!(first[1] & SEGMENTATION_BIT, 0);
        let second = build_frame(&mut client, 0, Some(&mut data)).unwrap();
        assert_eq!(data.position(), 256);
        assert_ne!(second[1] & SEGMENTATION_BIT, 0);
        let third = build_frame(&mut client, 0, Some(&mut data)).unwrap();
        assert_eq!(data.position(), 300);
        assert_eq!(third[1] & SEGMENTATION_BIT, 0);
    }

    #[test]
    fn test_incomplete_prefixes_leave_cursor_unchanged() {
        let mut server = server_settings();
        let mut payload = ByteBuffer::from(&[0xC0u8, 0x01, 0xC1][..]);
        let frame_bytes = build_frame(&mut server, 0, Some(&mut payload)).unwrap();

        let client = client_settings();
        let mut rx = ByteBuffer::new();
        for (i, byte) in frame_bytes.iter().enumerate() {
            rx.set(&[*byte]);
            let result = parse_frame(&client, &mut rx).unwrap();
            if i + 1 < frame_bytes.len() {
                assert!(result.is_none(), "byte {i} should be incomplete");
                assert_eq!(rx.position(), 0);
            } else {
                assert!(result.is_some());
                assert_eq!(rx.position(), rx.len());
            }
        }
    }

    #[test]
    fn test_single_bit_corruption_is_detected() {
        let mut server = server_settings();
        let mut payload = ByteBuffer::from(&[0x01u8, 0x02, 0x03, 0x04][..]);
        let frame_bytes = build_frame(&mut server, 0, Some(&mut payload)).unwrap();

        let client = client_settings();
        for i in 0..frame_bytes.len() {
            for bit in 0..8 {
                let mut corrupted = frame_bytes.clone();
                corrupted[i] ^= 1 << bit;
                let mut rx = ByteBuffer::from(corrupted.as_slice());
                let result = parse_frame(&client, &mut rx);
                assert!(
                    !matches!(result, Ok(Some(_))),
                    "corruption at byte {i} bit {bit} went unnoticed"
                );
            }
        }
    }

    #[test]
    fn test_garbage_before_frame_is_skipped() {
        let mut server = server_settings();
        let mut payload = ByteBuffer::from(&[0xAAu8, 0xBB][..]);
        let frame_bytes = build_frame(&mut server, 0, Some(&mut payload)).unwrap();

        let client = client_settings();
        let mut rx = ByteBuffer::new();
        rx.set(&[0x00, 0xFF, 0x13]);
        rx.set(&frame_bytes);
        let frame = parse_frame(&client, &mut rx).unwrap().unwrap();
        assert_eq!(frame.payload(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_own_echo_is_skipped() {
        let mut client = client_settings();
        let mut payload = ByteBuffer::from(&[0x10u8, 0x20][..]);
        let echoed = build_frame(&mut client, 0, Some(&mut payload)).unwrap();

        let mut server = server_settings();
        let mut reply_payload = ByteBuffer::from(&[0x33u8][..]);
        let reply = build_frame(&mut server, 0, Some(&mut reply_payload)).unwrap();

        // The client sees its own frame first, then the reply.
        let mut rx = ByteBuffer::new();
        rx.set(&echoed);
        rx.set(&reply);
        let frame = parse_frame(&client, &mut rx).unwrap().unwrap();
        assert_eq!(frame.payload(), &[0x33]);
    }

    #[test]
    fn test_address_mismatch_is_fatal() {
        let mut server = server_settings();
        let mut payload = ByteBuffer::from(&[0x01u8][..]);
        let frame_bytes = build_frame(&mut server, 0, Some(&mut payload)).unwrap();

        let other_client = Settings::new(17, 1);
        let mut rx = ByteBuffer::from(frame_bytes.as_slice());
        assert!(matches!(
            parse_frame(&other_client, &mut rx),
            Err(CosemError::AddressMismatch { .. })
        ));
    }

    #[test]
    fn test_snrm_control_classification() {
        assert_eq!(
            FrameType::from_control_byte(FrameType::Snrm.to_control_byte()).unwrap(),
            FrameType::Snrm
        );
        assert_eq!(
            FrameType::from_control_byte(0x73).unwrap(),
            FrameType::UnnumberedAcknowledge
        );
        assert!(FrameType::from_control_byte(0xAB).is_err());
    }
}

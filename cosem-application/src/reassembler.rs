//! Reply reassembler
//!
//! Consumes raw received bytes through the framing codecs, accumulates
//! transport fragments into a complete PDU and hands the result to the
//! command dispatcher. "Not enough bytes yet" is a status value, never an
//! error, so the caller can feed data from any I/O model.

use crate::dispatcher;
use crate::reply::ReplyData;
use cosem_core::{ByteBuffer, CosemError, CosemResult, InterfaceType, MoreData, Settings};
use cosem_session::hdlc::{FrameType, parse_frame};
use cosem_session::wrapper::parse_wrapper;
use log::debug;

/// Outcome of feeding received bytes to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// No complete transport frame yet; supply more bytes.
    Incomplete,
    /// A frame was consumed but the PDU continues in following frames.
    FrameBoundary,
    /// A PDU was interpreted; inspect the reply for value, error and
    /// outstanding block flags.
    PduReady,
}

/// Extract one transport frame from `data` and advance the exchange.
///
/// On `PduReady` the reply's `more_data` tells whether a next-block request
/// is still owed; feed the peer's answer through the same accumulator.
pub fn get_data(
    settings: &mut Settings,
    data: &mut ByteBuffer,
    reply: &mut ReplyData,
) -> CosemResult<FeedStatus> {
    match settings.interface_type {
        InterfaceType::Hdlc | InterfaceType::PlcHdlc => {
            let Some(frame) = parse_frame(settings, data)? else {
                return Ok(FeedStatus::Incomplete);
            };
            match frame.frame_type() {
                FrameType::Information | FrameType::UnnumberedInformation => {
                    if let Some(ns) = frame.send_sequence() {
                        settings.hdlc.update_receive_sequence(ns);
                    }
                    let segmented = frame.is_segmented();
                    reply.data.set(frame.payload());
                    if segmented {
                        reply.more_data.insert(MoreData::FRAME);
                        return Ok(FeedStatus::FrameBoundary);
                    }
                    reply.more_data.remove(MoreData::FRAME);
                }
                FrameType::ReceiveReady => {
                    debug!(
                        "receiver ready, N(R) = {}",
                        frame.receive_sequence().unwrap_or(0)
                    );
                    return Ok(FeedStatus::FrameBoundary);
                }
                other => {
                    // SNRM/UA/DISC/DM carry link negotiation parameters, not
                    // COSEM PDUs; hand the payload up undecoded.
                    debug!("link frame {other:?}");
                    reply.data.set(frame.payload());
                    return Ok(FeedStatus::PduReady);
                }
            }
        }
        InterfaceType::Wrapper => {
            let Some(payload) = parse_wrapper(settings, data)? else {
                return Ok(FeedStatus::Incomplete);
            };
            reply.data.set(&payload);
        }
        other => {
            return Err(CosemError::Protocol(format!(
                "interface type {other:?} is not supported by this engine"
            )));
        }
    }

    dispatcher::get_pdu(settings, reply)?;
    Ok(FeedStatus::PduReady)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::{LnParameters, get_ln_messages};
    use cosem_core::{Command, DataObject, INITIAL_BLOCK_INDEX, Security, SystemTitle};
    use cosem_security::GcmCipher;

    fn wrapper_pair() -> (Settings, Settings) {
        (
            Settings::new_server(16, 1).with_interface_type(InterfaceType::Wrapper),
            Settings::new(16, 1).with_interface_type(InterfaceType::Wrapper),
        )
    }

    fn feed_all(
        client: &mut Settings,
        frames: &[Vec<u8>],
        reply: &mut ReplyData,
    ) -> CosemResult<()> {
        for frame in frames {
            let mut rx = ByteBuffer::from(frame.as_slice());
            let status = get_data(client, &mut rx, reply)?;
            assert_eq!(status, FeedStatus::PduReady);
        }
        Ok(())
    }

    fn sample_array(rows: u16) -> DataObject {
        DataObject::Array(
            (0..rows)
                .map(|i| {
                    DataObject::Structure(vec![
                        DataObject::OctetString(vec![1, 0, 1, 8, 0, 255]),
                        DataObject::Unsigned16(i),
                    ])
                })
                .collect(),
        )
    }

    #[test]
    fn test_get_response_normal_round_trip() {
        let (mut server, mut client) = wrapper_pair();
        let value = DataObject::Unsigned32(0x0102_0304);
        let mut data = ByteBuffer::from(cosem_axdr::encode(&value).unwrap());
        let mut p = LnParameters::response(Command::GetResponse, 1, 0);
        let frames = get_ln_messages(&mut server, &mut p, &mut data).unwrap();
        assert_eq!(frames.len(), 1);

        let mut reply = ReplyData::new();
        feed_all(&mut client, &frames, &mut reply).unwrap();
        assert!(reply.is_complete());
        assert_eq!(reply.command, Some(Command::GetResponse));
        assert_eq!(reply.value, Some(value));
    }

    #[test]
    fn test_block_reconstruction_matches_unsegmented_decode() {
        let value = sample_array(40);
        let encoded = cosem_axdr::encode(&value).unwrap();

        // segmented under a small negotiated PDU size
        let (mut server, mut client) = wrapper_pair();
        server.max_pdu_size = 64;
        let mut data = ByteBuffer::from(encoded.as_slice());
        let mut p = LnParameters::response(Command::GetResponse, 2, 0);
        p.multiple_blocks = true;
        let frames = get_ln_messages(&mut server, &mut p, &mut data).unwrap();
        assert!(frames.len() > 1);

        let mut reply = ReplyData::new();
        for (i, frame) in frames.iter().enumerate() {
            let mut rx = ByteBuffer::from(frame.as_slice());
            assert_eq!(get_data(&mut client, &mut rx, &mut reply).unwrap(), FeedStatus::PduReady);
            if i + 1 < frames.len() {
                assert!(reply.more_data.contains(MoreData::BLOCK));
            }
        }
        assert!(reply.is_complete());
        assert_eq!(client.block_index(), INITIAL_BLOCK_INDEX);

        // unsegmented under the default PDU size
        let (mut server2, mut client2) = wrapper_pair();
        let mut data2 = ByteBuffer::from(encoded.as_slice());
        let mut p2 = LnParameters::response(Command::GetResponse, 1, 0);
        let frames2 = get_ln_messages(&mut server2, &mut p2, &mut data2).unwrap();
        assert_eq!(frames2.len(), 1);
        let mut reply2 = ReplyData::new();
        feed_all(&mut client2, &frames2, &mut reply2).unwrap();

        assert_eq!(reply.value, reply2.value);
        assert_eq!(reply.value, Some(value));
    }

    #[test]
    fn test_scalar_value_split_across_blocks() {
        let value = DataObject::OctetString((0..200u16).map(|i| i as u8).collect());
        let encoded = cosem_axdr::encode(&value).unwrap();
        let (mut server, mut client) = wrapper_pair();
        server.max_pdu_size = 48;
        let mut data = ByteBuffer::from(encoded.as_slice());
        let mut p = LnParameters::response(Command::GetResponse, 2, 0);
        p.multiple_blocks = true;
        let frames = get_ln_messages(&mut server, &mut p, &mut data).unwrap();
        assert!(frames.len() > 2);

        let mut reply = ReplyData::new();
        feed_all(&mut client, &frames, &mut reply).unwrap();
        assert!(reply.is_complete());
        assert_eq!(reply.value, Some(value));
    }

    #[test]
    fn test_hdlc_multi_frame_pdu() {
        let mut server = Settings::new_server(16, 1);
        server.hdlc.max_info_tx = 40;
        let mut client = Settings::new(16, 1);
        let value = DataObject::OctetString(vec![0x77; 120]);
        let mut data = ByteBuffer::from(cosem_axdr::encode(&value).unwrap());
        let mut p = LnParameters::response(Command::GetResponse, 1, 0);
        let frames = get_ln_messages(&mut server, &mut p, &mut data).unwrap();
        assert!(frames.len() > 1);

        let mut reply = ReplyData::new();
        for (i, frame) in frames.iter().enumerate() {
            let mut rx = ByteBuffer::from(frame.as_slice());
            let status = get_data(&mut client, &mut rx, &mut reply).unwrap();
            if i + 1 < frames.len() {
                assert_eq!(status, FeedStatus::FrameBoundary);
                assert!(reply.more_data.contains(MoreData::FRAME));
            } else {
                assert_eq!(status, FeedStatus::PduReady);
                assert!(reply.is_complete());
            }
        }
        assert_eq!(reply.value, Some(value));
    }

    #[test]
    fn test_incomplete_wrapper_feed() {
        let (mut server, mut client) = wrapper_pair();
        let mut data = ByteBuffer::from(cosem_axdr::encode(&DataObject::Boolean(true)).unwrap());
        let mut p = LnParameters::response(Command::GetResponse, 1, 0);
        let frames = get_ln_messages(&mut server, &mut p, &mut data).unwrap();
        let frame = &frames[0];

        let mut reply = ReplyData::new();
        let mut rx = ByteBuffer::new();
        rx.set(&frame[..5]);
        assert_eq!(
            get_data(&mut client, &mut rx, &mut reply).unwrap(),
            FeedStatus::Incomplete
        );
        rx.set(&frame[5..]);
        assert_eq!(
            get_data(&mut client, &mut rx, &mut reply).unwrap(),
            FeedStatus::PduReady
        );
        assert_eq!(reply.value, Some(DataObject::Boolean(true)));
    }

    #[test]
    fn test_ciphered_response_round_trip() {
        let title = SystemTitle::new([0x4D, 0x4D, 0x4D, 0, 0, 0, 0, 9]);
        let keys = ([0xAA; 16], [0xBB; 16]);
        let (mut server, mut client) = wrapper_pair();
        server.cipher = Some(Box::new(GcmCipher::new(
            Security::AuthenticationEncryption,
            title,
            keys.0,
            keys.1,
        )));
        client.cipher = Some(Box::new(
            GcmCipher::new(Security::AuthenticationEncryption, title, keys.0, keys.1)
                .with_peer_system_title(title),
        ));

        let value = DataObject::Unsigned32(42);
        let mut data = ByteBuffer::from(cosem_axdr::encode(&value).unwrap());
        let mut p = LnParameters::response(Command::GetResponse, 1, 0);
        let frames = get_ln_messages(&mut server, &mut p, &mut data).unwrap();
        // the wrapped PDU is a GloGetResponse
        assert_eq!(frames[0][8], 0xCC);

        let mut reply = ReplyData::new();
        feed_all(&mut client, &frames, &mut reply).unwrap();
        assert_eq!(reply.command, Some(Command::GetResponse));
        assert_eq!(reply.value, Some(value));
        assert!(reply.cipher_index > 0);
    }

    #[test]
    fn test_unsupported_interface_is_a_protocol_error() {
        let mut settings = Settings::new(16, 1).with_interface_type(InterfaceType::WiredMBus);
        let mut reply = ReplyData::new();
        let mut rx = ByteBuffer::from(&[0u8; 16][..]);
        assert!(matches!(
            get_data(&mut settings, &mut rx, &mut reply),
            Err(CosemError::Protocol(_))
        ));
    }
}

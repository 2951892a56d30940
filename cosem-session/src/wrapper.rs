//! TCP/UDP wrapper session layer
//!
//! Length-prefixed framing: `version(2B BE = 1) | destination(2B BE) |
//! source(2B BE) | length(2B BE) | payload`.

use bytes::{BufMut, BytesMut};
use cosem_core::{ByteBuffer, CosemError, CosemResult, Settings};
use log::debug;

/// Wrapper protocol version
pub const WRAPPER_VERSION: u16 = 1;

/// Wrapper header length in bytes
pub const WRAPPER_HEADER_LENGTH: usize = 8;

/// Build one wrapper frame around `payload`.
pub fn build_wrapper(settings: &Settings, payload: &[u8]) -> CosemResult<Vec<u8>> {
    if payload.len() > u16::MAX as usize {
        return Err(CosemError::InvalidData(format!(
            "wrapper payload of {} bytes exceeds the 16-bit length field",
            payload.len()
        )));
    }
    let (destination, source) = if settings.is_server {
        (settings.client_address, settings.server_address)
    } else {
        (settings.server_address, settings.client_address)
    };
    let mut buf = BytesMut::with_capacity(WRAPPER_HEADER_LENGTH + payload.len());
    buf.put_u16(WRAPPER_VERSION);
    buf.put_u16(destination as u16);
    buf.put_u16(source as u16);
    buf.put_u16(payload.len() as u16);
    buf.put_slice(payload);
    Ok(buf.to_vec())
}

/// Extract one wrapper payload from the receive buffer.
///
/// Returns `Ok(None)` with the cursor restored when the header or payload is
/// not yet complete. Zero addresses in the session state are adopted from the
/// first frame seen; a later disagreement is fatal.
pub fn parse_wrapper(
    settings: &mut Settings,
    data: &mut ByteBuffer,
) -> CosemResult<Option<Vec<u8>>> {
    if data.available() < WRAPPER_HEADER_LENGTH {
        return Ok(None);
    }
    let start = data.position();
    let version = data.get_u16()?;
    if version != WRAPPER_VERSION {
        return Err(CosemError::Framing(format!(
            "wrapper version {version}, only version {WRAPPER_VERSION} is supported"
        )));
    }
    let destination = u32::from(data.get_u16()?);
    let source = u32::from(data.get_u16()?);
    let length = data.get_u16()? as usize;

    // Received destination is our own station, source is the peer.
    let (own, peer) = if settings.is_server {
        (settings.server_address, settings.client_address)
    } else {
        (settings.client_address, settings.server_address)
    };
    if own == 0 {
        debug!("adopting own wrapper address {destination:#06X}");
        if settings.is_server {
            settings.server_address = destination;
        } else {
            settings.client_address = destination;
        }
    } else if destination != own {
        data.set_position(start);
        return Err(CosemError::AddressMismatch {
            expected: own,
            received: destination,
        });
    }
    if peer == 0 {
        debug!("adopting peer wrapper address {source:#06X}");
        if settings.is_server {
            settings.client_address = source;
        } else {
            settings.server_address = source;
        }
    } else if source != peer {
        data.set_position(start);
        return Err(CosemError::AddressMismatch {
            expected: peer,
            received: source,
        });
    }

    if data.available() < length {
        data.set_position(start);
        return Ok(None);
    }
    Ok(Some(data.get_bytes(length)?))
}

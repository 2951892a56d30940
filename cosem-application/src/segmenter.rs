//! PDU segmenter
//!
//! Turns one logical APDU into size-bounded, optionally ciphered wire chunks
//! and hands each to the framing codec selected by the session interface
//! type. LN requests and responses carry the command/subtype/invoke-id
//! header; oversized payloads go out as numbered data blocks or as a
//! general-block-transfer envelope.

use cosem_core::{
    ByteBuffer, Command, CosemError, CosemResult, InterfaceType, Security, Settings,
};
use cosem_session::hdlc::{LLC_REQUEST, LLC_RESPONSE, build_frame};
use cosem_session::wrapper::build_wrapper;
use log::trace;

/// Status value meaning "this PDU carries no status byte" (requests).
pub const NO_STATUS: u8 = 0xFF;

/// Parameters of one logical-name referencing send.
#[derive(Debug)]
pub struct LnParameters {
    pub command: Command,
    /// Command subtype byte (normal = 1, with-datablock = 2, with-list = 3).
    pub request_type: u8,
    /// Response status; `NO_STATUS` for requests.
    pub status: u8,
    /// Raw date-time octets embedded in a DataNotification.
    pub time: Option<Vec<u8>>,
    pub multiple_blocks: bool,
    pub last_block: bool,
    /// GBT sent-block number.
    pub block_number: u32,
    /// GBT acknowledged-block number.
    pub block_number_ack: u32,
    /// GBT streaming flag.
    pub streaming: bool,
}

impl LnParameters {
    pub fn request(command: Command, request_type: u8) -> Self {
        Self {
            command,
            request_type,
            status: NO_STATUS,
            time: None,
            multiple_blocks: false,
            last_block: true,
            block_number: 1,
            block_number_ack: 0,
            streaming: false,
        }
    }

    pub fn response(command: Command, request_type: u8, status: u8) -> Self {
        let mut p = Self::request(command, request_type);
        p.status = status;
        p
    }
}

/// Parameters of one short-name referencing send.
#[derive(Debug)]
pub struct SnParameters {
    pub command: Command,
}

impl SnParameters {
    pub fn new(command: Command) -> Self {
        Self { command }
    }
}

/// Build all wire frames of one LN send, consuming `data`.
pub fn get_ln_messages(
    settings: &mut Settings,
    p: &mut LnParameters,
    data: &mut ByteBuffer,
) -> CosemResult<Vec<Vec<u8>>> {
    if p.command.is_request() {
        settings.next_invoke_id();
    }
    let invoke = settings.invoke_id_priority();

    if !p.multiple_blocks && uses_block_transfer(p.command) {
        let overhead = 3 + status_length(p);
        p.multiple_blocks = overhead + data.available() > settings.max_pdu_size as usize;
    }

    let mut frames = Vec::new();
    loop {
        let pdu = get_ln_pdu(settings, p, data, invoke)?;
        let pdu = apply_ciphering(settings, p.command, pdu)?;
        add_frames(settings, &pdu, &mut frames)?;
        if data.available() == 0 {
            break;
        }
    }
    trace!(
        "built {} frame(s) for {:?} type {}",
        frames.len(),
        p.command,
        p.request_type
    );
    Ok(frames)
}

/// Build all wire frames of one SN send: a bare command byte (omitted for
/// Aarq/Aare) followed by the payload; block segmentation does not exist at
/// this layer.
pub fn get_sn_messages(
    settings: &mut Settings,
    p: &SnParameters,
    data: &mut ByteBuffer,
) -> CosemResult<Vec<Vec<u8>>> {
    if p.command.is_request() {
        settings.next_invoke_id();
    }
    let mut bb = ByteBuffer::with_capacity(1 + data.available());
    if !matches!(p.command, Command::Aarq | Command::Aare) {
        bb.set_u8(p.command.value());
    }
    bb.set(&data.get_bytes(data.available())?);
    let pdu = apply_ciphering(settings, p.command, bb.into_vec())?;
    let mut frames = Vec::new();
    add_frames(settings, &pdu, &mut frames)?;
    Ok(frames)
}

fn uses_block_transfer(command: Command) -> bool {
    matches!(
        command,
        Command::GetRequest
            | Command::SetRequest
            | Command::MethodRequest
            | Command::GetResponse
            | Command::SetResponse
            | Command::MethodResponse
    )
}

fn status_length(p: &LnParameters) -> usize {
    if p.status == NO_STATUS {
        0
    } else if p.command == Command::GetResponse && p.status != 0 {
        2
    } else {
        1
    }
}

/// Build one PDU chunk, advancing the payload cursor.
fn get_ln_pdu(
    settings: &mut Settings,
    p: &mut LnParameters,
    data: &mut ByteBuffer,
    invoke: u8,
) -> CosemResult<Vec<u8>> {
    let mut bb = ByteBuffer::with_capacity(16 + data.available().min(settings.max_pdu_size as usize));
    bb.set_u8(p.command.value());
    match p.command {
        Command::Aarq | Command::Aare => {
            // association material passes through untouched
            bb.set(&data.get_bytes(data.available())?);
        }
        Command::DataNotification => {
            bb.set_u32(settings.next_long_invoke_id());
            match &p.time {
                None => bb.set_u8(0),
                Some(time) => {
                    // octet-string body with the type tag stripped
                    bb.set_u8(time.len() as u8);
                    bb.set(time);
                }
            }
            bb.set(&data.get_bytes(data.available())?);
        }
        Command::GeneralBlockTransfer => {
            let mut control = settings.gbt_window_size & 0x3F;
            if p.streaming {
                control |= 0x40;
            }
            let capacity = (settings.max_pdu_size as usize).saturating_sub(11);
            if capacity == 0 {
                return Err(CosemError::InvalidData(
                    "negotiated PDU size too small for general block transfer".to_string(),
                ));
            }
            let chunk = data.available().min(capacity);
            p.last_block = chunk == data.available();
            if p.last_block {
                control |= 0x80;
            }
            bb.set_u8(control);
            bb.set_u8(p.block_number as u8);
            bb.set_u8(p.block_number_ack as u8);
            // APU and Addl reserved fields
            bb.set_u8(0);
            bb.set_u8(0);
            bb.set_object_count(chunk);
            bb.set(&data.get_bytes(chunk)?);
            p.block_number += 1;
        }
        _ => {
            bb.set_u8(p.request_type);
            bb.set_u8(invoke);
            if p.multiple_blocks {
                let capacity = (settings.max_pdu_size as usize)
                    .saturating_sub(bb.len() + 5 + status_length(p) + 5);
                if capacity == 0 {
                    return Err(CosemError::InvalidData(
                        "negotiated PDU size too small for block transfer".to_string(),
                    ));
                }
                let chunk = data.available().min(capacity);
                p.last_block = chunk == data.available();
                bb.set_u8(p.last_block as u8);
                bb.set_u32(settings.block_index());
                settings.increase_block_index();
                if p.command == Command::GetResponse && p.status != NO_STATUS && p.status != 0 {
                    bb.set_u8(1);
                    bb.set_u8(p.status);
                    // an error response carries no data
                    data.get_bytes(data.available())?;
                } else {
                    if p.command == Command::GetResponse {
                        bb.set_u8(0);
                    }
                    bb.set_object_count(chunk);
                    bb.set(&data.get_bytes(chunk)?);
                }
            } else {
                if p.status != NO_STATUS {
                    match p.command {
                        Command::GetResponse => {
                            if p.status == 0 {
                                bb.set_u8(0);
                            } else {
                                bb.set_u8(1);
                                bb.set_u8(p.status);
                                // an error response carries no data
                                data.get_bytes(data.available())?;
                                return Ok(bb.into_vec());
                            }
                        }
                        // a zero status for set and method responses is the
                        // bare result byte, no extra marker
                        _ => bb.set_u8(p.status),
                    }
                }
                bb.set(&data.get_bytes(data.available())?);
            }
        }
    }
    Ok(bb.into_vec())
}

/// Replace an assembled plaintext PDU with its glo/ded envelope when the
/// session ciphers.
fn apply_ciphering(
    settings: &mut Settings,
    command: Command,
    pdu: Vec<u8>,
) -> CosemResult<Vec<u8>> {
    let Some(cipher) = settings.cipher.as_mut() else {
        return Ok(pdu);
    };
    if cipher.security() == Security::None || matches!(command, Command::Aarq | Command::Aare) {
        return Ok(pdu);
    }
    let tag = command.ciphered(false)?.value();
    let title = *cipher.system_title();
    cipher.encrypt(tag, &title, &pdu)
}

/// Frame one PDU for the session interface type.
fn add_frames(
    settings: &mut Settings,
    pdu: &[u8],
    frames: &mut Vec<Vec<u8>>,
) -> CosemResult<()> {
    match settings.interface_type {
        InterfaceType::Hdlc | InterfaceType::PlcHdlc => {
            let llc = if settings.is_server {
                LLC_RESPONSE
            } else {
                LLC_REQUEST
            };
            let mut bb = ByteBuffer::with_capacity(3 + pdu.len());
            bb.set(&llc);
            bb.set(pdu);
            loop {
                frames.push(build_frame(settings, 0, Some(&mut bb))?);
                if bb.available() == 0 {
                    break;
                }
            }
        }
        InterfaceType::Wrapper => frames.push(build_wrapper(settings, pdu)?),
        other => {
            return Err(CosemError::Protocol(format!(
                "interface type {other:?} framing is not supported by this engine"
            )));
        }
    }
    Ok(())
}

//! Command dispatcher
//!
//! Interprets an assembled PDU at the reply accumulator's cursor. Ciphered
//! envelopes and general-block-transfer wrappers are unwrapped in place and
//! re-entered through an explicit loop over the current command, keeping the
//! stack depth flat.

use crate::objects;
use crate::reply::ReplyData;
use cosem_axdr::{AxdrDecoder, AxdrTag};
use cosem_core::{
    Command, CosemError, CosemResult, DataObject, ExceptionServiceError, ExceptionStateError,
    INITIAL_BLOCK_INDEX, MoreData, ObisCode, Settings, SystemTitle,
};
use log::{debug, warn};

enum Dispatch {
    Done,
    /// The buffer now holds a fresh PDU at the cursor; interpret it.
    Continue,
}

/// Interpret the PDU at the accumulator cursor.
///
/// On a terminal (non-blocked) response the session block index resets and
/// the cursor rewinds for reuse: to 0 for Aarq/Aare so the association layer
/// sees the whole APDU, to 1 otherwise, past the consumed command byte.
pub fn get_pdu(settings: &mut Settings, reply: &mut ReplyData) -> CosemResult<()> {
    let entry_position = reply.data.position();
    loop {
        let pdu_start = reply.data.position();
        if reply.data.available() == 0 {
            return Err(CosemError::Protocol("empty PDU".to_string()));
        }
        let tag = reply.data.get_u8()?;
        let command = Command::from_value(tag)?;
        reply.command = Some(command);
        let flow = match command {
            Command::GetResponse => handle_get_response(settings, reply, pdu_start)?,
            Command::SetResponse => handle_set_response(settings, reply)?,
            Command::MethodResponse => handle_method_response(settings, reply)?,
            Command::ReadResponse => handle_read_response(reply)?,
            Command::WriteResponse => handle_write_response(reply)?,
            Command::DataNotification => handle_data_notification(reply)?,
            Command::EventNotification => handle_event_notification(reply)?,
            Command::ExceptionResponse => handle_exception_response(reply)?,
            Command::ConfirmedServiceError => handle_confirmed_service_error(reply)?,
            Command::GeneralBlockTransfer => {
                handle_general_block_transfer(reply, pdu_start)?
            }
            Command::Aarq
            | Command::Aare
            | Command::ReleaseRequest
            | Command::ReleaseResponse => {
                // association negotiation material: leave the tag unconsumed
                // for the collaborator that owns it
                reply.data.set_position(pdu_start);
                Dispatch::Done
            }
            cmd if cmd.is_ciphered() => handle_ciphered(settings, reply, command, pdu_start)?,
            cmd => {
                return Err(CosemError::Protocol(format!(
                    "unexpected command in reply: {cmd:?}"
                )));
            }
        };
        match flow {
            Dispatch::Continue => continue,
            Dispatch::Done => break,
        }
    }

    if reply.peek {
        reply.data.set_position(entry_position);
    } else if reply.more_data.is_none() {
        settings.reset_block_index();
        let rewind = match reply.command {
            Some(Command::Aarq) | Some(Command::Aare) => 0,
            _ => 1,
        };
        reply.data.set_position(rewind.min(reply.data.len()));
    }
    Ok(())
}

fn check_invoke_id(settings: &Settings, reply: &mut ReplyData, invoke: u8) {
    reply.invoke_id = invoke & 0x0F;
    if reply.invoke_id != settings.invoke_id() {
        warn!(
            "response invoke id {} does not match the outstanding request {}",
            reply.invoke_id,
            settings.invoke_id()
        );
    }
}

/// Mark the start of the value stream unless it is already running.
fn resume_value_stream(reply: &mut ReplyData, chunk_start: usize) {
    let resume = *reply.read_position.get_or_insert(chunk_start);
    reply.data.set_position(resume);
}

/// Decode as much of the value as the buffer holds. Top-level arrays merge
/// element-wise across data blocks; anything else decodes as soon as its
/// bytes are present.
fn get_value_from_data(reply: &mut ReplyData) -> CosemResult<()> {
    if reply.value.is_none() && reply.total_count == 0 {
        let tag = match reply.data.peek_u8() {
            Ok(tag) => tag,
            Err(_) => return Ok(()),
        };
        if tag == AxdrTag::Array.value() {
            let start = reply.data.position();
            reply.data.get_u8()?;
            match reply.data.get_object_count() {
                Ok(count) => {
                    reply.total_count = count;
                    reply.value = Some(DataObject::Array(Vec::new()));
                }
                Err(CosemError::OutOfData) => {
                    reply.data.set_position(start);
                    reply.read_position = Some(start);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        } else {
            let start = reply.data.position();
            let mut decoder = AxdrDecoder::new(&mut reply.data);
            match decoder.try_decode_data_object()? {
                Some(value) => {
                    reply.value = Some(value);
                    reply.read_position = Some(reply.data.position());
                }
                None => reply.read_position = Some(start),
            }
            return Ok(());
        }
    }

    if matches!(reply.value, Some(DataObject::Array(_))) {
        let mut items = match reply.value.take() {
            Some(DataObject::Array(items)) => items,
            other => {
                reply.value = other;
                return Ok(());
            }
        };
        while items.len() < reply.total_count {
            let start = reply.data.position();
            let decoded = AxdrDecoder::new(&mut reply.data).try_decode_data_object()?;
            match decoded {
                Some(item) => items.push(item),
                None => {
                    reply.data.set_position(start);
                    break;
                }
            }
        }
        reply.read_position = Some(reply.data.position());
        reply.value = Some(DataObject::Array(items));
    }
    Ok(())
}

fn ensure_value_complete(reply: &ReplyData) -> CosemResult<()> {
    match &reply.value {
        Some(DataObject::Array(items)) if items.len() < reply.total_count => Err(
            CosemError::InvalidData(format!(
                "array value truncated: {} of {} elements",
                items.len(),
                reply.total_count
            )),
        ),
        None => Err(CosemError::InvalidData("value truncated".to_string())),
        _ => Ok(()),
    }
}

fn handle_get_response(
    settings: &mut Settings,
    reply: &mut ReplyData,
    pdu_start: usize,
) -> CosemResult<Dispatch> {
    let command_type = reply.data.get_u8()?;
    reply.command_type = command_type;
    let invoke = reply.data.get_u8()?;
    check_invoke_id(settings, reply, invoke);
    match command_type {
        // normal
        1 => {
            if reply.data.get_u8()? == 0 {
                let start = reply.data.position();
                resume_value_stream(reply, start);
                get_value_from_data(reply)?;
                ensure_value_complete(reply)?;
            } else {
                reply.error = reply.data.get_u8()?;
            }
        }
        // with data block
        2 => {
            let last_block = reply.data.get_u8()? != 0;
            let block_number = reply.data.get_u32()?;
            if block_number == 0 && settings.block_index() == INITIAL_BLOCK_INDEX {
                // documented interoperability workaround: some meters number
                // data blocks from zero
                warn!("peer numbers data blocks from zero, tolerating");
                settings.set_block_index(0);
            } else if block_number != settings.block_index() {
                return Err(CosemError::BlockSequence {
                    expected: settings.block_index(),
                    received: block_number,
                });
            }
            reply.block_number = block_number;
            settings.increase_block_index();
            if reply.data.get_u8()? != 0 {
                reply.error = reply.data.get_u8()?;
                reply.more_data.remove(MoreData::BLOCK);
                return Ok(Dispatch::Done);
            }
            let count = reply.data.get_object_count()?;
            if count != reply.data.available() {
                return Err(CosemError::InvalidData(format!(
                    "data block length {count} does not match {} available bytes",
                    reply.data.available()
                )));
            }
            if last_block {
                reply.more_data.remove(MoreData::BLOCK);
            } else {
                reply.more_data.insert(MoreData::BLOCK);
            }
            // splice the block header out so the value stream is contiguous
            reply.data.delete(pdu_start, reply.data.position());
            resume_value_stream(reply, pdu_start);
            get_value_from_data(reply)?;
            if reply.more_data.is_none() {
                ensure_value_complete(reply)?;
            } else {
                let end = reply.data.len();
                reply.data.set_position(end);
            }
        }
        // with list
        3 => {
            let count = reply.data.get_object_count()?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                if reply.data.get_u8()? == 0 {
                    items.push(AxdrDecoder::new(&mut reply.data).decode_data_object()?);
                } else {
                    let code = reply.data.get_u8()?;
                    if reply.error == 0 {
                        reply.error = code;
                    }
                    items.push(DataObject::Null);
                }
            }
            reply.total_count = count;
            reply.value = Some(DataObject::Array(items));
        }
        other => {
            return Err(CosemError::Protocol(format!(
                "unsupported get response type: {other}"
            )));
        }
    }
    Ok(Dispatch::Done)
}

fn handle_set_response(settings: &mut Settings, reply: &mut ReplyData) -> CosemResult<Dispatch> {
    let command_type = reply.data.get_u8()?;
    reply.command_type = command_type;
    let invoke = reply.data.get_u8()?;
    check_invoke_id(settings, reply, invoke);
    match command_type {
        // normal
        1 => reply.error = reply.data.get_u8()?,
        // data block: the peer acknowledges a block, the next one is owed
        2 => {
            reply.block_number_ack = reply.data.get_u32()?;
            reply.more_data.insert(MoreData::BLOCK);
        }
        // last data block
        3 => {
            reply.error = reply.data.get_u8()?;
            reply.block_number_ack = reply.data.get_u32()?;
            reply.more_data.remove(MoreData::BLOCK);
        }
        // with list
        5 => {
            let count = reply.data.get_object_count()?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                let code = reply.data.get_u8()?;
                if code != 0 && reply.error == 0 {
                    reply.error = code;
                }
                items.push(DataObject::Enumerate(code));
            }
            reply.total_count = count;
            reply.value = Some(DataObject::Array(items));
        }
        other => {
            return Err(CosemError::Protocol(format!(
                "unsupported set response type: {other}"
            )));
        }
    }
    Ok(Dispatch::Done)
}

fn handle_method_response(
    settings: &mut Settings,
    reply: &mut ReplyData,
) -> CosemResult<Dispatch> {
    let command_type = reply.data.get_u8()?;
    reply.command_type = command_type;
    let invoke = reply.data.get_u8()?;
    check_invoke_id(settings, reply, invoke);
    if command_type != 1 {
        return Err(CosemError::Protocol(format!(
            "unsupported method response type: {command_type}"
        )));
    }
    reply.error = reply.data.get_u8()?;
    // optional return parameters
    if reply.data.available() > 0 && reply.data.get_u8()? != 0 {
        if reply.data.get_u8()? == 0 {
            let start = reply.data.position();
            resume_value_stream(reply, start);
            get_value_from_data(reply)?;
            ensure_value_complete(reply)?;
        } else {
            reply.error = reply.data.get_u8()?;
        }
    }
    Ok(Dispatch::Done)
}

fn handle_read_response(reply: &mut ReplyData) -> CosemResult<Dispatch> {
    let count = reply.data.get_object_count()?;
    reply.total_count = count;
    if count == 1 {
        match reply.data.get_u8()? {
            0 => {
                let start = reply.data.position();
                resume_value_stream(reply, start);
                get_value_from_data(reply)?;
                ensure_value_complete(reply)?;
            }
            1 => reply.error = reply.data.get_u8()?,
            other => {
                return Err(CosemError::Protocol(format!(
                    "unsupported read response choice: {other}"
                )));
            }
        }
    } else {
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            match reply.data.get_u8()? {
                0 => items.push(AxdrDecoder::new(&mut reply.data).decode_data_object()?),
                1 => {
                    let code = reply.data.get_u8()?;
                    if reply.error == 0 {
                        reply.error = code;
                    }
                    items.push(DataObject::Null);
                }
                other => {
                    return Err(CosemError::Protocol(format!(
                        "unsupported read response choice: {other}"
                    )));
                }
            }
        }
        reply.value = Some(DataObject::Array(items));
    }
    Ok(Dispatch::Done)
}

fn handle_write_response(reply: &mut ReplyData) -> CosemResult<Dispatch> {
    let count = reply.data.get_object_count()?;
    for _ in 0..count {
        match reply.data.get_u8()? {
            0 => {}
            1 => {
                let code = reply.data.get_u8()?;
                if reply.error == 0 {
                    reply.error = code;
                }
            }
            other => {
                return Err(CosemError::Protocol(format!(
                    "unsupported write response choice: {other}"
                )));
            }
        }
    }
    Ok(Dispatch::Done)
}

fn handle_data_notification(reply: &mut ReplyData) -> CosemResult<Dispatch> {
    reply.long_invoke_id = reply.data.get_u32()?;
    reply.invoke_id = (reply.long_invoke_id & 0x0F) as u8;
    let time_length = reply.data.get_u8()? as usize;
    if time_length > 0 {
        reply.time = Some(reply.data.get_bytes(time_length)?);
    }
    let start = reply.data.position();
    resume_value_stream(reply, start);
    get_value_from_data(reply)?;
    ensure_value_complete(reply)?;
    Ok(Dispatch::Done)
}

fn handle_event_notification(reply: &mut ReplyData) -> CosemResult<Dispatch> {
    if reply.data.get_u8()? != 0 {
        reply.time = Some(reply.data.get_bytes(12)?);
    }
    let class_id = reply.data.get_u16()?;
    let logical_name = ObisCode::from_slice(&reply.data.get_bytes(6)?)?;
    let attribute = reply.data.get_u8()?;
    let value = AxdrDecoder::new(&mut reply.data).decode_data_object()?;
    match objects::create_object(class_id, logical_name) {
        Some(object) => debug!(
            "event notification from {:?} {}",
            object.object_type, object.logical_name
        ),
        None => warn!("event notification for unknown class {class_id}"),
    }
    reply.value = Some(DataObject::Structure(vec![
        DataObject::Unsigned16(class_id),
        DataObject::OctetString(logical_name.as_bytes().to_vec()),
        DataObject::Integer8(attribute as i8),
        value,
    ]));
    Ok(Dispatch::Done)
}

fn handle_exception_response(reply: &mut ReplyData) -> CosemResult<Dispatch> {
    let state = ExceptionStateError::from_value(reply.data.get_u8()?)?;
    let service = ExceptionServiceError::from_value(reply.data.get_u8()?)?;
    Err(CosemError::Exception { state, service })
}

fn handle_confirmed_service_error(reply: &mut ReplyData) -> CosemResult<Dispatch> {
    let service = reply.data.get_u8()?;
    let error_type = reply.data.get_u8()?;
    let code = reply.data.get_u8()?;
    Err(CosemError::Protocol(format!(
        "confirmed service error: service {service}, error type {error_type}, code {code}"
    )))
}

fn handle_general_block_transfer(
    reply: &mut ReplyData,
    pdu_start: usize,
) -> CosemResult<Dispatch> {
    let control = reply.data.get_u8()?;
    let last_block = control & 0x80 != 0;
    reply.streaming = control & 0x40 != 0;
    reply.window_size = control & 0x3F;
    reply.block_number = u32::from(reply.data.get_u8()?);
    reply.block_number_ack = u32::from(reply.data.get_u8()?);
    let reserved = (reply.data.get_u8()?, reply.data.get_u8()?);
    if reserved != (0, 0) {
        return Err(CosemError::Protocol(
            "non-zero reserved bytes in general block transfer header".to_string(),
        ));
    }
    let count = reply.data.get_object_count()?;
    if count != reply.data.available() {
        return Err(CosemError::InvalidData(format!(
            "general block transfer chunk length {count} does not match {} available bytes",
            reply.data.available()
        )));
    }
    // splice the envelope header out; chunks accumulate contiguously
    reply.data.delete(pdu_start, reply.data.position());
    if reply.read_position.is_none() {
        reply.read_position = Some(pdu_start);
    }
    if last_block {
        let resume = reply.read_position.take().unwrap_or(pdu_start);
        reply.data.set_position(resume);
        reply.more_data.remove(MoreData::BLOCK);
        // the accumulated chunks form a fresh PDU
        Ok(Dispatch::Continue)
    } else {
        reply.more_data.insert(MoreData::BLOCK);
        let end = reply.data.len();
        reply.data.set_position(end);
        Ok(Dispatch::Done)
    }
}

fn handle_ciphered(
    settings: &mut Settings,
    reply: &mut ReplyData,
    command: Command,
    pdu_start: usize,
) -> CosemResult<Dispatch> {
    let Some(cipher) = settings.cipher.as_mut() else {
        return Err(CosemError::Security(format!(
            "ciphered command {command:?} received but no cipher is configured"
        )));
    };
    let source_title = if matches!(
        command,
        Command::GeneralGloCiphering | Command::GeneralDedCiphering
    ) {
        let length = reply.data.get_object_count()?;
        let bytes = reply.data.get_bytes(length)?;
        Some(SystemTitle::from_slice(&bytes)?)
    } else {
        None
    };
    let length = reply.data.get_object_count()?;
    if length > reply.data.available() {
        return Err(CosemError::InvalidData(format!(
            "ciphered APDU length {length} exceeds {} available bytes",
            reply.data.available()
        )));
    }
    let body = reply.data.get_bytes(length)?;
    let end = reply.data.position();
    let plaintext = cipher.decrypt(source_title.as_ref(), &body)?;
    debug!("deciphered {} byte payload", plaintext.len());
    reply.data.replace(pdu_start, end, &plaintext);
    reply.cipher_index = pdu_start + plaintext.len();
    Ok(Dispatch::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosem_core::InterfaceType;

    fn wrapper_client() -> Settings {
        Settings::new(16, 1).with_interface_type(InterfaceType::Wrapper)
    }

    fn dispatch(pdu: &[u8]) -> (Settings, ReplyData, CosemResult<()>) {
        let mut settings = wrapper_client();
        let mut reply = ReplyData::new();
        reply.data.set(pdu);
        let result = get_pdu(&mut settings, &mut reply);
        (settings, reply, result)
    }

    #[test]
    fn test_get_response_normal_value() {
        let (_, reply, result) =
            dispatch(&[0xC4, 0x01, 0xC0, 0x00, 0x06, 0x00, 0x00, 0x00, 0x2A]);
        result.unwrap();
        assert_eq!(reply.command, Some(Command::GetResponse));
        assert_eq!(reply.value, Some(DataObject::Unsigned32(42)));
        assert!(reply.is_complete());
        // cursor rewound past the consumed command byte
        assert_eq!(reply.data.position(), 1);
    }

    #[test]
    fn test_get_response_error_code() {
        let (_, reply, result) = dispatch(&[0xC4, 0x01, 0xC0, 0x01, 0x03]);
        result.unwrap();
        assert_eq!(reply.error, 3);
        assert_eq!(reply.error_code(), cosem_core::ErrorCode::ReadWriteDenied);
        assert!(reply.value.is_none());
    }

    #[test]
    fn test_get_response_with_list() {
        let (_, reply, result) = dispatch(&[
            0xC4, 0x03, 0xC0, 0x02, // two results
            0x00, 0x11, 0x07, // data, unsigned8 7
            0x01, 0x02, // error, temporary failure
        ]);
        result.unwrap();
        assert_eq!(
            reply.value,
            Some(DataObject::Array(vec![
                DataObject::Unsigned8(7),
                DataObject::Null,
            ]))
        );
        assert_eq!(reply.error, 2);
    }

    #[test]
    fn test_block_sequence_error_leaves_value_untouched() {
        // announced block number 5 while the session expects 1
        let (settings, reply, result) = dispatch(&[
            0xC4, 0x02, 0xC0, 0x01, 0x00, 0x00, 0x00, 0x05, 0x00, 0x03, 0x11, 0x07, 0x00,
        ]);
        match result {
            Err(CosemError::BlockSequence { expected, received }) => {
                assert_eq!(expected, 1);
                assert_eq!(received, 5);
            }
            other => panic!("expected a block sequence error, got {other:?}"),
        }
        assert!(reply.value.is_none());
        assert_eq!(settings.block_index(), INITIAL_BLOCK_INDEX);
    }

    #[test]
    fn test_zero_based_block_numbering_is_tolerated() {
        // last block numbered 0 while the session expects 1
        let (_, reply, result) = dispatch(&[
            0xC4, 0x02, 0xC0, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x11, 0x07,
        ]);
        result.unwrap();
        assert_eq!(reply.value, Some(DataObject::Unsigned8(7)));
        assert!(reply.is_complete());
    }

    #[test]
    fn test_ciphered_pdu_without_cipher_is_a_security_error() {
        let (_, reply, result) = dispatch(&[0xC8, 0x02, 0x30, 0x00]);
        assert!(matches!(result, Err(CosemError::Security(_))));
        // nothing consumed beyond the command byte
        assert_eq!(reply.data.position(), 1);
        assert_eq!(reply.command, Some(Command::GloGetRequest));
    }

    #[test]
    fn test_exception_response_is_structured() {
        let (_, _, result) = dispatch(&[0xD8, 0x01, 0x03]);
        match result {
            Err(CosemError::Exception { state, service }) => {
                assert_eq!(state, ExceptionStateError::ServiceNotAllowed);
                assert_eq!(service, ExceptionServiceError::OtherReason);
            }
            other => panic!("expected an exception response, got {other:?}"),
        }
    }

    #[test]
    fn test_confirmed_service_error() {
        let (_, _, result) = dispatch(&[0x0E, 0x01, 0x06, 0x03]);
        assert!(matches!(result, Err(CosemError::Protocol(_))));
    }

    #[test]
    fn test_set_response_normal() {
        let (_, reply, result) = dispatch(&[0xC5, 0x01, 0xC0, 0x00]);
        result.unwrap();
        assert_eq!(reply.error, 0);
        assert!(reply.is_complete());
    }

    #[test]
    fn test_set_response_block_ack_requests_next_block() {
        let (_, reply, result) = dispatch(&[0xC5, 0x02, 0xC0, 0x00, 0x00, 0x00, 0x01]);
        result.unwrap();
        assert_eq!(reply.block_number_ack, 1);
        assert!(reply.more_data.contains(MoreData::BLOCK));
    }

    #[test]
    fn test_method_response_with_return_parameters() {
        let (_, reply, result) =
            dispatch(&[0xC7, 0x01, 0xC0, 0x00, 0x01, 0x00, 0x10, 0x00, 0x64]);
        result.unwrap();
        assert_eq!(reply.error, 0);
        assert_eq!(reply.value, Some(DataObject::Integer16(100)));
    }

    #[test]
    fn test_read_response_single_value() {
        let (_, reply, result) = dispatch(&[0x0C, 0x01, 0x00, 0x12, 0x01, 0x00]);
        result.unwrap();
        assert_eq!(reply.value, Some(DataObject::Unsigned16(256)));
    }

    #[test]
    fn test_read_response_list() {
        let (_, reply, result) = dispatch(&[0x0C, 0x02, 0x00, 0x03, 0x01, 0x01, 0x0B]);
        result.unwrap();
        assert_eq!(
            reply.value,
            Some(DataObject::Array(vec![
                DataObject::Boolean(true),
                DataObject::Null,
            ]))
        );
        assert_eq!(reply.error, 11);
    }

    #[test]
    fn test_write_response() {
        let (_, reply, result) = dispatch(&[0x0D, 0x02, 0x00, 0x01, 0x0D]);
        result.unwrap();
        assert_eq!(reply.error, 13);
    }

    #[test]
    fn test_data_notification_with_time() {
        let time = [0x07, 0xE4, 0x01, 0x01, 0xFF, 0x0A, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00];
        let mut pdu = vec![0x0F, 0x00, 0x00, 0x00, 0x10, 0x0C];
        pdu.extend_from_slice(&time);
        pdu.extend_from_slice(&[0x03, 0x01]);
        let (_, reply, result) = dispatch(&pdu);
        result.unwrap();
        assert_eq!(reply.long_invoke_id, 0x10);
        assert_eq!(reply.time.as_deref(), Some(&time[..]));
        assert_eq!(reply.value, Some(DataObject::Boolean(true)));
    }

    #[test]
    fn test_event_notification() {
        let mut pdu = vec![0xC2, 0x00, 0x00, 0x01];
        pdu.extend_from_slice(&[0x00, 0x00, 0x60, 0x03, 0x0A, 0xFF]);
        pdu.push(0x02);
        pdu.extend_from_slice(&[0x16, 0x01]);
        let (_, reply, result) = dispatch(&pdu);
        result.unwrap();
        match reply.value {
            Some(DataObject::Structure(items)) => {
                assert_eq!(items[0], DataObject::Unsigned16(1));
                assert_eq!(items[3], DataObject::Enumerate(1));
            }
            other => panic!("expected a structure, got {other:?}"),
        }
    }

    #[test]
    fn test_aarq_tag_is_left_unconsumed() {
        let (_, reply, result) = dispatch(&[0x61, 0x29, 0xA1, 0x09]);
        result.unwrap();
        assert_eq!(reply.command, Some(Command::Aare));
        assert_eq!(reply.data.position(), 0);
    }

    #[test]
    fn test_general_block_transfer_two_envelopes() {
        // inner GetResponse normal with a five byte octet string, split in two
        let inner = [
            0xC4, 0x01, 0xC0, 0x00, 0x09, 0x05, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE,
        ];
        let (first, second) = inner.split_at(6);

        let mut settings = wrapper_client();
        let mut reply = ReplyData::new();
        let mut envelope = vec![0xE0, 0x01, 0x01, 0x00, 0x00, 0x00, first.len() as u8];
        envelope.extend_from_slice(first);
        reply.data.set(&envelope);
        get_pdu(&mut settings, &mut reply).unwrap();
        assert!(reply.more_data.contains(MoreData::BLOCK));
        assert_eq!(reply.block_number, 1);
        assert_eq!(reply.window_size, 1);

        let mut envelope = vec![0xE0, 0x81, 0x02, 0x00, 0x00, 0x00, second.len() as u8];
        envelope.extend_from_slice(second);
        reply.data.set(&envelope);
        get_pdu(&mut settings, &mut reply).unwrap();
        assert!(reply.is_complete());
        assert_eq!(reply.command, Some(Command::GetResponse));
        assert_eq!(
            reply.value,
            Some(DataObject::OctetString(vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE]))
        );
    }

    #[test]
    fn test_general_block_transfer_reserved_bytes_must_be_zero() {
        let (_, _, result) = dispatch(&[0xE0, 0x81, 0x01, 0x00, 0x01, 0x00, 0x01, 0xC5]);
        assert!(matches!(result, Err(CosemError::Protocol(_))));
    }

    #[test]
    fn test_peek_mode_restores_cursor() {
        let mut settings = wrapper_client();
        let mut reply = ReplyData::new();
        reply.peek = true;
        reply.data.set(&[0xC4, 0x01, 0xC0, 0x00, 0x16, 0x09]);
        get_pdu(&mut settings, &mut reply).unwrap();
        assert_eq!(reply.value, Some(DataObject::Enumerate(9)));
        assert_eq!(reply.data.position(), 0);
    }

    #[test]
    fn test_unknown_command_tag() {
        let (_, _, result) = dispatch(&[0x44, 0x00]);
        assert!(matches!(result, Err(CosemError::Protocol(_))));
    }
}

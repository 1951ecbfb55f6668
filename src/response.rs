use crate::consts::{PREAMBLE_BYTE, RDM_MAX_DISCOVERY_RESPONSE_SIZE, SEPARATOR_BYTE};
use crate::layouts::rdm_discovery_response_layout;
use crate::rdm_message::RdmMessage;
use crate::types::{NackReason, ResponseType};
use crate::unique_identifier::UniqueIdentifier;
use crate::utils::{calculate_checksum, encode_disc_unique};

/// Outcome of a handler that has to be answered with a regular rdm response.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RdmResult {
    /// The parameter data of the message already holds the response data.
    Acknowledged,
    /// The request was rejected for the given reason.
    NotAcknowledged(NackReason),
}

/// Rewrite a request into its response, in the same buffer.
///
/// Sets the response type (for a NACK the parameter data becomes the reason code),
/// recomputes the message length, sends the message back to its source, turns the command
/// class into the response class and appends the checksum.
pub fn prepare_response(message: &mut RdmMessage, uid: &UniqueIdentifier, result: RdmResult) {
    match result {
        RdmResult::Acknowledged => message.set_response_type(ResponseType::ResponseTypeAck),
        RdmResult::NotAcknowledged(nack_reason) => {
            message.set_response_type(ResponseType::ResponseTypeNackReason);
            message.set_parameter_data(&nack_reason.to_be_bytes());
        },
    }

    message.set_message_count(0);
    message.update_message_length();

    let source_uid = message.source_uid();
    message.set_destination_uid(&source_uid);
    message.set_source_uid(&uid.to_bytes());

    message.increment_command_class();
    message.write_checksum();
}

/// Writes the response to a DISC_UNIQUE_BRANCH request into `dest`. It has no start code,
/// consists of 7 preamble bytes, a separator, the encoded uid and the encoded checksum.
/// Returns the amount of bytes written.
pub fn encode_discovery_response(uid: &UniqueIdentifier, dest: &mut [u8]) -> usize {
    let mut view =
        rdm_discovery_response_layout::View::new(&mut dest[..RDM_MAX_DISCOVERY_RESPONSE_SIZE]);

    view.preamble_mut().copy_from_slice(&[PREAMBLE_BYTE; 7]);
    view.separator_mut().write(SEPARATOR_BYTE);
    encode_disc_unique(&uid.to_bytes(), view.encoded_uid_mut());

    let checksum = calculate_checksum(view.encoded_uid());
    encode_disc_unique(&checksum.to_be_bytes(), view.encoded_checksum_mut());

    RDM_MAX_DISCOVERY_RESPONSE_SIZE
}

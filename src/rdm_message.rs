use crate::command_class::RequestCommandClass;
use crate::consts::{
    RDM_HEADER_SIZE, RDM_MAX_PARAMETER_DATA_LENGTH, RDM_MESSAGE_LENGTH_OVERHEAD, SC_RDM,
};
use crate::layouts::rdm_message_layout;
use crate::types::ResponseType;
use crate::utils::calculate_checksum;

/// Smallest buffer that can hold any rdm message including the checksum.
pub const RDM_MESSAGE_BUFFER_SIZE: usize = RDM_HEADER_SIZE + RDM_MAX_PARAMETER_DATA_LENGTH + 2;

/// Typed access to an rdm message inside a frame buffer.
///
/// The same bytes are first read as the request and then rewritten into the response,
/// the handle is the only reference to the buffer while that happens.
pub struct RdmMessage<'a> {
    buffer: &'a mut [u8],
}

impl<'a> RdmMessage<'a> {
    /// The buffer starts with the sub start code, the rdm start code isn't stored.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        assert!(buffer.len() >= RDM_MESSAGE_BUFFER_SIZE);

        Self { buffer }
    }

    fn view(&self) -> rdm_message_layout::View<&[u8]> {
        rdm_message_layout::View::new(&*self.buffer)
    }

    fn view_mut(&mut self) -> rdm_message_layout::View<&mut [u8]> {
        rdm_message_layout::View::new(&mut *self.buffer)
    }

    pub fn sub_start_code(&self) -> u8 {
        self.view().sub_start_code().read()
    }

    /// Length of the message on the wire including the start code but excluding the checksum.
    pub fn message_length(&self) -> u8 {
        self.view().message_length().read()
    }

    /// Derives the message length from the parameter data length.
    pub fn update_message_length(&mut self) {
        let message_length = self.parameter_data_length() as usize + RDM_MESSAGE_LENGTH_OVERHEAD;
        self.view_mut().message_length_mut().write(message_length as u8);
    }

    pub fn destination_uid(&self) -> [u8; 6] {
        *self.view().destination_uid()
    }

    pub fn set_destination_uid(&mut self, uid: &[u8; 6]) {
        self.view_mut().destination_uid_mut().copy_from_slice(uid);
    }

    pub fn source_uid(&self) -> [u8; 6] {
        *self.view().source_uid()
    }

    pub fn set_source_uid(&mut self, uid: &[u8; 6]) {
        self.view_mut().source_uid_mut().copy_from_slice(uid);
    }

    pub fn transaction_number(&self) -> u8 {
        self.view().transaction_number().read()
    }

    pub fn set_response_type(&mut self, response_type: ResponseType) {
        self.view_mut()
            .port_id_response_type_mut()
            .write(response_type as u8);
    }

    pub fn response_type(&self) -> Result<ResponseType, ()> {
        self.view().port_id_response_type().read().try_into()
    }

    pub fn set_message_count(&mut self, message_count: u8) {
        self.view_mut().message_count_mut().write(message_count);
    }

    pub fn sub_device(&self) -> u16 {
        self.view().sub_device().read()
    }

    /// The raw command class field.
    pub fn command_class_raw(&self) -> u8 {
        self.view().command_class().read()
    }

    pub fn command_class(&self) -> Option<RequestCommandClass> {
        self.command_class_raw().try_into().ok()
    }

    /// Turns a request command class into the matching response command class.
    pub fn increment_command_class(&mut self) {
        let command_class = self.command_class_raw().wrapping_add(1);
        self.view_mut().command_class_mut().write(command_class);
    }

    pub fn parameter_id(&self) -> u16 {
        self.view().parameter_id().read()
    }

    pub fn parameter_data_length(&self) -> u8 {
        self.view().parameter_data_length().read()
    }

    pub fn set_parameter_data_length(&mut self, length: u8) {
        self.view_mut().parameter_data_length_mut().write(length);
    }

    /// The parameter data as announced by the parameter data length field.
    pub fn parameter_data(&self) -> &[u8] {
        let length = (self.parameter_data_length() as usize).min(RDM_MAX_PARAMETER_DATA_LENGTH);
        &self.buffer[RDM_HEADER_SIZE..RDM_HEADER_SIZE + length]
    }

    /// The whole parameter data area, regardless of the current length field.
    pub fn parameter_data_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[RDM_HEADER_SIZE..RDM_HEADER_SIZE + RDM_MAX_PARAMETER_DATA_LENGTH]
    }

    /// Copies `data` into the parameter data and updates the length field.
    /// Data that doesn't fit into one message is cut off.
    pub fn set_parameter_data(&mut self, data: &[u8]) {
        let length = data.len().min(RDM_MAX_PARAMETER_DATA_LENGTH);
        self.parameter_data_mut()[..length].copy_from_slice(&data[..length]);
        self.set_parameter_data_length(length as u8);
    }

    /// Amount of message bytes stored in the buffer, excluding the checksum.
    pub fn stored_length(&self) -> usize {
        (self.message_length() as usize)
            .saturating_sub(1)
            .min(RDM_HEADER_SIZE + RDM_MAX_PARAMETER_DATA_LENGTH)
    }

    /// Checksum over the start code and every message byte.
    pub fn calculate_checksum(&self) -> u16 {
        calculate_checksum(&self.buffer[..self.stored_length()]).wrapping_add(SC_RDM as u16)
    }

    /// The checksum stored behind the message.
    pub fn checksum(&self) -> u16 {
        let offset = self.stored_length();
        u16::from_be_bytes([self.buffer[offset], self.buffer[offset + 1]])
    }

    pub fn write_checksum(&mut self) {
        let offset = self.stored_length();
        let checksum = self.calculate_checksum();
        self.buffer[offset..offset + 2].copy_from_slice(&checksum.to_be_bytes());
    }

    /// Message and checksum, everything that follows the start code on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.stored_length() + 2]
    }

    /// The underlying buffer, e.g. to reuse it for a discovery response.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut *self.buffer
    }
}

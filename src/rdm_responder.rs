use crate::command_class::RequestCommandClass;
use crate::consts::{
    RDM_DISC_UNIQUE_BRANCH_DATA_LENGTH, RDM_DISC_UNIQUE_BRANCH_LENGTH, RDM_HEADER_SIZE,
    RDM_MAX_PARAMETER_DATA_LENGTH, RDM_MAX_STRING_LENGTH, RDM_MESSAGE_LENGTH_OVERHEAD,
    RDM_ROOT_DEVICE, SC_SUB_MESSAGE,
};
use crate::pids;
use crate::rdm_message::RdmMessage;
use crate::rdm_types::{
    CommsStatus, DeviceInfo, DeviceLabel, DiscoveryMuteResponse, DmxStartAddress,
};
use crate::response::RdmResult;
use crate::types::NackReason;
use crate::unique_identifier::{PackageAddress, UniqueIdentifier};

/// Parameters that are always listed in SUPPORTED_PARAMETERS besides the ones required by the
/// standard.
const INTERNALLY_SUPPORTED_PIDS: [u16; 4] = [
    pids::MANUFACTURER_LABEL,
    pids::DEVICE_MODEL_DESCRIPTION,
    pids::DEVICE_LABEL,
    pids::COMMS_STATUS,
];

/// Product category DIMMER_CS_LED.
pub const DEFAULT_PRODUCT_CATEGORY: u16 = 0x0509;
pub const DEFAULT_SOFTWARE_VERSION_ID: u32 = 0x1000_0000;

/// Addressing and identity of the device, supplied by the application.
#[derive(Debug, Clone)]
pub struct RdmConfig {
    pub device_model_id: u16,
    pub product_category: u16,
    pub software_version_id: u32,
    /// Amount of dmx slots the device uses.
    pub dmx_footprint: u16,
    /// Initial dmx start address. Controllers can change it with DMX_START_ADDRESS.
    pub dmx_start_address: u16,
    pub manufacturer_label: &'static str,
    pub device_model_description: &'static str,
    pub software_version_label: &'static str,
    /// Manufacturer specific pids that are reported in SUPPORTED_PARAMETERS.
    pub additional_supported_pids: &'static [u16],
}

impl Default for RdmConfig {
    fn default() -> Self {
        Self {
            device_model_id: 0,
            product_category: DEFAULT_PRODUCT_CATEGORY,
            software_version_id: DEFAULT_SOFTWARE_VERSION_ID,
            dmx_footprint: 1,
            dmx_start_address: 1,
            manufacturer_label: "",
            device_model_description: "",
            software_version_label: "dmx-rdm-uart device",
            additional_supported_pids: &[],
        }
    }
}

/// What has to be sent after a request was handled.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RdmAnswer {
    /// Has to be sent as regular rdm response with a break.
    Response(RdmResult),
    /// Has to be sent as discovery response, see [crate::response::encode_discovery_response].
    DiscoveryResponse,
    /// No response to send.
    NoResponse,
}

impl From<RdmResult> for RdmAnswer {
    fn from(value: RdmResult) -> Self {
        Self::Response(value)
    }
}

/// Discovery handlers answer on their own terms, some requests stay unanswered.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum DiscoveryHandler {
    UniqueBranch,
    UnMute,
    Mute,
}

/// Parameter handlers always produce an ACK or a NACK.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ParameterHandler {
    SetIdentify,
    SetDeviceLabel,
    SetStartAddress,
    SetSupportedParameters,
    SetCommsStatus,
    GetIdentify,
    GetDeviceInfo,
    GetManufacturerLabel,
    GetModelDescription,
    GetDeviceLabel,
    GetSoftwareVersionLabel,
    GetStartAddress,
    GetSupportedParameters,
    GetCommsStatus,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum RdmHandler {
    Discovery(DiscoveryHandler),
    Parameter(ParameterHandler),
}

struct HandlerEntry {
    command_class: RequestCommandClass,
    parameter_id: u16,
    handler: RdmHandler,
}

macro_rules! handler_entry {
    (DiscoveryCommand, $pid:path, $handler:ident) => {
        HandlerEntry {
            command_class: RequestCommandClass::DiscoveryCommand,
            parameter_id: $pid,
            handler: RdmHandler::Discovery(DiscoveryHandler::$handler),
        }
    };
    ($command_class:ident, $pid:path, $handler:ident) => {
        HandlerEntry {
            command_class: RequestCommandClass::$command_class,
            parameter_id: $pid,
            handler: RdmHandler::Parameter(ParameterHandler::$handler),
        }
    };
}

/// Searched front to back, the first match handles the request.
static RDM_HANDLERS: [HandlerEntry; 17] = [
    handler_entry!(DiscoveryCommand, pids::DISC_UNIQUE_BRANCH, UniqueBranch),
    handler_entry!(DiscoveryCommand, pids::DISC_UN_MUTE, UnMute),
    handler_entry!(DiscoveryCommand, pids::DISC_MUTE, Mute),
    handler_entry!(SetCommand, pids::IDENTIFY_DEVICE, SetIdentify),
    handler_entry!(SetCommand, pids::DEVICE_LABEL, SetDeviceLabel),
    handler_entry!(SetCommand, pids::DMX_START_ADDRESS, SetStartAddress),
    handler_entry!(SetCommand, pids::SUPPORTED_PARAMETERS, SetSupportedParameters),
    handler_entry!(SetCommand, pids::COMMS_STATUS, SetCommsStatus),
    handler_entry!(GetCommand, pids::IDENTIFY_DEVICE, GetIdentify),
    handler_entry!(GetCommand, pids::DEVICE_INFO, GetDeviceInfo),
    handler_entry!(GetCommand, pids::MANUFACTURER_LABEL, GetManufacturerLabel),
    handler_entry!(GetCommand, pids::DEVICE_MODEL_DESCRIPTION, GetModelDescription),
    handler_entry!(GetCommand, pids::DEVICE_LABEL, GetDeviceLabel),
    handler_entry!(GetCommand, pids::SOFTWARE_VERSION_LABEL, GetSoftwareVersionLabel),
    handler_entry!(GetCommand, pids::DMX_START_ADDRESS, GetStartAddress),
    handler_entry!(GetCommand, pids::SUPPORTED_PARAMETERS, GetSupportedParameters),
    handler_entry!(GetCommand, pids::COMMS_STATUS, GetCommsStatus),
];

macro_rules! nack {
    ($nack_reason:ident) => {
        RdmResult::NotAcknowledged(NackReason::$nack_reason)
    };
}

macro_rules! verify_get_request {
    ($message:expr) => {
        if $message.parameter_data_length() > 0 {
            return nack!(FormatError);
        }

        if $message.sub_device() != RDM_ROOT_DEVICE {
            return nack!(SubDeviceOutOfRange);
        }
    };
}

/// Rdm state of the device and the handlers that read and change it.
pub struct RdmResponderPackageHandler {
    uid: UniqueIdentifier,
    rdm_config: Option<RdmConfig>,
    handlers: &'static [HandlerEntry],
    discovery_muted: bool,
    identify: bool,
    device_label: DeviceLabel,
    comms_status: CommsStatus,
    rdm_changed: bool,
}

impl RdmResponderPackageHandler {
    /// Creates a new [RdmResponderPackageHandler]. Without an [RdmConfig] the device answers with
    /// empty labels and a start address of 0 and refuses to change the start address.
    pub fn new(uid: UniqueIdentifier, rdm_config: Option<RdmConfig>) -> Self {
        Self {
            uid,
            rdm_config,
            handlers: &RDM_HANDLERS,
            discovery_muted: false,
            identify: false,
            device_label: DeviceLabel::new(),
            comms_status: CommsStatus::default(),
            rdm_changed: false,
        }
    }

    /// Get the uid of the rdm responder.
    pub fn get_uid(&self) -> UniqueIdentifier {
        self.uid
    }

    pub fn is_identify(&self) -> bool {
        self.identify
    }

    pub fn is_discovery_muted(&self) -> bool {
        self.discovery_muted
    }

    pub fn get_label(&self) -> &[u8] {
        &self.device_label
    }

    /// The current dmx start address, None if the device has no [RdmConfig].
    pub fn get_start_address(&self) -> Option<u16> {
        self.rdm_config
            .as_ref()
            .map(|rdm_config| rdm_config.dmx_start_address)
    }

    pub fn get_comms_status(&self) -> CommsStatus {
        self.comms_status
    }

    /// Returns true once after a controller changed identify, label or start address.
    pub fn take_rdm_changed(&mut self) -> bool {
        core::mem::take(&mut self.rdm_changed)
    }

    /// Checks a received message before it is dispatched and counts the failures.
    /// `received` is the amount of bytes received after the start code.
    pub fn verify_message(&mut self, message: &RdmMessage, received: usize) -> bool {
        // the start code isn't stored but two checksum bytes follow the message
        let message_length = message.message_length() as usize;
        if received < RDM_HEADER_SIZE + 2 || received < message_length + 1 {
            log::debug!("rdm message ended after {} bytes", received);
            self.comms_status.short_message = self.comms_status.short_message.saturating_add(1);
            return false;
        }

        let expected_length =
            message.parameter_data_length() as usize + RDM_MESSAGE_LENGTH_OVERHEAD;
        if message_length != expected_length {
            log::debug!("rdm message length {} doesn't match its data", message_length);
            self.comms_status.length_mismatch =
                self.comms_status.length_mismatch.saturating_add(1);
            return false;
        }

        if message.sub_start_code() != SC_SUB_MESSAGE {
            log::debug!("unknown rdm sub start code {:#04x}", message.sub_start_code());
            return false;
        }

        if message.checksum() != message.calculate_checksum() {
            log::debug!("rdm checksum mismatch");
            self.comms_status.checksum_fail = self.comms_status.checksum_fail.saturating_add(1);
            return false;
        }

        true
    }

    /// Handle a verified rdm request. The message is rewritten to hold the response data.
    pub fn handle_rdm_request(&mut self, message: &mut RdmMessage) -> RdmAnswer {
        let is_for_me = match PackageAddress::from_bytes(&message.destination_uid()) {
            PackageAddress::Device(device_uid) if device_uid == self.uid => true,
            PackageAddress::ManufacturerBroadcast(manufacturer_uid)
                if manufacturer_uid == self.uid.manufacturer_uid() =>
            {
                false
            },
            PackageAddress::Broadcast => false,
            _ => return RdmAnswer::NoResponse,
        };

        let command_class = message.command_class_raw();
        let parameter_id = message.parameter_id();

        let handler = self
            .handlers
            .iter()
            .find(|entry| {
                entry.command_class as u8 == command_class && entry.parameter_id == parameter_id
            })
            .map(|entry| entry.handler);

        let answer = match handler {
            Some(handler) => self.invoke(handler, is_for_me, message),
            None => {
                log::debug!(
                    "no handler for command class {:#04x} pid {:#06x}",
                    command_class,
                    parameter_id
                );
                nack!(UnknownPid).into()
            },
        };

        if let RdmAnswer::Response(RdmResult::NotAcknowledged(nack_reason)) = answer {
            log::debug!("nack pid {:#06x}: {}", parameter_id, nack_reason);
        }

        answer
    }

    fn invoke(
        &mut self,
        handler: RdmHandler,
        is_for_me: bool,
        message: &mut RdmMessage,
    ) -> RdmAnswer {
        let handler = match handler {
            RdmHandler::Discovery(DiscoveryHandler::UniqueBranch) => {
                return self.handle_disc_unique_branch(message)
            },
            RdmHandler::Discovery(DiscoveryHandler::UnMute) => {
                return self.handle_disc_mute(is_for_me, false, message)
            },
            RdmHandler::Discovery(DiscoveryHandler::Mute) => {
                return self.handle_disc_mute(is_for_me, true, message)
            },
            RdmHandler::Parameter(handler) => handler,
        };

        let result = match handler {
            ParameterHandler::SetIdentify => self.handle_set_identify(message),
            ParameterHandler::SetDeviceLabel => self.handle_set_device_label(message),
            ParameterHandler::SetStartAddress => self.handle_set_start_address(message),
            ParameterHandler::SetSupportedParameters => nack!(UnsupportedCommandClass),
            ParameterHandler::SetCommsStatus => self.handle_set_comms_status(message),
            ParameterHandler::GetIdentify => self.handle_get_identify(message),
            ParameterHandler::GetDeviceInfo => self.handle_get_device_info(message),
            ParameterHandler::GetManufacturerLabel => {
                let label = self.rdm_config.as_ref().map(|c| c.manufacturer_label);
                Self::handle_get_label(label, message)
            },
            ParameterHandler::GetModelDescription => {
                let label = self.rdm_config.as_ref().map(|c| c.device_model_description);
                Self::handle_get_label(label, message)
            },
            ParameterHandler::GetSoftwareVersionLabel => {
                let label = self.rdm_config.as_ref().map(|c| c.software_version_label);
                Self::handle_get_label(label, message)
            },
            ParameterHandler::GetDeviceLabel => self.handle_get_device_label(message),
            ParameterHandler::GetStartAddress => self.handle_get_start_address(message),
            ParameterHandler::GetSupportedParameters => {
                self.handle_get_supported_parameters(message)
            },
            ParameterHandler::GetCommsStatus => self.handle_get_comms_status(message),
        };

        result.into()
    }

    fn handle_disc_unique_branch(&self, message: &RdmMessage) -> RdmAnswer {
        if self.discovery_muted {
            return RdmAnswer::NoResponse;
        }

        if message.message_length() != RDM_DISC_UNIQUE_BRANCH_LENGTH
            || message.parameter_data_length() != RDM_DISC_UNIQUE_BRANCH_DATA_LENGTH
        {
            return RdmAnswer::NoResponse;
        }

        // uids compare like big endian numbers, so the byte arrays can be compared directly
        let parameter_data = message.parameter_data();
        let own_uid = self.uid.to_bytes();
        if parameter_data[..6] <= own_uid[..] && own_uid[..] <= parameter_data[6..12] {
            return RdmAnswer::DiscoveryResponse;
        }

        RdmAnswer::NoResponse
    }

    fn handle_disc_mute(
        &mut self,
        is_for_me: bool,
        mute: bool,
        message: &mut RdmMessage,
    ) -> RdmAnswer {
        if !is_for_me || message.parameter_data_length() != 0 {
            return RdmAnswer::NoResponse;
        }

        self.discovery_muted = mute;
        message.set_parameter_data(&DiscoveryMuteResponse::default().serialize());

        RdmResult::Acknowledged.into()
    }

    fn handle_set_identify(&mut self, message: &mut RdmMessage) -> RdmResult {
        let identify = match message.parameter_data() {
            [0] => false,
            [1] => true,
            [_] => return nack!(DataOutOfRange),
            _ => return nack!(FormatError),
        };

        self.identify = identify;
        self.rdm_changed = true;
        message.set_parameter_data_length(0);

        RdmResult::Acknowledged
    }

    fn handle_set_device_label(&mut self, message: &mut RdmMessage) -> RdmResult {
        let device_label = match DeviceLabel::from_slice(message.parameter_data()) {
            Ok(device_label) => device_label,
            Err(_) => return nack!(FormatError),
        };

        self.device_label = device_label;
        self.rdm_changed = true;
        message.set_parameter_data_length(0);

        RdmResult::Acknowledged
    }

    fn handle_set_start_address(&mut self, message: &mut RdmMessage) -> RdmResult {
        if message.parameter_data_length() != 2 {
            return nack!(FormatError);
        }

        let dmx_start_address = match DmxStartAddress::deserialize(message.parameter_data()) {
            Ok(start_address) => start_address,
            Err(_) => return nack!(DataOutOfRange),
        };

        let rdm_config = match self.rdm_config.as_mut() {
            Some(rdm_config) => rdm_config,
            None => return nack!(HardwareFault),
        };

        rdm_config.dmx_start_address = dmx_start_address.as_u16();
        self.rdm_changed = true;
        message.set_parameter_data_length(0);

        RdmResult::Acknowledged
    }

    fn handle_set_comms_status(&mut self, message: &mut RdmMessage) -> RdmResult {
        if message.parameter_data_length() != 0 {
            return nack!(FormatError);
        }

        self.comms_status = CommsStatus::default();

        RdmResult::Acknowledged
    }

    fn handle_get_identify(&self, message: &mut RdmMessage) -> RdmResult {
        verify_get_request!(message);

        message.set_parameter_data(&[self.identify as u8]);
        RdmResult::Acknowledged
    }

    fn handle_get_device_info(&self, message: &mut RdmMessage) -> RdmResult {
        verify_get_request!(message);

        let device_info = match &self.rdm_config {
            Some(rdm_config) => DeviceInfo {
                device_model_id: rdm_config.device_model_id,
                product_category: rdm_config.product_category,
                software_version: rdm_config.software_version_id,
                dmx_footprint: rdm_config.dmx_footprint,
                dmx_start_address: rdm_config.dmx_start_address,
            },
            None => DeviceInfo {
                device_model_id: 0,
                product_category: DEFAULT_PRODUCT_CATEGORY,
                software_version: DEFAULT_SOFTWARE_VERSION_ID,
                dmx_footprint: 0,
                dmx_start_address: 0,
            },
        };

        let length = device_info.serialize_into(message.parameter_data_mut());
        message.set_parameter_data_length(length as u8);

        RdmResult::Acknowledged
    }

    fn handle_get_label(label: Option<&'static str>, message: &mut RdmMessage) -> RdmResult {
        verify_get_request!(message);

        let label = label.unwrap_or("").as_bytes();
        message.set_parameter_data(&label[..label.len().min(RDM_MAX_STRING_LENGTH)]);

        RdmResult::Acknowledged
    }

    fn handle_get_device_label(&self, message: &mut RdmMessage) -> RdmResult {
        verify_get_request!(message);

        message.set_parameter_data(&self.device_label);
        RdmResult::Acknowledged
    }

    fn handle_get_start_address(&self, message: &mut RdmMessage) -> RdmResult {
        verify_get_request!(message);

        let start_address = self.get_start_address().unwrap_or(0);
        message.set_parameter_data(&start_address.to_be_bytes());

        RdmResult::Acknowledged
    }

    fn handle_get_supported_parameters(&self, message: &mut RdmMessage) -> RdmResult {
        verify_get_request!(message);

        let additional_pids = self
            .rdm_config
            .as_ref()
            .map(|rdm_config| rdm_config.additional_supported_pids)
            .unwrap_or(&[]);

        // one pid is u16
        const MAX_PIDS_PER_RESPONSE: usize = RDM_MAX_PARAMETER_DATA_LENGTH / 2;

        let parameter_data = message.parameter_data_mut();
        let mut amount_pids = 0;
        for (pid, chunk) in INTERNALLY_SUPPORTED_PIDS
            .iter()
            .chain(additional_pids.iter())
            .take(MAX_PIDS_PER_RESPONSE)
            .zip(parameter_data.chunks_exact_mut(2))
        {
            chunk.copy_from_slice(&pid.to_be_bytes());
            amount_pids += 1;
        }
        message.set_parameter_data_length((amount_pids * 2) as u8);

        RdmResult::Acknowledged
    }

    fn handle_get_comms_status(&self, message: &mut RdmMessage) -> RdmResult {
        verify_get_request!(message);

        let length = self
            .comms_status
            .serialize_into(message.parameter_data_mut());
        message.set_parameter_data_length(length as u8);

        RdmResult::Acknowledged
    }
}

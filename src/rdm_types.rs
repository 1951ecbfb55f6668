use crate::consts::{
    DMX_BUFFER_SIZE, RDM_COMMS_STATUS_SIZE, RDM_DEVICE_INFO_SIZE, RDM_MAX_STRING_LENGTH,
};
use crate::layouts::{rdm_comms_status_layout, rdm_device_info_layout};
use modular_bitfield::bitfield;
use modular_bitfield::prelude::B12;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeserializationError;

impl core::fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "There was a deserialization error.")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DeserializationError {}

/// A dmx start address between 1 and 512.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmxStartAddress(u16);

impl DmxStartAddress {
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Expects exactly two big endian bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializationError> {
        let start_address = u16::from_be_bytes(data.try_into().map_err(|_| DeserializationError)?);

        start_address.try_into()
    }
}

impl TryFrom<u16> for DmxStartAddress {
    type Error = DeserializationError;

    fn try_from(start_address: u16) -> Result<Self, Self::Error> {
        if !(1..=DMX_BUFFER_SIZE as u16).contains(&start_address) {
            return Err(DeserializationError);
        }

        Ok(Self(start_address))
    }
}

/// The label a controller assigned to the device.
pub type DeviceLabel = heapless::Vec<u8, RDM_MAX_STRING_LENGTH>;

/// Response to discovery mute/unmute requests.
#[derive(Debug, Default)]
pub struct DiscoveryMuteResponse {
    /// The responder is a proxy device.
    pub managed_proxy: bool,
    /// The responder supports sub devices.
    pub sub_device: bool,
    /// The responder is not operational before receiving a firmware update.
    pub boot_loader: bool,
    /// A proxy device has responded on behalf of another device.
    pub proxy_device: bool,
}

#[bitfield]
struct DiscControlField {
    managed_proxy: bool,
    sub_device: bool,
    boot_loader: bool,
    proxy_device: bool,
    #[skip]
    reserved: B12,
}

impl DiscoveryMuteResponse {
    /// The control field as sent on the wire. Bit 0 is the managed proxy flag.
    pub fn serialize(&self) -> [u8; 2] {
        let control_field = DiscControlField::new()
            .with_managed_proxy(self.managed_proxy)
            .with_sub_device(self.sub_device)
            .with_boot_loader(self.boot_loader)
            .with_proxy_device(self.proxy_device);

        u16::from_le_bytes(control_field.into_bytes()).to_be_bytes()
    }
}

pub struct DeviceInfo {
    pub device_model_id: u16,
    pub product_category: u16,
    pub software_version: u32,
    pub dmx_footprint: u16,
    pub dmx_start_address: u16,
}

impl DeviceInfo {
    /// Writes the device info into `dest` and returns the amount of bytes written.
    /// The device always reports rdm protocol 1.0, one personality, no sub devices and no sensors.
    pub fn serialize_into(&self, dest: &mut [u8]) -> usize {
        let mut device_info_view =
            rdm_device_info_layout::View::new(&mut dest[..RDM_DEVICE_INFO_SIZE]);

        device_info_view.protocol_version_mut().write(0x01_00);
        device_info_view
            .device_model_id_mut()
            .write(self.device_model_id);
        device_info_view
            .product_category_mut()
            .write(self.product_category);
        device_info_view
            .software_version_id_mut()
            .write(self.software_version);
        device_info_view
            .dmx_footprint_mut()
            .write(self.dmx_footprint);
        device_info_view.current_personality_mut().write(1);
        device_info_view.personality_count_mut().write(1);
        device_info_view
            .dmx_start_address_mut()
            .write(self.dmx_start_address);
        device_info_view.sub_device_count_mut().write(0);
        device_info_view.sensor_count_mut().write(0);

        RDM_DEVICE_INFO_SIZE
    }
}

/// Counters for rdm messages that were dropped before they reached the dispatcher.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommsStatus {
    /// The message ended before its length field said it would.
    pub short_message: u16,
    /// The length field doesn't match the parameter data length.
    pub length_mismatch: u16,
    /// The checksum didn't match.
    pub checksum_fail: u16,
}

impl CommsStatus {
    pub fn serialize_into(&self, dest: &mut [u8]) -> usize {
        let mut comms_status_view =
            rdm_comms_status_layout::View::new(&mut dest[..RDM_COMMS_STATUS_SIZE]);

        comms_status_view
            .short_message_mut()
            .write(self.short_message);
        comms_status_view
            .length_mismatch_mut()
            .write(self.length_mismatch);
        comms_status_view
            .checksum_fail_mut()
            .write(self.checksum_fail);

        RDM_COMMS_STATUS_SIZE
    }
}

use crate::dmx_uart_driver::{UartConfig, UartFraming};

pub const DMX_NULL_START: u8 = 0x00;
/// Amount of slots in one dmx frame, excluding the start code.
pub const DMX_BUFFER_SIZE: usize = 512;
pub const SC_RDM: u8 = 0xCC;
pub const SC_SUB_MESSAGE: u8 = 0x01;

pub const PREAMBLE_BYTE: u8 = 0xFE;
pub const SEPARATOR_BYTE: u8 = 0xAA;

pub const BROADCAST_UID: u64 = 0xFFFF_FFFFFFFF;
/// The prototyping manufacturer id handed out by the esta.
pub const PROTOTYPING_MANUFACTURER_ID: u16 = 0x7FF0;

pub const DMX_BAUD: u32 = 250_000;
/// A 0x00 at this baud rate holds the line low long enough to be seen as a break.
pub const BREAK_BAUD: u32 = 100_000;
/// Shorter break used in front of rdm responses.
pub const RDM_BREAK_BAUD: u32 = 45_500;

/// Uart settings for sending dmx and rdm slots.
pub const DMX_UART_CONFIG: UartConfig = UartConfig {
    baud_rate: DMX_BAUD,
    framing: UartFraming::EightNoneTwo,
};
/// Uart settings for receiving. The break shows up as a framing error.
pub const DMX_RECEIVE_UART_CONFIG: UartConfig = UartConfig {
    baud_rate: DMX_BAUD,
    framing: UartFraming::EightNoneOne,
};
pub const BREAK_UART_CONFIG: UartConfig = UartConfig {
    baud_rate: BREAK_BAUD,
    framing: UartFraming::EightEvenOne,
};
pub const RDM_BREAK_UART_CONFIG: UartConfig = UartConfig {
    baud_rate: RDM_BREAK_BAUD,
    framing: UartFraming::EightEvenOne,
};

/// Minimum time between the end of a request and the start of the response.
pub const RDM_MIN_RESPONSE_DELAY_MICROS: u32 = 176;

/// Size of the rdm header stored in the frame buffer (the start code is not stored).
pub const RDM_HEADER_SIZE: usize = 23;
/// Difference between the message length field and the parameter data length.
pub const RDM_MESSAGE_LENGTH_OVERHEAD: usize = 24;
pub const RDM_MAX_PARAMETER_DATA_LENGTH: usize = 231;
pub const RDM_MAX_STRING_LENGTH: usize = 32;
pub const RDM_DISC_UNIQUE_BRANCH_LENGTH: u8 = 36;
pub const RDM_DISC_UNIQUE_BRANCH_DATA_LENGTH: u8 = 12;
/// Excluding preamble and separator
pub const RDM_DISCOVERY_RESPONSE_SIZE: usize = 16;
/// Including 7 bytes preamble + 1 byte separator
pub const RDM_MAX_DISCOVERY_RESPONSE_SIZE: usize = RDM_DISCOVERY_RESPONSE_SIZE + 8;

pub const RDM_DEVICE_INFO_SIZE: usize = 0x13;
pub const RDM_COMMS_STATUS_SIZE: usize = 6;
pub const RDM_ROOT_DEVICE: u16 = 0;

use crate::consts::{
    BREAK_UART_CONFIG, DMX_BUFFER_SIZE, DMX_NULL_START, DMX_RECEIVE_UART_CONFIG, DMX_UART_CONFIG,
    RDM_BREAK_UART_CONFIG, RDM_MIN_RESPONSE_DELAY_MICROS, SC_RDM,
};
use crate::dmx_uart_driver::{BusDirection, Clock, DmxUartDriver};
use crate::frame_buffer::{DmxFrame, FrameBufferPair};
use crate::rdm_message::RdmMessage;
use crate::rdm_responder::{RdmAnswer, RdmConfig, RdmResponderPackageHandler};
use crate::rdm_types::CommsStatus;
use crate::response::{encode_discovery_response, prepare_response};
use crate::unique_identifier::UniqueIdentifier;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmxError<E> {
    /// An error raised by the uart driver.
    DriverError(E),
}

impl<E: core::fmt::Display> core::fmt::Display for DmxError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DmxError::DriverError(error) => error.fmt(f),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Display + core::fmt::Debug> std::error::Error for DmxError<E> {}

/// Operation mode of the [DmxDriver].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// The uart is shut down and the transceiver listens passively.
    Off,
    /// Receive dmx frames and answer rdm requests.
    Input,
    /// Send dmx frames continuously.
    Output,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum DmxState {
    /// Bytes are discarded until the next break.
    Idle,
    /// A break was seen (or sent), the next byte is the start code.
    Break,
    DmxRecv,
    RdmRecv,
    /// All 512 slots were received, waiting for the break that publishes the frame.
    DmxComplete,
    DmxTx,
}

pub struct DmxDriverConfig {
    /// The unique id that is used as a source id in the rdm responses.
    pub uid: UniqueIdentifier,
    /// Without a config the labels are empty, the start address reads as 0 and setting it is
    /// answered with a nack.
    pub rdm_config: Option<RdmConfig>,
}

impl Default for DmxDriverConfig {
    fn default() -> Self {
        Self {
            uid: UniqueIdentifier::default(),
            rdm_config: Some(RdmConfig::default()),
        }
    }
}

/// Interrupt driven dmx512 receiver/transmitter with an rdm responder.
///
/// The uart interrupts have to be routed to [DmxDriver::on_receive], [DmxDriver::on_break] and
/// [DmxDriver::on_transmit_complete]. The application polls the one shot flags
/// [DmxDriver::new_frame] and [DmxDriver::rdm_changed] and reads the last completed frame with
/// [DmxDriver::get_buffer].
pub struct DmxDriver<D: DmxUartDriver, C: Clock> {
    uart: D,
    clock: C,
    mode: Mode,
    state: DmxState,
    index: usize,
    buffers: FrameBufferPair,
    frame_count: u32,
    new_frame: bool,
    rdm_responder: RdmResponderPackageHandler,
}

impl<D: DmxUartDriver, C: Clock> DmxDriver<D, C> {
    /// Creates a new [DmxDriver] in [Mode::Off].
    /// The uart isn't touched until [DmxDriver::set_mode] is called.
    pub fn new(uart: D, clock: C, config: DmxDriverConfig) -> Self {
        Self {
            uart,
            clock,
            mode: Mode::Off,
            state: DmxState::Idle,
            index: 0,
            buffers: FrameBufferPair::new(),
            frame_count: 0,
            new_frame: false,
            rdm_responder: RdmResponderPackageHandler::new(config.uid, config.rdm_config),
        }
    }

    /// Stops the current mode and starts the new one.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), DmxError<D::DriverError>> {
        log::debug!("switching from {:?} to {:?}", self.mode, mode);

        match self.mode {
            Mode::Input | Mode::Output => self.uart.shutdown().map_err(DmxError::DriverError)?,
            Mode::Off => {},
        }

        self.mode = mode;

        match mode {
            Mode::Input => self.start_receive(),
            Mode::Output => self.start_transmit(),
            Mode::Off => {
                self.state = DmxState::Idle;
                self.uart.set_direction(BusDirection::Receive)
            },
        }
        .map_err(DmxError::DriverError)
    }

    fn start_receive(&mut self) -> Result<(), D::DriverError> {
        self.uart.configure(DMX_RECEIVE_UART_CONFIG)?;
        self.uart.set_direction(BusDirection::Receive)?;

        self.index = 0;
        self.state = DmxState::Idle;

        Ok(())
    }

    fn start_transmit(&mut self) -> Result<(), D::DriverError> {
        self.uart.set_direction(BusDirection::Transmit)?;

        self.index = 0;
        self.state = DmxState::Break;
        self.uart.configure(BREAK_UART_CONFIG)?;
        self.uart.write_byte(0)
    }

    /// Has to be called when the uart received bytes. Only does something in [Mode::Input].
    pub fn on_receive(&mut self) -> Result<(), DmxError<D::DriverError>> {
        if self.mode != Mode::Input {
            return Ok(());
        }

        critical_section::with(|_| self.read_bytes()).map_err(DmxError::DriverError)
    }

    /// Has to be called when the uart detected a framing error, which marks a break.
    /// Publishes a completed dmx frame or answers a received rdm request. Only does something
    /// in [Mode::Input].
    ///
    /// Only draining the uart and swapping the buffers happen in a critical section, the rdm
    /// response is sent with interrupts enabled.
    pub fn on_break(&mut self) -> Result<(), DmxError<D::DriverError>> {
        if self.mode != Mode::Input {
            return Ok(());
        }

        let (read_result, rdm_length) = critical_section::with(|_| self.complete_frame());

        let rdm_result = match rdm_length {
            Some(received) => {
                let result = self.process_rdm(received);
                critical_section::with(|_| self.arm_break());
                result
            },
            None => Ok(()),
        };

        read_result.and(rdm_result).map_err(DmxError::DriverError)
    }

    /// Has to be called when the uart finished sending a byte.
    /// Only does something in [Mode::Output].
    pub fn on_transmit_complete(&mut self) -> Result<(), DmxError<D::DriverError>> {
        if self.mode != Mode::Output {
            return Ok(());
        }

        self.next_tx().map_err(DmxError::DriverError)
    }

    /// Drains bytes the interrupts haven't consumed yet. Only does something in [Mode::Input].
    pub fn poll(&mut self) -> Result<(), DmxError<D::DriverError>> {
        if self.mode != Mode::Input {
            return Ok(());
        }

        self.on_receive()
    }

    fn read_bytes(&mut self) -> Result<(), D::DriverError> {
        while self.uart.bytes_available() > 0 {
            let byte = self.uart.read_byte()?;
            self.receive_byte(byte);
        }

        Ok(())
    }

    fn receive_byte(&mut self, byte: u8) {
        match self.state {
            DmxState::Break => {
                self.state = match byte {
                    DMX_NULL_START => DmxState::DmxRecv,
                    SC_RDM => DmxState::RdmRecv,
                    start_code => {
                        log::trace!("ignoring frame with start code {:#04x}", start_code);
                        DmxState::Idle
                    },
                }
            },
            DmxState::DmxRecv | DmxState::RdmRecv => {
                self.buffers.active_mut()[self.index] = byte;
                self.index += 1;

                if self.index == DMX_BUFFER_SIZE {
                    self.state = match self.state {
                        DmxState::DmxRecv => DmxState::DmxComplete,
                        _ => {
                            log::debug!("discarding oversized rdm message");
                            DmxState::Idle
                        },
                    };
                }
            },
            DmxState::Idle | DmxState::DmxComplete | DmxState::DmxTx => {},
        }
    }

    /// Drains the uart and publishes a completed dmx frame. Returns the length of a received
    /// rdm message, which still has to be answered.
    fn complete_frame(&mut self) -> (Result<(), D::DriverError>, Option<usize>) {
        let read_result = self.read_bytes();

        match self.state {
            DmxState::DmxRecv | DmxState::DmxComplete => {
                self.frame_count = self.frame_count.wrapping_add(1);
                self.buffers.swap();
                self.new_frame = true;
            },
            DmxState::RdmRecv => {
                // keep incoming bytes out of the buffer while it turns into the response
                self.state = DmxState::Idle;
                return (read_result, Some(self.index));
            },
            _ => {},
        }

        self.arm_break();
        (read_result, None)
    }

    fn arm_break(&mut self) {
        self.index = 0;
        self.state = DmxState::Break;
    }

    fn process_rdm(&mut self, received: usize) -> Result<(), D::DriverError> {
        let timing_start = self.clock.micros();
        let uid = self.rdm_responder.get_uid();

        let mut message = RdmMessage::new(self.buffers.active_mut());
        if !self.rdm_responder.verify_message(&message, received) {
            return Ok(());
        }

        match self.rdm_responder.handle_rdm_request(&mut message) {
            RdmAnswer::NoResponse => Ok(()),
            RdmAnswer::Response(result) => {
                prepare_response(&mut message, &uid, result);
                let length = message.as_bytes().len();

                self.wait_response_delay(timing_start);
                self.send_rdm(Some(SC_RDM), length)
            },
            RdmAnswer::DiscoveryResponse => {
                let length = encode_discovery_response(&uid, message.buffer_mut());
                self.send_rdm(None, length)
            },
        }
    }

    fn wait_response_delay(&mut self, timing_start: u32) {
        let elapsed = self.clock.micros().wrapping_sub(timing_start);
        if elapsed < RDM_MIN_RESPONSE_DELAY_MICROS {
            self.clock.delay_micros(RDM_MIN_RESPONSE_DELAY_MICROS - elapsed);
        }
    }

    /// Sends the first `length` bytes of the active buffer after an rdm break and returns
    /// to receive mode, even if sending failed.
    fn send_rdm(&mut self, start_code: Option<u8>, length: usize) -> Result<(), D::DriverError> {
        let send_result = self.write_rdm(start_code, length);
        if send_result.is_err() {
            log::warn!("sending the rdm response failed");
        }

        let receive_result = self.start_receive();
        send_result.and(receive_result)
    }

    fn write_rdm(&mut self, start_code: Option<u8>, length: usize) -> Result<(), D::DriverError> {
        self.uart.set_direction(BusDirection::Transmit)?;

        self.uart.configure(RDM_BREAK_UART_CONFIG)?;
        self.uart.write_byte(0)?;
        self.uart.flush()?;

        self.uart.configure(DMX_UART_CONFIG)?;
        if let Some(start_code) = start_code {
            self.uart.write_byte(start_code)?;
            self.uart.flush()?;
        }

        for byte in &self.buffers.active()[..length] {
            self.uart.write_byte(*byte)?;
            self.uart.flush()?;
        }

        Ok(())
    }

    fn next_tx(&mut self) -> Result<(), D::DriverError> {
        match self.state {
            DmxState::Break => {
                self.state = DmxState::DmxTx;
                self.uart.configure(DMX_UART_CONFIG)?;
                self.uart.write_byte(DMX_NULL_START)
            },
            DmxState::DmxTx if self.index == DMX_BUFFER_SIZE => {
                self.state = DmxState::Break;
                self.index = 0;
                self.uart.configure(BREAK_UART_CONFIG)?;
                self.uart.write_byte(0)
            },
            DmxState::DmxTx => {
                let byte = self.buffers.active()[self.index];
                self.index += 1;
                self.uart.write_byte(byte)
            },
            _ => Ok(()),
        }
    }

    /// Set a 0 based channel of the outgoing frame. Out of range channels are ignored.
    pub fn set_channel(&mut self, address: u16, value: u8) {
        if let Some(slot) = self.buffers.active_mut().get_mut(address as usize) {
            *slot = value;
        }
    }

    /// Replace the outgoing frame: every channel before `start_address` and after the copied
    /// values is set to 0. Values beyond the end of the frame are cut off.
    pub fn set_channels(&mut self, start_address: u16, values: &[u8]) {
        let frame = self.buffers.active_mut();
        let start_address = (start_address as usize).min(DMX_BUFFER_SIZE);
        let end_address = (start_address + values.len()).min(DMX_BUFFER_SIZE);

        frame[..start_address].fill(0);
        frame[start_address..end_address].copy_from_slice(&values[..end_address - start_address]);
        frame[end_address..].fill(0);
    }

    /// Like [DmxDriver::set_channel], but the first channel is 1.
    pub fn set_dmx_channel(&mut self, channel: u16, value: u8) {
        if let Some(address) = channel.checked_sub(1) {
            self.set_channel(address, value);
        }
    }

    /// Like [DmxDriver::set_channels], but the first channel is 1.
    pub fn set_dmx_channels(&mut self, start_channel: u16, values: &[u8]) {
        if let Some(start_address) = start_channel.checked_sub(1) {
            self.set_channels(start_address, values);
        }
    }

    /// The last completed frame. It doesn't change until the next frame is completed.
    pub fn get_buffer(&self) -> &DmxFrame {
        self.buffers.inactive()
    }

    /// Read a 0 based channel of the last completed frame. Out of range channels read as 0.
    pub fn get_channel(&self, address: u16) -> u8 {
        self.get_buffer()
            .get(address as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Like [DmxDriver::get_channel], but the first channel is 1.
    pub fn get_dmx_channel(&self, channel: u16) -> u8 {
        channel
            .checked_sub(1)
            .map_or(0, |address| self.get_channel(address))
    }

    /// Returns true once for every completed frame.
    pub fn new_frame(&mut self) -> bool {
        core::mem::take(&mut self.new_frame)
    }

    /// Returns true once after a controller changed identify, label or start address.
    pub fn rdm_changed(&mut self) -> bool {
        self.rdm_responder.take_rdm_changed()
    }

    /// Amount of completed frames, wraps around.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn is_identify(&self) -> bool {
        self.rdm_responder.is_identify()
    }

    pub fn get_label(&self) -> &[u8] {
        self.rdm_responder.get_label()
    }

    /// None if there is no [RdmConfig].
    pub fn start_address(&self) -> Option<u16> {
        self.rdm_responder.get_start_address()
    }

    /// Is the device muted for discovery?
    pub fn is_muted(&self) -> bool {
        self.rdm_responder.is_discovery_muted()
    }

    pub fn comms_status(&self) -> CommsStatus {
        self.rdm_responder.get_comms_status()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn get_uid(&self) -> UniqueIdentifier {
        self.rdm_responder.get_uid()
    }

    /// Access the uart driver, e.g. to clear interrupt flags.
    pub fn uart_mut(&mut self) -> &mut D {
        &mut self.uart
    }
}

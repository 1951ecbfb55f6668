#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use dmx_rdm_uart::command_class::RequestCommandClass;
use dmx_rdm_uart::consts::{DMX_UART_CONFIG, SC_RDM, SC_SUB_MESSAGE};
use dmx_rdm_uart::dmx_driver::{DmxDriver, DmxDriverConfig, Mode};
use dmx_rdm_uart::dmx_uart_driver::{BusDirection, Clock, DmxUartDriver, UartConfig};
use dmx_rdm_uart::unique_identifier::UniqueIdentifier;

pub const CONTROLLER_UID: [u8; 6] = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UartEvent {
    Configure(UartConfig),
    Direction(BusDirection),
    Shutdown,
    Write(u8),
    Flush,
}

#[derive(Debug, Eq, PartialEq)]
pub struct MockError;

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mock uart failed")
    }
}

/// Records every call and hands out scripted input.
#[derive(Default)]
pub struct MockUart {
    pub events: Vec<UartEvent>,
    pub input: VecDeque<u8>,
    pub fail_writes: bool,
    /// Record on the first write whether the global critical section is held.
    pub watch_critical_section: bool,
    pub written_in_critical_section: Option<bool>,
}

/// Another thread can only enter the critical section if this one doesn't hold it.
fn critical_section_held() -> bool {
    let (sender, receiver) = mpsc::channel();
    std::thread::spawn(move || critical_section::with(|_| sender.send(()).ok()));

    receiver.recv_timeout(Duration::from_millis(200)).is_err()
}

impl MockUart {
    /// Bytes written since the last data configuration, i.e. everything after the break.
    pub fn written_after_break(&self) -> Vec<u8> {
        let start = self
            .events
            .iter()
            .rposition(|event| *event == UartEvent::Configure(DMX_UART_CONFIG))
            .map_or(0, |position| position + 1);

        self.events[start..]
            .iter()
            .filter_map(|event| match event {
                UartEvent::Write(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }

    pub fn written(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|event| match event {
                UartEvent::Write(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }
}

impl DmxUartDriver for MockUart {
    type DriverError = MockError;

    fn configure(&mut self, config: UartConfig) -> Result<(), MockError> {
        self.events.push(UartEvent::Configure(config));
        Ok(())
    }

    fn set_direction(&mut self, direction: BusDirection) -> Result<(), MockError> {
        self.events.push(UartEvent::Direction(direction));
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), MockError> {
        self.events.push(UartEvent::Shutdown);
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), MockError> {
        if self.fail_writes {
            return Err(MockError);
        }

        if self.watch_critical_section && self.written_in_critical_section.is_none() {
            self.written_in_critical_section = Some(critical_section_held());
        }

        self.events.push(UartEvent::Write(byte));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MockError> {
        self.events.push(UartEvent::Flush);
        Ok(())
    }

    fn bytes_available(&self) -> usize {
        self.input.len()
    }

    fn read_byte(&mut self) -> Result<u8, MockError> {
        self.input.pop_front().ok_or(MockError)
    }
}

/// Advances by `step` microseconds every time it is read.
#[derive(Clone, Default)]
pub struct MockClock {
    pub now: Rc<Cell<u32>>,
    pub step: u32,
    pub delays: Rc<Cell<u32>>,
}

impl Clock for MockClock {
    fn micros(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        now
    }

    fn delay_micros(&mut self, micros: u32) {
        self.delays.set(self.delays.get() + micros);
        self.now.set(self.now.get().wrapping_add(micros));
    }
}

pub type TestDriver = DmxDriver<MockUart, MockClock>;

pub fn input_driver(config: DmxDriverConfig) -> TestDriver {
    init_logger();

    let mut driver = DmxDriver::new(MockUart::default(), MockClock::default(), config);
    driver.set_mode(Mode::Input).unwrap();
    driver.uart_mut().events.clear();
    driver
}

pub fn input_driver_with_clock(clock: MockClock) -> TestDriver {
    init_logger();

    let mut driver = DmxDriver::new(MockUart::default(), clock, DmxDriverConfig::default());
    driver.set_mode(Mode::Input).unwrap();
    driver.uart_mut().events.clear();
    driver
}

/// A break followed by `frame` (including its start code) and the next break.
pub fn receive_frame(driver: &mut TestDriver, frame: &[u8]) {
    driver.on_break().unwrap();
    driver.uart_mut().input.extend(frame.iter().copied());
    driver.on_receive().unwrap();
    driver.on_break().unwrap();
}

pub fn own_uid() -> [u8; 6] {
    UniqueIdentifier::default().to_bytes()
}

pub fn rdm_checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, byte| sum.wrapping_add(*byte as u16))
}

/// A complete rdm request as it is sent on the wire, start code and checksum included.
pub fn rdm_request(
    destination: [u8; 6],
    command_class: RequestCommandClass,
    parameter_id: u16,
    sub_device: u16,
    data: &[u8],
) -> Vec<u8> {
    let mut request = vec![SC_RDM, SC_SUB_MESSAGE, (data.len() + 24) as u8];
    request.extend_from_slice(&destination);
    request.extend_from_slice(&CONTROLLER_UID);
    request.extend_from_slice(&[0x2A, 0x01, 0x00]);
    request.extend_from_slice(&sub_device.to_be_bytes());
    request.push(command_class as u8);
    request.extend_from_slice(&parameter_id.to_be_bytes());
    request.push(data.len() as u8);
    request.extend_from_slice(data);

    let checksum = rdm_checksum(&request);
    request.extend_from_slice(&checksum.to_be_bytes());
    request
}

/// Parsed view of a response captured from the mock uart.
pub struct Response {
    pub bytes: Vec<u8>,
}

impl Response {
    pub fn new(bytes: Vec<u8>) -> Self {
        assert!(bytes.len() >= 26, "response too short: {bytes:?}");
        assert_eq!(bytes[0], SC_RDM);
        assert_eq!(bytes[1], SC_SUB_MESSAGE);
        assert_eq!(bytes.len(), bytes[2] as usize + 2);

        let message_end = bytes.len() - 2;
        let checksum = u16::from_be_bytes([bytes[message_end], bytes[message_end + 1]]);
        assert_eq!(checksum, rdm_checksum(&bytes[..message_end]));

        Self { bytes }
    }

    pub fn destination(&self) -> &[u8] {
        &self.bytes[3..9]
    }

    pub fn source(&self) -> &[u8] {
        &self.bytes[9..15]
    }

    pub fn transaction_number(&self) -> u8 {
        self.bytes[15]
    }

    pub fn response_type(&self) -> u8 {
        self.bytes[16]
    }

    pub fn command_class(&self) -> u8 {
        self.bytes[20]
    }

    pub fn parameter_id(&self) -> u16 {
        u16::from_be_bytes([self.bytes[21], self.bytes[22]])
    }

    pub fn data(&self) -> &[u8] {
        &self.bytes[24..24 + self.bytes[23] as usize]
    }

    pub fn nack_reason(&self) -> u16 {
        assert_eq!(self.response_type(), 0x02);
        u16::from_be_bytes([self.data()[0], self.data()[1]])
    }
}

/// Sends a request to the driver and returns what it answered.
pub fn exchange(driver: &mut TestDriver, request: &[u8]) -> Option<Vec<u8>> {
    driver.uart_mut().events.clear();
    receive_frame(driver, request);

    let written = driver.uart_mut().written_after_break();
    if written.is_empty() {
        None
    } else {
        Some(written)
    }
}

/// Character framing of the uart.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartFraming {
    /// 8 data bits, no parity, 1 stop bit.
    EightNoneOne,
    /// 8 data bits, no parity, 2 stop bits. Used for dmx slots.
    EightNoneTwo,
    /// 8 data bits, even parity, 1 stop bit. Used to stretch a 0x00 into a break.
    EightEvenOne,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    pub baud_rate: u32,
    pub framing: UartFraming,
}

/// Direction of the rs485 transceiver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusDirection {
    Receive,
    Transmit,
}

/// Object to implement access to the uart.
///
/// The driver is interrupt driven: the implementation has to call
/// [crate::dmx_driver::DmxDriver::on_receive] when bytes are available,
/// [crate::dmx_driver::DmxDriver::on_break] when a framing error (a break) was detected and
/// [crate::dmx_driver::DmxDriver::on_transmit_complete] when a byte has been fully sent.
/// See [crate::binding::DriverSlot] for routing those interrupts to the driver.
pub trait DmxUartDriver {
    type DriverError;

    /// Reconfigure baud rate and framing. Pending output is sent with the old settings first.
    fn configure(&mut self, config: UartConfig) -> Result<(), Self::DriverError>;

    /// Switch the rs485 transceiver and enable the matching interrupts
    /// (transmit complete or receive plus framing error).
    fn set_direction(&mut self, direction: BusDirection) -> Result<(), Self::DriverError>;

    /// Disable the uart and all of its interrupts.
    fn shutdown(&mut self) -> Result<(), Self::DriverError>;

    /// Queue one byte for sending.
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::DriverError>;

    /// Block until every queued byte has left the shift register.
    fn flush(&mut self) -> Result<(), Self::DriverError>;

    /// Amount of received bytes waiting in the uart or in software buffers.
    fn bytes_available(&self) -> usize;

    /// Read one received byte. Only called if [DmxUartDriver::bytes_available] is non zero.
    fn read_byte(&mut self) -> Result<u8, Self::DriverError>;
}

/// Microsecond time source used to keep the minimum delay before rdm responses.
pub trait Clock {
    /// Free running microsecond counter. Allowed to wrap.
    fn micros(&self) -> u32;

    /// Busy wait for the given amount of microseconds.
    fn delay_micros(&mut self, micros: u32);
}

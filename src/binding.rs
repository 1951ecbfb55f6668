//! Routes bare interrupt handlers to the driver that owns a uart.
//!
//! ```rust
//! use dmx_rdm_uart::binding::DriverSlot;
//! # use dmx_rdm_uart::dmx_uart_driver::{BusDirection, Clock, DmxUartDriver, UartConfig};
//! # use dmx_rdm_uart::dmx_driver::{DmxDriver, DmxDriverConfig, Mode};
//! # struct Uart;
//! # impl DmxUartDriver for Uart {
//! #     type DriverError = ();
//! #     fn configure(&mut self, _: UartConfig) -> Result<(), ()> { Ok(()) }
//! #     fn set_direction(&mut self, _: BusDirection) -> Result<(), ()> { Ok(()) }
//! #     fn shutdown(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn write_byte(&mut self, _: u8) -> Result<(), ()> { Ok(()) }
//! #     fn flush(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn bytes_available(&self) -> usize { 0 }
//! #     fn read_byte(&mut self) -> Result<u8, ()> { Err(()) }
//! # }
//! # struct Timer;
//! # impl Clock for Timer {
//! #     fn micros(&self) -> u32 { 0 }
//! #     fn delay_micros(&mut self, _: u32) {}
//! # }
//!
//! static DMX1: DriverSlot<DmxDriver<Uart, Timer>> = DriverSlot::new();
//!
//! // uart status interrupt
//! fn uart1_status() {
//!     DMX1.with(|dmx| dmx.on_receive());
//! }
//!
//! // uart error interrupt, fires on the break
//! fn uart1_error() {
//!     DMX1.with(|dmx| dmx.on_break());
//! }
//!
//! DMX1.install(DmxDriver::new(Uart, Timer, DmxDriverConfig::default()));
//! DMX1.with(|dmx| dmx.set_mode(Mode::Input)).unwrap().unwrap();
//! uart1_status();
//! uart1_error();
//!
//! // main loop
//! if DMX1.with(|dmx| dmx.new_frame()) == Some(true) {
//!     let _first_channel = DMX1.with(|dmx| dmx.get_dmx_channel(1));
//! }
//! ```

use core::cell::RefCell;
use critical_section::Mutex;

/// Holds at most one driver. Every access happens inside a critical section.
pub struct DriverSlot<D> {
    driver: Mutex<RefCell<Option<D>>>,
}

impl<D> Default for DriverSlot<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> DriverSlot<D> {
    pub const fn new() -> Self {
        Self {
            driver: Mutex::new(RefCell::new(None)),
        }
    }

    /// Moves the driver into the slot and returns the one that was installed before.
    pub fn install(&self, driver: D) -> Option<D> {
        critical_section::with(|cs| self.driver.borrow_ref_mut(cs).replace(driver))
    }

    /// Removes the driver, interrupts routed to this slot are ignored afterwards.
    pub fn take(&self) -> Option<D> {
        critical_section::with(|cs| self.driver.borrow_ref_mut(cs).take())
    }

    /// Runs `f` with the installed driver. Returns None if no driver is installed.
    ///
    /// The global critical section is held for as long as `f` runs, so interrupts stay disabled
    /// while e.g. [crate::dmx_driver::DmxDriver::on_break] sends an rdm response.
    pub fn with<R>(&self, f: impl FnOnce(&mut D) -> R) -> Option<R> {
        critical_section::with(|cs| self.driver.borrow_ref_mut(cs).as_mut().map(f))
    }
}

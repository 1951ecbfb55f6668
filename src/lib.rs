//! Rust library for receiving and sending DMX512 (ANSI E1.11) frames and answering DMX-RDM
//! (ANSI E1.20) requests on a RS485 bus that is attached to a plain uart. This library is no-std
//! and does no heap allocation, it is meant to run directly in the uart interrupts of a
//! microcontroller.
//!
//! Please refer to the [official specifications](https://tsp.esta.org/) published by the ESTA.
//!
//! <div class="warning">This library is wip, it has not yet received extensive testing and the api
//! might not be final.</div>
//!
//! # Usage
//! The hardware is accessed through the [dmx_uart_driver::DmxUartDriver] trait, timing through
//! [dmx_uart_driver::Clock]. The [dmx_driver::DmxDriver] owns both and has to be fed with the
//! uart interrupts, see [binding::DriverSlot] for sharing it between interrupt handlers and
//! the application.
//!
//! ```rust
//! use dmx_rdm_uart::dmx_driver::{DmxDriver, DmxDriverConfig, Mode};
//! use dmx_rdm_uart::dmx_uart_driver::{BusDirection, Clock, DmxUartDriver, UartConfig};
//! use dmx_rdm_uart::rdm_responder::RdmConfig;
//! use dmx_rdm_uart::unique_identifier::UniqueIdentifier;
//!
//! struct Uart;
//!
//! impl DmxUartDriver for Uart {
//!     type DriverError = ();
//!
//!     fn configure(&mut self, _config: UartConfig) -> Result<(), ()> { Ok(()) }
//!     fn set_direction(&mut self, _direction: BusDirection) -> Result<(), ()> { Ok(()) }
//!     fn shutdown(&mut self) -> Result<(), ()> { Ok(()) }
//!     fn write_byte(&mut self, _byte: u8) -> Result<(), ()> { Ok(()) }
//!     fn flush(&mut self) -> Result<(), ()> { Ok(()) }
//!     fn bytes_available(&self) -> usize { 0 }
//!     fn read_byte(&mut self) -> Result<u8, ()> { Err(()) }
//! }
//!
//! struct Timer;
//!
//! impl Clock for Timer {
//!     fn micros(&self) -> u32 { 0 }
//!     fn delay_micros(&mut self, _micros: u32) {}
//! }
//!
//! let mut dmx = DmxDriver::new(
//!     Uart,
//!     Timer,
//!     DmxDriverConfig {
//!         uid: UniqueIdentifier::new(0x7FF0, 1).unwrap(),
//!         rdm_config: Some(RdmConfig {
//!             dmx_footprint: 3,
//!             manufacturer_label: "Example Inc.",
//!             device_model_description: "RGB spot",
//!             ..Default::default()
//!         }),
//!     },
//! );
//!
//! dmx.set_mode(Mode::Input).unwrap();
//!
//! // in the application loop
//! dmx.poll().unwrap();
//! if dmx.new_frame() {
//!     let start_address = dmx.start_address().unwrap_or(1);
//!     let red = dmx.get_dmx_channel(start_address);
//!     println!("red is now {red}");
//! }
//!
//! if dmx.rdm_changed() {
//!     println!("identify: {}", dmx.is_identify());
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Sharing a driver between interrupt handlers and the application.
pub mod binding;
pub mod command_class;
pub mod consts;
/// The interrupt driven dmx state machine and its application api.
pub mod dmx_driver;
/// The traits a uart and a timer have to implement.
pub mod dmx_uart_driver;
pub mod frame_buffer;
mod layouts;
pub mod pids;
pub mod rdm_message;
/// Handling of rdm requests without an underlying driver.
pub mod rdm_responder;
pub mod rdm_types;
pub mod response;
pub mod types;
pub mod unique_identifier;
mod utils;

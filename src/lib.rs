//! Driver library for the Microchip MCP23x08 8-bit I/O expanders.
//!
//! The MCP23S08 (SPI) and MCP23008 (I2C) share one register map: eight GPIO pins, each
//! configurable as input or output, with per-pin polarity inversion, weak pull-ups and
//! interrupt-on-change. This driver gives register-level access to both variants through a
//! single [`Expander`] API; which bus is used is decided by the [`ExpanderInterface`] you build
//! the `Expander` from.
//!
//! This driver is intended to work on embedded platforms using any implementation of the
//! `embedded-hal` trait library.
//!
//! # Construction
//!
//! To set up the driver:
//!
//! - Use your platform's `embedded-hal` implementation to obtain the bus your chip is connected
//!   to, and for the MCP23S08, one GPIO push-pull output pin for chip select.
//! - Put the bus inside a mutex implementing [`IOMutex`]. Every device on that bus must be given
//!   the same mutex.
//! - Construct the [`ExpanderInterface`] for your variant, [`SpiInterface`] or [`I2cInterface`],
//!   passing the level strapped on the chip's address pins as a [`DeviceAddress`].
//! - Construct an [`Expander`] with the interface and the [`PowerOnConfig`] to apply, and call
//!   [`Expander::init`].
//!
//! ```ignore
//! let spi = /* construct something implementing embedded_hal::blocking::spi::Transfer<u8> */
//! let cs = /* construct something implementing embedded_hal::digital::v2::OutputPin */
//!
//! let bus = mcp23x08::DefaultMutex::new(spi);
//! let ei = mcp23x08::SpiInterface::new(&bus, cs, mcp23x08::DeviceAddress::new(0b101));
//! let mut expander = mcp23x08::Expander::new(ei, mcp23x08::PowerOnConfig::default());
//! ```
//!
//! # Initialization
//!
//! *See [`Expander::init`] and [`PowerOnConfig`].*
//!
//! ```
//! # fn main() -> Result<(), std::convert::Infallible> {
//! # let ei = mcp23x08::interface::noop::NoopInterface;
//! # let mut delay = mcp23x08::interface::noop::NoopDelay;
//! let cfg = mcp23x08::PowerOnConfig::default()
//!     .iodir(0b1111_0000)
//!     .gppu(0b1111_0000);
//! let mut expander = mcp23x08::Expander::new(ei, cfg);
//! if !expander.init(&mut delay)? {
//!     // IOCON did not read back as written; the chip is probably not answering.
//! }
//! # Ok(())
//! # }
//! ```
//!
//! `init` reports whether the IOCON register read back as written. It carries on writing the
//! remaining registers either way.
//!
//! # Register access
//!
//! ```
//! # fn main() -> Result<(), std::convert::Infallible> {
//! # let ei = mcp23x08::interface::noop::NoopInterface;
//! # let mut expander = mcp23x08::Expander::new(ei, Default::default());
//! use mcp23x08::{Pins, Register};
//!
//! expander.write(Register::Iodir, 0b1111_0000)?;
//! expander.write_port(0b0000_0101)?;
//! let port = Pins::from(expander.read_port()?);
//! let button_down = !port.pin(4);
//! # Ok(())
//! # }
//! ```
//!
//! Register values are plain `u8`s with GP0 in the LSB; [`Pins`] is available if you would rather
//! address them by pin number.
//!
//! # Errors
//!
//! Every bus operation returns a [`TransportError`]. Whether that is fatal is up to the caller;
//! the driver never retries.
//!
//! # Mutual exclusion
//!
//! The interfaces require you to provide a mutual exclusion primitive to arbitrate access to the
//! bus. For now, they are parameterized over a type implementing the `IOMutex` trait, which is a
//! concept borrowed from [`shared-bus`](http://docs.rs/shared-bus).
//!
//! In a `std` environment you may enable the `std` Cargo feature, and `mutex::DefaultMutex<T>`
//! will be a type alias to `std::sync::Mutex<T>` with a provided impl of `IOMutex`. Similarly, for
//! Cortex-M environments using the `cortex-m` crate, enabling the `cortexm` Cargo feature will
//! alias `mutex::DefaultMutex<T>` to `cortex_m::interrupt::Mutex<core::cell::RefCell<T>>` with a
//! provided `IOMutex` impl. With both features enabled, `DefaultMutex` follows `std`. With
//! neither, there is no `DefaultMutex` and any type implementing `IOMutex` can be used.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate core;
#[cfg(test)]
extern crate proptest;
#[macro_use]
extern crate log;

extern crate embedded_hal as hal;

pub mod address;
pub mod config;
pub mod expander;
pub mod interface;
pub mod mutex;
pub mod pins;
pub mod registers;

pub use address::DeviceAddress;
pub use config::PowerOnConfig;
pub use expander::Expander;
pub use interface::i2c::I2cInterface;
pub use interface::spi::SpiInterface;
pub use interface::{ExpanderInterface, Protocol, TransportError};
#[cfg(any(feature = "std", feature = "cortexm"))]
pub use mutex::DefaultMutex;
pub use mutex::IOMutex;
pub use pins::Pins;
pub use registers::Register;

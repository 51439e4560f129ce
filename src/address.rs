//! Hardware address (A2..A0 strap pins) of an MCP23x08.
//!
//! The two bus variants use the address differently. The MCP23S08 only decodes A0 and A1, and
//! they travel inside the SPI control byte; chip select already picks the device, so A2 plays no
//! part. The MCP23008 decodes all three bits, and they form the low bits of the 7-bit I2C slave
//! address. The control byte itself is then emitted by the I2C peripheral as the address phase.
//! Keep the two encodings apart: unifying them either drops A2 on I2C or leaks it into SPI.

use registers::WRITE_CONTROL_BYTE;

/// The 3-bit hardware address of a device.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct DeviceAddress(u8);

fn valid_address(addr: u8) -> u8 {
    match addr {
        0..=7 => addr,
        _ => panic!("MCP23x08 has no hardware address {}", addr),
    }
}

impl DeviceAddress {
    /// Create an address from its numeric value, `A2 A1 A0` as bits 2..0. Panics if `addr` does
    /// not fit in 3 bits.
    pub fn new(addr: u8) -> Self {
        DeviceAddress(valid_address(addr))
    }

    /// Create an address from the levels strapped onto the A0, A1 and A2 pins.
    pub fn from_pins(a0: bool, a1: bool, a2: bool) -> Self {
        DeviceAddress(((a2 as u8) << 2) | ((a1 as u8) << 1) | (a0 as u8))
    }

    /// The full 3-bit value.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// The SPI control byte for `base` (`READ_CONTROL_BYTE` or `WRITE_CONTROL_BYTE`). Only A0 and
    /// A1 are encoded.
    pub fn spi_control_byte(self, base: u8) -> u8 {
        base + ((self.0 & 0b011) << 1)
    }

    /// The 7-bit I2C slave address. All three address bits are encoded.
    pub fn i2c_target(self) -> u8 {
        (WRITE_CONTROL_BYTE >> 1) | self.0
    }
}

impl From<DeviceAddress> for u8 {
    fn from(addr: DeviceAddress) -> u8 {
        addr.0
    }
}

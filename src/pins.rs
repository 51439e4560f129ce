//! A bit accessor over raw register values.
//!
//! The driver hands out and accepts plain `u8` register values. What a bit means depends on the
//! register (direction, polarity, pull-up, level...), and the driver does not interpret it. `Pins`
//! is for callers who would rather address bits by pin number than by mask.
//!
//! ```
//! use mcp23x08::Pins;
//!
//! let port = Pins::from(0b0000_0101);
//! assert!(port.pin(0));
//! assert!(!port.pin(1));
//! assert_eq!(u8::from(port.with_pin(7, true)), 0b1000_0101);
//! ```

use core::fmt;

fn valid_pin(pin: u8) -> u8 {
    match pin {
        0..=7 => pin,
        _ => panic!("MCP23x08 does not have pin GP{}", pin),
    }
}

/// One bit per pin, GP0 in the LSB.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Pins(u8);

impl Pins {
    /// The state of pin `GP<pin>`. Panics if `pin > 7`.
    pub fn pin(self, pin: u8) -> bool {
        self.0 & (1 << valid_pin(pin)) != 0
    }

    /// Set or clear pin `GP<pin>` in place. Panics if `pin > 7`.
    pub fn set_pin(&mut self, pin: u8, bit: bool) {
        let mask = 1 << valid_pin(pin);
        if bit {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    /// A copy with pin `GP<pin>` set or cleared. Panics if `pin > 7`.
    pub fn with_pin(mut self, pin: u8, bit: bool) -> Self {
        self.set_pin(pin, bit);
        self
    }

    /// The raw register value.
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl From<u8> for Pins {
    fn from(bits: u8) -> Self {
        Pins(bits)
    }
}

impl From<Pins> for u8 {
    fn from(pins: Pins) -> u8 {
        pins.0
    }
}

impl fmt::Debug for Pins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pins({:#010b})", self.0)
    }
}

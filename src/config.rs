//! The register values written to the MCP23x08 at power-on.

use registers::Register;

/// The full register configuration `Expander::init` writes to the device.
///
/// `PowerOnConfig::default()` matches the chip's own reset state (all pins inputs, everything else
/// cleared), so only the registers that differ need setting:
///
/// ```
/// # use mcp23x08::PowerOnConfig;
/// let cfg = PowerOnConfig::default()
///     .iodir(0b1111_0000)
///     .gppu(0b1111_0000)
///     .olat(0b0000_0101);
/// assert_eq!(cfg.iocon, 0x00);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerOnConfig {
    /// Pin direction, a set bit makes the pin an input.
    pub iodir: u8,
    /// Input polarity, a set bit inverts the pin as read from GPIO.
    pub ipol: u8,
    /// Interrupt-on-change enable per pin.
    pub gpinten: u8,
    /// Comparison value for pins whose INTCON bit is set.
    pub defval: u8,
    /// Interrupt compare mode, set bits compare against DEFVAL instead of the previous value.
    pub intcon: u8,
    /// Device configuration, written first and read back to check the chip is answering.
    pub iocon: u8,
    /// Weak pull-up enable per pin.
    pub gppu: u8,
    /// Written to the GPIO register, i.e. the initial output level.
    pub gpio: u8,
    /// Output latch.
    pub olat: u8,
}

impl Default for PowerOnConfig {
    fn default() -> Self {
        Self {
            iodir: 0xFF,
            ipol: 0x00,
            gpinten: 0x00,
            defval: 0x00,
            intcon: 0x00,
            iocon: 0x00,
            gppu: 0x00,
            gpio: 0x00,
            olat: 0x00,
        }
    }
}

impl PowerOnConfig {
    /// Set the IODIR value.
    pub fn iodir(mut self, v: u8) -> Self {
        self.iodir = v;
        self
    }

    /// Set the IPOL value.
    pub fn ipol(mut self, v: u8) -> Self {
        self.ipol = v;
        self
    }

    /// Set the GPINTEN value.
    pub fn gpinten(mut self, v: u8) -> Self {
        self.gpinten = v;
        self
    }

    /// Set the DEFVAL value.
    pub fn defval(mut self, v: u8) -> Self {
        self.defval = v;
        self
    }

    /// Set the INTCON value.
    pub fn intcon(mut self, v: u8) -> Self {
        self.intcon = v;
        self
    }

    /// Set the IOCON value.
    pub fn iocon(mut self, v: u8) -> Self {
        self.iocon = v;
        self
    }

    /// Set the GPPU value.
    pub fn gppu(mut self, v: u8) -> Self {
        self.gppu = v;
        self
    }

    /// Set the GPIO value.
    pub fn gpio(mut self, v: u8) -> Self {
        self.gpio = v;
        self
    }

    /// Set the OLAT value.
    pub fn olat(mut self, v: u8) -> Self {
        self.olat = v;
        self
    }

    /// The writes that follow the IOCON check during initialization, in the order they are
    /// issued.
    pub fn register_writes(&self) -> [(Register, u8); 8] {
        [
            (Register::Iodir, self.iodir),
            (Register::Ipol, self.ipol),
            (Register::Gpinten, self.gpinten),
            (Register::Defval, self.defval),
            (Register::Intcon, self.intcon),
            (Register::Gppu, self.gppu),
            (Register::Gpio, self.gpio),
            (Register::Olat, self.olat),
        ]
    }
}

//! The register map shared by the MCP23S08 and MCP23008.

/// Control byte base for a register read. The device address bits are added on top of this.
pub const READ_CONTROL_BYTE: u8 = 0x41;

/// Control byte base for a register write. The device address bits are added on top of this.
pub const WRITE_CONTROL_BYTE: u8 = 0x40;

/// A register address within the MCP23x08. These are created by conversion from `Register`. It is
/// a newtype around `u8` that prevents invalid addresses from being forged and passed to
/// `ExpanderInterface` methods.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RegisterAddress(pub(crate) u8);

impl From<RegisterAddress> for u8 {
    /// Convert a `RegisterAddress` into a `u8` corresponding to the hardware address.
    fn from(addr: RegisterAddress) -> u8 {
        addr.0
    }
}

/// The eleven addressable registers of the MCP23x08.
///
/// Every register holds one bit per pin, GP0 in the LSB through GP7 in the MSB.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Register {
    /// I/O direction. A set bit makes the pin an input, a clear bit an output.
    Iodir,

    /// Input polarity. A set bit makes the GPIO register report the inverted level of the pin.
    Ipol,

    /// Interrupt-on-change enable, per pin.
    Gpinten,

    /// Default compare value for interrupt-on-change.
    Defval,

    /// Interrupt control. A set bit compares the pin against `Defval`, a clear bit against its
    /// previous value.
    Intcon,

    /// I/O expander configuration: sequential operation, slew rate, hardware addressing and the
    /// INT pin's drive mode and polarity.
    Iocon,

    /// Weak pull-up enable, per pin.
    Gppu,

    /// Interrupt flags. Read-only on the chip.
    Intf,

    /// Port value captured when the interrupt fired. Read-only on the chip.
    Intcap,

    /// Live logic level on the pins. Writing it writes the output latch.
    Gpio,

    /// Output latch, the last value commanded for the output pins.
    Olat,
}

impl Register {
    /// All registers, in address order.
    pub const ALL: [Register; 11] = [
        Register::Iodir,
        Register::Ipol,
        Register::Gpinten,
        Register::Defval,
        Register::Intcon,
        Register::Iocon,
        Register::Gppu,
        Register::Intf,
        Register::Intcap,
        Register::Gpio,
        Register::Olat,
    ];

    /// Whether the chip ignores writes to this register. The driver still transmits such writes;
    /// this is for callers that want to avoid them.
    pub fn is_read_only(self) -> bool {
        match self {
            Register::Intf | Register::Intcap => true,
            _ => false,
        }
    }
}

impl From<Register> for RegisterAddress {
    /// Convert a `Register` into a `RegisterAddress`.
    fn from(reg: Register) -> RegisterAddress {
        use self::Register::*;
        match reg {
            Iodir => RegisterAddress(0x00),
            Ipol => RegisterAddress(0x01),
            Gpinten => RegisterAddress(0x02),
            Defval => RegisterAddress(0x03),
            Intcon => RegisterAddress(0x04),
            Iocon => RegisterAddress(0x05),
            Gppu => RegisterAddress(0x06),
            Intf => RegisterAddress(0x07),
            Intcap => RegisterAddress(0x08),
            Gpio => RegisterAddress(0x09),
            Olat => RegisterAddress(0x0A),
        }
    }
}

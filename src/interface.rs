//! This module provides shims between `embedded-hal` bus implementations and the MCP23x08's
//! registers, one per supported bus: SPI for the MCP23S08 and I2C for the MCP23008.
//!
//! Each interface borrows the bus through an [`IOMutex`](crate::mutex::IOMutex), so several expanders
//! (or other drivers) can share one bus. Every register access is performed as a single critical
//! section on that mutex.

use core::fmt;

use hal::blocking::delay::DelayMs;

use registers::RegisterAddress;

/// Timeout the platform should configure for one SPI transfer, in milliseconds. The driver does
/// not enforce it; embedded-hal transfers block until the peripheral gives up.
pub const SPI_TRANSFER_TIMEOUT: u32 = 2000;

/// Timeout the platform should configure for each I2C phase, in milliseconds.
pub const I2C_PHASE_TIMEOUT: u32 = 1000;

/// The bus variant an interface speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// MCP23S08.
    Spi,
    /// MCP23008.
    I2c,
}

/// The error returned by register accesses. `E` carries the underlying bus error.
#[derive(Debug, PartialEq)]
pub enum TransportError<E> {
    /// The bus did not become idle within the configured bound.
    Timeout,
    /// The bus peripheral (or, for SPI, the chip select line) reported an error.
    BusFault(E),
}

impl<E: fmt::Debug> fmt::Display for TransportError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "bus stayed busy"),
            TransportError::BusFault(e) => write!(f, "bus fault: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for TransportError<E> {}

/// An interface for the MCP23x08 implements this trait, which provides the basic operations for
/// sending pre-encoded register accesses to the chip via the interface.
pub trait ExpanderInterface {
    /// The type of error that register reads and writes may return.
    type Error;

    /// The bus variant of this interface.
    const PROTOCOL: Protocol;

    /// Issue a write command to the expander to write `value` into the register at `addr`.
    fn write_register(&mut self, addr: RegisterAddress, value: u8) -> Result<(), Self::Error>;

    /// Issue a read command to the expander to fetch the `u8` value at register `addr`.
    fn read_register(&mut self, addr: RegisterAddress) -> Result<u8, Self::Error>;

    /// Bring the bus link into a known state before the first register access. Does nothing
    /// unless the bus needs it.
    fn settle<D: DelayMs<u8>>(&mut self, _delay: &mut D) -> Result<(), Self::Error> {
        Ok(())
    }
}

// This is here (and has to be pub) for doctests only. It's useless otherwise.
#[doc(hidden)]
pub mod noop {
    use super::{ExpanderInterface, Protocol};
    use hal::blocking::delay::DelayMs;
    use registers::RegisterAddress;

    pub struct NoopInterface;
    impl ExpanderInterface for NoopInterface {
        type Error = core::convert::Infallible;
        const PROTOCOL: Protocol = Protocol::Spi;
        fn write_register(
            &mut self,
            _addr: RegisterAddress,
            _value: u8,
        ) -> Result<(), Self::Error> {
            Ok(())
        }
        fn read_register(&mut self, _addr: RegisterAddress) -> Result<u8, Self::Error> {
            Ok(0u8)
        }
    }

    pub struct NoopDelay;
    impl DelayMs<u8> for NoopDelay {
        fn delay_ms(&mut self, _ms: u8) {}
    }
}

pub mod spi {
    //! The SPI interface controls an MCP23S08 via a 4-wire interface (SCK, MOSI, MISO, CS).
    //!
    //! Every access is one 3-byte full-duplex transfer with CS held low: control byte, register
    //! address, and a data byte that is either the value written or a dummy clocked out while the
    //! chip shifts the register value back.

    use core::marker::PhantomData;

    use hal;
    use hal::blocking::delay::DelayMs;

    use super::{ExpanderInterface, Protocol, RegisterAddress, TransportError};
    use address::DeviceAddress;
    use mutex::IOMutex;
    use registers::{READ_CONTROL_BYTE, WRITE_CONTROL_BYTE};

    /// How many times a busy flag is re-polled on either side of a transfer before giving up.
    pub const DEFAULT_BUSY_POLL_LIMIT: u32 = 2000;

    /// How long CS is held low by the settling pulse in `settle`.
    const SETTLE_MS: u8 = 1;

    /// A readiness flag of the SPI peripheral, polled before and after each transfer.
    pub trait BusyFlag {
        fn is_busy(&mut self) -> bool;
    }

    /// For SPI peripherals whose transfers are complete when the HAL call returns.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct NeverBusy;

    impl BusyFlag for NeverBusy {
        fn is_busy(&mut self) -> bool {
            false
        }
    }

    /// The errors that may occur on the SPI interface.
    #[derive(Debug, PartialEq)]
    pub enum SpiError<CSE, TE> {
        /// The chip select GPIO threw an error.
        ChipSelect(CSE),
        /// An error occurred during the SPI transfer.
        Transfer(TE),
    }

    impl<CSE, TE> SpiError<CSE, TE> {
        fn from_cs(e: CSE) -> TransportError<Self> {
            TransportError::BusFault(SpiError::ChipSelect(e))
        }
        fn from_transfer(e: TE) -> TransportError<Self> {
            TransportError::BusFault(SpiError::Transfer(e))
        }
    }

    type Fault<SPI, CS> = SpiError<
        <CS as hal::digital::v2::OutputPin>::Error,
        <SPI as hal::blocking::spi::Transfer<u8>>::Error,
    >;

    /// The flag is always checked once; `limit` counts the re-polls allowed after that.
    fn wait_idle<B: BusyFlag, E>(busy: &mut B, limit: u32) -> Result<(), TransportError<E>> {
        let mut polls = 0;
        while busy.is_busy() {
            if polls == limit {
                return Err(TransportError::Timeout);
            }
            polls += 1;
        }
        Ok(())
    }

    /// A configured `ExpanderInterface` for controlling an MCP23S08 via SPI.
    pub struct SpiInterface<'a, M: 'a, SPI, CS, B = NeverBusy> {
        /// The mutex guarding the SPI master device the MCP23S08 is connected to.
        bus: &'a M,
        /// A GPIO output pin connected to the CS pin of the MCP23S08. Owned by this interface
        /// alone.
        cs: CS,
        busy: B,
        busy_poll_limit: u32,
        address: DeviceAddress,
        _spi: PhantomData<SPI>,
    }

    impl<'a, M, SPI, CS> SpiInterface<'a, M, SPI, CS, NeverBusy>
    where
        M: IOMutex<SPI>,
        SPI: hal::blocking::spi::Transfer<u8>,
        CS: hal::digital::v2::OutputPin,
    {
        /// Create a new SPI interface to communicate with the port expander. `bus` is the mutex
        /// holding the SPI master device, `cs` is the GPIO output pin connected to the CS pin of
        /// the MCP23S08, and `address` is the level strapped onto its address pins.
        pub fn new(bus: &'a M, cs: CS, address: DeviceAddress) -> Self {
            Self {
                bus,
                cs,
                busy: NeverBusy,
                busy_poll_limit: DEFAULT_BUSY_POLL_LIMIT,
                address,
                _spi: PhantomData,
            }
        }
    }

    impl<'a, M, SPI, CS, B> SpiInterface<'a, M, SPI, CS, B>
    where
        M: IOMutex<SPI>,
        SPI: hal::blocking::spi::Transfer<u8>,
        CS: hal::digital::v2::OutputPin,
        B: BusyFlag,
    {
        /// Poll `busy` around every transfer.
        pub fn with_busy_flag<B2: BusyFlag>(self, busy: B2) -> SpiInterface<'a, M, SPI, CS, B2> {
            SpiInterface {
                bus: self.bus,
                cs: self.cs,
                busy,
                busy_poll_limit: self.busy_poll_limit,
                address: self.address,
                _spi: PhantomData,
            }
        }

        /// Change how many re-polls of a busy flag are made before a transfer fails with
        /// `TransportError::Timeout`. With a limit of 0 the flag is checked once and the
        /// transfer proceeds if it reads idle.
        pub fn busy_poll_limit(mut self, limit: u32) -> Self {
            self.busy_poll_limit = limit;
            self
        }

        pub fn address(&self) -> DeviceAddress {
            self.address
        }

        /// Give back the chip select pin and busy flag.
        pub fn release(self) -> (CS, B) {
            (self.cs, self.busy)
        }

        /// Clock `frame` through the chip in place, holding the bus and CS for the duration.
        fn transceive(
            &mut self,
            frame: &mut [u8; 3],
        ) -> Result<(), <Self as ExpanderInterface>::Error> {
            let cs = &mut self.cs;
            let busy = &mut self.busy;
            let limit = self.busy_poll_limit;
            self.bus.lock(|spi| {
                cs.set_low().map_err(Fault::<SPI, CS>::from_cs)?;
                let result = wait_idle(busy, limit)
                    .and_then(|_| {
                        spi.transfer(&mut frame[..])
                            .map(|_| ())
                            .map_err(Fault::<SPI, CS>::from_transfer)
                    })
                    .and_then(|_| wait_idle(busy, limit));
                // A failed deselect only surfaces when the transfer itself succeeded.
                let deselect = cs.set_high().map_err(Fault::<SPI, CS>::from_cs);
                result.and(deselect)
            })
        }
    }

    impl<'a, M, SPI, CS, B> ExpanderInterface for SpiInterface<'a, M, SPI, CS, B>
    where
        M: IOMutex<SPI>,
        SPI: hal::blocking::spi::Transfer<u8>,
        CS: hal::digital::v2::OutputPin,
        B: BusyFlag,
    {
        type Error = TransportError<Fault<SPI, CS>>;

        const PROTOCOL: Protocol = Protocol::Spi;

        fn write_register(&mut self, addr: RegisterAddress, value: u8) -> Result<(), Self::Error> {
            let mut frame = [
                self.address.spi_control_byte(WRITE_CONTROL_BYTE),
                u8::from(addr),
                value,
            ];
            trace!("spi {:#04x} write {:#04x} <- {:#04x}", frame[0], frame[1], value);
            self.transceive(&mut frame)
        }

        fn read_register(&mut self, addr: RegisterAddress) -> Result<u8, Self::Error> {
            // Third byte is don't-care; the chip drives the register value out while it shifts in.
            let mut frame = [
                self.address.spi_control_byte(READ_CONTROL_BYTE),
                u8::from(addr),
                0u8,
            ];
            let (control, reg) = (frame[0], frame[1]);
            self.transceive(&mut frame)?;
            trace!("spi {:#04x} read {:#04x} -> {:#04x}", control, reg, frame[2]);
            Ok(frame[2])
        }

        /// Pulse CS once with no data phase so the chip's serial logic starts from a clean
        /// frame boundary.
        fn settle<D: DelayMs<u8>>(&mut self, delay: &mut D) -> Result<(), Self::Error> {
            let cs = &mut self.cs;
            self.bus.lock(|_| {
                cs.set_low().map_err(Fault::<SPI, CS>::from_cs)?;
                delay.delay_ms(SETTLE_MS);
                cs.set_high().map_err(Fault::<SPI, CS>::from_cs)
            })
        }
    }
}

pub mod i2c {
    //! The I2C interface controls an MCP23008 via a 2-wire interface (SCL, SDA).
    //!
    //! The control byte of the MCP23x08 protocol doubles as the I2C address byte, so the
    //! peripheral is handed the 7-bit slave address and only the register address (and value)
    //! go in the payload. A read is a register-pointer write followed by a separate 1-byte read.
    //!
    //! On the wire a write is still three bytes (control, register, value) and the pointer phase
    //! of a read is two (control, register). Repeating the control byte at the start of the
    //! payload would send it twice, and the chip would take it for the register address.

    use core::marker::PhantomData;

    use hal;

    use super::{ExpanderInterface, Protocol, RegisterAddress, TransportError};
    use address::DeviceAddress;
    use mutex::IOMutex;

    /// The errors that may occur on the I2C interface.
    #[derive(Debug, PartialEq)]
    pub enum I2cError<WE, RE> {
        /// An error occurred during an I2C write phase.
        Write(WE),
        /// An error occurred during an I2C read phase.
        Read(RE),
    }

    impl<WE, RE> I2cError<WE, RE> {
        fn from_write(e: WE) -> TransportError<Self> {
            TransportError::BusFault(I2cError::Write(e))
        }
        fn from_read(e: RE) -> TransportError<Self> {
            TransportError::BusFault(I2cError::Read(e))
        }
    }

    type Fault<I2C> = I2cError<
        <I2C as hal::blocking::i2c::Write>::Error,
        <I2C as hal::blocking::i2c::Read>::Error,
    >;

    /// A configured `ExpanderInterface` for controlling an MCP23008 via I2C.
    pub struct I2cInterface<'a, M: 'a, I2C> {
        /// The mutex guarding the I2C master device.
        bus: &'a M,
        address: DeviceAddress,
        _i2c: PhantomData<I2C>,
    }

    impl<'a, M, I2C> I2cInterface<'a, M, I2C>
    where
        M: IOMutex<I2C>,
        I2C: hal::blocking::i2c::Write + hal::blocking::i2c::Read,
    {
        /// Create a new I2C interface to communicate with the port expander. `bus` is the mutex
        /// holding the I2C master device and `address` is the level strapped onto the MCP23008's
        /// address pins.
        pub fn new(bus: &'a M, address: DeviceAddress) -> Self {
            Self {
                bus,
                address,
                _i2c: PhantomData,
            }
        }

        pub fn address(&self) -> DeviceAddress {
            self.address
        }
    }

    impl<'a, M, I2C> ExpanderInterface for I2cInterface<'a, M, I2C>
    where
        M: IOMutex<I2C>,
        I2C: hal::blocking::i2c::Write + hal::blocking::i2c::Read,
    {
        type Error = TransportError<Fault<I2C>>;

        const PROTOCOL: Protocol = Protocol::I2c;

        fn write_register(&mut self, addr: RegisterAddress, value: u8) -> Result<(), Self::Error> {
            let target = self.address.i2c_target();
            let buf = [u8::from(addr), value];
            trace!("i2c {:#04x} write {:#04x} <- {:#04x}", target, buf[0], value);
            self.bus
                .lock(|i2c| i2c.write(target, &buf).map_err(Fault::<I2C>::from_write))
        }

        fn read_register(&mut self, addr: RegisterAddress) -> Result<u8, Self::Error> {
            let target = self.address.i2c_target();
            let reg = u8::from(addr);
            let value = self.bus.lock(|i2c| -> Result<u8, Self::Error> {
                i2c.write(target, &[reg]).map_err(Fault::<I2C>::from_write)?;
                let mut buf = [0u8];
                i2c.read(target, &mut buf).map_err(Fault::<I2C>::from_read)?;
                Ok(buf[0])
            })?;
            trace!("i2c {:#04x} read {:#04x} -> {:#04x}", target, reg, value);
            Ok(value)
        }
    }
}

//! The port expander device API. This provides the `Expander` type, which is the handle for one
//! physical MCP23x08 and gives register-level access to it.

use hal::blocking::delay::DelayMs;

use config::PowerOnConfig;
use interface::{ExpanderInterface, Protocol};
use registers::Register;

/// The port expander device itself.
///
/// There must be only one `Expander` per physical chip. Nothing stops two handles from addressing
/// the same chip, and if they do their register accesses will interleave unpredictably.
pub struct Expander<EI: ExpanderInterface> {
    iface: EI,
    config: PowerOnConfig,
}

impl<EI: ExpanderInterface> Expander<EI> {
    /// Create a new `Expander`.
    ///
    /// Takes ownership of the `ExpanderInterface` which it should use to communicate with the
    /// chip, and the register values to apply in [`init`](Expander::init). No bus traffic is
    /// generated.
    pub fn new(iface: EI, config: PowerOnConfig) -> Self {
        Self { iface, config }
    }

    /// The bus variant this expander is reached through.
    pub fn protocol(&self) -> Protocol {
        EI::PROTOCOL
    }

    /// The register values `init` writes.
    pub fn config(&self) -> &PowerOnConfig {
        &self.config
    }

    /// Release the `ExpanderInterface`, consuming the expander.
    pub fn release(self) -> EI {
        self.iface
    }

    /// Write the power-on configuration to the chip.
    ///
    /// IOCON is written first and read back; the rest of the registers are written whether or not
    /// it matched. Returns `Ok(false)` on a mismatch, which usually means the chip is not
    /// answering at the configured address, or the IOCON value sets bits the chip does not
    /// implement. Bus errors are returned as they happen, leaving the chip partially configured.
    pub fn init<D: DelayMs<u8>>(&mut self, delay: &mut D) -> Result<bool, EI::Error> {
        debug!("initializing {:?} expander", EI::PROTOCOL);
        self.iface.settle(delay)?;

        let iocon = self.config.iocon;
        self.write(Register::Iocon, iocon)?;
        let readback = self.read(Register::Iocon)?;
        let verified = readback == iocon;
        if !verified {
            warn!(
                "IOCON readback mismatch: wrote {:#04x}, read {:#04x}",
                iocon, readback
            );
        }

        for &(reg, value) in self.config.register_writes().iter() {
            self.write(reg, value)?;
        }
        debug!("expander initialized, IOCON verified: {}", verified);
        Ok(verified)
    }

    /// Read the current value of register `reg`.
    pub fn read(&mut self, reg: Register) -> Result<u8, EI::Error> {
        self.iface.read_register(reg.into())
    }

    /// Write `value` into register `reg`.
    ///
    /// Writes to the read-only `Intf` and `Intcap` registers are transmitted anyway; the chip
    /// ignores them.
    pub fn write(&mut self, reg: Register, value: u8) -> Result<(), EI::Error> {
        self.iface.write_register(reg.into(), value)
    }

    /// Read the logic level of all eight pins (the GPIO register).
    ///
    /// This is the level on the pins, which for inputs and for externally-driven outputs may
    /// differ from the output latch. Use `read(Register::Olat)` for the last commanded output.
    pub fn read_port(&mut self) -> Result<u8, EI::Error> {
        self.read(Register::Gpio)
    }

    /// Write the output level of all eight pins (the GPIO register). Only pins configured as
    /// outputs are driven.
    pub fn write_port(&mut self, bits: u8) -> Result<(), EI::Error> {
        self.write(Register::Gpio, bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use address::DeviceAddress;
    use interface::i2c::I2cInterface;
    use interface::spi::{SpiError, SpiInterface};
    use interface::test_spy::*;
    use interface::TransportError;
    use mutex::{DefaultMutex, IOMutex};
    use proptest::prelude::*;
    use std::thread;

    fn sample_config() -> PowerOnConfig {
        PowerOnConfig::default()
            .iodir(0xF0)
            .ipol(0x01)
            .gpinten(0x02)
            .defval(0x03)
            .intcon(0x04)
            .iocon(0b0010_0000)
            .gppu(0xF0)
            .gpio(0x05)
            .olat(0x05)
    }

    fn any_register() -> impl Strategy<Value = Register> {
        (0usize..Register::ALL.len()).prop_map(|i| Register::ALL[i])
    }

    #[test]
    fn spi_example_frame() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::echo(0b01, &log);
        let bus: DefaultMutex<_> = IOMutex::new(chip.spi());
        let ei = SpiInterface::new(&bus, SpyPin::new("cs", &log), DeviceAddress::new(0b101));
        let mut ex = Expander::new(ei, PowerOnConfig::default());

        assert!(ex.write(Register::Iodir, 0xFF).is_ok());
        assert_eq!(
            log.events(),
            vec![
                Event::Select("cs"),
                Event::SpiTransfer(vec![0x42, 0x00, 0xFF]),
                Event::Deselect("cs"),
            ]
        );
    }

    #[test]
    fn protocol_follows_interface() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::echo(0, &log);
        let spi_bus: DefaultMutex<_> = IOMutex::new(chip.spi());
        let i2c_bus: DefaultMutex<_> = IOMutex::new(chip.i2c());
        let spi_ex = Expander::new(
            SpiInterface::new(&spi_bus, SpyPin::new("cs", &log), DeviceAddress::new(0)),
            PowerOnConfig::default(),
        );
        let i2c_ex = Expander::new(
            I2cInterface::new(&i2c_bus, DeviceAddress::new(0)),
            PowerOnConfig::default(),
        );
        assert_eq!(spi_ex.protocol(), Protocol::Spi);
        assert_eq!(i2c_ex.protocol(), Protocol::I2c);
        assert!(log.events().is_empty());
    }

    #[test]
    fn spi_init_verified() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::mcp23x08(0b11, &log);
        let bus: DefaultMutex<_> = IOMutex::new(chip.spi());
        let ei = SpiInterface::new(&bus, SpyPin::new("cs", &log), DeviceAddress::new(0b011));
        let mut ex = Expander::new(ei, sample_config());

        assert_eq!(ex.init(&mut SpyDelay(log.split())), Ok(true));

        let events = log.events();
        assert_eq!(
            &events[..3],
            &[Event::Select("cs"), Event::Delay(1), Event::Deselect("cs")][..]
        );
        assert_eq!(
            log.writes(),
            vec![
                (0x05, 0b0010_0000),
                (0x00, 0xF0),
                (0x01, 0x01),
                (0x02, 0x02),
                (0x03, 0x03),
                (0x04, 0x04),
                (0x06, 0xF0),
                (0x09, 0x05),
                (0x0A, 0x05),
            ]
        );
        assert_eq!(chip.get(0x00), 0xF0);
        assert_eq!(chip.get(0x0A), 0x05);
    }

    #[test]
    fn spi_init_mismatch_still_writes_everything() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::mcp23x08(0, &log);
        let bus: DefaultMutex<_> = IOMutex::new(chip.spi());
        let ei = SpiInterface::new(&bus, SpyPin::new("cs", &log), DeviceAddress::new(0));
        // Bit 7 is unimplemented on the MCP23x08 and reads back as zero.
        let mut ex = Expander::new(ei, sample_config().iocon(0b1010_0000));

        assert_eq!(ex.init(&mut SpyDelay(log.split())), Ok(false));
        assert_eq!(log.writes().len(), 9);
        assert_eq!(chip.get(0x05), 0b0010_0000);
        assert_eq!(chip.get(0x06), 0xF0);
    }

    #[test]
    fn init_mismatch_when_chip_not_addressed() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::echo(0b00, &log);
        let bus: DefaultMutex<_> = IOMutex::new(chip.spi());
        let ei = SpiInterface::new(&bus, SpyPin::new("cs", &log), DeviceAddress::new(0b010));
        let mut ex = Expander::new(ei, sample_config());

        assert_eq!(ex.init(&mut SpyDelay(log.split())), Ok(false));
        assert_eq!(log.writes().len(), 9);
        assert_eq!(chip.get(0x00), 0x00);
    }

    #[test]
    fn i2c_init_verified() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::mcp23x08(0b100, &log);
        let bus: DefaultMutex<_> = IOMutex::new(chip.i2c());
        let ei = I2cInterface::new(&bus, DeviceAddress::new(0b100));
        let mut ex = Expander::new(ei, sample_config());

        assert_eq!(ex.init(&mut SpyDelay(log.split())), Ok(true));
        let events = log.events();
        assert_eq!(events[0], Event::I2cWrite(0x24, vec![0x05, 0b0010_0000]));
        assert_eq!(events[1], Event::I2cWrite(0x24, vec![0x05]));
        assert_eq!(events[2], Event::I2cRead(0x24, 1));
        assert!(!events.contains(&Event::Delay(1)));
        assert_eq!(log.writes().len(), 9);
    }

    #[test]
    fn i2c_init_mismatch() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::mcp23x08(0, &log);
        let bus: DefaultMutex<_> = IOMutex::new(chip.i2c());
        let ei = I2cInterface::new(&bus, DeviceAddress::new(0));
        let mut ex = Expander::new(ei, sample_config().iocon(0xFF));

        assert_eq!(ex.init(&mut SpyDelay(log.split())), Ok(false));
        assert_eq!(log.writes().len(), 9);
    }

    #[test]
    fn init_stops_on_bus_fault() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::mcp23x08(0, &log);
        chip.fail_after(3);
        let bus: DefaultMutex<_> = IOMutex::new(chip.spi());
        let ei = SpiInterface::new(&bus, SpyPin::new("cs", &log), DeviceAddress::new(0));
        let mut ex = Expander::new(ei, sample_config());

        assert_eq!(
            ex.init(&mut SpyDelay(log.split())),
            Err(TransportError::BusFault(SpiError::Transfer(SimFault::Injected)))
        );
        // IOCON write, IOCON read, IODIR write, then the failing IPOL write.
        assert_eq!(log.writes().len(), 3);
        assert_eq!(log.events().last(), Some(&Event::Deselect("cs")));
    }

    #[test]
    fn port_delegates_to_gpio() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::echo(0, &log);
        let bus: DefaultMutex<_> = IOMutex::new(chip.spi());
        let ei = SpiInterface::new(&bus, SpyPin::new("cs", &log), DeviceAddress::new(0));
        let mut ex = Expander::new(ei, PowerOnConfig::default());

        assert!(ex.write_port(0x5A).is_ok());
        assert_eq!(ex.read_port(), Ok(0x5A));
        let via_port = log.events();
        log.clear();

        assert!(ex.write(Register::Gpio, 0x5A).is_ok());
        assert_eq!(ex.read(Register::Gpio), Ok(0x5A));
        assert_eq!(log.events(), via_port);
    }

    #[test]
    fn port_and_latch_are_separate_registers() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::echo(0, &log);
        let bus: DefaultMutex<_> = IOMutex::new(chip.i2c());
        let mut ex = Expander::new(
            I2cInterface::new(&bus, DeviceAddress::new(0)),
            PowerOnConfig::default(),
        );

        assert!(ex.write(Register::Olat, 0x0F).is_ok());
        // An input pulled high externally.
        chip.set(0x09, 0x8F);
        assert_eq!(ex.read_port(), Ok(0x8F));
        assert_eq!(ex.read(Register::Olat), Ok(0x0F));
    }

    #[test]
    fn read_only_register_write_is_transmitted() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::mcp23x08(0, &log);
        let bus: DefaultMutex<_> = IOMutex::new(chip.spi());
        let ei = SpiInterface::new(&bus, SpyPin::new("cs", &log), DeviceAddress::new(0));
        let mut ex = Expander::new(ei, PowerOnConfig::default());

        assert!(ex.write(Register::Intf, 0xFF).is_ok());
        assert_eq!(log.writes(), vec![(0x07, 0xFF)]);
        assert_eq!(ex.read(Register::Intf), Ok(0x00));
    }

    #[test]
    fn shared_bus_transactions_do_not_interleave() {
        let log = TransactionLog::new();
        let chip = SimulatedChip::echo(0, &log);
        let bus: DefaultMutex<_> = IOMutex::new(chip.spi());

        thread::scope(|s| {
            for &name in ["left", "right"].iter() {
                let (bus, log) = (&bus, log.split());
                s.spawn(move || {
                    let ei = SpiInterface::new(bus, SpyPin::new(name, &log), DeviceAddress::new(0));
                    let mut ex = Expander::new(ei, PowerOnConfig::default());
                    for i in 0..200u32 {
                        if i % 2 == 0 {
                            assert!(ex.write(Register::Olat, i as u8).is_ok());
                        } else {
                            assert!(ex.read(Register::Gpio).is_ok());
                        }
                    }
                });
            }
        });

        let events = log.events();
        assert_eq!(events.len(), 2 * 200 * 3);
        for txn in events.chunks(3) {
            match (&txn[0], &txn[1], &txn[2]) {
                (Event::Select(a), Event::SpiTransfer(_), Event::Deselect(b)) => {
                    assert_eq!(a, b)
                }
                other => panic!("interleaved transaction: {:?}", other),
            }
        }
    }

    #[test]
    fn shared_i2c_reads_keep_pointer_and_data_together() {
        let log = TransactionLog::new();
        let left = SimulatedChip::echo(0b001, &log);
        let right = SimulatedChip::echo(0b110, &log);
        let bus: DefaultMutex<_> = IOMutex::new(SharedI2c(vec![left.i2c(), right.i2c()]));

        thread::scope(|s| {
            for &(strap, reg) in [(0b001, Register::Olat), (0b110, Register::Gppu)].iter() {
                let bus = &bus;
                s.spawn(move || {
                    let ei = I2cInterface::new(bus, DeviceAddress::new(strap));
                    let mut ex = Expander::new(ei, PowerOnConfig::default());
                    for i in 0..100u8 {
                        assert!(ex.write(reg, i).is_ok());
                        assert_eq!(ex.read(reg), Ok(i));
                    }
                });
            }
        });

        let events = log.events();
        assert_eq!(events.len(), 2 * 100 * 3);
        let mut i = 0;
        while i < events.len() {
            match &events[i] {
                Event::I2cWrite(_, payload) if payload.len() == 2 => i += 1,
                Event::I2cWrite(t, payload) if payload.len() == 1 => {
                    assert_eq!(events.get(i + 1), Some(&Event::I2cRead(*t, 1)));
                    i += 2;
                }
                other => panic!("read phase without its pointer write: {:?}", other),
            }
        }
        assert_eq!(left.get(0x0A), 99);
        assert_eq!(right.get(0x06), 99);
    }

    #[test]
    fn init_over_caller_supplied_mutex() {
        use std::cell::RefCell;

        struct CellMutex<T>(RefCell<T>);

        impl<T> IOMutex<T> for CellMutex<T> {
            fn new(v: T) -> Self {
                CellMutex(RefCell::new(v))
            }
            fn lock<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
                f(&mut self.0.borrow_mut())
            }
        }

        let log = TransactionLog::new();
        let chip = SimulatedChip::mcp23x08(0b011, &log);
        let bus: CellMutex<_> = IOMutex::new(chip.i2c());
        let ei = I2cInterface::new(&bus, DeviceAddress::new(0b011));
        let mut ex = Expander::new(ei, sample_config());

        assert_eq!(ex.init(&mut SpyDelay(log.split())), Ok(true));
        assert_eq!(chip.get(0x00), 0xF0);
    }

    proptest! {
        #[test]
        fn spi_round_trip(reg in any_register(), value in any::<u8>(), a in 0u8..8) {
            let log = TransactionLog::new();
            let chip = SimulatedChip::echo(a & 0b11, &log);
            let bus: DefaultMutex<_> = IOMutex::new(chip.spi());
            let ei = SpiInterface::new(&bus, SpyPin::new("cs", &log), DeviceAddress::new(a));
            let mut ex = Expander::new(ei, PowerOnConfig::default());

            prop_assert!(ex.write(reg, value).is_ok());
            prop_assert_eq!(ex.read(reg), Ok(value));
        }

        #[test]
        fn i2c_round_trip(reg in any_register(), value in any::<u8>(), a in 0u8..8) {
            let log = TransactionLog::new();
            let chip = SimulatedChip::echo(a, &log);
            let bus: DefaultMutex<_> = IOMutex::new(chip.i2c());
            let ei = I2cInterface::new(&bus, DeviceAddress::new(a));
            let mut ex = Expander::new(ei, PowerOnConfig::default());

            prop_assert!(ex.write(reg, value).is_ok());
            prop_assert_eq!(ex.read(reg), Ok(value));
        }

        #[test]
        fn spi_control_byte_on_the_wire(reg in any_register(), a in 0u8..8) {
            let log = TransactionLog::new();
            let chip = SimulatedChip::echo(a & 0b11, &log);
            let bus: DefaultMutex<_> = IOMutex::new(chip.spi());
            let ei = SpiInterface::new(&bus, SpyPin::new("cs", &log), DeviceAddress::new(a));
            let mut ex = Expander::new(ei, PowerOnConfig::default());

            prop_assert!(ex.write(reg, 0).is_ok());
            prop_assert!(ex.read(reg).is_ok());
            let frames = log
                .events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::SpiTransfer(f) => Some(f[0]),
                    _ => None,
                })
                .collect::<Vec<_>>();
            prop_assert_eq!(frames, vec![0x40 + ((a & 0x3) << 1), 0x41 + ((a & 0x3) << 1)]);
        }

        #[test]
        fn i2c_target_on_the_wire(reg in any_register(), a in 0u8..8) {
            let log = TransactionLog::new();
            let chip = SimulatedChip::echo(a, &log);
            let bus: DefaultMutex<_> = IOMutex::new(chip.i2c());
            let ei = I2cInterface::new(&bus, DeviceAddress::new(a));
            let mut ex = Expander::new(ei, PowerOnConfig::default());

            prop_assert!(ex.read(reg).is_ok());
            for e in log.events() {
                match e {
                    Event::I2cWrite(t, _) | Event::I2cRead(t, _) => {
                        prop_assert_eq!(t, 0x20 | a);
                    }
                    other => {
                        prop_assert!(false, "unexpected event {:?}", other);
                    }
                }
            }
        }
    }
}

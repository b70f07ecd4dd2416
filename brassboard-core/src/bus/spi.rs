//! Chip-selected SPI device with retry and register conventions

use brassboard_hal::spi::{SpiBus, SpiConfig};
use embedded_hal::delay::DelayNs;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{register_frame, CommunicationBus};
use crate::config::SpiDeviceConfig;
use crate::error::{ArgumentError, Error};
use crate::retry::{NoDelay, RetryPolicy};

/// Bits OR-ed into the register byte of SPI register accesses
///
/// Many SPI sensors flag direction and auto-increment in the address
/// byte, e.g. ADXL345 uses `read = 0x80`, `multi = 0x40`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegisterFlags {
    /// Set on register reads
    #[cfg_attr(feature = "serde", serde(default))]
    pub read: u8,
    /// Set on register writes
    #[cfg_attr(feature = "serde", serde(default))]
    pub write: u8,
    /// Set when more than one register is transferred
    #[cfg_attr(feature = "serde", serde(default))]
    pub multi: u8,
}

impl RegisterFlags {
    /// Plain register addresses
    pub const NONE: Self = Self {
        read: 0,
        write: 0,
        multi: 0,
    };

    /// Read bit 7 set, multi-byte bit 6 set (ADXL345, LIS3DH family)
    pub const READ_HIGH_MULTI: Self = Self {
        read: 0x80,
        write: 0x00,
        multi: 0x40,
    };

    fn read_address(&self, register: u8, len: usize) -> u8 {
        register | self.read | if len > 1 { self.multi } else { 0 }
    }

    fn write_address(&self, register: u8, len: usize) -> u8 {
        register | self.write | if len > 1 { self.multi } else { 0 }
    }
}

/// One chip-selected device on an SPI transport
#[derive(Debug)]
pub struct SpiDevice<B, D = NoDelay> {
    bus: B,
    config: SpiConfig,
    retry: RetryPolicy,
    flags: RegisterFlags,
    delay: D,
}

impl<B: SpiBus> SpiDevice<B, NoDelay> {
    /// Create a device with plain register addresses and default retry
    pub fn new(bus: B, config: SpiConfig) -> Result<Self, ArgumentError> {
        Self::from_config(
            bus,
            &SpiDeviceConfig {
                bus: config,
                retry: RetryPolicy::default(),
                registers: RegisterFlags::NONE,
            },
        )
    }

    /// Create a device from a validated configuration
    pub fn from_config(bus: B, config: &SpiDeviceConfig) -> Result<Self, ArgumentError> {
        config.validate()?;
        Ok(Self {
            bus,
            config: config.bus,
            retry: config.retry,
            flags: config.registers,
            delay: NoDelay,
        })
    }
}

impl<B: SpiBus, D: DelayNs> SpiDevice<B, D> {
    /// Use the given register flag convention
    pub fn with_flags(mut self, flags: RegisterFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Result<Self, ArgumentError> {
        retry.validate()?;
        self.retry = retry;
        Ok(self)
    }

    /// Use `delay` for retry backoff
    pub fn with_delay<D2: DelayNs>(self, delay: D2) -> SpiDevice<B, D2> {
        SpiDevice {
            bus: self.bus,
            config: self.config,
            retry: self.retry,
            flags: self.flags,
            delay,
        }
    }

    /// Bus clock configuration
    pub fn config(&self) -> SpiConfig {
        self.config
    }

    /// Register flag convention
    pub fn flags(&self) -> RegisterFlags {
        self.flags
    }

    /// Full-duplex transfer of `write` while filling `read`
    pub fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Error<B::Error>> {
        if write.is_empty() {
            return Err(ArgumentError::EmptyBuffer.into());
        }
        if read.len() != write.len() {
            return Err(ArgumentError::LengthMismatch {
                read: read.len(),
                write: write.len(),
            }
            .into());
        }
        let Self {
            bus, retry, delay, ..
        } = self;
        retry
            .run(delay, write.len(), || bus.transfer(read, write))
            .map_err(|e| {
                read.fill(0);
                e
            })?;
        Ok(())
    }

    /// Give back the transport
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: SpiBus, D: DelayNs> CommunicationBus for SpiDevice<B, D> {
    type Error = B::Error;

    fn write_bytes(&mut self, values: &[u8]) -> Result<(), Error<Self::Error>> {
        if values.is_empty() {
            return Err(ArgumentError::EmptyBuffer.into());
        }
        let Self {
            bus, retry, delay, ..
        } = self;
        retry.run(delay, values.len(), || bus.write(values))?;
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), Error<Self::Error>> {
        if buf.is_empty() {
            return Err(ArgumentError::EmptyBuffer.into());
        }
        let Self {
            bus, retry, delay, ..
        } = self;
        retry
            .run(delay, buf.len(), || bus.write_read(&[], buf))
            .map_err(|e| {
                buf.fill(0);
                e
            })?;
        Ok(())
    }

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Error<Self::Error>> {
        if write.is_empty() || read.is_empty() {
            return Err(ArgumentError::EmptyBuffer.into());
        }
        let Self {
            bus, retry, delay, ..
        } = self;
        let expected = write.len() + read.len();
        retry
            .run(delay, expected, || bus.write_read(write, read))
            .map_err(|e| {
                read.fill(0);
                e
            })?;
        Ok(())
    }

    fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Error<Self::Error>> {
        let address = self.flags.read_address(register, buf.len());
        self.write_read(&[address], buf)
    }

    fn write_registers(&mut self, register: u8, values: &[u8]) -> Result<(), Error<Self::Error>> {
        let address = self.flags.write_address(register, values.len());
        let frame = register_frame(address, values)?;
        self.write_bytes(&frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SharedBus;
    use crate::error::{TransferError, TransferFault};
    use brassboard_hal::mock::{MockError, MockSpi};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_read_flags_applied() {
        let mut mock = MockSpi::new(0x3F);
        mock.set_registers(0x32, &[0x10, 0x20]);

        let mut dev = SpiDevice::new(&mut mock, SpiConfig::default())
            .unwrap()
            .with_flags(RegisterFlags::READ_HIGH_MULTI);

        let mut buf = [0u8; 2];
        dev.read_registers(0x32, &mut buf).unwrap();
        assert_eq!(buf, [0x10, 0x20]);

        let single = dev.read_register(0x00).unwrap();
        assert_eq!(single, 0x00);
        drop(dev);

        assert_eq!(mock.writes()[0].as_slice(), &[0xF2]);
        assert_eq!(mock.writes()[1].as_slice(), &[0x80]);
    }

    #[test]
    fn test_write_register_frame() {
        let mut mock = MockSpi::new(0x3F);
        let mut dev = SpiDevice::new(&mut mock, SpiConfig::default())
            .unwrap()
            .with_flags(RegisterFlags::READ_HIGH_MULTI);

        dev.write_register(0x2D, 0x08).unwrap();
        drop(dev);

        assert_eq!(mock.writes()[0].as_slice(), &[0x2D, 0x08]);
        assert_eq!(mock.register(0x2D), 0x08);
    }

    #[test]
    fn test_retry_bound() {
        let mut mock = MockSpi::default();
        mock.fail_next(5);

        let mut dev = SpiDevice::new(&mut mock, SpiConfig::default())
            .unwrap()
            .with_retry(RetryPolicy::attempts(4))
            .unwrap();

        assert_eq!(
            dev.write_byte(0xAA),
            Err(Error::Transfer(TransferError {
                attempts: 4,
                last: TransferFault::Bus(MockError::Bus),
            }))
        );
        drop(dev);
        assert_eq!(mock.calls(), 4);
    }

    #[test]
    fn test_transfer_length_mismatch() {
        let mut mock = MockSpi::default();
        let mut dev = SpiDevice::new(&mut mock, SpiConfig::default()).unwrap();
        let mut read = [0u8; 2];
        assert_eq!(
            dev.transfer(&mut read, &[1, 2, 3]),
            Err(Error::Argument(ArgumentError::LengthMismatch { read: 2, write: 3 }))
        );
        assert_eq!(
            dev.transfer(&mut [], &[]),
            Err(Error::Argument(ArgumentError::EmptyBuffer))
        );
    }

    #[test]
    fn test_exhausted_reads_leave_no_data() {
        let mut mock = MockSpi::default();
        mock.set_registers(0x00, &[0xAA; 8]);
        let shared: SharedBus<NoopRawMutex, _> = SharedBus::new(mock);
        let mut dev = SpiDevice::new(shared.handle(), SpiConfig::default()).unwrap();

        shared.with(|m| m.short_next(3));
        let mut buf = [0xFFu8; 2];
        assert_eq!(
            dev.read_bytes(&mut buf),
            Err(Error::Transfer(TransferError {
                attempts: 3,
                last: TransferFault::Short {
                    expected: 2,
                    actual: 1
                },
            }))
        );
        assert_eq!(buf, [0, 0]);

        shared.with(|m| m.short_next(3));
        let mut buf = [0xFFu8; 2];
        assert!(dev.transfer(&mut buf, &[0x01, 0x02]).unwrap_err().is_transfer());
        assert_eq!(buf, [0, 0]);

        shared.with(|m| m.short_next(3));
        let mut buf = [0xFFu8; 2];
        assert!(dev.read_registers(0x00, &mut buf).unwrap_err().is_transfer());
        assert_eq!(buf, [0, 0]);

        let mut buf = [0u8; 2];
        dev.read_registers(0x02, &mut buf).unwrap();
        assert_eq!(buf, [0xAA, 0xAA]);
        assert_eq!(shared.with(|m| m.calls()), 10);
    }
}

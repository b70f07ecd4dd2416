//! Register-oriented communication buses
//!
//! [`CommunicationBus`] is the one interface every driver talks to. Its
//! three primitives (`write_bytes`, `read_bytes`, `write_read`) are each
//! a single retried transaction; everything register-shaped is built on
//! top of them.
//!
//! ```text
//!  driver ──► CommunicationBus ──► I2cDevice / SpiDevice ──► RetryPolicy
//!                                           │
//!                                           ▼
//!                          I2cBus / SpiBus (owned, or a SharedBus handle)
//! ```

pub mod i2c;
pub mod shared;
pub mod spi;

pub use i2c::{scan, I2cDevice};
pub use shared::{BusHandle, SharedBus};
pub use spi::{RegisterFlags, SpiDevice};

use heapless::Vec;

use crate::error::{ArgumentError, DeviceError, Error};

/// Largest payload accepted by a single register write
pub const MAX_REGISTER_WRITE: usize = 32;

/// Register byte plus payload
pub const REGISTER_FRAME_LEN: usize = MAX_REGISTER_WRITE + 1;

/// Width of the registers the bit helpers operate on
pub const REGISTER_WIDTH: u8 = 8;

/// Build `[register, payload...]` for a register write
pub fn register_frame(
    register: u8,
    values: &[u8],
) -> Result<Vec<u8, REGISTER_FRAME_LEN>, ArgumentError> {
    if values.is_empty() {
        return Err(ArgumentError::EmptyBuffer);
    }
    if values.len() > MAX_REGISTER_WRITE {
        return Err(ArgumentError::PayloadTooLong {
            len: values.len(),
            max: MAX_REGISTER_WRITE,
        });
    }

    let mut frame = Vec::new();
    // Capacity checked above
    let _ = frame.push(register);
    let _ = frame.extend_from_slice(values);
    Ok(frame)
}

fn check_bit(bit: u8) -> Result<u8, ArgumentError> {
    if bit >= REGISTER_WIDTH {
        return Err(ArgumentError::BitOutOfRange {
            bit,
            width: REGISTER_WIDTH,
        });
    }
    Ok(1 << bit)
}

/// Addressed channel to one device
///
/// Implementations retry each primitive up to their configured bound and
/// surface [`Error::Transfer`] once it is exceeded. Zero-length buffers
/// are rejected with [`ArgumentError::EmptyBuffer`].
pub trait CommunicationBus {
    /// Transport error type
    type Error: core::fmt::Debug;

    /// Write a byte sequence in one transaction
    fn write_bytes(&mut self, values: &[u8]) -> Result<(), Error<Self::Error>>;

    /// Read `buf.len()` bytes in one transaction, without writing first
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), Error<Self::Error>>;

    /// Write `write`, then read `read.len()` bytes in the same acquisition
    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Error<Self::Error>>;

    /// Write a single byte
    fn write_byte(&mut self, value: u8) -> Result<(), Error<Self::Error>> {
        self.write_bytes(&[value])
    }

    /// Read `buf.len()` bytes starting at `register`
    ///
    /// Equivalent to `write_read(&[register], buf)` on plain buses.
    fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Error<Self::Error>> {
        self.write_read(&[register], buf)
    }

    /// Write `values` starting at `register`
    ///
    /// Transmits `[register, values...]` in one transaction.
    fn write_registers(&mut self, register: u8, values: &[u8]) -> Result<(), Error<Self::Error>> {
        let frame = register_frame(register, values)?;
        self.write_bytes(&frame)
    }

    /// Read one register
    fn read_register(&mut self, register: u8) -> Result<u8, Error<Self::Error>> {
        let mut buf = [0u8; 1];
        self.read_registers(register, &mut buf)?;
        Ok(buf[0])
    }

    /// Write one register
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<Self::Error>> {
        self.write_registers(register, &[value])
    }

    /// Read `N` consecutive registers into an array
    fn read_array<const N: usize>(&mut self, register: u8) -> Result<[u8; N], Error<Self::Error>> {
        let mut buf = [0u8; N];
        self.read_registers(register, &mut buf)?;
        Ok(buf)
    }

    /// Read a big-endian 16-bit register pair
    fn read_u16_be(&mut self, register: u8) -> Result<u16, Error<Self::Error>> {
        self.read_array::<2>(register).map(u16::from_be_bytes)
    }

    /// Read a little-endian 16-bit register pair
    fn read_u16_le(&mut self, register: u8) -> Result<u16, Error<Self::Error>> {
        self.read_array::<2>(register).map(u16::from_le_bytes)
    }

    /// Write a big-endian 16-bit register pair
    fn write_u16_be(&mut self, register: u8, value: u16) -> Result<(), Error<Self::Error>> {
        self.write_registers(register, &value.to_be_bytes())
    }

    /// Write a little-endian 16-bit register pair
    fn write_u16_le(&mut self, register: u8, value: u16) -> Result<(), Error<Self::Error>> {
        self.write_registers(register, &value.to_le_bytes())
    }

    /// Read-modify-write: replace the bits selected by `mask` with `value`
    fn update_register(
        &mut self,
        register: u8,
        mask: u8,
        value: u8,
    ) -> Result<(), Error<Self::Error>> {
        let current = self.read_register(register)?;
        let next = (current & !mask) | (value & mask);
        if next != current {
            self.write_register(register, next)?;
        }
        Ok(())
    }

    /// Read a single bit of a register
    fn read_bit(&mut self, register: u8, bit: u8) -> Result<bool, Error<Self::Error>> {
        let mask = check_bit(bit)?;
        Ok(self.read_register(register)? & mask != 0)
    }

    /// Set or clear a single bit of a register
    fn write_bit(&mut self, register: u8, bit: u8, on: bool) -> Result<(), Error<Self::Error>> {
        let mask = check_bit(bit)?;
        self.update_register(register, mask, if on { mask } else { 0 })
    }
}

impl<T: CommunicationBus + ?Sized> CommunicationBus for &mut T {
    type Error = T::Error;

    fn write_bytes(&mut self, values: &[u8]) -> Result<(), Error<Self::Error>> {
        T::write_bytes(self, values)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), Error<Self::Error>> {
        T::read_bytes(self, buf)
    }

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Error<Self::Error>> {
        T::write_read(self, write, read)
    }

    fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Error<Self::Error>> {
        T::read_registers(self, register, buf)
    }

    fn write_registers(&mut self, register: u8, values: &[u8]) -> Result<(), Error<Self::Error>> {
        T::write_registers(self, register, values)
    }
}

/// Compare an identity ("who am I") register against its expected value
pub fn check_identity<B: CommunicationBus>(
    bus: &mut B,
    register: u8,
    expected: u8,
) -> Result<(), Error<B::Error>> {
    let found = bus.read_register(register)?;
    if found != expected {
        warn!(
            "identity mismatch at {}: expected {}, found {}",
            register, expected, found
        );
        return Err(DeviceError::UnexpectedId {
            register,
            expected,
            found,
        }
        .into());
    }
    debug!("identity {} confirmed at register {}", found, register);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_frame_order() {
        let frame = register_frame(0x2C, &[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(frame.as_slice(), &[0x2C, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_register_frame_limits() {
        assert_eq!(register_frame(0x00, &[]), Err(ArgumentError::EmptyBuffer));

        let max = [0u8; MAX_REGISTER_WRITE];
        assert!(register_frame(0x00, &max).is_ok());

        let over = [0u8; MAX_REGISTER_WRITE + 1];
        assert_eq!(
            register_frame(0x00, &over),
            Err(ArgumentError::PayloadTooLong {
                len: MAX_REGISTER_WRITE + 1,
                max: MAX_REGISTER_WRITE
            })
        );
    }

    #[test]
    fn test_check_bit() {
        assert_eq!(check_bit(0), Ok(0x01));
        assert_eq!(check_bit(7), Ok(0x80));
        assert_eq!(
            check_bit(8),
            Err(ArgumentError::BitOutOfRange { bit: 8, width: 8 })
        );
    }
}

//! I2C bus abstractions
//!
//! The transport reports how many bytes it actually moved so the layer
//! above can tell a short transfer apart from a completed one.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest valid 7-bit I2C address
pub const MAX_ADDRESS: u8 = 0x7F;

/// I2C bus master
///
/// Every method returns the number of bytes transferred on success. A
/// controller that gives up part way (NACK mid-frame, arbitration loss)
/// may report it either as an error or as a short count.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error: core::fmt::Debug;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize, Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// Returns the sum of bytes written and bytes read.
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<usize, Self::Error>;
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize, Self::Error> {
        T::write(self, address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        T::read(self, address, buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<usize, Self::Error> {
        T::write_read(self, address, write_data, read_buf)
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
    };

    /// Configuration from a speed given in kHz, the unit board files use
    ///
    /// Saturates at `u32::MAX` Hz.
    pub const fn from_khz(khz: u32) -> Self {
        Self {
            frequency: khz.saturating_mul(1_000),
        }
    }

    /// Clock frequency in kHz
    pub const fn khz(&self) -> u32 {
        self.frequency / 1_000
    }
}

/// Check that an address fits in 7 bits
pub const fn is_valid_address(address: u8) -> bool {
    address <= MAX_ADDRESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(I2cConfig::default(), I2cConfig::STANDARD);
        assert_eq!(I2cConfig::from_khz(400), I2cConfig::FAST);
        assert_eq!(I2cConfig::FAST_PLUS.khz(), 1_000);
    }

    #[test]
    fn test_from_khz_saturates() {
        assert_eq!(I2cConfig::from_khz(u32::MAX).frequency, u32::MAX);
        assert_eq!(I2cConfig::from_khz(0).frequency, 0);
    }

    #[test]
    fn test_address_range() {
        assert!(is_valid_address(0x00));
        assert!(is_valid_address(0x40));
        assert!(is_valid_address(0x7F));
        assert!(!is_valid_address(0x80));
        assert!(!is_valid_address(0xFF));
    }
}

//! SPI bus abstractions
//!
//! An [`SpiBus`] addresses exactly one chip-selected device. Chip select is
//! asserted for the duration of each call.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// SPI device on a chip select line
///
/// Methods return the number of bytes clocked on success.
pub trait SpiBus {
    /// Error type for SPI operations
    type Error: core::fmt::Debug;

    /// Transfer data (simultaneous read/write)
    ///
    /// Writes data from `write` buffer while reading into `read` buffer.
    /// Both buffers must be the same length.
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<usize, Self::Error>;

    /// Write data without reading
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Write `write`, then clock in `read.len()` bytes with chip select held
    ///
    /// Returns the sum of both phases.
    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<usize, Self::Error>;
}

impl<T: SpiBus + ?Sized> SpiBus for &mut T {
    type Error = T::Error;

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<usize, Self::Error> {
        T::transfer(self, read, write)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        T::write(self, data)
    }

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<usize, Self::Error> {
        T::write_read(self, write, read)
    }
}

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Clock polarity and phase
    pub mode: Mode,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            frequency: 1_000_000, // 1 MHz
            mode: Mode::Mode0,
        }
    }
}

impl SpiConfig {
    /// Clock polarity for the configured mode
    pub fn polarity(&self) -> Polarity {
        let (polarity, _) = self.mode.into();
        polarity
    }

    /// Clock phase for the configured mode
    pub fn phase(&self) -> Phase {
        let (_, phase) = self.mode.into();
        phase
    }
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}

impl From<Mode> for embedded_hal::spi::Mode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => embedded_hal::spi::MODE_0,
            Mode::Mode1 => embedded_hal::spi::MODE_1,
            Mode::Mode2 => embedded_hal::spi::MODE_2,
            Mode::Mode3 => embedded_hal::spi::MODE_3,
        }
    }
}

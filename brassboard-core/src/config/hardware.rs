//! Hardware configuration types
//!
//! These types describe how each device is wired: bus addresses and
//! clocks, retry policy, pins, and polling cadence. They carry no
//! transport handles, so a whole board can be described in a config file
//! and validated before any driver is constructed.

use brassboard_hal::gpio::Pull;
use brassboard_hal::i2c::I2cConfig;
use brassboard_hal::spi::SpiConfig;
use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bus::i2c::validate_address;
use crate::bus::RegisterFlags;
use crate::error::ArgumentError;
use crate::poll::FailurePolicy;
use crate::retry::RetryPolicy;

/// Maximum length of a device name
pub const MAX_NAME_LEN: usize = 16;

/// Maximum devices of each kind per board
pub const MAX_DEVICES: usize = 8;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number
    pub pin: u8,
    /// Pin is active-low (inverted)
    #[cfg_attr(feature = "serde", serde(default))]
    pub inverted: bool,
    /// Internal pull resistor (inputs only)
    #[cfg_attr(feature = "serde", serde(default))]
    pub pull: Pull,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull: Pull::None,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
            pull: Pull::None,
        }
    }

    /// Create a pin with pull-up enabled
    pub const fn with_pullup(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull: Pull::Up,
        }
    }
}

/// One I2C device: address, clock and retry bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct I2cDeviceConfig {
    /// 7-bit address
    pub address: u8,
    /// Bus clock
    #[cfg_attr(feature = "serde", serde(default))]
    pub bus: I2cConfig,
    /// Attempts per transaction
    #[cfg_attr(feature = "serde", serde(default))]
    pub retry: RetryPolicy,
}

impl I2cDeviceConfig {
    /// Standard-mode device with default retry
    pub const fn new(address: u8) -> Self {
        Self {
            address,
            bus: I2cConfig::STANDARD,
            retry: RetryPolicy::attempts(crate::retry::DEFAULT_ATTEMPTS),
        }
    }

    /// Check address range, clock and retry bound
    pub fn validate(&self) -> Result<(), ArgumentError> {
        validate_address(self.address)?;
        if self.bus.frequency == 0 {
            return Err(ArgumentError::ZeroFrequency);
        }
        self.retry.validate()
    }
}

/// One SPI device: clock/mode, retry bound, register convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiDeviceConfig {
    /// Bus clock and mode
    #[cfg_attr(feature = "serde", serde(default))]
    pub bus: SpiConfig,
    /// Attempts per transaction
    #[cfg_attr(feature = "serde", serde(default))]
    pub retry: RetryPolicy,
    /// Flags OR-ed into register addresses
    #[cfg_attr(feature = "serde", serde(default))]
    pub registers: RegisterFlags,
}

impl SpiDeviceConfig {
    /// Check clock and retry bound
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if self.bus.frequency == 0 {
            return Err(ArgumentError::ZeroFrequency);
        }
        self.retry.validate()
    }
}

/// Polling cadence for one driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PollConfig {
    /// Time between updates in milliseconds
    pub period_ms: u32,
    /// What a failed update does to the loop
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_failure: FailurePolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            period_ms: 1_000,
            on_failure: FailurePolicy::default(),
        }
    }
}

impl PollConfig {
    /// Reject a zero period or a zero failure bound
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if self.period_ms == 0 {
            return Err(ArgumentError::ZeroPeriod);
        }
        if let FailurePolicy::Retry { max_consecutive: 0 } = self.on_failure {
            return Err(ArgumentError::ZeroRetries);
        }
        Ok(())
    }
}

/// Named I2C device entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct I2cEntry {
    /// Device name (e.g., "humidity", "accel")
    pub name: String<MAX_NAME_LEN>,
    /// Wiring
    pub device: I2cDeviceConfig,
    /// Polling, if the application polls this device
    #[cfg_attr(feature = "serde", serde(default))]
    pub poll: Option<PollConfig>,
    /// Change-notification threshold in engineering units
    #[cfg_attr(feature = "serde", serde(default))]
    pub threshold: f32,
}

/// Named SPI device entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiEntry {
    /// Device name
    pub name: String<MAX_NAME_LEN>,
    /// Chip select pin
    pub chip_select: PinConfig,
    /// Wiring
    #[cfg_attr(feature = "serde", serde(default))]
    pub device: SpiDeviceConfig,
}

/// Named digital pin entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinEntry {
    /// Port name (e.g., "relay", "button")
    pub name: String<MAX_NAME_LEN>,
    /// Pin wiring
    pub pin: PinConfig,
}

/// Complete board description
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardConfig {
    /// I2C devices
    #[cfg_attr(feature = "serde", serde(default))]
    pub i2c: Vec<I2cEntry, MAX_DEVICES>,
    /// SPI devices
    #[cfg_attr(feature = "serde", serde(default))]
    pub spi: Vec<SpiEntry, MAX_DEVICES>,
    /// Digital ports
    #[cfg_attr(feature = "serde", serde(default))]
    pub pins: Vec<PinEntry, MAX_DEVICES>,
}

impl BoardConfig {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Find an I2C device by name
    pub fn find_i2c(&self, name: &str) -> Option<&I2cEntry> {
        self.i2c.iter().find(|d| d.name.as_str() == name)
    }

    /// Find an SPI device by name
    pub fn find_spi(&self, name: &str) -> Option<&SpiEntry> {
        self.spi.iter().find(|d| d.name.as_str() == name)
    }

    /// Find a digital port by name
    pub fn find_pin(&self, name: &str) -> Option<&PinEntry> {
        self.pins.iter().find(|p| p.name.as_str() == name)
    }

    /// Validate every entry
    ///
    /// Also rejects a pin used twice (chip selects included) and negative
    /// thresholds.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        let mut used: Vec<u8, { 2 * MAX_DEVICES }> = Vec::new();
        let mut claim = |pin: u8| -> Result<(), ArgumentError> {
            if used.contains(&pin) {
                return Err(ArgumentError::PinInUse(pin));
            }
            let _ = used.push(pin);
            Ok(())
        };

        for entry in &self.i2c {
            entry.device.validate()?;
            if let Some(poll) = &entry.poll {
                poll.validate()?;
            }
            if entry.threshold.is_nan() || entry.threshold < 0.0 {
                return Err(ArgumentError::InvalidThreshold);
            }
        }
        for entry in &self.spi {
            entry.device.validate()?;
            claim(entry.chip_select.pin)?;
        }
        for entry in &self.pins {
            claim(entry.pin.pin)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_config() {
        let pin = PinConfig::new(10);
        assert_eq!(pin.pin, 10);
        assert!(!pin.inverted);
        assert_eq!(pin.pull, Pull::None);

        let inverted = PinConfig::inverted(12);
        assert!(inverted.inverted);

        let pullup = PinConfig::with_pullup(4);
        assert_eq!(pullup.pull, Pull::Up);
    }

    #[test]
    fn test_i2c_config_validation() {
        assert!(I2cDeviceConfig::new(0x40).validate().is_ok());
        assert_eq!(
            I2cDeviceConfig::new(0x90).validate(),
            Err(ArgumentError::AddressOutOfRange(0x90))
        );

        let mut slow = I2cDeviceConfig::new(0x40);
        slow.bus.frequency = 0;
        assert_eq!(slow.validate(), Err(ArgumentError::ZeroFrequency));

        let mut once = I2cDeviceConfig::new(0x40);
        once.retry.max_attempts = 0;
        assert_eq!(once.validate(), Err(ArgumentError::ZeroRetries));
    }

    #[test]
    fn test_board_rejects_shared_pin() {
        let mut board = BoardConfig::new();
        board
            .pins
            .push(PinEntry {
                name: String::try_from("relay").unwrap(),
                pin: PinConfig::new(5),
            })
            .unwrap();
        board
            .spi
            .push(SpiEntry {
                name: String::try_from("shift").unwrap(),
                chip_select: PinConfig::new(5),
                device: SpiDeviceConfig::default(),
            })
            .unwrap();

        assert_eq!(board.validate(), Err(ArgumentError::PinInUse(5)));
    }

    #[test]
    fn test_empty_board() {
        let board = BoardConfig::new();
        assert!(board.validate().is_ok());
        assert!(board.find_i2c("humidity").is_none());
    }
}

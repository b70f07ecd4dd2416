//! TI TMP102 digital temperature sensor
//!
//! The temperature register holds a left-aligned two's-complement count
//! of 0.0625 °C steps: 12 bits normally, 13 bits in extended mode. Bit 0
//! of the low byte is set in extended mode, so each sample says how it
//! should be decoded.

use brassboard_core::bus::CommunicationBus;
use brassboard_core::error::Error;
use brassboard_core::reading::{ChangeThreshold, Changes, Quantity, Reading};
use brassboard_core::traits::Sensor;

use super::finite;

/// Address with ADD0 tied to ground
pub const DEFAULT_ADDRESS: u8 = 0x48;

/// Degrees Celsius per count
pub const RESOLUTION: f32 = 0.0625;

const REG_TEMPERATURE: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

// Bits of the configuration register, as a big-endian u16
const CONFIG_SHUTDOWN: u16 = 1 << 8;
const CONFIG_EXTENDED: u16 = 1 << 4;
const CONFIG_RATE_SHIFT: u16 = 6;
const CONFIG_RATE_MASK: u16 = 0b11 << CONFIG_RATE_SHIFT;

/// Continuous conversion rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionRate {
    /// 0.25 Hz
    Quarter = 0b00,
    /// 1 Hz
    One = 0b01,
    /// 4 Hz (power-on default)
    Four = 0b10,
    /// 8 Hz
    Eight = 0b11,
}

/// Temperature in °C from the two temperature register bytes
pub fn decode_temperature(bytes: [u8; 2]) -> f32 {
    let raw = i16::from_be_bytes(bytes);
    let counts = if bytes[1] & 0x01 != 0 {
        raw >> 3
    } else {
        raw >> 4
    };
    counts as f32 * RESOLUTION
}

/// TMP102 driver
pub struct Tmp102<B> {
    bus: B,
    temperature: Reading,
}

impl<B: CommunicationBus> Tmp102<B> {
    /// Create a driver; the device has no identity register to check
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            temperature: Reading::new(Quantity::Temperature, ChangeThreshold::ZERO),
        }
    }

    /// Change threshold in °C
    pub fn with_threshold(mut self, threshold: ChangeThreshold) -> Self {
        self.temperature.set_threshold(threshold);
        self
    }

    /// Last committed temperature (°C)
    pub fn temperature(&self) -> Option<f32> {
        self.temperature.value()
    }

    /// Switch between 12-bit (-55..128 °C) and 13-bit (-55..150 °C) output
    pub fn set_extended_mode(&mut self, extended: bool) -> Result<(), Error<B::Error>> {
        self.modify_config(CONFIG_EXTENDED, if extended { CONFIG_EXTENDED } else { 0 })
    }

    /// Set the continuous conversion rate
    pub fn set_conversion_rate(&mut self, rate: ConversionRate) -> Result<(), Error<B::Error>> {
        self.modify_config(CONFIG_RATE_MASK, (rate as u16) << CONFIG_RATE_SHIFT)
    }

    /// Enter or leave shutdown mode
    pub fn shutdown(&mut self, off: bool) -> Result<(), Error<B::Error>> {
        self.modify_config(CONFIG_SHUTDOWN, if off { CONFIG_SHUTDOWN } else { 0 })
    }

    /// Give back the bus
    pub fn release(self) -> B {
        self.bus
    }

    fn modify_config(&mut self, mask: u16, value: u16) -> Result<(), Error<B::Error>> {
        let config = self.bus.read_u16_be(REG_CONFIG)?;
        let next = (config & !mask) | (value & mask);
        if next != config {
            self.bus.write_u16_be(REG_CONFIG, next)?;
        }
        Ok(())
    }
}

impl<B: CommunicationBus> Sensor for Tmp102<B> {
    type Error = Error<B::Error>;

    fn update(&mut self) -> Result<Changes, Self::Error> {
        let bytes = self.bus.read_array::<2>(REG_TEMPERATURE)?;
        let temperature = finite(decode_temperature(bytes))?;

        let mut changes = Changes::new();
        self.temperature.commit_into(temperature, &mut changes);
        Ok(changes)
    }
}

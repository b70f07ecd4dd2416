//! Honeywell HIH6130 humidity and temperature sensor
//!
//! A measurement is started with a one-byte write and fetched as a plain
//! four-byte read once the conversion has finished:
//!
//! ```text
//! byte 0: S1 S0 H13..H8   status + humidity high bits
//! byte 1: H7..H0
//! byte 2: T13..T6
//! byte 3: T5..T0 x x
//! ```

use brassboard_core::bus::CommunicationBus;
use brassboard_core::error::{DeviceError, Error};
use brassboard_core::reading::{ChangeThreshold, Changes, Quantity, Reading};
use brassboard_core::traits::Sensor;
use embedded_hal::delay::DelayNs;

use super::finite;

/// Factory-default I2C address
pub const DEFAULT_ADDRESS: u8 = 0x27;

/// Worst-case conversion time in milliseconds
pub const CONVERSION_TIME_MS: u32 = 40;

/// Full scale of the 14-bit humidity and temperature counts
const FULL_SCALE: f32 = 16383.0;

const STATUS_NORMAL: u8 = 0b00;
const STATUS_STALE: u8 = 0b01;

/// Relative humidity in percent from a 14-bit count
pub fn humidity_percent(raw: u16) -> f32 {
    100.0 * (raw & 0x3FFF) as f32 / FULL_SCALE
}

/// Temperature in degrees Celsius from a 14-bit count
pub fn temperature_celsius(raw: u16) -> f32 {
    (raw & 0x3FFF) as f32 * 165.0 / FULL_SCALE - 40.0
}

/// HIH6130 driver
pub struct Hih6130<B, D> {
    bus: B,
    delay: D,
    humidity: Reading,
    temperature: Reading,
}

impl<B: CommunicationBus, D: DelayNs> Hih6130<B, D> {
    /// Create a driver; the device has no identity register to check
    pub fn new(bus: B, delay: D) -> Self {
        Self {
            bus,
            delay,
            humidity: Reading::new(Quantity::Humidity, ChangeThreshold::ZERO),
            temperature: Reading::new(Quantity::Temperature, ChangeThreshold::ZERO),
        }
    }

    /// Change thresholds in %RH and °C
    pub fn with_thresholds(mut self, humidity: ChangeThreshold, temperature: ChangeThreshold) -> Self {
        self.humidity.set_threshold(humidity);
        self.temperature.set_threshold(temperature);
        self
    }

    /// Last committed relative humidity (%)
    pub fn humidity(&self) -> Option<f32> {
        self.humidity.value()
    }

    /// Last committed temperature (°C)
    pub fn temperature(&self) -> Option<f32> {
        self.temperature.value()
    }

    /// Give back the bus and delay
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    /// Start a conversion, wait for it and decode the result
    ///
    /// Returns `None` when the device reports stale data.
    fn measure(&mut self) -> Result<Option<(f32, f32)>, Error<B::Error>> {
        self.bus.write_byte(0x00)?;
        self.delay.delay_ms(CONVERSION_TIME_MS);

        let mut frame = [0u8; 4];
        self.bus.read_bytes(&mut frame)?;

        let status = frame[0] >> 6;
        match status {
            STATUS_NORMAL => {}
            STATUS_STALE => {
                debug!("stale measurement, readings kept");
                return Ok(None);
            }
            _ => {
                warn!("device status {}", status);
                return Err(DeviceError::Status(status).into());
            }
        }

        let raw_humidity = u16::from_be_bytes([frame[0], frame[1]]);
        let raw_temperature = u16::from_be_bytes([frame[2], frame[3]]) >> 2;
        let humidity = finite(humidity_percent(raw_humidity))?;
        let temperature = finite(temperature_celsius(raw_temperature))?;
        Ok(Some((humidity, temperature)))
    }
}

impl<B: CommunicationBus, D: DelayNs> Sensor for Hih6130<B, D> {
    type Error = Error<B::Error>;

    fn update(&mut self) -> Result<Changes, Self::Error> {
        let mut changes = Changes::new();
        if let Some((humidity, temperature)) = self.measure()? {
            self.humidity.commit_into(humidity, &mut changes);
            self.temperature.commit_into(temperature, &mut changes);
        }
        Ok(changes)
    }
}

//! Analog Devices ADXL345 3-axis accelerometer
//!
//! Works over I2C or SPI. On SPI the device expects the read flag in bit
//! 7 and the multi-byte flag in bit 6 of the address byte, which
//! [`RegisterFlags::READ_HIGH_MULTI`](brassboard_core::bus::RegisterFlags::READ_HIGH_MULTI)
//! provides.
//!
//! The driver always runs in full-resolution mode, where one count is
//! 3.9 mg regardless of range.

use brassboard_core::bus::{check_identity, CommunicationBus};
use brassboard_core::error::{ArgumentError, Error};
use brassboard_core::reading::{ChangeThreshold, Changes, Quantity, Reading};
use brassboard_core::traits::Sensor;

use super::finite;

/// Address with ALT ADDRESS tied low
pub const DEFAULT_ADDRESS: u8 = 0x53;

/// Address with ALT ADDRESS tied high
pub const ALT_ADDRESS: u8 = 0x1D;

/// Value of the DEVID register
pub const DEVICE_ID: u8 = 0xE5;

/// g per count in full-resolution mode
pub const SCALE_G: f32 = 0.0039;

const REG_DEVID: u8 = 0x00;
const REG_BW_RATE: u8 = 0x2C;
const REG_POWER_CTL: u8 = 0x2D;
const REG_DATA_FORMAT: u8 = 0x31;
const REG_DATAX0: u8 = 0x32;

const POWER_MEASURE: u8 = 1 << 3;
const FORMAT_FULL_RES: u8 = 1 << 3;
const FORMAT_RANGE_MASK: u8 = 0b11;
const RATE_MASK: u8 = 0b1111;

/// Measurement range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Range {
    /// ±2 g
    #[default]
    G2 = 0b00,
    /// ±4 g
    G4 = 0b01,
    /// ±8 g
    G8 = 0b10,
    /// ±16 g
    G16 = 0b11,
}

/// Acceleration in g from the six data registers
pub fn decode_axes(data: [u8; 6]) -> [f32; 3] {
    [
        i16::from_le_bytes([data[0], data[1]]) as f32 * SCALE_G,
        i16::from_le_bytes([data[2], data[3]]) as f32 * SCALE_G,
        i16::from_le_bytes([data[4], data[5]]) as f32 * SCALE_G,
    ]
}

/// ADXL345 driver
pub struct Adxl345<B> {
    bus: B,
    range: Range,
    axes: [Reading; 3],
}

impl<B: CommunicationBus> Adxl345<B> {
    /// Check the device ID and start measuring at ±2 g
    ///
    /// Fails with a device error if DEVID does not read 0xE5.
    pub fn new(mut bus: B) -> Result<Self, Error<B::Error>> {
        check_identity(&mut bus, REG_DEVID, DEVICE_ID)?;

        let mut adxl = Self {
            bus,
            range: Range::G2,
            axes: [
                Reading::new(Quantity::AccelerationX, ChangeThreshold::ZERO),
                Reading::new(Quantity::AccelerationY, ChangeThreshold::ZERO),
                Reading::new(Quantity::AccelerationZ, ChangeThreshold::ZERO),
            ],
        };
        adxl.bus.write_register(REG_DATA_FORMAT, FORMAT_FULL_RES)?;
        adxl.bus.write_register(REG_POWER_CTL, POWER_MEASURE)?;
        Ok(adxl)
    }

    /// Change threshold in g, applied to every axis
    pub fn with_threshold(mut self, threshold: ChangeThreshold) -> Self {
        for axis in &mut self.axes {
            axis.set_threshold(threshold);
        }
        self
    }

    /// Select the measurement range
    pub fn set_range(&mut self, range: Range) -> Result<(), Error<B::Error>> {
        self.bus
            .update_register(REG_DATA_FORMAT, FORMAT_RANGE_MASK, range as u8)?;
        self.range = range;
        Ok(())
    }

    /// Measurement range last configured
    pub fn range(&self) -> Range {
        self.range
    }

    /// Set the output data rate code (0..=15, 0x0A is 100 Hz)
    pub fn set_rate_code(&mut self, code: u8) -> Result<(), Error<B::Error>> {
        if code > RATE_MASK {
            return Err(ArgumentError::ValueOutOfRange.into());
        }
        self.bus.update_register(REG_BW_RATE, RATE_MASK, code)
    }

    /// Last committed acceleration per axis (g)
    pub fn acceleration(&self) -> Option<[f32; 3]> {
        Some([
            self.axes[0].value()?,
            self.axes[1].value()?,
            self.axes[2].value()?,
        ])
    }

    /// Stop measuring and give back the bus
    pub fn release(mut self) -> Result<B, Error<B::Error>> {
        self.bus.write_register(REG_POWER_CTL, 0)?;
        Ok(self.bus)
    }
}

impl<B: CommunicationBus> Sensor for Adxl345<B> {
    type Error = Error<B::Error>;

    fn update(&mut self) -> Result<Changes, Self::Error> {
        let data = self.bus.read_array::<6>(REG_DATAX0)?;
        let [x, y, z] = decode_axes(data);
        let decoded = [finite(x)?, finite(y)?, finite(z)?];

        let mut changes = Changes::new();
        for (axis, value) in self.axes.iter_mut().zip(decoded) {
            axis.commit_into(value, &mut changes);
        }
        Ok(changes)
    }
}

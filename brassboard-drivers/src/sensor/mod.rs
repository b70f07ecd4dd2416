//! Sensor drivers
//!
//! Each driver implements [`Sensor`](brassboard_core::traits::Sensor):
//! `update()` reads the device, decodes every value, and only then
//! commits them to the cached readings.

pub mod adxl345;
pub mod hih6130;
pub mod tmp102;

pub use adxl345::{Adxl345, Range};
pub use hih6130::Hih6130;
pub use tmp102::{ConversionRate, Tmp102};

use brassboard_core::error::DeviceError;

/// Reject decoded values that are not finite
pub(crate) fn finite(value: f32) -> Result<f32, DeviceError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DeviceError::InvalidData)
    }
}

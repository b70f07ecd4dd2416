//! Device driver implementations
//!
//! Every driver here is generic over a
//! [`CommunicationBus`](brassboard_core::bus::CommunicationBus) or over
//! digital ports, so the same code runs on any board and against the
//! host-side mocks:
//!
//! - Sensors (HIH6130 humidity, TMP102 temperature, ADXL345 accelerometer)
//! - Real-time clock (DS3231)
//! - Outputs (relay, 74HC595 shift register)
//! - Inputs (push button)

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod input;
pub mod output;
pub mod rtc;
pub mod sensor;

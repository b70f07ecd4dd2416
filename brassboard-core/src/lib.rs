//! Board-agnostic peripheral plumbing
//!
//! This crate contains everything a device driver needs that does not
//! depend on a specific microcontroller:
//!
//! - Register-oriented buses with bounded retry (I2C and SPI)
//! - A mutex-guarded shared bus for several drivers on one set of wires
//! - Digital input/output ports and pin ownership
//! - Cached readings with threshold-gated change events
//! - Change listeners and a stoppable polling loop
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod bus;
pub mod config;
pub mod error;
pub mod event;
pub mod poll;
pub mod port;
pub mod reading;
pub mod retry;
pub mod traits;

pub use bus::{check_identity, CommunicationBus, I2cDevice, SharedBus, SpiDevice};
pub use error::{ArgumentError, DeviceError, Error, TransferError};
pub use event::ChangeListener;
pub use poll::{Poller, StopSignal};
pub use port::{DigitalInputPort, DigitalOutputPort, PinRegistry};
pub use reading::{ChangeThreshold, Changes, Quantity, Reading, ReadingChanged};
pub use retry::RetryPolicy;
pub use traits::Sensor;

//! Driver-facing traits
//!
//! Bus access lives in [`crate::bus::CommunicationBus`]; this module holds
//! the traits drivers implement so generic code can drive them.

pub mod sensor;

pub use sensor::Sensor;

//! Brassboard Hardware Abstraction Layer
//!
//! This crate defines the platform capabilities the Brassboard bus and
//! port types are built on. A board support crate (or any HAL that
//! implements the `embedded-hal` 1.0 traits, through the adapters in
//! [`eh`]) provides them; the drivers never touch chip registers directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application                            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  brassboard-drivers (sensors, outputs)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  brassboard-core (bus, ports, polling)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  brassboard-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!          embedded-hal implementations
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`], [`gpio::EdgeWait`] - Digital I/O
//! - [`gpio::ConfigurePull`] - Internal pull resistors
//! - [`i2c::I2cBus`] - I2C transfers reporting bytes moved
//! - [`spi::SpiBus`] - SPI transfers on one chip-selected device

#![no_std]
#![deny(unsafe_code)]

pub mod eh;
pub mod gpio;
pub mod i2c;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod spi;

// Re-export key traits at crate root for convenience
pub use gpio::{ConfigurePull, Edge, EdgeWait, InputPin, OutputPin, Pull};
pub use i2c::{I2cBus, I2cConfig};
pub use spi::{Mode, Phase, Polarity, SpiBus, SpiConfig};

//! GPIO pin abstractions
//!
//! Pins are fallible: on expanders and some host backends a level change
//! is itself a bus transfer.

use core::future::Future;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Internal pull resistor selection for inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Pull {
    /// Floating input
    #[default]
    None,
    /// Pull to VCC
    Up,
    /// Pull to GND
    Down,
}

/// Edge that an input can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Low to high
    Rising,
    /// High to low
    Falling,
    /// Either transition
    Any,
}

/// Digital output pin
pub trait OutputPin {
    /// Error type for pin writes
    type Error: core::fmt::Debug;

    /// Drive the pin high (`true`) or low (`false`)
    fn set_level(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Set the pin high (logic 1)
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_level(true)
    }

    /// Set the pin low (logic 0)
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_level(false)
    }
}

/// Digital input pin
pub trait InputPin {
    /// Error type for pin reads
    type Error: core::fmt::Debug;

    /// Check if the pin reads high (logic 1)
    ///
    /// Takes `&mut self` because some backends sample through a bus.
    fn is_high(&mut self) -> Result<bool, Self::Error>;

    /// Check if the pin reads low (logic 0)
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Pull resistor control of an input pin
///
/// `embedded-hal` has no equivalent, so board crates implement this on
/// their own pin types. Pins wired with external resistors need not.
pub trait ConfigurePull: InputPin {
    /// Select the internal pull resistor
    fn set_pull(&mut self, pull: Pull) -> Result<(), Self::Error>;
}

/// Edge interrupt capability of an input pin
///
/// Resolves once the requested transition has been latched by the
/// platform's interrupt controller.
pub trait EdgeWait: InputPin {
    /// Wait for the given edge
    fn wait_for_edge(&mut self, edge: Edge) -> impl Future<Output = Result<(), Self::Error>>;
}

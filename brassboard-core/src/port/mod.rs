//! Digital ports
//!
//! A port wraps one pin with a fixed direction. Outputs cache the level
//! they last drove; inputs read the pin on every call and can report
//! transitions to a [`ChangeListener`](crate::event::ChangeListener).
//!
//! Ports may carry a [`PinClaim`] from a [`PinRegistry`]; the claim is
//! released when the port is released or dropped.

pub mod input;
pub mod output;
pub mod registry;

pub use input::DigitalInputPort;
pub use output::DigitalOutputPort;
pub use registry::{PinClaim, PinRegistry, MAX_PINS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which physical level means "on"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActiveLevel {
    /// Logical true drives the pin high
    #[default]
    High,
    /// Logical true drives the pin low
    Low,
}

impl ActiveLevel {
    /// Active-low when `inverted` is set
    pub const fn from_inverted(inverted: bool) -> Self {
        if inverted {
            ActiveLevel::Low
        } else {
            ActiveLevel::High
        }
    }

    /// Convert between logical state and physical level (symmetric)
    pub const fn apply(self, level: bool) -> bool {
        match self {
            ActiveLevel::High => level,
            ActiveLevel::Low => !level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_level() {
        assert!(ActiveLevel::High.apply(true));
        assert!(!ActiveLevel::Low.apply(true));
        assert_eq!(ActiveLevel::from_inverted(true), ActiveLevel::Low);
        assert_eq!(ActiveLevel::default(), ActiveLevel::High);
    }
}

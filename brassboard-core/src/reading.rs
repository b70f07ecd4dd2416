//! Cached sensor readings with threshold-gated change events
//!
//! A [`Reading`] holds the last committed value and the last value a
//! change event was raised for. Committing a new value raises a
//! [`ReadingChanged`] when nothing has been notified yet, or when the
//! value moved by at least the threshold. A threshold of zero fires on
//! any difference and never on an identical value.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;

/// Most change events a single update can produce
pub const MAX_CHANGES: usize = 4;

/// Change events produced by one update
pub type Changes = Vec<ReadingChanged, MAX_CHANGES>;

/// Physical quantity a reading represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Quantity {
    /// Degrees Celsius
    Temperature,
    /// Percent relative humidity
    Humidity,
    /// X-axis acceleration in g
    AccelerationX,
    /// Y-axis acceleration in g
    AccelerationY,
    /// Z-axis acceleration in g
    AccelerationZ,
}

/// Minimum movement that raises a change event
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChangeThreshold(f32);

impl ChangeThreshold {
    /// Fire on any difference
    pub const ZERO: Self = Self(0.0);

    /// Threshold in the reading's engineering units
    ///
    /// Negative and NaN thresholds are rejected.
    pub fn new(value: f32) -> Result<Self, ArgumentError> {
        if value.is_nan() || value < 0.0 {
            return Err(ArgumentError::InvalidThreshold);
        }
        Ok(Self(value))
    }

    /// Threshold value
    pub fn value(&self) -> f32 {
        self.0
    }

    /// True when moving from `previous` to `current` should notify
    pub fn is_crossed(&self, previous: Option<f32>, current: f32) -> bool {
        match previous {
            None => true,
            Some(previous) => {
                let delta = current - previous;
                delta != 0.0 && delta.abs() >= self.0
            }
        }
    }
}

/// One change event
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadingChanged {
    /// What changed
    pub quantity: Quantity,
    /// Value at the previous notification, `None` for the first one
    pub previous: Option<f32>,
    /// New value
    pub current: f32,
}

/// A cached reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    quantity: Quantity,
    current: Option<f32>,
    last_notified: Option<f32>,
    threshold: ChangeThreshold,
}

impl Reading {
    /// Empty reading; [`value`](Self::value) is `None` until the first commit
    pub const fn new(quantity: Quantity, threshold: ChangeThreshold) -> Self {
        Self {
            quantity,
            current: None,
            last_notified: None,
            threshold,
        }
    }

    /// Quantity this reading holds
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Last committed value
    pub fn value(&self) -> Option<f32> {
        self.current
    }

    /// Value the last change event carried
    pub fn last_notified(&self) -> Option<f32> {
        self.last_notified
    }

    /// Minimum difference that counts as a change
    pub fn threshold(&self) -> ChangeThreshold {
        self.threshold
    }

    /// Replace the threshold; the cached values are kept
    pub fn set_threshold(&mut self, threshold: ChangeThreshold) {
        self.threshold = threshold;
    }

    /// Store a decoded value and decide whether it is a change
    pub fn commit(&mut self, value: f32) -> Option<ReadingChanged> {
        self.current = Some(value);
        if !self.threshold.is_crossed(self.last_notified, value) {
            return None;
        }
        let event = ReadingChanged {
            quantity: self.quantity,
            previous: self.last_notified,
            current: value,
        };
        self.last_notified = Some(value);
        Some(event)
    }

    /// Commit `value` and append any change to `changes`
    pub fn commit_into(&mut self, value: f32, changes: &mut Changes) {
        if let Some(event) = self.commit(value) {
            // Each driver commits at most MAX_CHANGES readings per update
            let _ = changes.push(event);
        }
    }
}

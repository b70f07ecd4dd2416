//! Pin ownership
//!
//! The application owns one [`PinRegistry`] per board and claims every
//! pin through it before building a port, so two ports can never drive
//! the same pin.

use core::cell::Cell;
use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::error::ArgumentError;

/// Most pins a registry can track
pub const MAX_PINS: u8 = 64;

/// Set of claimed pin numbers
pub struct PinRegistry<M: RawMutex> {
    pin_count: u8,
    claimed: Mutex<M, Cell<u64>>,
}

impl<M: RawMutex> PinRegistry<M> {
    /// Registry for pins `0..pin_count` (at most [`MAX_PINS`])
    pub const fn new(pin_count: u8) -> Self {
        Self {
            pin_count: if pin_count > MAX_PINS {
                MAX_PINS
            } else {
                pin_count
            },
            claimed: Mutex::new(Cell::new(0)),
        }
    }

    /// Number of pins the registry covers
    pub fn pin_count(&self) -> u8 {
        self.pin_count
    }

    /// Take ownership of `pin`
    ///
    /// Fails immediately if the pin is out of range or already claimed.
    pub fn claim(&self, pin: u8) -> Result<PinClaim<'_, M>, ArgumentError> {
        if pin >= self.pin_count {
            return Err(ArgumentError::PinOutOfRange(pin));
        }
        let bit = 1u64 << pin;
        self.claimed.lock(|claimed| {
            let mask = claimed.get();
            if mask & bit != 0 {
                warn!("pin {} already claimed", pin);
                return Err(ArgumentError::PinInUse(pin));
            }
            claimed.set(mask | bit);
            Ok(())
        })?;
        trace!("pin {} claimed", pin);
        Ok(PinClaim {
            registry: self,
            pin,
        })
    }

    /// Whether `pin` is currently owned
    pub fn is_claimed(&self, pin: u8) -> bool {
        pin < self.pin_count && self.claimed.lock(|claimed| claimed.get() & (1u64 << pin) != 0)
    }

    /// Number of pins currently owned
    pub fn claimed_count(&self) -> u32 {
        self.claimed.lock(|claimed| claimed.get().count_ones())
    }

    fn release(&self, pin: u8) {
        self.claimed.lock(|claimed| claimed.set(claimed.get() & !(1u64 << pin)));
        trace!("pin {} released", pin);
    }
}

/// Ownership of one pin; released on drop
pub struct PinClaim<'r, M: RawMutex> {
    registry: &'r PinRegistry<M>,
    pin: u8,
}

impl<M: RawMutex> PinClaim<'_, M> {
    /// Claimed pin number
    pub fn pin(&self) -> u8 {
        self.pin
    }
}

impl<M: RawMutex> fmt::Debug for PinClaim<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinClaim").field("pin", &self.pin).finish()
    }
}

impl<M: RawMutex> Drop for PinClaim<'_, M> {
    fn drop(&mut self) {
        self.registry.release(self.pin);
    }
}

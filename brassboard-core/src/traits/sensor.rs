//! Polled sensor trait

use crate::reading::Changes;

/// A device whose readings are refreshed by an explicit update
///
/// Implementations read and decode everything first and commit to their
/// cached readings only once the whole decode has succeeded, so a failed
/// update leaves every reading untouched.
pub trait Sensor {
    /// Error type for a failed update
    type Error: core::fmt::Debug;

    /// Refresh the cached readings
    ///
    /// Returns the change events the new values raised, in commit order.
    fn update(&mut self) -> Result<Changes, Self::Error>;
}

impl<S: Sensor + ?Sized> Sensor for &mut S {
    type Error = S::Error;

    fn update(&mut self) -> Result<Changes, Self::Error> {
        S::update(self)
    }
}

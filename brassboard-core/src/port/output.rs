//! Digital output port

use brassboard_hal::gpio::OutputPin;

use super::ActiveLevel;
use crate::config::PinConfig;
use crate::error::Error;

/// Output pin with a cached logical state
///
/// `C` is whatever proves ownership of the pin, normally a
/// [`PinClaim`](super::PinClaim); it is held until the port is released.
#[derive(Debug)]
pub struct DigitalOutputPort<P, C = ()> {
    pin: P,
    state: bool,
    active: ActiveLevel,
    claim: C,
}

impl<P: OutputPin> DigitalOutputPort<P> {
    /// Active-high output driven to `initial`
    pub fn new(pin: P, initial: bool) -> Result<Self, Error<P::Error>> {
        Self::with_level(pin, initial, ActiveLevel::High)
    }

    /// Output with the given active level, driven to `initial`
    pub fn with_level(pin: P, initial: bool, active: ActiveLevel) -> Result<Self, Error<P::Error>> {
        let mut port = Self {
            pin,
            state: initial,
            active,
            claim: (),
        };
        port.drive(initial)?;
        Ok(port)
    }

    /// Output wired as described by `config`
    pub fn from_config(pin: P, config: &PinConfig, initial: bool) -> Result<Self, Error<P::Error>> {
        Self::with_level(pin, initial, ActiveLevel::from_inverted(config.inverted))
    }
}

impl<P: OutputPin, C> DigitalOutputPort<P, C> {
    /// Attach proof of ownership
    pub fn with_claim<C2>(self, claim: C2) -> DigitalOutputPort<P, C2> {
        DigitalOutputPort {
            pin: self.pin,
            state: self.state,
            active: self.active,
            claim,
        }
    }

    /// Last state successfully written; no pin access
    pub fn state(&self) -> bool {
        self.state
    }

    /// Drive the pin, then cache the new state
    ///
    /// On a pin error the cached state is unchanged.
    pub fn set_state(&mut self, state: bool) -> Result<(), Error<P::Error>> {
        self.drive(state)?;
        self.state = state;
        Ok(())
    }

    /// Invert the state and return the new one
    pub fn toggle(&mut self) -> Result<bool, Error<P::Error>> {
        let next = !self.state;
        self.set_state(next)?;
        Ok(next)
    }

    /// Level driven for `true`
    pub fn active_level(&self) -> ActiveLevel {
        self.active
    }

    /// Ownership token held by this port
    pub fn claim(&self) -> &C {
        &self.claim
    }

    /// Give back the pin; the claim is dropped
    pub fn release(self) -> P {
        self.pin
    }

    fn drive(&mut self, state: bool) -> Result<(), Error<P::Error>> {
        self.pin
            .set_level(self.active.apply(state))
            .map_err(Error::Pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArgumentError;
    use crate::port::PinRegistry;
    use brassboard_hal::mock::{MockError, MockOutputPin};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_initial_state_written() {
        let port = DigitalOutputPort::new(MockOutputPin::new(), true).unwrap();
        assert!(port.state());
        let pin = port.release();
        assert!(pin.high);
        assert_eq!(pin.writes, 1);
    }

    #[test]
    fn test_state_is_cached() {
        let mut port = DigitalOutputPort::new(MockOutputPin::new(), false).unwrap();
        port.set_state(true).unwrap();
        assert!(port.state());
        assert!(port.state());
        assert_eq!(port.release().writes, 2);
    }

    #[test]
    fn test_failed_write_keeps_state() {
        let mut port = DigitalOutputPort::new(MockOutputPin::new(), false).unwrap();
        port.pin.broken = true;
        assert_eq!(port.set_state(true), Err(Error::Pin(MockError::Bus)));
        assert!(!port.state());
    }

    #[test]
    fn test_active_low() {
        let mut port =
            DigitalOutputPort::with_level(MockOutputPin::new(), false, ActiveLevel::Low).unwrap();
        assert!(port.pin.high);

        assert!(port.toggle().unwrap());
        assert!(port.state());
        assert!(!port.pin.high);
    }

    #[test]
    fn test_from_config() {
        let port =
            DigitalOutputPort::from_config(MockOutputPin::new(), &PinConfig::inverted(4), true)
                .unwrap();
        assert_eq!(port.active_level(), ActiveLevel::Low);
        assert!(!port.release().high);
    }

    #[test]
    fn test_claim_released_with_port() {
        let registry: PinRegistry<NoopRawMutex> = PinRegistry::new(16);
        let port = DigitalOutputPort::new(MockOutputPin::new(), false)
            .unwrap()
            .with_claim(registry.claim(3).unwrap());

        assert_eq!(port.claim().pin(), 3);
        assert_eq!(registry.claim(3).unwrap_err(), ArgumentError::PinInUse(3));

        let _pin = port.release();
        assert!(registry.claim(3).is_ok());
    }
}

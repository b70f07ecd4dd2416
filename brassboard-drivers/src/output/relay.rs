//! Relay on a digital output
//!
//! Controls a relay coil or SSR through one GPIO. Many relay boards
//! energise the coil when the pin is low, so the active level is
//! configurable; the relay always starts off.

use brassboard_core::config::PinConfig;
use brassboard_core::error::Error;
use brassboard_core::port::{ActiveLevel, DigitalOutputPort};
use brassboard_hal::gpio::OutputPin;

/// Relay driver
#[derive(Debug)]
pub struct Relay<P, C = ()> {
    port: DigitalOutputPort<P, C>,
}

impl<P: OutputPin> Relay<P> {
    /// Relay energised by a high pin
    pub fn new_active_high(pin: P) -> Result<Self, Error<P::Error>> {
        Self::new(pin, ActiveLevel::High)
    }

    /// Relay energised by a low pin
    pub fn new_active_low(pin: P) -> Result<Self, Error<P::Error>> {
        Self::new(pin, ActiveLevel::Low)
    }

    /// Relay wired as described by `config`
    pub fn from_config(pin: P, config: &PinConfig) -> Result<Self, Error<P::Error>> {
        Self::new(pin, ActiveLevel::from_inverted(config.inverted))
    }

    fn new(pin: P, active: ActiveLevel) -> Result<Self, Error<P::Error>> {
        Ok(Self {
            port: DigitalOutputPort::with_level(pin, false, active)?,
        })
    }
}

impl<P: OutputPin, C> Relay<P, C> {
    /// Wrap an existing port, keeping its current state
    pub fn from_port(port: DigitalOutputPort<P, C>) -> Self {
        Self { port }
    }

    /// Energise or release the relay
    pub fn set_on(&mut self, on: bool) -> Result<(), Error<P::Error>> {
        self.port.set_state(on)
    }

    /// Whether the relay is energised
    pub fn is_on(&self) -> bool {
        self.port.state()
    }

    /// Flip the relay, returning the new state
    pub fn toggle(&mut self) -> Result<bool, Error<P::Error>> {
        self.port.toggle()
    }

    /// Turn off and give back the port
    pub fn release(mut self) -> Result<DigitalOutputPort<P, C>, Error<P::Error>> {
        self.port.set_state(false)?;
        Ok(self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brassboard_hal::mock::MockOutputPin;

    #[test]
    fn test_active_high_relay() {
        let mut relay = Relay::new_active_high(MockOutputPin::new()).unwrap();

        // Initially off
        assert!(!relay.is_on());

        relay.set_on(true).unwrap();
        assert!(relay.is_on());

        let pin = relay.release().unwrap().release();
        assert!(!pin.high);
        assert_eq!(pin.writes, 3);
    }

    #[test]
    fn test_active_low_relay() {
        let mut relay = Relay::new_active_low(MockOutputPin::new()).unwrap();
        assert!(!relay.is_on());

        // Pin goes low to energise
        assert!(relay.toggle().unwrap());
        let port = relay.release().unwrap();
        assert!(!port.state());
        assert!(port.release().high);
    }

    #[test]
    fn test_from_config() {
        let relay = Relay::from_config(MockOutputPin::new(), &PinConfig::inverted(6)).unwrap();
        let pin = relay.release().unwrap().release();
        assert!(pin.high);
    }
}

//! Momentary push button on a digital input

use brassboard_core::config::PinConfig;
use brassboard_core::error::Error;
use brassboard_core::event::{ChangeListener, Ignore};
use brassboard_core::port::{ActiveLevel, DigitalInputPort};
use brassboard_hal::gpio::{ConfigurePull, EdgeWait, InputPin, Pull};

/// Button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Button went down
    Pressed,
    /// Button came back up
    Released,
}

impl From<bool> for ButtonEvent {
    fn from(pressed: bool) -> Self {
        if pressed {
            ButtonEvent::Pressed
        } else {
            ButtonEvent::Released
        }
    }
}

/// Push button driver
///
/// The usual wiring pulls the pin up and shorts it to ground when
/// pressed, hence [`new_pull_up`](Self::new_pull_up).
#[derive(Debug)]
pub struct PushButton<P, C = ()> {
    port: DigitalInputPort<P, C>,
}

impl<P: InputPin> PushButton<P> {
    /// Button that reads low when pressed
    pub fn new_pull_up(pin: P) -> Self {
        Self::from_port(DigitalInputPort::with_level(pin, ActiveLevel::Low))
    }

    /// Button that reads high when pressed
    pub fn new_pull_down(pin: P) -> Self {
        Self::from_port(DigitalInputPort::with_level(pin, ActiveLevel::High))
    }

    /// Button wired as described by `config`
    ///
    /// A pull-up button reads low when pressed, so `Pull::Up` makes it
    /// active-low as `inverted` does.
    pub fn from_config(pin: P, config: &PinConfig) -> Self {
        Self::from_port(DigitalInputPort::with_level(pin, pressed_level(config)))
    }
}

impl<P: ConfigurePull> PushButton<P> {
    /// Select the pull resistor from `config`, then wire as [`from_config`](Self::from_config)
    pub fn configure(mut pin: P, config: &PinConfig) -> Result<Self, Error<P::Error>> {
        pin.set_pull(config.pull).map_err(Error::Pin)?;
        Ok(Self::from_config(pin, config))
    }
}

fn pressed_level(config: &PinConfig) -> ActiveLevel {
    if config.inverted || config.pull == Pull::Up {
        ActiveLevel::Low
    } else {
        ActiveLevel::High
    }
}

impl<P: InputPin, C> PushButton<P, C> {
    /// Wrap an existing input port
    pub fn from_port(port: DigitalInputPort<P, C>) -> Self {
        Self { port }
    }

    /// Sample the button
    pub fn is_pressed(&mut self) -> Result<bool, Error<P::Error>> {
        self.port.value()
    }

    /// Sample once and report a press or release
    pub fn poll<L>(&mut self, listener: &mut L) -> Result<Option<ButtonEvent>, Error<P::Error>>
    where
        L: ChangeListener<ButtonEvent>,
    {
        let event = self.port.poll_changed(&mut Ignore)?.map(ButtonEvent::from);
        if let Some(event) = &event {
            listener.on_change(event);
        }
        Ok(event)
    }

    /// Give back the port
    pub fn release(self) -> DigitalInputPort<P, C> {
        self.port
    }
}

impl<P: EdgeWait, C> PushButton<P, C> {
    /// Wait for the next press or release
    pub async fn wait<L>(&mut self, listener: &mut L) -> Result<ButtonEvent, Error<P::Error>>
    where
        L: ChangeListener<ButtonEvent>,
    {
        let event = ButtonEvent::from(self.port.wait_changed(&mut Ignore).await?);
        listener.on_change(&event);
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use brassboard_hal::mock::MockInputPin;
    use embassy_futures::block_on;

    #[test]
    fn test_pull_up_press_and_release() {
        let level = Cell::new(true);
        let reads = Cell::new(0);
        let mut button = PushButton::new_pull_up(MockInputPin::new(&level, &reads));
        let mut presses = 0;
        let mut listener = |e: &ButtonEvent| {
            if *e == ButtonEvent::Pressed {
                presses += 1;
            }
        };

        assert!(!button.is_pressed().unwrap());
        assert_eq!(button.poll(&mut listener).unwrap(), None);

        level.set(false);
        assert_eq!(button.poll(&mut listener).unwrap(), Some(ButtonEvent::Pressed));
        level.set(true);
        assert_eq!(button.poll(&mut listener).unwrap(), Some(ButtonEvent::Released));
        drop(button);

        assert_eq!(presses, 1);
    }

    #[test]
    fn test_wait_for_press() {
        let level = Cell::new(false);
        let reads = Cell::new(0);
        let mut button = PushButton::new_pull_down(MockInputPin::new(&level, &reads));
        assert_eq!(button.poll(&mut Ignore).unwrap(), None);

        level.set(true);
        let event = block_on(button.wait(&mut Ignore)).unwrap();
        assert_eq!(event, ButtonEvent::Pressed);
    }

    #[test]
    fn test_from_config() {
        let level = Cell::new(false);
        let reads = Cell::new(0);
        let mut button =
            PushButton::from_config(MockInputPin::new(&level, &reads), &PinConfig::inverted(2));
        assert!(button.is_pressed().unwrap());
    }

    #[test]
    fn test_pull_up_config_matches_pull_up_wiring() {
        let level = Cell::new(true);
        let reads = Cell::new(0);
        let mut wired = PushButton::new_pull_up(MockInputPin::new(&level, &reads));
        let mut configured =
            PushButton::from_config(MockInputPin::new(&level, &reads), &PinConfig::with_pullup(3));

        assert!(!configured.is_pressed().unwrap());
        assert_eq!(configured.is_pressed().unwrap(), wired.is_pressed().unwrap());
        level.set(false);
        assert!(configured.is_pressed().unwrap());
    }

    #[test]
    fn test_configure_selects_pull() {
        let level = Cell::new(true);
        let reads = Cell::new(0);
        let mut button =
            PushButton::configure(MockInputPin::new(&level, &reads), &PinConfig::with_pullup(3))
                .unwrap();

        assert!(!button.is_pressed().unwrap());
        assert_eq!(button.release().release().pull(), Pull::Up);
    }
}

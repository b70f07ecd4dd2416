//! Digital input port

use brassboard_hal::gpio::{ConfigurePull, Edge, EdgeWait, InputPin};

use super::ActiveLevel;
use crate::config::PinConfig;
use crate::error::Error;
use crate::event::ChangeListener;

/// Input pin with change detection
///
/// [`value`](Self::value) always samples the pin. Change detection keeps
/// the last level it reported; the first sample only sets that baseline.
#[derive(Debug)]
pub struct DigitalInputPort<P, C = ()> {
    pin: P,
    last: Option<bool>,
    active: ActiveLevel,
    claim: C,
}

impl<P: InputPin> DigitalInputPort<P> {
    /// Active-high input
    pub fn new(pin: P) -> Self {
        Self::with_level(pin, ActiveLevel::High)
    }

    /// Input with the given active level
    pub fn with_level(pin: P, active: ActiveLevel) -> Self {
        Self {
            pin,
            last: None,
            active,
            claim: (),
        }
    }

    /// Input wired as described by `config`
    ///
    /// Only inversion is applied. Use [`configure`](Self::configure) to
    /// also select the pull resistor.
    pub fn from_config(pin: P, config: &PinConfig) -> Self {
        Self::with_level(pin, ActiveLevel::from_inverted(config.inverted))
    }
}

impl<P: ConfigurePull> DigitalInputPort<P> {
    /// Select the pull resistor from `config`, then apply its inversion
    pub fn configure(mut pin: P, config: &PinConfig) -> Result<Self, Error<P::Error>> {
        pin.set_pull(config.pull).map_err(Error::Pin)?;
        Ok(Self::from_config(pin, config))
    }
}

impl<P: InputPin, C> DigitalInputPort<P, C> {
    /// Attach proof of ownership
    pub fn with_claim<C2>(self, claim: C2) -> DigitalInputPort<P, C2> {
        DigitalInputPort {
            pin: self.pin,
            last: self.last,
            active: self.active,
            claim,
        }
    }

    /// Sample the pin
    pub fn value(&mut self) -> Result<bool, Error<P::Error>> {
        let high = self.pin.is_high().map_err(Error::Pin)?;
        Ok(self.active.apply(high))
    }

    /// Level last reported (or the baseline), if any
    pub fn last_value(&self) -> Option<bool> {
        self.last
    }

    /// Level that reads as `true`
    pub fn active_level(&self) -> ActiveLevel {
        self.active
    }

    /// Ownership token held by this port
    pub fn claim(&self) -> &C {
        &self.claim
    }

    /// Sample once and report a transition to `listener`
    ///
    /// Returns the new value when it differs from the last one seen.
    pub fn poll_changed<L>(&mut self, listener: &mut L) -> Result<Option<bool>, Error<P::Error>>
    where
        L: ChangeListener<bool>,
    {
        let value = self.value()?;
        match self.last.replace(value) {
            Some(previous) if previous != value => {
                listener.on_change(&value);
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }

    /// Give back the pin; the claim is dropped
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: EdgeWait, C> DigitalInputPort<P, C> {
    /// Wait for the next transition and report it to `listener`
    ///
    /// Edges after which the pin reads the level already reported are
    /// treated as glitches and skipped.
    pub async fn wait_changed<L>(&mut self, listener: &mut L) -> Result<bool, Error<P::Error>>
    where
        L: ChangeListener<bool>,
    {
        let mut last = match self.last {
            Some(level) => level,
            None => {
                let level = self.value()?;
                self.last = Some(level);
                level
            }
        };

        loop {
            self.pin.wait_for_edge(Edge::Any).await.map_err(Error::Pin)?;
            let value = self.value()?;
            if value != last {
                self.last = Some(value);
                listener.on_change(&value);
                return Ok(value);
            }
            trace!("edge without level change ignored");
            last = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::event::Ignore;
    use brassboard_hal::gpio::Pull;
    use brassboard_hal::mock::{MockError, MockInputPin};
    use embassy_futures::block_on;

    /// Pin that replays a fixed sequence of levels, one per read
    struct ScriptedPin<'a> {
        levels: &'a [bool],
        next: usize,
        edges: usize,
    }

    impl InputPin for ScriptedPin<'_> {
        type Error = MockError;

        fn is_high(&mut self) -> Result<bool, Self::Error> {
            let level = self.levels[self.next.min(self.levels.len() - 1)];
            self.next += 1;
            Ok(level)
        }
    }

    impl EdgeWait for ScriptedPin<'_> {
        async fn wait_for_edge(&mut self, _edge: Edge) -> Result<(), Self::Error> {
            self.edges += 1;
            Ok(())
        }
    }

    #[test]
    fn test_value_reads_every_call() {
        let level = Cell::new(true);
        let reads = Cell::new(0);
        let mut port = DigitalInputPort::new(MockInputPin::new(&level, &reads));

        assert!(port.value().unwrap());
        level.set(false);
        assert!(!port.value().unwrap());
        assert_eq!(reads.get(), 2);
    }

    #[test]
    fn test_poll_changed_reports_transitions() {
        let level = Cell::new(false);
        let reads = Cell::new(0);
        let mut port = DigitalInputPort::new(MockInputPin::new(&level, &reads));
        let mut events = 0;
        let mut listener = |_: &bool| events += 1;

        assert_eq!(port.poll_changed(&mut listener).unwrap(), None);
        assert_eq!(port.poll_changed(&mut listener).unwrap(), None);
        level.set(true);
        assert_eq!(port.poll_changed(&mut listener).unwrap(), Some(true));
        assert_eq!(port.poll_changed(&mut listener).unwrap(), None);

        assert_eq!(events, 1);
    }

    #[test]
    fn test_active_low_input() {
        let level = Cell::new(false);
        let reads = Cell::new(0);
        let mut port =
            DigitalInputPort::from_config(MockInputPin::new(&level, &reads), &PinConfig::inverted(2));
        assert!(port.value().unwrap());
    }

    #[test]
    fn test_configure_selects_pull() {
        let level = Cell::new(true);
        let reads = Cell::new(0);
        let mut port =
            DigitalInputPort::configure(MockInputPin::new(&level, &reads), &PinConfig::with_pullup(5))
                .unwrap();

        assert!(port.value().unwrap());
        assert_eq!(port.release().pull(), Pull::Up);
    }

    #[test]
    fn test_wait_changed() {
        let level = Cell::new(false);
        let reads = Cell::new(0);
        let mut port = DigitalInputPort::new(MockInputPin::new(&level, &reads));
        assert_eq!(port.poll_changed(&mut Ignore).unwrap(), None);

        level.set(true);
        let mut seen = None;
        let value = block_on(port.wait_changed(&mut |v: &bool| seen = Some(*v))).unwrap();

        assert!(value);
        assert_eq!(seen, Some(true));
        assert_eq!(port.last_value(), Some(true));
    }

    #[test]
    fn test_wait_changed_filters_glitches() {
        // baseline low, two glitch edges still low, then high
        let levels = [false, false, false, true];
        let mut port = DigitalInputPort::new(ScriptedPin {
            levels: &levels,
            next: 0,
            edges: 0,
        });

        let mut events = 0;
        let value = block_on(port.wait_changed(&mut |_: &bool| events += 1)).unwrap();

        assert!(value);
        assert_eq!(events, 1);
        assert_eq!(port.release().edges, 3);
    }
}

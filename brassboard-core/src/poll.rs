//! Periodic sensor polling
//!
//! A [`Poller`] owns one [`Sensor`] and one [`ChangeListener`]. Each
//! cycle checks the [`StopSignal`], runs one update, forwards the change
//! events and waits one period. Failed updates are handled according to
//! the [`FailurePolicy`] instead of ending the loop outright.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::PollConfig;
use crate::error::ArgumentError;
use crate::event::ChangeListener;
use crate::reading::ReadingChanged;
use crate::traits::Sensor;

/// Consecutive failures tolerated by the default policy
pub const DEFAULT_MAX_FAILURES: u8 = 3;

/// What a failed update does to the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FailurePolicy {
    /// End the loop with the error
    Stop,
    /// Keep polling; end after this many failures in a row
    Retry {
        /// Failures in a row that end the loop
        max_consecutive: u8,
    },
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Retry {
            max_consecutive: DEFAULT_MAX_FAILURES,
        }
    }
}

/// Why a polling loop returned normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollExit {
    /// The stop signal was raised
    Stopped,
}

/// Request to end a polling loop
///
/// Stays raised until [`reset`](Self::reset), so a loop that checks it
/// late still sees it.
pub struct StopSignal<M: RawMutex> {
    signal: Signal<M, ()>,
}

impl<M: RawMutex> StopSignal<M> {
    /// Signal with no stop requested
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Ask the loop to stop
    pub fn stop(&self) {
        self.signal.signal(());
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.signal.signaled()
    }

    /// Clear a previous request
    pub fn reset(&self) {
        self.signal.reset();
    }

    /// Resolve once a stop is requested
    async fn raised(&self) {
        self.signal.wait().await;
        // `wait` consumes the value; keep the request visible
        self.signal.signal(());
    }
}

impl<M: RawMutex> Default for StopSignal<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives one sensor periodically
pub struct Poller<S, L> {
    sensor: S,
    listener: L,
    period_ms: u32,
    policy: FailurePolicy,
    failures: u8,
}

impl<S, L> Poller<S, L>
where
    S: Sensor,
    L: ChangeListener<ReadingChanged>,
{
    /// Poll `sensor` as configured, reporting to `listener`
    pub fn new(sensor: S, listener: L, config: &PollConfig) -> Result<Self, ArgumentError> {
        config.validate()?;
        Ok(Self {
            sensor,
            listener,
            period_ms: config.period_ms,
            policy: config.on_failure,
            failures: 0,
        })
    }

    /// The polled sensor
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// The polled sensor, e.g. to change its thresholds between runs
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Where change events go
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Failed updates since the last success
    pub fn consecutive_failures(&self) -> u8 {
        self.failures
    }

    /// Take the sensor and listener back
    pub fn into_parts(self) -> (S, L) {
        (self.sensor, self.listener)
    }

    /// Run a single update and forward its changes
    ///
    /// Returns the number of change events raised. Ignores the failure
    /// policy.
    pub fn poll_once(&mut self) -> Result<usize, S::Error> {
        let changes = self.sensor.update()?;
        for change in &changes {
            self.listener.on_change(change);
        }
        Ok(changes.len())
    }

    /// Poll until stopped, blocking on `delay` between updates
    pub fn run<D, M>(&mut self, delay: &mut D, stop: &StopSignal<M>) -> Result<PollExit, S::Error>
    where
        D: embedded_hal::delay::DelayNs,
        M: RawMutex,
    {
        loop {
            if stop.is_stopped() {
                debug!("polling stopped");
                return Ok(PollExit::Stopped);
            }
            self.supervised_poll()?;
            delay.delay_ms(self.period_ms);
        }
    }

    /// Poll until stopped; a stop during the wait ends it immediately
    pub async fn run_async<D, M>(
        &mut self,
        delay: &mut D,
        stop: &StopSignal<M>,
    ) -> Result<PollExit, S::Error>
    where
        D: embedded_hal_async::delay::DelayNs,
        M: RawMutex,
    {
        loop {
            if stop.is_stopped() {
                debug!("polling stopped");
                return Ok(PollExit::Stopped);
            }
            self.supervised_poll()?;
            if let Either::Second(()) = select(delay.delay_ms(self.period_ms), stop.raised()).await {
                debug!("polling stopped during wait");
                return Ok(PollExit::Stopped);
            }
        }
    }

    fn supervised_poll(&mut self) -> Result<(), S::Error> {
        match self.poll_once() {
            Ok(_) => {
                self.failures = 0;
                Ok(())
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                match self.policy {
                    FailurePolicy::Retry { max_consecutive } if self.failures < max_consecutive => {
                        warn!(
                            "update failed ({} of {} in a row), continuing",
                            self.failures, max_consecutive
                        );
                        Ok(())
                    }
                    _ => {
                        error!("update failed {} time(s), polling ended", self.failures);
                        Err(e)
                    }
                }
            }
        }
    }
}

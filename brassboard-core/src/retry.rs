//! Bounded retry for bus transactions
//!
//! Each attempt either moves exactly the expected number of bytes or is
//! counted as a failure. Attempts are immediate unless a [`Backoff`] is
//! configured, in which case the device's delay provider waits between
//! them.

use embedded_hal::delay::DelayNs;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ArgumentError, TransferError, TransferFault};

/// Default number of attempts per transaction
pub const DEFAULT_ATTEMPTS: u8 = 3;

/// Wait between failed attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Backoff {
    /// Retry immediately
    #[default]
    None,
    /// Same wait after every failure (µs)
    Fixed(u32),
    /// Wait grows by this step after each failure (µs)
    Linear(u32),
}

impl Backoff {
    /// Wait before attempt number `attempt` (1-based; attempt 1 never waits)
    pub fn wait_us(&self, attempt: u8) -> u32 {
        let failures = attempt.saturating_sub(1) as u32;
        if failures == 0 {
            return 0;
        }
        match *self {
            Backoff::None => 0,
            Backoff::Fixed(us) => us,
            Backoff::Linear(step) => step.saturating_mul(failures),
        }
    }
}

/// Attempt bound and backoff for one bus device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RetryPolicy {
    /// Total attempts per transaction, including the first
    pub max_attempts: u8,
    /// Wait between attempts
    #[cfg_attr(feature = "serde", serde(default))]
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_ATTEMPTS,
            backoff: Backoff::None,
        }
    }
}

impl RetryPolicy {
    /// Immediate retries up to `max_attempts`
    pub const fn attempts(max_attempts: u8) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::None,
        }
    }

    /// Single attempt, no retry
    pub const NONE: Self = Self::attempts(1);

    /// Same policy with a backoff
    pub const fn with_backoff(self, backoff: Backoff) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff,
        }
    }

    /// Reject a bound of zero attempts
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if self.max_attempts == 0 {
            return Err(ArgumentError::ZeroRetries);
        }
        Ok(())
    }

    /// Run `op` until it moves `expected` bytes or the bound is reached
    ///
    /// `op` returns the transport's byte count. On success the count has
    /// matched; on failure nothing the attempts produced should be used.
    pub fn run<E, D, F>(
        &self,
        delay: &mut D,
        expected: usize,
        mut op: F,
    ) -> Result<(), TransferError<E>>
    where
        D: DelayNs,
        F: FnMut() -> Result<usize, E>,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 0u8;

        loop {
            attempt += 1;

            let wait = self.backoff.wait_us(attempt);
            if wait > 0 {
                delay.delay_us(wait);
            }

            let fault = match op() {
                Ok(actual) if actual == expected => {
                    if attempt > 1 {
                        debug!("transfer recovered on attempt {}", attempt);
                    }
                    return Ok(());
                }
                Ok(actual) => TransferFault::Short { expected, actual },
                Err(e) => TransferFault::Bus(e),
            };

            if attempt >= max {
                error!("transfer failed after {} attempts", attempt);
                return Err(TransferError {
                    attempts: attempt,
                    last: fault,
                });
            }
            warn!("transfer attempt {} of {} failed", attempt, max);
        }
    }
}

/// Delay provider that returns immediately
///
/// Default for bus devices; only consulted when a [`Backoff`] is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Delay that records the total requested wait
    #[derive(Default)]
    struct RecordingDelay {
        total_ns: u64,
        calls: usize,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
            self.calls += 1;
        }
    }

    #[test]
    fn test_succeeds_after_k_failures() {
        let policy = RetryPolicy::attempts(3);
        let mut failures_left = 2;
        let mut calls = 0;

        let result: Result<(), TransferError<()>> = policy.run(&mut NoDelay, 4, || {
            calls += 1;
            if failures_left > 0 {
                failures_left -= 1;
                Err(())
            } else {
                Ok(4)
            }
        });

        assert_eq!(result, Ok(()));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_gives_up_at_bound() {
        let policy = RetryPolicy::attempts(3);
        let mut calls = 0;

        let result = policy.run(&mut NoDelay, 2, || {
            calls += 1;
            Err::<usize, _>("nack")
        });

        assert_eq!(
            result,
            Err(TransferError {
                attempts: 3,
                last: TransferFault::Bus("nack"),
            })
        );
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_short_count_is_failure() {
        let policy = RetryPolicy::attempts(2);
        let result: Result<(), TransferError<()>> = policy.run(&mut NoDelay, 3, || Ok(2));

        assert_eq!(
            result,
            Err(TransferError {
                attempts: 2,
                last: TransferFault::Short {
                    expected: 3,
                    actual: 2
                },
            })
        );
    }

    #[test]
    fn test_single_attempt_policy() {
        let mut calls = 0;
        let result: Result<(), TransferError<()>> = RetryPolicy::NONE.run(&mut NoDelay, 1, || {
            calls += 1;
            Err(())
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_backoff_waits_between_attempts_only() {
        let policy = RetryPolicy::attempts(3).with_backoff(Backoff::Linear(100));
        let mut delay = RecordingDelay::default();

        let _: Result<(), TransferError<()>> = policy.run(&mut delay, 1, || Err(()));

        // Waits of 100us and 200us before attempts 2 and 3
        assert_eq!(delay.total_ns, 300_000);
        assert_eq!(delay.calls, 2);
    }

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(Backoff::None.wait_us(3), 0);
        assert_eq!(Backoff::Fixed(50).wait_us(1), 0);
        assert_eq!(Backoff::Fixed(50).wait_us(4), 50);
        assert_eq!(Backoff::Linear(10).wait_us(4), 30);
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            RetryPolicy::attempts(0).validate(),
            Err(ArgumentError::ZeroRetries)
        );
        assert!(RetryPolicy::default().validate().is_ok());
    }
}

//! Addressed I2C device with retry

use brassboard_hal::i2c::{is_valid_address, I2cBus, I2cConfig};
use embedded_hal::delay::DelayNs;
use heapless::Vec;

use super::CommunicationBus;
use crate::config::I2cDeviceConfig;
use crate::error::{ArgumentError, Error};
use crate::retry::{NoDelay, RetryPolicy};

/// First address [`scan`] probes (0x00-0x07 are reserved)
pub const SCAN_FIRST: u8 = 0x08;

/// Last address [`scan`] probes (0x78-0x7F are reserved)
pub const SCAN_LAST: u8 = 0x77;

/// One device at a fixed 7-bit address on an I2C transport
///
/// The transport `B` is either owned outright or a
/// [`BusHandle`](super::BusHandle) onto a shared physical bus. `D` is
/// only used to wait between retries when the policy has a backoff.
#[derive(Debug)]
pub struct I2cDevice<B, D = NoDelay> {
    bus: B,
    address: u8,
    config: I2cConfig,
    retry: RetryPolicy,
    delay: D,
}

impl<B: I2cBus> I2cDevice<B, NoDelay> {
    /// Create a device with the default retry policy
    ///
    /// Fails if `address` is not 7-bit or the frequency is zero.
    pub fn new(bus: B, address: u8, config: I2cConfig) -> Result<Self, ArgumentError> {
        Self::from_config(
            bus,
            &I2cDeviceConfig {
                address,
                bus: config,
                retry: RetryPolicy::default(),
            },
        )
    }

    /// Create a device from a validated configuration
    pub fn from_config(bus: B, config: &I2cDeviceConfig) -> Result<Self, ArgumentError> {
        config.validate()?;
        Ok(Self {
            bus,
            address: config.address,
            config: config.bus,
            retry: config.retry,
            delay: NoDelay,
        })
    }
}

impl<B: I2cBus, D: DelayNs> I2cDevice<B, D> {
    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Result<Self, ArgumentError> {
        retry.validate()?;
        self.retry = retry;
        Ok(self)
    }

    /// Use `delay` for retry backoff
    pub fn with_delay<D2: DelayNs>(self, delay: D2) -> I2cDevice<B, D2> {
        I2cDevice {
            bus: self.bus,
            address: self.address,
            config: self.config,
            retry: self.retry,
            delay,
        }
    }

    /// 7-bit device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Bus clock configuration
    pub fn config(&self) -> I2cConfig {
        self.config
    }

    /// Active retry policy
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Check that something acknowledges the address
    ///
    /// Single attempt, one-byte read; errors count as absent.
    pub fn probe(&mut self) -> bool {
        probe_address(&mut self.bus, self.address)
    }

    /// Give back the transport
    pub fn release(self) -> B {
        self.bus
    }
}

fn probe_address<B: I2cBus>(bus: &mut B, address: u8) -> bool {
    let mut buf = [0u8; 1];
    matches!(bus.read(address, &mut buf), Ok(1))
}

impl<B: I2cBus, D: DelayNs> CommunicationBus for I2cDevice<B, D> {
    type Error = B::Error;

    fn write_bytes(&mut self, values: &[u8]) -> Result<(), Error<Self::Error>> {
        if values.is_empty() {
            return Err(ArgumentError::EmptyBuffer.into());
        }
        let Self {
            bus,
            address,
            retry,
            delay,
            ..
        } = self;
        retry.run(delay, values.len(), || bus.write(*address, values))?;
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), Error<Self::Error>> {
        if buf.is_empty() {
            return Err(ArgumentError::EmptyBuffer.into());
        }
        let Self {
            bus,
            address,
            retry,
            delay,
            ..
        } = self;
        let expected = buf.len();
        retry
            .run(delay, expected, || bus.read(*address, buf))
            .map_err(|e| {
                buf.fill(0);
                e
            })?;
        Ok(())
    }

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Error<Self::Error>> {
        if write.is_empty() || read.is_empty() {
            return Err(ArgumentError::EmptyBuffer.into());
        }
        let Self {
            bus,
            address,
            retry,
            delay,
            ..
        } = self;
        let expected = write.len() + read.len();
        retry
            .run(delay, expected, || bus.write_read(*address, write, read))
            .map_err(|e| {
                read.fill(0);
                e
            })?;
        Ok(())
    }
}

/// List the addresses in `0x08..=0x77` that acknowledge a one-byte read
pub fn scan<B: I2cBus>(bus: &mut B) -> Vec<u8, 128> {
    let mut found = Vec::new();
    for address in SCAN_FIRST..=SCAN_LAST {
        if probe_address(bus, address) {
            debug!("device found at {}", address);
            let _ = found.push(address);
        }
    }
    found
}

/// Reject addresses outside the 7-bit range
pub(crate) fn validate_address(address: u8) -> Result<(), ArgumentError> {
    if !is_valid_address(address) {
        return Err(ArgumentError::AddressOutOfRange(address));
    }
    Ok(())
}

//! One mutex-guarded transport per physical bus
//!
//! Several drivers on the same wires each hold a [`BusHandle`]. The lock
//! is taken for exactly one transport call (one retry attempt) and
//! released before the call returns, so transactions from different
//! drivers never interleave but a slow retry loop does not starve the
//! others.
//!
//! With `CriticalSectionRawMutex` the bus may live in a `static` and be
//! used from several tasks or threads; `NoopRawMutex` suits a single
//! executor.

use core::cell::RefCell;

use brassboard_hal::i2c::I2cBus;
use brassboard_hal::spi::SpiBus;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Transport shared between drivers
pub struct SharedBus<M: RawMutex, B> {
    inner: Mutex<M, RefCell<B>>,
}

impl<M: RawMutex, B> SharedBus<M, B> {
    /// Wrap a transport
    pub const fn new(bus: B) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(bus)),
        }
    }

    /// Handle for one driver
    pub fn handle(&self) -> BusHandle<'_, M, B> {
        BusHandle { shared: self }
    }

    /// Run `f` with exclusive access to the transport
    pub fn with<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Take the transport back
    pub fn into_inner(self) -> B {
        self.inner.into_inner().into_inner()
    }
}

/// A driver's view of a [`SharedBus`]
///
/// Implements the transport traits itself, so it can be passed to
/// [`I2cDevice`](super::I2cDevice) or [`SpiDevice`](super::SpiDevice)
/// in place of an owned transport.
pub struct BusHandle<'a, M: RawMutex, B> {
    shared: &'a SharedBus<M, B>,
}

impl<M: RawMutex, B> Clone for BusHandle<'_, M, B> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared,
        }
    }
}

impl<M: RawMutex, B: I2cBus> I2cBus for BusHandle<'_, M, B> {
    type Error = B::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize, Self::Error> {
        self.shared.with(|bus| bus.write(address, data))
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.shared.with(|bus| bus.read(address, buf))
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<usize, Self::Error> {
        self.shared
            .with(|bus| bus.write_read(address, write_data, read_buf))
    }
}

impl<M: RawMutex, B: SpiBus> SpiBus for BusHandle<'_, M, B> {
    type Error = B::Error;

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<usize, Self::Error> {
        self.shared.with(|bus| bus.transfer(read, write))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.shared.with(|bus| bus.write(data))
    }

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<usize, Self::Error> {
        self.shared.with(|bus| bus.write_read(write, read))
    }
}

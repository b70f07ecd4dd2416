//! Change listeners
//!
//! Ports and pollers hand every change to a [`ChangeListener`]. Closures
//! implement it directly; [`ChannelPublisher`] forwards events into an
//! `embassy-sync` channel for another task to consume.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Sender, TrySendError};

/// Receiver of change events of type `T`
pub trait ChangeListener<T> {
    /// Called once per change, in the order changes were detected
    fn on_change(&mut self, event: &T);
}

impl<T, F: FnMut(&T)> ChangeListener<T> for F {
    fn on_change(&mut self, event: &T) {
        self(event)
    }
}

/// Listener that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct Ignore;

impl<T> ChangeListener<T> for Ignore {
    fn on_change(&mut self, _event: &T) {}
}

/// Forwards events into a bounded channel
///
/// Never blocks: when the channel is full the event is dropped, counted
/// and logged.
pub struct ChannelPublisher<'ch, M: RawMutex, T, const N: usize> {
    sender: Sender<'ch, M, T, N>,
    dropped: u32,
}

impl<'ch, M: RawMutex, T, const N: usize> ChannelPublisher<'ch, M, T, N> {
    /// Publish into the channel behind `sender`
    pub fn new(sender: Sender<'ch, M, T, N>) -> Self {
        Self { sender, dropped: 0 }
    }

    /// Events lost to a full channel
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<M: RawMutex, T: Clone, const N: usize> ChangeListener<T> for ChannelPublisher<'_, M, T, N> {
    fn on_change(&mut self, event: &T) {
        if let Err(TrySendError::Full(_)) = self.sender.try_send(event.clone()) {
            self.dropped = self.dropped.saturating_add(1);
            warn!("change event dropped, channel full ({} total)", self.dropped);
        }
    }
}

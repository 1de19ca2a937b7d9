use std::path::PathBuf;

use hikari_handle::AssetId;

use crate::LoadError;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadEvent {
    pub id: AssetId,
    pub path: PathBuf,
    pub type_name: &'static str,
    pub error: Option<LoadError>,
}

impl LoadEvent {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetEvent {
    Loaded(LoadEvent),
    /// An asset that already had a loaded value finished loading again
    Reloaded(LoadEvent),
    /// Nothing is pending or loading anymore. Counts cover every attempt
    /// that settled since the previous `Settled` event.
    Settled { loaded: usize, failed: usize },
}

/// Receives asset lifecycle notifications. Publishing must not block.
pub trait EventBus: Send + Sync + 'static {
    fn publish(&self, event: AssetEvent);
}

impl<F> EventBus for F
where
    F: Fn(AssetEvent) + Send + Sync + 'static,
{
    fn publish(&self, event: AssetEvent) {
        (self)(event)
    }
}

pub struct ChannelEventBus {
    sender: flume::Sender<AssetEvent>,
}

impl ChannelEventBus {
    pub fn new() -> (Self, flume::Receiver<AssetEvent>) {
        let (sender, receiver) = flume::unbounded();
        (Self { sender }, receiver)
    }
}

impl EventBus for ChannelEventBus {
    fn publish(&self, event: AssetEvent) {
        if self.sender.send(event).is_err() {
            log::trace!("Asset event dropped, no receiver left");
        }
    }
}

pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn publish(&self, _event: AssetEvent) {}
}

/// Message sent by a load task once its result is installed in the record store
#[derive(Debug, Clone)]
pub(crate) struct Completion {
    pub event: LoadEvent,
    pub reload: bool,
}

impl Completion {
    pub fn into_event(self) -> AssetEvent {
        if self.reload {
            AssetEvent::Reloaded(self.event)
        } else {
            AssetEvent::Loaded(self.event)
        }
    }
}

/// Decides when the `Settled` notification fires: once per transition
/// from at least one in-flight asset to none.
#[derive(Default)]
pub(crate) struct SettleTracker {
    busy: bool,
    loaded: usize,
    failed: usize,
}

impl SettleTracker {
    pub fn record(&mut self, completion: &Completion) {
        self.busy = true;
        if completion.event.succeeded() {
            self.loaded += 1;
        } else {
            self.failed += 1;
        }
    }
    pub fn finish_tick(&mut self, pending: usize) -> Option<AssetEvent> {
        if pending > 0 {
            self.busy = true;
            return None;
        }
        if !self.busy {
            return None;
        }

        let event = AssetEvent::Settled {
            loaded: self.loaded,
            failed: self.failed,
        };
        *self = Self::default();

        Some(event)
    }
}

//! services/api/src/web/events.rs
//!
//! Owner-keyed publish/subscribe for library changes.
//!
//! Each user gets their own broadcast channel, created on first subscribe.
//! Publishing to a user with no live subscribers is a no-op and drops the
//! idle channel; so does `release` once the last subscriber has gone.

use crate::web::protocol::LibraryEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct EventHub {
    channels: Arc<Mutex<HashMap<Uuid, broadcast::Sender<LibraryEvent>>>>,
    capacity: usize,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// `capacity` is how many events a slow subscriber may fall behind before it lags.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<Uuid, broadcast::Sender<LibraryEvent>>> {
        // The map holds no invariants a panicking holder could break.
        self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Subscribes to every future event of `owner`.
    pub fn subscribe(&self, owner: Uuid) -> broadcast::Receiver<LibraryEvent> {
        let mut channels = self.channels();
        match channels.get(&owner) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(self.capacity);
                channels.insert(owner, sender);
                receiver
            }
        }
    }

    /// Sends `event` to the owner's subscribers. Returns how many received it.
    pub fn publish(&self, owner: Uuid, event: LibraryEvent) -> usize {
        let mut channels = self.channels();
        let Some(sender) = channels.get(&owner) else {
            return 0;
        };
        match sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(%owner, "No live subscribers, dropping event channel");
                channels.remove(&owner);
                0
            }
        }
    }

    /// Drops the owner's channel if nobody is subscribed to it any more.
    pub fn release(&self, owner: Uuid) {
        let mut channels = self.channels();
        if channels
            .get(&owner)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            debug!(%owner, "Last subscriber left, dropping event channel");
            channels.remove(&owner);
        }
    }

    /// Number of owners with an open channel.
    pub fn channel_count(&self) -> usize {
        self.channels().len()
    }
}

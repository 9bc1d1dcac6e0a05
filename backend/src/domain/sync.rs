//! Synchronization fan-out.
//!
//! Services publish a [`Change`] on a guild-scoped topic after every
//! successful mutation; connected reader sessions subscribe to the topics
//! they render and re-derive a fresh per-reader snapshot on each signal.
//! Delivery is at-least-once of the *current* state: a lagged subscriber
//! simply rebuilds its snapshot, so missed intermediate signals are
//! harmless, and re-receiving an unchanged snapshot must be tolerated by
//! clients.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use super::ids::{BookId, GuildId};

/// Broadcast channel depth per topic. Snapshot semantics make lag benign,
/// so the buffer only needs to absorb short bursts.
const TOPIC_CAPACITY: usize = 16;

/// A guild-scoped change topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Membership changed: roster, counts, or the guild record itself.
    Roster(GuildId),
    /// A reader's progress for a book changed.
    Progress(GuildId, BookId),
    /// A note for a book was posted or deleted.
    Notes(GuildId, BookId),
}

/// Change signal carried on a topic. Deliberately content-free: subscribers
/// re-derive state through the query ports so spoiler gating is applied per
/// reader at push time, never baked into a shared payload.
#[derive(Debug, Clone)]
pub struct Change {
    /// The topic the change occurred on.
    pub topic: Topic,
}

/// In-process publish/subscribe hub keyed by [`Topic`].
#[derive(Clone, Default)]
pub struct SyncHub {
    topics: Arc<Mutex<HashMap<Topic, broadcast::Sender<Change>>>>,
}

impl SyncHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a topic, creating its channel on first use.
    #[must_use]
    pub fn subscribe(&self, topic: &Topic) -> broadcast::Receiver<Change> {
        let mut topics = self.lock();
        topics
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Publish a change, returning the number of subscribers reached.
    ///
    /// Publishing to a topic nobody watches is a no-op; the channel is
    /// dropped once its last subscriber disconnects.
    pub fn publish(&self, topic: Topic) -> usize {
        let mut topics = self.lock();
        let Some(sender) = topics.get(&topic) else {
            return 0;
        };
        match sender.send(Change {
            topic: topic.clone(),
        }) {
            Ok(reached) => reached,
            Err(_) => {
                topics.remove(&topic);
                0
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Topic, broadcast::Sender<Change>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

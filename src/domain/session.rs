//! Sensor Session Store
//!
//! Holds the latest reading for every configured sensor. The key set is
//! fixed at construction; each slot has its own lock so two sensors never
//! serialize on each other. Change notification goes through an atomic
//! revision counter, so it adds no shared lock to the write path.

use crate::domain::error::PipelineError;
use crate::domain::models::{OrientationReading, SensorIdentity};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Notify;
use tracing::trace;

/// Immutable copy of the session state, in configured sensor order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub entries: Vec<(SensorIdentity, OrientationReading)>,
}

impl SessionSnapshot {
    pub fn get(&self, identity: &SensorIdentity) -> Option<&OrientationReading> {
        self.entries
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, reading)| reading)
    }
}

#[derive(Default)]
struct Revision {
    counter: AtomicU64,
    changed: Notify,
}

/// Tracks which store revision a reader has already seen.
pub struct RevisionReceiver {
    revision: Arc<Revision>,
    seen: u64,
}

impl RevisionReceiver {
    /// Latest revision, without marking it seen.
    pub fn current(&self) -> u64 {
        self.revision.counter.load(Ordering::Acquire)
    }

    pub fn has_changed(&self) -> bool {
        self.current() != self.seen
    }

    /// Mark the latest revision as seen and return it.
    pub fn mark_seen(&mut self) -> u64 {
        self.seen = self.current();
        self.seen
    }

    /// Wait for a revision newer than the last one seen.
    pub async fn changed(&mut self) -> u64 {
        let revision = self.revision.clone();
        loop {
            // Register before checking so a bump in between is not lost.
            let notified = revision.changed.notified();
            if self.has_changed() {
                return self.mark_seen();
            }
            notified.await;
        }
    }
}

pub struct SessionStore {
    order: Vec<SensorIdentity>,
    slots: HashMap<SensorIdentity, RwLock<OrientationReading>>,
    revision: Arc<Revision>,
}

impl SessionStore {
    /// Create a store with zeroed readings for `identities`.
    ///
    /// Duplicates are collapsed; the first occurrence fixes the order.
    pub fn new(identities: impl IntoIterator<Item = SensorIdentity>) -> Self {
        let mut order = Vec::new();
        let mut slots = HashMap::new();
        for identity in identities {
            if slots.contains_key(&identity) {
                continue;
            }
            slots.insert(identity.clone(), RwLock::new(OrientationReading::default()));
            order.push(identity);
        }

        Self {
            order,
            slots,
            revision: Arc::new(Revision::default()),
        }
    }

    pub fn is_tracked(&self, identity: &SensorIdentity) -> bool {
        self.slots.contains_key(identity)
    }

    /// Replace the stored reading for `identity`.
    pub fn record_reading(
        &self,
        identity: &SensorIdentity,
        reading: OrientationReading,
    ) -> Result<(), PipelineError> {
        let slot = self
            .slots
            .get(identity)
            .ok_or_else(|| PipelineError::UnknownIdentity(identity.clone()))?;

        // A poisoned slot still holds a whole reading, and we overwrite it anyway.
        *slot.write().unwrap_or_else(|e| e.into_inner()) = reading;

        self.revision.counter.fetch_add(1, Ordering::Release);
        self.revision.changed.notify_waiters();
        trace!(sensor = %identity, ?reading, "Reading recorded");
        Ok(())
    }

    pub fn reading(&self, identity: &SensorIdentity) -> Option<OrientationReading> {
        self.slots
            .get(identity)
            .map(|slot| *slot.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn current_state(&self) -> SessionSnapshot {
        let entries = self
            .order
            .iter()
            .filter_map(|id| self.reading(id).map(|reading| (id.clone(), reading)))
            .collect();
        SessionSnapshot { entries }
    }

    /// Receiver that reports every reading recorded after this call.
    pub fn subscribe(&self) -> RevisionReceiver {
        let seen = self.revision.counter.load(Ordering::Acquire);
        RevisionReceiver {
            revision: self.revision.clone(),
            seen,
        }
    }
}

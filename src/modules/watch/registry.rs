//! Active poll session registry
//!
//! Guarantees at most one active session per (owner, entity): starting a new
//! session for a pair cancels and replaces whatever was running there.

use dashmap::DashMap;
use uuid::Uuid;

use crate::log_debug;

use super::session::{PollConfig, PollSession};
use super::watcher::{spawn_status_poll, PollEvents, StatusFetch};

#[derive(Default)]
pub struct PollRegistry {
    sessions: DashMap<(String, Uuid), PollSession>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Start polling `entity_id` on behalf of `owner`, cancelling any prior
    /// session for the same pair.
    pub fn start(
        &self,
        owner: &str,
        entity_id: Uuid,
        config: PollConfig,
        fetch: StatusFetch,
        events: PollEvents,
    ) -> PollSession {
        let key = (owner.to_string(), entity_id);
        if let Some((_, previous)) = self.sessions.remove(&key) {
            previous.cancel();
            log_debug!(
                "Replaced active poll session for owner '{}', entity {}",
                owner,
                entity_id
            );
        }

        let session = spawn_status_poll(entity_id, config, fetch, events);
        if let Some(raced) = self.sessions.insert(key, session.clone()) {
            raced.cancel();
        }

        session
    }

    /// Cancel the session for (owner, entity), if any.
    pub fn cancel(&self, owner: &str, entity_id: Uuid) -> bool {
        match self.sessions.remove(&(owner.to_string(), entity_id)) {
            Some((_, session)) => {
                session.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every session (e.g. when the owning context is discarded).
    pub fn cancel_all(&self) {
        for entry in self.sessions.iter() {
            entry.value().cancel();
        }
        self.sessions.clear();
    }

    /// Number of sessions that are still running.
    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.value().is_active())
            .count()
    }

    /// Drop bookkeeping for sessions that terminated on their own.
    pub fn purge_finished(&self) {
        self.sessions.retain(|_, session| session.is_active());
    }
}

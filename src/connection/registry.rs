//! Session registry
//!
//! Concurrency-safe store of live sessions keyed by their identifier. It is
//! owned by the service (constructed at startup, shared by `Arc`, torn down at
//! shutdown) rather than being a hidden global.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};

use super::session::Session;
use crate::rest::OutboundClient;

/// In-memory registry of active sessions
#[derive(Default)]
pub struct SessionRegistry {
    /// Active sessions by session ID
    sessions: DashMap<String, Arc<Session>>,

    created: AtomicU64,
    removed: AtomicU64,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new session with a fresh identifier and register it.
    ///
    /// Identifiers are random v4 UUIDs. An existing entry is never
    /// overwritten; on the (astronomically unlikely) collision a new
    /// identifier is drawn.
    pub fn create(
        &self,
        domain_url: &str,
        domain_name: &str,
        domain_version: &str,
        username: &str,
        client: Arc<OutboundClient>,
    ) -> Arc<Session> {
        loop {
            let id = uuid::Uuid::new_v4().to_string();

            if let Entry::Vacant(slot) = self.sessions.entry(id.clone()) {
                let session = Arc::new(Session::new(
                    id,
                    domain_url.to_string(),
                    domain_name.to_string(),
                    domain_version.to_string(),
                    username.to_string(),
                    client,
                ));
                slot.insert(Arc::clone(&session));
                self.created.fetch_add(1, Ordering::Relaxed);

                debug!(connection_id = %session.id(), domain_url = %domain_url, "Registered session");
                return session;
            }
        }
    }

    /// Get a session by ID. Blank IDs are always absent.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        if id.trim().is_empty() {
            return None;
        }
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Check whether a session ID is live
    pub fn contains(&self, id: &str) -> bool {
        !id.trim().is_empty() && self.sessions.contains_key(id)
    }

    /// Remove a session, closing its client and releasing its artifacts.
    ///
    /// Idempotent: unknown, blank or already removed IDs are ignored. Returns
    /// whether this call removed a session.
    pub fn remove(&self, id: &str) -> bool {
        if id.trim().is_empty() {
            return false;
        }

        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.release();
                self.removed.fetch_add(1, Ordering::Relaxed);
                info!(
                    connection_id = %id,
                    domain_url = %session.domain_url(),
                    "Removed session"
                );
                true
            }
            None => false,
        }
    }

    /// Remove every session (process shutdown)
    pub fn shutdown(&self) -> usize {
        let ids: Vec<String> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        let count = ids.iter().filter(|id| self.remove(id)).count();

        if count > 0 {
            info!("Tore down {} sessions at shutdown", count);
        }
        count
    }

    /// IDs of all live sessions
    pub fn ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Get statistics about the registry
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            active_sessions: self.sessions.len(),
            created_total: self.created.load(Ordering::Relaxed),
            removed_total: self.removed.load(Ordering::Relaxed),
        }
    }
}

/// Session registry statistics
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub active_sessions: usize,
    pub created_total: u64,
    pub removed_total: u64,
}

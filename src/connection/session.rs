//! Authenticated sessions against a remote management endpoint
//!
//! A session is created only by a successful handshake. Its identity fields
//! never change afterwards, so readers need no synchronization. The only
//! mutable part is the artifact cache, which lets downstream components attach
//! per-connection state and be told when the connection goes away.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::rest::OutboundClient;

/// State cached on a session that must be released when the session ends
pub trait ConnectionArtifact: Send + Sync {
    /// Called once when the owning session is removed, before the artifact
    /// is dropped from the session's cache. The session is still readable.
    fn connection_removed(&self, session: &Session);
}

/// One authenticated relationship to a remote management endpoint
pub struct Session {
    id: String,
    domain_url: String,
    domain_name: String,
    domain_version: String,
    username: String,
    client: Arc<OutboundClient>,
    connected_at: DateTime<Utc>,
    artifacts: DashMap<String, Arc<dyn ConnectionArtifact>>,
}

impl Session {
    pub(crate) fn new(
        id: String,
        domain_url: String,
        domain_name: String,
        domain_version: String,
        username: String,
        client: Arc<OutboundClient>,
    ) -> Self {
        Self {
            id,
            domain_url,
            domain_name,
            domain_version,
            username,
            client,
            connected_at: Utc::now(),
            artifacts: DashMap::new(),
        }
    }

    /// Opaque, unguessable session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn domain_url(&self) -> &str {
        &self.domain_url
    }

    /// Remote product (domain) name
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// Remote product (domain) version
    pub fn domain_version(&self) -> &str {
        &self.domain_version
    }

    /// Principal name, or [`UNKNOWN_USERNAME`](crate::auth::UNKNOWN_USERNAME)
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The session's outbound client
    pub fn client(&self) -> &Arc<OutboundClient> {
        &self.client
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Cache an artifact under `key`, returning the one it replaced
    pub fn cache_artifact(
        &self,
        key: impl Into<String>,
        artifact: Arc<dyn ConnectionArtifact>,
    ) -> Option<Arc<dyn ConnectionArtifact>> {
        self.artifacts.insert(key.into(), artifact)
    }

    pub fn artifact(&self, key: &str) -> Option<Arc<dyn ConnectionArtifact>> {
        self.artifacts.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    /// Serializable summary of the session
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            connection_id: self.id.clone(),
            domain_url: self.domain_url.clone(),
            domain_name: self.domain_name.clone(),
            domain_version: self.domain_version.clone(),
            username: self.username.clone(),
            connected_at: self.connected_at,
        }
    }

    /// Tear down: close the client, then notify every cached artifact, then
    /// clear the cache. Artifacts may still read the session while notified.
    ///
    /// Artifacts cached during notification are notified in a further pass,
    /// so every artifact that was ever cached hears about the removal once.
    pub(crate) fn release(&self) {
        if self.client.close() {
            debug!(connection_id = %self.id, "Closed session client");
        }

        let mut released = 0;
        loop {
            // Snapshot first so artifacts can use the cache during notification
            let cached: Vec<(String, Arc<dyn ConnectionArtifact>)> = self
                .artifacts
                .iter()
                .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
                .collect();

            if cached.is_empty() {
                break;
            }

            for (_, artifact) in &cached {
                artifact.connection_removed(self);
            }

            // Keep anything swapped in under the same key for the next pass
            for (key, artifact) in &cached {
                self.artifacts
                    .remove_if(key, |_, current| Arc::ptr_eq(current, artifact));
            }
            released += cached.len();
        }

        if released > 0 {
            debug!(connection_id = %self.id, count = released, "Released session artifacts");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("domain_url", &self.domain_url)
            .field("domain_name", &self.domain_name)
            .field("domain_version", &self.domain_version)
            .field("username", &self.username)
            .field("connected_at", &self.connected_at)
            .field("artifacts", &self.artifacts.len())
            .finish()
    }
}

/// Summary of a session suitable for returning to the console frontend
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub connection_id: String,
    pub domain_url: String,
    pub domain_name: String,
    pub domain_version: String,
    pub username: String,
    pub connected_at: DateTime<Utc>,
}

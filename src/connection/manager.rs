//! Connection establishment
//!
//! The handshake is a single pass with no retries:
//!
//! 1. build an outbound client carrying the caller's credentials
//! 2. probe `domainConfig` for the domain name and version
//! 3. check the probe returned both fields
//! 4. check the version is supported
//! 5. register a session that takes ownership of the client
//!
//! Every failure is folded into a [`ConnectionOutcome`] and closes the client.
//! Only a successful handshake hands its client over to the new session.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, info, warn};

use super::outcome::ConnectionOutcome;
use super::registry::SessionRegistry;
use super::session::Session;
use crate::auth::{admin_roles, username_from_header, RoleSet, ADMIN, ALL_ROLES, UNKNOWN_USERNAME};
use crate::capability::{CapabilityCache, CapabilityDescriptor, CapabilityKey, SupportedVersions, VersionRegistry};
use crate::config::ConnectionConfig;
use crate::messages::{DefaultMessages, MessageCatalog, MessageKey};
use crate::rest::{ClientFactory, Credentials, OutboundClient, RequestDescriptor, RestClient};
use crate::types::{GatehouseError, Result};

/// Configuration root probed by the handshake
const PROBE_PATH: &str = "domainConfig";

/// Fields requested from the probe
const PROBE_FIELDS: &str = "name,domainVersion";

const NAME_FIELD: &str = "name";
const VERSION_FIELD: &str = "domainVersion";

/// Role check operation on the remote security runtime
const CHECK_ROLE_PATH: &str = "serverRuntime/serverSecurityRuntime/checkRole";

/// Name and version reported by a successful probe
#[derive(Debug)]
struct DomainIdentity {
    name: String,
    version: String,
}

/// Owns the session registry and turns credentials into sessions
pub struct ConnectionManager {
    factory: ClientFactory,
    registry: Arc<SessionRegistry>,
    versions: Arc<dyn VersionRegistry>,
    messages: Arc<dyn MessageCatalog>,
    capabilities: Arc<CapabilityCache>,
}

impl ConnectionManager {
    /// Create a manager with an empty registry and the default collaborators
    pub fn new(config: ConnectionConfig) -> Self {
        if let Some(value) = &config.same_site_cookie {
            info!("SameSite cookie attribute is enabled using value: {}", value);
        }

        Self {
            factory: ClientFactory::new(config),
            registry: Arc::new(SessionRegistry::new()),
            versions: Arc::new(SupportedVersions::default()),
            messages: Arc::new(DefaultMessages),
            capabilities: Arc::new(CapabilityCache::default()),
        }
    }

    /// Use a shared session registry
    pub fn with_registry(mut self, registry: Arc<SessionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Use a different supported-version registry
    pub fn with_versions(mut self, versions: Arc<dyn VersionRegistry>) -> Self {
        self.versions = versions;
        self
    }

    /// Use a different message catalog
    pub fn with_messages(mut self, messages: Arc<dyn MessageCatalog>) -> Self {
        self.messages = messages;
        self
    }

    /// Use a shared capability cache
    pub fn with_capabilities(mut self, capabilities: Arc<CapabilityCache>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn capabilities(&self) -> &Arc<CapabilityCache> {
        &self.capabilities
    }

    pub fn versions(&self) -> &Arc<dyn VersionRegistry> {
        &self.versions
    }

    /// SameSite attribute for console cookies, only when enabled
    pub fn same_site_cookie(&self) -> Option<&str> {
        self.factory.config().same_site_cookie.as_deref()
    }

    // =========================================================================
    // Handshake
    // =========================================================================

    /// Try a connection by forwarding the browser's Authorization header.
    ///
    /// The principal is read from the header when it is HTTP Basic and
    /// recorded as `<unknown>` otherwise. The password is never checked here;
    /// the remote endpoint does that.
    pub async fn try_connection_with_header(
        &self,
        domain_url: &str,
        authorization: &str,
        locales: &[String],
    ) -> ConnectionOutcome {
        let username = username_from_header(authorization).unwrap_or_else(|| UNKNOWN_USERNAME.to_string());
        let credentials = Credentials::Header(authorization.to_string());
        self.connect(domain_url, &username, &credentials, locales).await
    }

    /// Try a connection with an explicit username and password
    pub async fn try_connection(&self, domain_url: &str, username: &str, password: &str) -> ConnectionOutcome {
        let credentials = Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.connect(domain_url, username, &credentials, &[]).await
    }

    /// Connect and return the new session, or `None` when the handshake fails
    pub async fn make_connection(&self, domain_url: &str, username: &str, password: &str) -> Option<Arc<Session>> {
        let outcome = self.try_connection(domain_url, username, password).await;
        outcome.connection_id().and_then(|id| self.registry.get(id))
    }

    async fn connect(
        &self,
        domain_url: &str,
        username: &str,
        credentials: &Credentials,
        locales: &[String],
    ) -> ConnectionOutcome {
        let client = match self.factory.build(credentials) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                info!(domain_url = %domain_url, "Unable to build outbound client: {}", e);
                return ConnectionOutcome::failure(StatusCode::BAD_REQUEST);
            }
        };

        self.handshake(domain_url, username, client, locales).await
    }

    /// Probe the domain through `client` and register a session on success.
    /// The client is closed on every failure path.
    async fn handshake(
        &self,
        domain_url: &str,
        username: &str,
        client: Arc<OutboundClient>,
        locales: &[String],
    ) -> ConnectionOutcome {
        let (status, identity) = probe(domain_url, &client).await;

        if !status.is_success() {
            return fail(&client, ConnectionOutcome::failure(status));
        }

        let Some(identity) = identity else {
            info!(domain_url = %domain_url, "Unexpected response from domain: no name or version information found");
            return fail(&client, ConnectionOutcome::failure(StatusCode::INTERNAL_SERVER_ERROR));
        };

        if !self.versions.is_supported(&identity.version) {
            let message = format!(
                "{}: {}",
                self.messages.localize(MessageKey::DomainVersionNotSupported, locales),
                identity.version
            );
            info!(domain_url = %domain_url, "{}", message);
            return fail(
                &client,
                ConnectionOutcome::failure_with_message(StatusCode::NOT_IMPLEMENTED, message),
            );
        }

        info!(
            domain_url = %domain_url,
            ">>>> Connected to domain '{}' with version '{}' <<<<", identity.name, identity.version
        );

        let session = self
            .registry
            .create(domain_url, &identity.name, &identity.version, username, client);
        ConnectionOutcome::success(status, session.id().to_string())
    }

    // =========================================================================
    // Session access
    // =========================================================================

    /// Look up a live session
    pub fn get_connection(&self, id: &str) -> Option<Arc<Session>> {
        self.registry.get(id)
    }

    /// Look up a live session, failing with `NotFound` when it is gone
    pub fn require_connection(&self, id: &str) -> Result<Arc<Session>> {
        self.registry
            .get(id)
            .ok_or_else(|| GatehouseError::NotFound(format!("connection '{}'", id)))
    }

    pub fn is_valid_connection(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// Tear down a session. Unknown or blank IDs are ignored.
    pub fn remove_connection(&self, id: &str) -> bool {
        self.registry.remove(id)
    }

    /// Tear down every session
    pub fn shutdown(&self) -> usize {
        self.registry.shutdown()
    }

    // =========================================================================
    // Roles and capabilities
    // =========================================================================

    /// Ask the remote endpoint whether the session's user holds `role`
    pub async fn check_role(&self, session: &Arc<Session>, role: &str) -> Result<bool> {
        let request = RequestDescriptor::builder()
            .session(Arc::clone(session))
            .path(CHECK_ROLE_PATH)
            .build()?;

        let response = RestClient::post(&request, &json!({ "roleName": role })).await?;
        if !response.is_success() {
            return Err(GatehouseError::Protocol(format!(
                "role check answered with status {}",
                response.status
            )));
        }

        response
            .bool_field("return")
            .ok_or_else(|| GatehouseError::Protocol("role check response has no 'return' value".into()))
    }

    /// Message to show when the session's user is not an administrator.
    ///
    /// `None` when the user is an administrator or the check could not be
    /// made; a failed check never blocks the connection.
    pub async fn check_user_administrator(&self, session: &Arc<Session>, locales: &[String]) -> Option<String> {
        match self.check_role(session, ADMIN).await {
            Ok(true) => None,
            Ok(false) => {
                let message = self.messages.localize(MessageKey::UserNotAdmin, locales);
                debug!(connection_id = %session.id(), username = %session.username(), "{}", message);
                Some(message)
            }
            Err(e) => {
                debug!(
                    connection_id = %session.id(),
                    domain_url = %session.domain_url(),
                    "Unable to check admin role: {}", e
                );
                None
            }
        }
    }

    /// Roles the remote endpoint confirms for the session's user.
    ///
    /// A failed check counts as not holding the role.
    pub async fn resolve_roles(&self, session: &Arc<Session>) -> RoleSet {
        let mut roles = RoleSet::new();

        for role in ALL_ROLES {
            match self.check_role(session, role).await {
                Ok(true) if role == ADMIN => return admin_roles(),
                Ok(true) => {
                    roles.insert(role.to_string());
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(connection_id = %session.id(), role = %role, "Role check failed: {}", e);
                }
            }
        }

        debug!(connection_id = %session.id(), roles = ?roles, "Resolved roles");
        roles
    }

    /// The shared capability descriptor for the session's version and roles
    pub async fn capabilities_for(&self, session: &Arc<Session>) -> Result<Arc<CapabilityDescriptor>> {
        let roles = self.resolve_roles(session).await;
        let version = session.domain_version();
        let key = CapabilityKey::new(version, self.versions.supports_security_warnings(version), roles);

        // Descriptor construction may be slow; keep it off the async workers
        let cache = Arc::clone(&self.capabilities);
        tokio::task::spawn_blocking(move || cache.get_key(key))
            .await
            .map_err(|e| GatehouseError::Internal(format!("capability descriptor build failed: {}", e)))
    }
}

/// Issue the probe. Transport failures and remote internal errors both
/// come back as `404 Not Found`.
async fn probe(domain_url: &str, client: &Arc<OutboundClient>) -> (StatusCode, Option<DomainIdentity>) {
    let request = RequestDescriptor::builder()
        .server_url(domain_url)
        .client(Arc::clone(client))
        .path(PROBE_PATH)
        .query_param("links", "none")
        .query_param("fields", PROBE_FIELDS)
        .build();

    let response = match request {
        Ok(request) => RestClient::get(&request).await,
        Err(e) => Err(e),
    };

    match response {
        Ok(response) => {
            info!(domain_url = %domain_url, status = %response.status, "Connection response from domain");

            // A remote internal error is treated like an unreachable domain
            let status = if response.status == StatusCode::INTERNAL_SERVER_ERROR {
                StatusCode::NOT_FOUND
            } else {
                response.status
            };

            let identity = match (response.str_field(NAME_FIELD), response.str_field(VERSION_FIELD)) {
                (Some(name), Some(version)) => Some(DomainIdentity {
                    name: name.to_string(),
                    version: version.to_string(),
                }),
                _ => None,
            };

            (status, identity)
        }
        Err(e) => {
            info!(domain_url = %domain_url, "Unable to contact domain: {}", e);
            (StatusCode::NOT_FOUND, None)
        }
    }
}

fn fail(client: &OutboundClient, outcome: ConnectionOutcome) -> ConnectionOutcome {
    client.close();
    outcome
}

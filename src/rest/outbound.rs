//! Outbound HTTP clients for the remote management endpoint
//!
//! Each handshake gets its own client carrying the caller's credentials. A
//! successful handshake hands the client to the new session; every other path
//! closes it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::auth::basic_header;
use crate::config::ConnectionConfig;
use crate::types::{GatehouseError, Result};

const USER_AGENT: &str = concat!("gatehouse/", env!("CARGO_PKG_VERSION"));

/// Credentials presented to the remote endpoint
#[derive(Clone)]
pub enum Credentials {
    /// A raw `Authorization` header forwarded from the browser
    Header(String),
    /// An explicit username/password pair, sent as HTTP Basic
    Basic { username: String, password: String },
}

impl Credentials {
    fn header_value(&self) -> String {
        match self {
            Credentials::Header(value) => value.clone(),
            Credentials::Basic { username, password } => basic_header(username, password),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Header(_) => f.write_str("Credentials::Header(..)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Credentials::Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Builds outbound clients with the operator-configured timeouts and TLS policy
#[derive(Debug, Clone)]
pub struct ClientFactory {
    config: ConnectionConfig,
}

impl ClientFactory {
    /// Create a new client factory
    pub fn new(config: ConnectionConfig) -> Self {
        if config.disable_hostname_verification {
            warn!("Hostname verification for SSL/TLS connections has been disabled!");
        }
        Self { config }
    }

    /// Build a client that authenticates every request with `credentials`
    pub fn build(&self, credentials: &Credentials) -> Result<OutboundClient> {
        let mut auth = HeaderValue::from_str(&credentials.header_value()).map_err(|_| {
            GatehouseError::Validation("authorization header contains invalid characters".into())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .read_timeout(self.config.read_timeout)
            .danger_accept_invalid_hostnames(self.config.disable_hostname_verification)
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        debug!(
            connect_timeout_ms = self.config.connect_timeout.as_millis() as u64,
            read_timeout_ms = self.config.read_timeout.as_millis() as u64,
            "Outbound client built"
        );

        Ok(OutboundClient::from_http(http))
    }

    /// The configuration clients are built from
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

/// An HTTP client owned by exactly one handshake or session.
///
/// `reqwest` clients have no explicit close, so the handle tracks its own
/// lifecycle: once closed, every request through it fails with
/// [`GatehouseError::ClientClosed`].
pub struct OutboundClient {
    http: reqwest::Client,
    closed: AtomicBool,
}

impl OutboundClient {
    /// Wrap an already configured `reqwest` client
    pub fn from_http(http: reqwest::Client) -> Self {
        Self {
            http,
            closed: AtomicBool::new(false),
        }
    }

    /// The underlying client, unless this handle was closed
    pub fn http(&self) -> Result<&reqwest::Client> {
        if self.is_closed() {
            return Err(GatehouseError::ClientClosed);
        }
        Ok(&self.http)
    }

    /// Close the client. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for OutboundClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundClient")
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_happens_once() {
        let client = OutboundClient::from_http(reqwest::Client::new());
        assert!(!client.is_closed());
        assert!(client.http().is_ok());

        assert!(client.close());
        assert!(!client.close());
        assert!(client.is_closed());
        assert!(matches!(client.http(), Err(GatehouseError::ClientClosed)));
    }

    #[test]
    fn test_build_with_basic_credentials() {
        let factory = ClientFactory::new(ConnectionConfig::default());
        let client = factory
            .build(&Credentials::Basic {
                username: "weblogic".to_string(),
                password: "welcome1".to_string(),
            })
            .unwrap();
        assert!(!client.is_closed());
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let factory = ClientFactory::new(ConnectionConfig::default());
        let result = factory.build(&Credentials::Header("Basic abc\r\nX-Injected: 1".to_string()));
        assert!(matches!(result, Err(GatehouseError::Validation(_))));
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let creds = Credentials::Basic {
            username: "weblogic".to_string(),
            password: "welcome1".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("weblogic"));
        assert!(!rendered.contains("welcome1"));

        let header = Credentials::Header("Basic c2VjcmV0".to_string());
        assert!(!format!("{:?}", header).contains("c2VjcmV0"));
    }
}

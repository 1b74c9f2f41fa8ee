//! Request descriptors for the remote management REST API
//!
//! A [`RequestDescriptor`] is an immutable description of one outbound call:
//! where it goes (a session, or an explicit endpoint + client pair for
//! pre-session probing), its unencoded path segments, headers and query
//! parameters. It is produced by [`RequestBuilder::build`] and consumed by
//! [`RestClient`](super::RestClient).

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Url;

use super::outbound::OutboundClient;
use crate::connection::Session;
use crate::types::{GatehouseError, Result};

/// Path segments between the domain URL and every request path
pub const API_ROOT: [&str; 3] = ["management", "weblogic", "latest"];

/// Header asking the remote endpoint to wait briefly for async work
pub const PREFER_HEADER: &str = "Prefer";

/// Wait up to two seconds before answering with a pending status
pub const PREFER_WAIT: &str = "wait=2";

/// Query parameter: save (rather than activate) configuration changes
pub const SAVE_CHANGES_PARAM: &str = "saveChanges";

/// Query parameter: return expanded values
pub const EXPANDED_VALUES_PARAM: &str = "expandedValues";

/// An immutable description of a single protocol-level call
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    session: Option<Arc<Session>>,
    server_url: Option<String>,
    client: Option<Arc<OutboundClient>>,
    path: Vec<String>,
    headers: BTreeMap<String, String>,
    query_params: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// Start building a request
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Target session, if the request was addressed through one
    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// Domain URL the request goes to (session first, then explicit URL)
    pub fn server_url(&self) -> Option<&str> {
        match &self.session {
            Some(session) => Some(session.domain_url()),
            None => self.server_url.as_deref(),
        }
    }

    /// Client the request is issued through (session first, then explicit client)
    pub fn client(&self) -> Option<&Arc<OutboundClient>> {
        match &self.session {
            Some(session) => Some(session.client()),
            None => self.client.as_ref(),
        }
    }

    /// Unencoded path segments below the API root
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(String::as_str)
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }

    /// Resolve the full request URL.
    ///
    /// Format: `<domain-url>/management/weblogic/latest/<segments>?<query>`,
    /// with every segment percent-encoded on its own.
    pub fn url(&self) -> Result<Url> {
        let server_url = self
            .server_url()
            .ok_or_else(|| GatehouseError::Validation("request has no target endpoint".into()))?;

        let mut url = Url::parse(server_url)
            .map_err(|e| GatehouseError::Validation(format!("invalid domain URL '{}': {}", server_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| GatehouseError::Validation(format!("domain URL '{}' cannot be a base", server_url)))?
            .pop_if_empty()
            .extend(API_ROOT)
            .extend(&self.path);

        if !self.query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query_params);
        }

        Ok(url)
    }
}

/// Fluent builder for [`RequestDescriptor`].
///
/// `build` snapshots the builder, so a builder can keep being configured and
/// built again without touching descriptors it already produced.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    session: Option<Arc<Session>>,
    server_url: Option<String>,
    client: Option<Arc<OutboundClient>>,
    path: Option<Vec<String>>,
    headers: BTreeMap<String, String>,
    query_params: BTreeMap<String, String>,
}

impl RequestBuilder {
    /// Address the request through an established session
    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Address the request to an explicit domain URL (pre-session probing)
    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    /// Issue the request through an explicit client (pre-session probing)
    pub fn client(mut self, client: Arc<OutboundClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the path from a `/`-separated string, e.g. `changeManager/cancelEdit`.
    ///
    /// Use [`path_segments`](Self::path_segments) when a segment itself may
    /// contain characters that need encoding, such as `/`.
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        );
        self
    }

    /// Set the path from unencoded segments, e.g. `["servers", "Managed (migratable)"]`
    pub fn path_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = Some(segments.into_iter().map(Into::into).collect());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Replace all headers with a copy of `headers`
    pub fn headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        self.headers = headers.clone();
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query_params.insert(key.into(), value.to_string());
        self
    }

    /// Replace all query parameters with a copy of `query_params`
    pub fn query_params(mut self, query_params: &BTreeMap<String, String>) -> Self {
        self.query_params = query_params.clone();
        self
    }

    /// Ask the remote endpoint to wait briefly for asynchronous work to
    /// finish before answering with a pending status. Endpoints without async
    /// support ignore this and run synchronously.
    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        if asynchronous {
            self.headers.insert(PREFER_HEADER.to_string(), PREFER_WAIT.to_string());
        } else {
            self.headers.remove(PREFER_HEADER);
        }
        self
    }

    /// Save (rather than activate) any configuration changes
    pub fn save_changes(self, save_changes: bool) -> Self {
        self.query_param(SAVE_CHANGES_PARAM, save_changes)
    }

    /// Return expanded values in the response
    pub fn expanded_values(self, expanded_values: bool) -> Self {
        self.query_param(EXPANDED_VALUES_PARAM, expanded_values)
    }

    /// Build the descriptor. Fails when no path was configured.
    pub fn build(&self) -> Result<RequestDescriptor> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| GatehouseError::Validation("path is a required builder item".into()))?;

        Ok(RequestDescriptor {
            session: self.session.clone(),
            server_url: self.server_url.clone(),
            client: self.client.clone(),
            path,
            headers: self.headers.clone(),
            query_params: self.query_params.clone(),
        })
    }
}

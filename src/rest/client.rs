//! REST call boundary
//!
//! Every outbound call goes through [`RestClient`]. This is the one place
//! where transport failures are turned into [`GatehouseError`] values; callers
//! above it only ever see a [`RestResponse`] or a classified error.

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::request::RequestDescriptor;
use crate::types::{GatehouseError, Result};

/// Largest response body the console will buffer
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Status and (optional) JSON body returned by the remote endpoint
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub status: StatusCode,
    /// Parsed JSON body, `None` when the body was empty or not JSON
    pub body: Option<Value>,
}

impl RestResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// String field of a JSON object body
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.body.as_ref()?.get(name)?.as_str()
    }

    /// Boolean field of a JSON object body
    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.body.as_ref()?.get(name)?.as_bool()
    }
}

/// Issues descriptor-driven requests against the remote endpoint
pub struct RestClient;

impl RestClient {
    /// GET the resource described by `request`
    pub async fn get(request: &RequestDescriptor) -> Result<RestResponse> {
        Self::send(Method::GET, request, None).await
    }

    /// POST `body` to the resource described by `request`
    pub async fn post(request: &RequestDescriptor, body: &Value) -> Result<RestResponse> {
        Self::send(Method::POST, request, Some(body)).await
    }

    /// DELETE the resource described by `request`
    pub async fn delete(request: &RequestDescriptor) -> Result<RestResponse> {
        Self::send(Method::DELETE, request, None).await
    }

    async fn send(method: Method, request: &RequestDescriptor, body: Option<&Value>) -> Result<RestResponse> {
        let client = request
            .client()
            .ok_or_else(|| GatehouseError::Validation("request has no outbound client".into()))?;
        let http = client.http()?;
        let url = request.url()?;

        debug!(method = %method, url = %url, "Issuing REST request");

        let mut builder = http.request(method, url);
        for (key, value) in request.headers() {
            builder = builder.header(key, value);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = read_body(response, MAX_BODY_BYTES).await?;

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(status = %status, "Response body is not JSON: {}", e);
                    None
                }
            }
        };

        debug!(status = %status, "REST response received");

        Ok(RestResponse { status, body })
    }
}

/// Read a response body, refusing anything longer than `limit` bytes
async fn read_body(mut response: reqwest::Response, limit: usize) -> Result<Vec<u8>> {
    if let Some(length) = response.content_length() {
        if length > limit as u64 {
            return Err(GatehouseError::Protocol(format!(
                "response body of {} bytes exceeds the {} byte limit",
                length, limit
            )));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(GatehouseError::Protocol(format!(
                "response body exceeds the {} byte limit",
                limit
            )));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

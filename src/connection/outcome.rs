//! Result of a connection attempt

use std::fmt;

use reqwest::StatusCode;
use serde::Serialize;

/// Status, new connection ID and message returned once per handshake.
///
/// The connection ID is present only on success. A message is present only
/// on failures that carry user-facing text (an unsupported version).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOutcome {
    #[serde(serialize_with = "serialize_status")]
    status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    connection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ConnectionOutcome {
    pub(crate) fn success(status: StatusCode, connection_id: String) -> Self {
        Self {
            status,
            connection_id: Some(connection_id),
            message: None,
        }
    }

    pub(crate) fn failure(status: StatusCode) -> Self {
        Self {
            status,
            connection_id: None,
            message: None,
        }
    }

    pub(crate) fn failure_with_message(status: StatusCode, message: String) -> Self {
        Self {
            status,
            connection_id: None,
            message: Some(message),
        }
    }

    /// Whether the handshake produced a session
    pub fn is_success(&self) -> bool {
        self.status.is_success() && self.connection_id.is_some()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for ConnectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status = {}; Connection ID = {}; Message = {}",
            self.status,
            self.connection_id.as_deref().unwrap_or("-"),
            self.message.as_deref().unwrap_or("-")
        )
    }
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_and_failure() {
        let ok = ConnectionOutcome::success(StatusCode::OK, "abc".to_string());
        assert!(ok.is_success());
        assert_eq!(ok.connection_id(), Some("abc"));
        assert!(ok.message().is_none());

        let not_found = ConnectionOutcome::failure(StatusCode::NOT_FOUND);
        assert!(!not_found.is_success());
        assert!(not_found.connection_id().is_none());
    }

    #[test]
    fn test_display_and_json() {
        let outcome = ConnectionOutcome::failure_with_message(
            StatusCode::NOT_IMPLEMENTED,
            "Unsupported: 10.3.6.0".to_string(),
        );
        assert_eq!(
            outcome.to_string(),
            "Status = 501 Not Implemented; Connection ID = -; Message = Unsupported: 10.3.6.0"
        );

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], 501);
        assert_eq!(json["message"], "Unsupported: 10.3.6.0");
        assert!(json.get("connectionId").is_none());
    }
}

//! The resolved server endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved API server endpoint.
///
/// Created by the supervisor on a successful announcement parse and
/// immutable afterwards. A re-start after failure produces a fresh value
/// that replaces the old one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEndpoint {
    /// Host the UI should connect to.
    pub host: String,
    /// Port announced by the server after binding.
    pub port: u16,
    /// When the announcement was parsed.
    pub resolved_at: DateTime<Utc>,
}

impl ServerEndpoint {
    /// Create an endpoint resolved at the current instant.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            resolved_at: Utc::now(),
        }
    }

    /// The base URL the UI issues HTTP calls against.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_formats_host_and_port() {
        let endpoint = ServerEndpoint::new("localhost", 43210);
        assert_eq!(endpoint.url(), "http://localhost:43210");
    }

    #[test]
    fn serializes_camel_case() {
        let endpoint = ServerEndpoint::new("localhost", 9000);
        let json = serde_json::to_string(&endpoint).unwrap();
        assert!(json.contains("\"resolvedAt\""));
        assert!(json.contains("\"port\":9000"));
    }
}

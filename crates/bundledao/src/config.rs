//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Production node endpoint.
pub const DEFAULT_NODE_URL: &str = "https://node.bundledao.io";

/// Production identity service.
pub const DEFAULT_IDENTITY_URL: &str = bundledao_identity::DEFAULT_IDENTITY_URL;

/// How long a remote sign request may wait for the identity service.
pub const DEFAULT_SIGN_TIMEOUT: Duration = Duration::from_secs(60);

/// Lifetime of an API JWT.
pub const DEFAULT_JWT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Timeout for a single HTTP request to the node.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for [`BundleDaoClient`](crate::BundleDaoClient).
///
/// Missing fields take their defaults when deserialized. Durations are
/// whole seconds on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the node API.
    pub node_url: String,
    /// Origin of the identity service the host channel talks to.
    pub identity_url: String,
    /// Remote signing timeout.
    #[serde(with = "duration_secs")]
    pub sign_timeout: Duration,
    /// API JWT lifetime.
    #[serde(with = "duration_secs")]
    pub jwt_max_age: Duration,
    /// HTTP request timeout.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            sign_timeout: DEFAULT_SIGN_TIMEOUT,
            jwt_max_age: DEFAULT_JWT_MAX_AGE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Use a different node.
    pub fn with_node_url(mut self, url: impl Into<String>) -> Self {
        self.node_url = url.into();
        self
    }

    /// Use a different identity service origin.
    pub fn with_identity_url(mut self, url: impl Into<String>) -> Self {
        self.identity_url = url.into();
        self
    }

    /// Set the remote signing timeout.
    pub fn with_sign_timeout(mut self, timeout: Duration) -> Self {
        self.sign_timeout = timeout;
        self
    }

    /// Set the JWT lifetime.
    pub fn with_jwt_max_age(mut self, max_age: Duration) -> Self {
        self.jwt_max_age = max_age;
        self
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.node_url, "https://node.bundledao.io");
        assert_eq!(config.identity_url, "https://identity.deso.org");
        assert_eq!(config.sign_timeout, Duration::from_secs(60));
        assert_eq!(config.jwt_max_age, Duration::from_secs(600));
        assert_eq!(config.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"node_url": "http://localhost:8080", "sign_timeout": 5}"#)
                .unwrap();
        assert_eq!(config.node_url, "http://localhost:8080");
        assert_eq!(config.sign_timeout, Duration::from_secs(5));
        assert_eq!(config.identity_url, DEFAULT_IDENTITY_URL);
        assert_eq!(config.jwt_max_age, DEFAULT_JWT_MAX_AGE);
    }

    #[test]
    fn test_durations_serialize_as_seconds() {
        let value = serde_json::to_value(ClientConfig::default()).unwrap();
        assert_eq!(value["jwt_max_age"], 600);
        assert_eq!(value["request_timeout"], 120);
    }
}

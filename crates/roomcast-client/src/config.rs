//! Client configuration.

use crate::ClientError;

/// Environment variable naming the hub endpoint.
pub const SOCKET_URL_ENV: &str = "SOCKET_URL";

/// Where the runtime client connects.
///
/// The endpoint can be set explicitly or picked up from the
/// `SOCKET_URL` environment variable. There is deliberately no
/// hard-coded default: a client built without an endpoint fails fast
/// at connect time instead of dialing some guessed address.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    endpoint: Option<String>,
}

impl RuntimeConfig {
    /// A config with the endpoint set explicitly.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
        }
    }

    /// Reads the endpoint from the `SOCKET_URL` environment variable,
    /// if set.
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var(SOCKET_URL_ENV).ok(),
        }
    }

    /// Overrides the endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// The configured endpoint, or an error if none was given.
    pub fn resolve_endpoint(&self) -> Result<&str, ClientError> {
        self.endpoint
            .as_deref()
            .ok_or(ClientError::EndpointNotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_endpoint_resolves() {
        let config = RuntimeConfig::new("ws://example:9000");
        assert_eq!(config.resolve_endpoint().unwrap(), "ws://example:9000");
    }

    #[test]
    fn test_missing_endpoint_is_an_error() {
        let config = RuntimeConfig::default();
        assert!(matches!(
            config.resolve_endpoint(),
            Err(ClientError::EndpointNotConfigured)
        ));
    }

    #[test]
    fn test_builder_override_wins() {
        let config = RuntimeConfig::default().endpoint("ws://a:1");
        assert_eq!(config.resolve_endpoint().unwrap(), "ws://a:1");
    }
}

//! Client configuration

use super::error::ClientError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API root of a local backend
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default user agent
pub const DEFAULT_USER_AGENT: &str = "ojt-client/0.1.0";

/// Paths of the authentication endpoints, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
    pub login: String,
    pub register: String,
    pub logout: String,
    pub check_auth: String,
    pub refresh: String,
    pub profile: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login/".to_string(),
            register: "/auth/register/".to_string(),
            logout: "/auth/logout/".to_string(),
            check_auth: "/auth/check-auth/".to_string(),
            refresh: "/auth/refresh/".to_string(),
            profile: "/auth/profile/".to_string(),
        }
    }
}

impl AuthEndpoints {
    /// Whether `path` targets login, registration, check-auth or refresh.
    ///
    /// A 401 from one of these is never answered with a refresh. Query
    /// strings and trailing slashes are ignored when comparing.
    pub fn is_bootstrap(&self, path: &str) -> bool {
        let path = normalize(path);
        [&self.login, &self.register, &self.check_auth, &self.refresh]
            .into_iter()
            .any(|endpoint| normalize(endpoint) == path)
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.trim_end_matches('/')
}

/// Everything needed to build an [`OjtClient`](super::OjtClient)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8000/api`
    pub base_url: String,

    /// Request timeout in seconds (none = transport default)
    pub timeout_secs: Option<u64>,

    /// User agent sent with every request
    pub user_agent: String,

    /// Authentication endpoint paths
    pub endpoints: AuthEndpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            endpoints: AuthEndpoints::default(),
        }
    }
}

impl ClientConfig {
    /// Check that the base URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<(), ClientError> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base_url {:?}: {e}", self.base_url))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ClientError::Configuration(format!(
                "unsupported base_url scheme: {scheme}"
            ))),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_endpoints_are_recognized() {
        let endpoints = AuthEndpoints::default();

        assert!(endpoints.is_bootstrap("/auth/login/"));
        assert!(endpoints.is_bootstrap("/auth/register/"));
        assert!(endpoints.is_bootstrap("/auth/check-auth/"));
        assert!(endpoints.is_bootstrap("/auth/refresh/"));
        assert!(endpoints.is_bootstrap("/auth/login"));
        assert!(endpoints.is_bootstrap("/auth/check-auth/?ts=1"));
    }

    #[test]
    fn protected_endpoints_are_not_bootstrap() {
        let endpoints = AuthEndpoints::default();

        assert!(!endpoints.is_bootstrap("/auth/logout/"));
        assert!(!endpoints.is_bootstrap("/auth/profile/"));
        assert!(!endpoints.is_bootstrap("/listings/"));
        assert!(!endpoints.is_bootstrap("/auth/login/history/"));
    }

    #[test]
    fn validate_rejects_bad_base_urls() {
        let mut config = ClientConfig::default();
        assert!(config.validate().is_ok());

        config.base_url = "localhost:8000".into();
        assert!(matches!(
            config.validate(),
            Err(ClientError::Configuration(_))
        ));

        config.base_url = "ftp://example.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "https://ojt.example.com/api"}"#).unwrap();

        assert_eq!(config.base_url, "https://ojt.example.com/api");
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.endpoints.refresh, "/auth/refresh/");
    }
}

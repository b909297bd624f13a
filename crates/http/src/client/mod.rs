//! OJT API client

pub mod auth;
pub mod config;
pub mod error;
pub mod refresh;
pub mod transport;

pub use config::{AuthEndpoints, ClientConfig};
pub use refresh::RefreshingTransport;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

use error::ClientError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// OJT API client
///
/// Holds two views of the same transport: the refreshing path used for
/// every ordinary call, and the direct path for calls that must never
/// trigger a refresh (registration, the refresh call itself).
#[derive(Clone)]
pub struct OjtClient {
    refreshing: Arc<RefreshingTransport<Arc<dyn Transport>>>,
    direct: Arc<dyn Transport>,
    endpoints: AuthEndpoints,
}

impl OjtClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> OjtClientBuilder {
        OjtClientBuilder::default()
    }

    /// Build a client from a loaded configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Self::builder()
            .base_url(config.base_url.clone())
            .user_agent(config.user_agent.clone())
            .endpoints(config.endpoints.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Wrap an arbitrary transport
    pub fn with_transport(transport: Arc<dyn Transport>, endpoints: AuthEndpoints) -> Self {
        Self {
            refreshing: Arc::new(RefreshingTransport::new(
                transport.clone(),
                endpoints.clone(),
            )),
            direct: transport,
            endpoints,
        }
    }

    /// Endpoint paths in use
    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    /// Number of successful silent refreshes performed by this client
    pub fn refresh_generation(&self) -> u64 {
        self.refreshing.refresh_generation()
    }

    /// Send through the refreshing path and return the raw response
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        self.refreshing.call_with_refresh(request).await
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, ClientError> {
        self.send(request).await?.error_for_status()?.json()
    }

    /// Execute a request whose response body is irrelevant
    pub async fn execute_empty(&self, request: &ApiRequest) -> Result<(), ClientError> {
        self.send(request).await?.error_for_status()?;
        Ok(())
    }

    /// Execute a request without the refresh decorator
    pub async fn execute_direct<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, ClientError> {
        self.direct.send(request).await?.error_for_status()?.json()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(&ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(&ApiRequest::post(path).json(body)?).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(&ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.execute_empty(&ApiRequest::delete(path)).await
    }
}

/// Builder for `OjtClient`
#[derive(Default)]
pub struct OjtClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    endpoints: Option<AuthEndpoints>,
}

impl OjtClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Override the auth endpoint paths
    pub fn endpoints(mut self, endpoints: AuthEndpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<OjtClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        ClientConfig {
            base_url: base_url.clone(),
            ..ClientConfig::default()
        }
        .validate()?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| config::DEFAULT_USER_AGENT.to_string());
        let transport = ReqwestTransport::new(base_url, self.timeout, &user_agent)?;

        Ok(OjtClient::with_transport(
            Arc::new(transport),
            self.endpoints.unwrap_or_default(),
        ))
    }
}

//! Transport seam between the API client and the network

use super::error::ClientError;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A request that can be re-issued as many times as needed
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// A response of any status
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Turn a non-success status into a [`ClientError`]
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            let message = if self.body.is_empty() {
                self.status.to_string()
            } else {
                self.body
            };
            Err(ClientError::from_status(self.status, message))
        }
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Sends requests and hands back responses of any status.
///
/// Only failures that produced no response at all are errors here; status
/// interpretation belongs to the layers above.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        (**self).send(request).await
    }
}

/// Network transport backed by `reqwest` with an in-memory cookie jar
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a transport for the given base URL
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut builder = ClientBuilder::new()
            .user_agent(user_agent)
            .cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path; the leading `/` is optional
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let url = self.url_for(&request.path);
        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_for_status_keeps_body() {
        let err = ApiResponse::new(StatusCode::BAD_REQUEST, r#"{"username":["taken"]}"#)
            .error_for_status()
            .unwrap_err();

        assert!(matches!(err, ClientError::BadRequest(ref body) if body.contains("taken")));
    }

    #[test]
    fn error_for_status_falls_back_to_reason() {
        let err = ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "")
            .error_for_status()
            .unwrap_err();

        assert_eq!(err.body(), Some("500 Internal Server Error"));
    }

    #[test]
    fn json_body_is_attached() {
        let request = ApiRequest::post("/auth/login/")
            .json(&json!({"username": "alice"}))
            .unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, Some(json!({"username": "alice"})));
    }

    #[test]
    fn base_url_is_trimmed() {
        let transport =
            ReqwestTransport::new("http://localhost:8000/api/", None, "ojt-test").unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn paths_join_with_exactly_one_slash() {
        let transport =
            ReqwestTransport::new("http://localhost:8000/api/", None, "ojt-test").unwrap();

        assert_eq!(
            transport.url_for("/listings/"),
            "http://localhost:8000/api/listings/"
        );
        assert_eq!(
            transport.url_for("listings/"),
            "http://localhost:8000/api/listings/"
        );
    }
}

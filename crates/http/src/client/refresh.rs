//! Transparent session refresh
//!
//! [`RefreshingTransport`] wraps another transport. When a protected request
//! comes back 401 it renews the session cookie through the refresh endpoint
//! and re-sends the request exactly once. Concurrent 401s share one refresh:
//! a request remembers how many refresh attempts had completed when it was
//! sent, and if another attempt has finished since, it reuses that outcome
//! (retry after a renewal, the same rejection otherwise) instead of calling
//! the refresh endpoint again.

use super::config::AuthEndpoints;
use super::error::ClientError;
use super::transport::{ApiRequest, ApiResponse, Transport};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Rejected refresh, kept so concurrent waiters can report it too
#[derive(Debug, Clone)]
struct Rejection {
    status: u16,
    message: String,
}

impl From<Rejection> for ClientError {
    fn from(rejection: Rejection) -> Self {
        Self::RefreshRejected {
            status: rejection.status,
            message: rejection.message,
        }
    }
}

/// Retry-once-after-refresh decorator around a [`Transport`]
pub struct RefreshingTransport<T> {
    inner: T,
    endpoints: AuthEndpoints,
    /// Successful refreshes
    generation: AtomicU64,
    /// Completed refresh attempts, successful or not
    attempts: AtomicU64,
    /// Outcome of the latest attempt; held while a refresh is in flight
    last_rejection: Mutex<Option<Rejection>>,
}

impl<T: Transport> RefreshingTransport<T> {
    pub fn new(inner: T, endpoints: AuthEndpoints) -> Self {
        Self {
            inner,
            endpoints,
            generation: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
            last_rejection: Mutex::new(None),
        }
    }

    /// Number of successful refreshes so far
    pub fn refresh_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Send `request`, refreshing the session and retrying once on 401.
    ///
    /// Transport failures, non-401 statuses and responses from the
    /// auth-bootstrapping endpoints pass through unchanged. If the refresh
    /// itself fails, its error is returned instead of the original 401.
    pub async fn call_with_refresh(
        &self,
        request: &ApiRequest,
    ) -> Result<ApiResponse, ClientError> {
        let sent_under = self.attempts.load(Ordering::Acquire);
        let response = self.inner.send(request).await?;

        if !response.is_unauthorized() || self.endpoints.is_bootstrap(&request.path) {
            return Ok(response);
        }

        debug!(method = %request.method, path = %request.path, "unauthorized, refreshing session");
        self.refresh(sent_under).await?;

        let retried = self.inner.send(request).await?;
        if retried.is_unauthorized() {
            warn!(path = %request.path, "still unauthorized after session refresh");
        }
        Ok(retried)
    }

    async fn refresh(&self, sent_under: u64) -> Result<(), ClientError> {
        let mut last_rejection = self.last_rejection.lock().await;

        if self.attempts.load(Ordering::Acquire) != sent_under {
            return match &*last_rejection {
                None => {
                    debug!("session already refreshed by a concurrent request");
                    Ok(())
                }
                Some(rejection) => {
                    debug!("reusing concurrent refresh rejection");
                    Err(rejection.clone().into())
                }
            };
        }

        let request = ApiRequest::post(self.endpoints.refresh.as_str())
            .json(&serde_json::json!({}))?;
        // No response means no verdict; waiters try for themselves
        let response = self.inner.send(&request).await?;

        if response.is_success() {
            *last_rejection = None;
            self.generation.fetch_add(1, Ordering::AcqRel);
            self.attempts.fetch_add(1, Ordering::AcqRel);
            debug!("session refreshed");
            return Ok(());
        }

        warn!(status = %response.status, "session refresh rejected");
        let rejection = Rejection {
            status: response.status.as_u16(),
            message: response.body,
        };
        *last_rejection = Some(rejection.clone());
        self.attempts.fetch_add(1, Ordering::AcqRel);
        Err(rejection.into())
    }
}

#[async_trait]
impl<T: Transport> Transport for RefreshingTransport<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        self.call_with_refresh(request).await
    }
}

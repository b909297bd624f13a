//! OJT HTTP client
//!
//! Cookie-carrying access to the OJT marketplace REST API. Every call made
//! through [`client::OjtClient`] goes through a refresh decorator that turns
//! a recoverable session expiry (401 on a protected endpoint) into a silent
//! credential refresh followed by exactly one retry.

pub mod client;
pub mod types;

pub use client::{
    ApiRequest, ApiResponse, AuthEndpoints, ClientConfig, OjtClient, OjtClientBuilder,
    RefreshingTransport, ReqwestTransport, Transport, error::ClientError,
};
pub use types::{FieldErrors, Role, User};

//! Client-side session for the OJT marketplace
//!
//! [`SessionStore`] tracks who is signed in and drives login, registration,
//! logout and re-validation through an [`ojt_http::OjtClient`].

pub mod auth;
pub mod config;

pub use auth::{
    Access, AuthFailure, Session, SessionAction, SessionStatus, SessionStore, authorize,
};
pub use config::AuthConfig;
pub use ojt_http::{FieldErrors, Role, User};

//! Session configuration

/// Authentication messages and defaults
pub struct AuthConfig;

impl AuthConfig {
    /// Shown when a login is rejected without a specific reason
    pub const LOGIN_FAILED_MESSAGE: &'static str = "Login failed";

    /// Shown when a registration is rejected without a usable payload
    pub const REGISTRATION_FAILED_MESSAGE: &'static str = "Registration failed";

    /// Shown when the backend could not be reached at all
    pub const UNREACHABLE_MESSAGE: &'static str = "Unable to reach the server. Please try again.";

    /// Shown when the session was signed out while a sign-in was pending
    pub const SUPERSEDED_MESSAGE: &'static str = "Signed out before sign-in completed";
}

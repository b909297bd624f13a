//! Authentication API client methods

use super::{ApiRequest, ClientError, OjtClient, Transport};
use crate::types::{AuthResponse, LoginRequest, RegistrationRequest, User};
use tracing::debug;

impl OjtClient {
    /// Resolve the user behind the current session cookie
    pub async fn check_auth(&self) -> Result<User, ClientError> {
        let request = ApiRequest::get(self.endpoints().check_auth.as_str());
        let response: AuthResponse = self.execute(&request).await?;
        Ok(response.user)
    }

    /// Exchange credentials for a session cookie
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let request = ApiRequest::post(self.endpoints().login.as_str()).json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let response: AuthResponse = self.execute(&request).await?;
        debug!(user = %response.user.username, "login accepted");
        Ok(response.user)
    }

    /// Create an account; bypasses the refresh decorator entirely
    pub async fn register(&self, registration: &RegistrationRequest) -> Result<User, ClientError> {
        let request = ApiRequest::post(self.endpoints().register.as_str()).json(registration)?;
        let response: AuthResponse = self.execute_direct(&request).await?;
        debug!(user = %response.user.username, role = %response.user.role, "registration accepted");
        Ok(response.user)
    }

    /// End the server-side session
    pub async fn logout(&self) -> Result<(), ClientError> {
        let request = ApiRequest::post(self.endpoints().logout.as_str());
        self.execute_empty(&request).await
    }

    /// Renew the session cookie explicitly
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let request =
            ApiRequest::post(self.endpoints().refresh.as_str()).json(&serde_json::json!({}))?;
        self.direct.send(&request).await?.error_for_status()?;
        Ok(())
    }

    /// Fetch the signed-in user's profile
    pub async fn profile(&self) -> Result<User, ClientError> {
        self.get(&self.endpoints().profile).await
    }
}

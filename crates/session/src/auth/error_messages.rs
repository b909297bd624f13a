//! Turning backend error payloads into user-facing failures

use crate::config::AuthConfig;
use ojt_http::{ClientError, FieldErrors};
use serde_json::Value;
use thiserror::Error;

/// Why a login or registration did not go through
#[derive(Debug, Error)]
pub enum AuthFailure {
    /// A single human-readable reason
    #[error("{0}")]
    Message(String),

    /// Per-field validation errors, exactly as the backend reported them
    #[error("{}", flatten_fields(.0))]
    Fields(FieldErrors),

    /// No response from the backend; not an authentication verdict
    #[error("{}", AuthConfig::UNREACHABLE_MESSAGE)]
    Unreachable(#[source] ClientError),

    /// Accepted by the backend, but a logout or reset landed first
    #[error("{}", AuthConfig::SUPERSEDED_MESSAGE)]
    Superseded,
}

impl AuthFailure {
    /// Field errors, if the failure carries them
    pub const fn fields(&self) -> Option<&FieldErrors> {
        match self {
            Self::Fields(fields) => Some(fields),
            Self::Message(_) | Self::Unreachable(_) | Self::Superseded => None,
        }
    }
}

/// Failure for a rejected login: the first non-field error, or a generic
/// message when the payload has none.
pub fn login_failure(error: ClientError) -> AuthFailure {
    if error.is_transport() {
        return AuthFailure::Unreachable(error);
    }

    let reason = error
        .payload()
        .as_ref()
        .and_then(|payload| payload.get("non_field_errors"))
        .and_then(first_message)
        .unwrap_or_else(|| AuthConfig::LOGIN_FAILED_MESSAGE.to_string());

    AuthFailure::Message(reason)
}

/// Failure for a rejected registration.
///
/// A `detail` message wins; a mapping of fields to message lists is returned
/// untouched; any other payload is flattened into one message.
pub fn registration_failure(error: ClientError) -> AuthFailure {
    if error.is_transport() {
        return AuthFailure::Unreachable(error);
    }

    match error.payload() {
        Some(Value::Object(map)) => {
            if let Some(Value::String(detail)) = map.get("detail") {
                return AuthFailure::Message(detail.clone());
            }
            if let Some(fields) = as_field_errors(&map) {
                return AuthFailure::Fields(fields);
            }
            let flattened = map
                .values()
                .flat_map(messages_of)
                .collect::<Vec<_>>()
                .join(" ");
            AuthFailure::Message(non_empty_or_default(flattened))
        }
        Some(Value::String(message)) => AuthFailure::Message(non_empty_or_default(message)),
        Some(other) => AuthFailure::Message(non_empty_or_default(
            messages_of(&other).join(" "),
        )),
        None => {
            let body = error.body().unwrap_or_default().trim().to_string();
            AuthFailure::Message(non_empty_or_default(body))
        }
    }
}

fn as_field_errors(map: &serde_json::Map<String, Value>) -> Option<FieldErrors> {
    if map.is_empty() {
        return None;
    }
    map.iter()
        .map(|(field, value)| {
            let messages = value
                .as_array()?
                .iter()
                .map(|message| message.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()?;
            Some((field.clone(), messages))
        })
        .collect()
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.first().and_then(first_message),
        Value::String(message) => Some(message.clone()),
        _ => None,
    }
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(message) => vec![message.clone()],
        Value::Array(items) => items.iter().flat_map(messages_of).collect(),
        Value::Object(map) => map.values().flat_map(messages_of).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

fn non_empty_or_default(message: String) -> String {
    if message.trim().is_empty() {
        AuthConfig::REGISTRATION_FAILED_MESSAGE.to_string()
    } else {
        message
    }
}

fn flatten_fields(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bad_request(body: &Value) -> ClientError {
        ClientError::BadRequest(body.to_string())
    }

    #[test]
    fn login_uses_first_non_field_error() {
        let failure = login_failure(bad_request(&json!({
            "non_field_errors": ["Invalid credentials", "second"]
        })));
        assert_eq!(failure.to_string(), "Invalid credentials");
    }

    #[test]
    fn login_falls_back_to_generic_message() {
        let failure = login_failure(bad_request(&json!({"username": ["This field is required."]})));
        assert_eq!(failure.to_string(), AuthConfig::LOGIN_FAILED_MESSAGE);

        let failure = login_failure(ClientError::ServerError {
            status: 502,
            message: "<html>Bad gateway</html>".into(),
        });
        assert_eq!(failure.to_string(), AuthConfig::LOGIN_FAILED_MESSAGE);
    }

    #[test]
    fn registration_returns_field_map_unmodified() {
        let failure = registration_failure(bad_request(&json!({
            "company_name": ["This field is required."],
            "username": ["A user with that username already exists.", "Too short."]
        })));

        let fields = failure.fields().unwrap();
        assert_eq!(fields["company_name"], vec!["This field is required."]);
        assert_eq!(fields["username"].len(), 2);
        assert_eq!(fields["username"][1], "Too short.");
    }

    #[test]
    fn registration_prefers_detail() {
        let failure = registration_failure(bad_request(&json!({"detail": "Registration closed"})));
        assert!(matches!(failure, AuthFailure::Message(ref m) if m == "Registration closed"));
    }

    #[test]
    fn registration_flattens_irregular_payloads() {
        let failure = registration_failure(bad_request(&json!({
            "course": ["Course is required for students"],
            "password": "Passwords don't match"
        })));
        assert!(failure.fields().is_none());
        assert_eq!(
            failure.to_string(),
            "Course is required for students Passwords don't match"
        );

        let failure = registration_failure(bad_request(&json!(["Username taken"])));
        assert_eq!(failure.to_string(), "Username taken");
    }

    #[test]
    fn registration_handles_plain_and_empty_bodies() {
        let failure = registration_failure(ClientError::ServerError {
            status: 500,
            message: "Server Error".into(),
        });
        assert_eq!(failure.to_string(), "Server Error");

        let failure = registration_failure(bad_request(&json!({})));
        assert_eq!(failure.to_string(), AuthConfig::REGISTRATION_FAILED_MESSAGE);
    }

    #[test]
    fn field_failure_display_lists_fields() {
        let failure = AuthFailure::Fields(FieldErrors::from([(
            "email".to_string(),
            vec!["Enter a valid email address.".to_string()],
        )]));
        assert_eq!(failure.to_string(), "email: Enter a valid email address.");
    }
}

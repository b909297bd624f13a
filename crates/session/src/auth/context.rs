//! Session state and its transitions

use ojt_http::{Role, User};
use serde::Serialize;
use std::fmt;

/// Coarse session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Initializing,
    Authenticated,
    Unauthenticated,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initializing => "initializing",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        })
    }
}

/// Who is signed in
///
/// The user only exists inside `Authenticated`, so a session can never be
/// authenticated without a user or carry a user while signed out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", content = "user", rename_all = "lowercase")]
pub enum Session {
    /// Startup re-validation has not settled yet
    #[default]
    Initializing,
    Authenticated(User),
    Unauthenticated,
}

/// Session transitions
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// The backend vouched for this user (check-auth, login or registration)
    Resolved(User),
    /// Re-validation failed
    Rejected,
    /// The user signed out
    LoggedOut,
    /// Back to the state of a fresh application load
    Reset,
}

impl Session {
    pub const fn status(&self) -> SessionStatus {
        match self {
            Self::Initializing => SessionStatus::Initializing,
            Self::Authenticated(_) => SessionStatus::Authenticated,
            Self::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }

    pub const fn current_user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Initializing | Self::Unauthenticated => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.current_user().map(|user| user.role)
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Initializing)
    }

    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Apply a transition
    #[must_use]
    pub fn reduce(self, action: SessionAction) -> Self {
        match action {
            SessionAction::Resolved(user) => Self::Authenticated(user),
            SessionAction::Rejected | SessionAction::LoggedOut => Self::Unauthenticated,
            SessionAction::Reset => Self::Initializing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(role: &str) -> User {
        serde_json::from_value(json!({"id": 1, "username": "alice", "role": role})).unwrap()
    }

    fn assert_consistent(session: &Session) {
        assert_eq!(
            session.status() == SessionStatus::Authenticated,
            session.current_user().is_some()
        );
    }

    #[test]
    fn starts_initializing() {
        let session = Session::default();
        assert!(session.is_loading());
        assert_eq!(session.status(), SessionStatus::Initializing);
        assert_consistent(&session);
    }

    #[test]
    fn transitions_follow_the_state_machine() {
        let resolved = Session::Initializing.reduce(SessionAction::Resolved(user("student")));
        assert_eq!(resolved.status(), SessionStatus::Authenticated);
        assert_eq!(resolved.role(), Some(Role::Student));
        assert_consistent(&resolved);

        let rejected = Session::Initializing.reduce(SessionAction::Rejected);
        assert_eq!(rejected, Session::Unauthenticated);
        assert_consistent(&rejected);

        let logged_out = resolved.clone().reduce(SessionAction::LoggedOut);
        assert_eq!(logged_out, Session::Unauthenticated);

        let expired = resolved.reduce(SessionAction::Rejected);
        assert_eq!(expired, Session::Unauthenticated);

        let relogged = expired.reduce(SessionAction::Resolved(user("company")));
        assert_eq!(relogged.role(), Some(Role::Company));

        assert_eq!(relogged.reduce(SessionAction::Reset), Session::Initializing);
    }

    #[test]
    fn serializes_with_status_tag() {
        let value = serde_json::to_value(Session::Unauthenticated).unwrap();
        assert_eq!(value, json!({"status": "unauthenticated"}));

        let value = serde_json::to_value(Session::Authenticated(user("admin"))).unwrap();
        assert_eq!(value["status"], "authenticated");
        assert_eq!(value["user"]["username"], "alice");
    }
}

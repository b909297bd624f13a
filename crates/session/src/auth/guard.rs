//! Access decisions for protected views

use super::context::Session;
use ojt_http::{Role, User};

/// What a protected view should do with the current session
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// Still initializing; show a loading indicator
    Pending,
    /// Nobody is signed in; send the visitor to the login page
    SignInRequired,
    /// Signed in, but the role is not allowed here
    Forbidden(Role),
    Granted(User),
}

/// Decide access for a view restricted to `roles` (empty = any signed-in user)
pub fn authorize(session: &Session, roles: &[Role]) -> Access {
    match session {
        Session::Initializing => Access::Pending,
        Session::Unauthenticated => Access::SignInRequired,
        Session::Authenticated(user) if !roles.is_empty() && !roles.contains(&user.role) => {
            Access::Forbidden(user.role)
        }
        Session::Authenticated(user) => Access::Granted(user.clone()),
    }
}

//! Session store
//!
//! The single owner of [`Session`]. Views read snapshots or subscribe to a
//! `watch` channel; only the operations here change the state, and each
//! change is applied in one step so subscribers never see a half-updated
//! session.
//!
//! Logins, registrations, logouts and resets advance an epoch. A result from
//! an operation that started before the latest epoch change is dropped, so a
//! slow check-auth cannot sign the user back in after they logged out.

use super::context::{Session, SessionAction, SessionStatus};
use super::error_messages::{AuthFailure, login_failure, registration_failure};
use ojt_http::types::RegistrationRequest;
use ojt_http::{OjtClient, User};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Re-validation; never outranks what the user did meanwhile
    Background,
    /// Login or registration; starts a new epoch when applied
    User,
}

/// Owner of the current session
pub struct SessionStore {
    client: OjtClient,
    state: watch::Sender<Session>,
    epoch: AtomicU64,
}

impl SessionStore {
    /// Create a store in the `Initializing` state
    pub fn new(client: OjtClient) -> Self {
        let (state, _) = watch::channel(Session::Initializing);
        Self {
            client,
            state,
            epoch: AtomicU64::new(0),
        }
    }

    /// Client sharing this store's cookies and refresh path
    pub const fn client(&self) -> &OjtClient {
        &self.client
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().current_user().cloned()
    }

    /// Observe every session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Wait until startup re-validation has settled
    pub async fn settled(&self) -> Session {
        let mut receiver = self.state.subscribe();
        let settled = receiver
            .wait_for(|session| !session.is_loading())
            .await
            .map(|session| Session::clone(&session));
        settled.unwrap_or_else(|_| self.session())
    }

    /// Re-validate at application start.
    ///
    /// Leaves `Initializing` on every path, including when this future is
    /// dropped before the check-auth call completes. A `reset` in the
    /// meantime hands that duty to the next `initialize`.
    pub async fn initialize(&self) -> SessionStatus {
        let _settle = SettleOnDrop {
            store: self,
            started: self.epoch.load(Ordering::Acquire),
        };
        self.revalidate().await
    }

    /// Ask the backend who the session cookie belongs to
    pub async fn revalidate(&self) -> SessionStatus {
        let started = self.epoch.load(Ordering::Acquire);

        let action = match self.client.check_auth().await {
            Ok(user) => {
                debug!(user = %user.username, role = %user.role, "session re-validated");
                SessionAction::Resolved(user)
            }
            Err(err) => {
                debug!(error = %err, "session re-validation failed");
                SessionAction::Rejected
            }
        };
        self.dispatch(started, action, Origin::Background);

        self.status()
    }

    /// Sign in with username and password.
    ///
    /// On failure the session is left as it was. If a logout or reset lands
    /// while the request is pending, the sign-in is discarded and
    /// [`AuthFailure::Superseded`] is returned.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthFailure> {
        let started = self.epoch.load(Ordering::Acquire);

        match self.client.login(username, password).await {
            Ok(user) => {
                if !self.dispatch(started, SessionAction::Resolved(user.clone()), Origin::User) {
                    return Err(AuthFailure::Superseded);
                }
                info!(user = %user.username, role = %user.role, "signed in");
                Ok(user)
            }
            Err(err) => {
                let failure = login_failure(err);
                info!(username, reason = %failure, "login rejected");
                Err(failure)
            }
        }
    }

    /// Create an account and sign in as it.
    ///
    /// Superseded the same way as [`login`](Self::login).
    pub async fn register(
        &self,
        registration: &RegistrationRequest,
    ) -> Result<User, AuthFailure> {
        let started = self.epoch.load(Ordering::Acquire);

        match self.client.register(registration).await {
            Ok(user) => {
                if !self.dispatch(started, SessionAction::Resolved(user.clone()), Origin::User) {
                    return Err(AuthFailure::Superseded);
                }
                info!(user = %user.username, role = %user.role, "registered and signed in");
                Ok(user)
            }
            Err(err) => {
                let failure = registration_failure(err);
                info!(username = %registration.username, reason = %failure, "registration rejected");
                Err(failure)
            }
        }
    }

    /// Sign out. The local session is cleared even if the backend call fails.
    pub async fn logout(&self) {
        if let Err(err) = self.client.logout().await {
            warn!(error = %err, "logout request failed, clearing local session anyway");
        }
        self.force(SessionAction::LoggedOut);
        info!("signed out");
    }

    /// Return to the state of a fresh application load
    pub fn reset(&self) {
        self.force(SessionAction::Reset);
    }

    /// Apply `action` unless a user-driven transition happened since `started`.
    /// Returns whether the action was applied.
    fn dispatch(&self, started: u64, action: SessionAction, origin: Origin) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|session| {
            if self.epoch.load(Ordering::Acquire) != started {
                return false;
            }
            if origin == Origin::User {
                self.epoch.fetch_add(1, Ordering::AcqRel);
            }
            applied = true;
            replace(session, action)
        });

        if !applied {
            debug!(?origin, "dropping stale session result");
        }
        applied
    }

    fn force(&self, action: SessionAction) {
        self.state.send_if_modified(|session| {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            replace(session, action)
        });
    }
}

/// Reduce in place; true if the session changed
fn replace(session: &mut Session, action: SessionAction) -> bool {
    let next = session.clone().reduce(action);
    if next == *session {
        return false;
    }
    *session = next;
    true
}

struct SettleOnDrop<'a> {
    store: &'a SessionStore,
    started: u64,
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        let store = self.store;
        store.state.send_if_modified(|session| {
            if !session.is_loading() || store.epoch.load(Ordering::Acquire) != self.started {
                return false;
            }
            *session = Session::Unauthenticated;
            true
        });
    }
}

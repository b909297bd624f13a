//! Authentication module

pub mod context;
pub mod error_messages;
pub mod guard;
pub mod store;

// Re-export commonly used items
pub use context::{Session, SessionAction, SessionStatus};
pub use error_messages::AuthFailure;
pub use guard::{Access, authorize};
pub use store::SessionStore;

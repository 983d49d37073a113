//! Application layer: session state, services and notifications
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod notify;
pub mod services;
pub mod session;

pub use error::{ApplicationError, ApplicationResult};
pub use notify::{Level, Notification, Outcome};
pub use session::{EditorMode, EditorSession, SyncDirection};

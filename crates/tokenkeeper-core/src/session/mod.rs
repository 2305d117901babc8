//! Session lifecycle: state machine, renewal scheduling, identity projection.

mod manager;
mod schedule;
mod state;

pub use manager::{DEFAULT_RENEW_SKEW, SessionManager, SessionManagerBuilder};
pub use state::{CurrentUser, SessionState, SessionStatus, project};

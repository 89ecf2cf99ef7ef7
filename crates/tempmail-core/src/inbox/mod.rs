//! Inbox state machine and its async controller shell.
//!
//! [`state`] is a pure state machine covering the session lifecycle
//! and the selection sub-state; [`controller`] drives it with a tokio
//! task, a scoped polling ticker, and spawned remote calls;
//! [`snapshot`] is the render contract handed to presentation layers.

mod controller;
mod snapshot;
mod state;

pub use controller::{ControllerConfig, InboxController, InboxHandle};
pub use snapshot::InboxSnapshot;
pub use state::SessionEpoch;

//! # tempmail-core
//!
//! Session and inbox controller for a disposable-email client.
//!
//! This crate owns the only component of the system with nontrivial
//! state: the lifecycle of a mailbox session (create, poll, replace)
//! together with the selection sub-state of the message being read.
//! The remote provider is reached through the [`Mailbox`] seam,
//! implemented for [`tempmail_api::MailboxClient`]; presentation
//! layers consume [`InboxSnapshot`] values from a watch channel and
//! feed user intent back through [`InboxHandle`].
//!
//! All state lives in memory for the lifetime of the controller.
//! There is no storage, no retry policy, and no ordering assumption on
//! the provider's message list.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod inbox;
mod mailbox;

pub use inbox::{ControllerConfig, InboxController, InboxHandle, InboxSnapshot, SessionEpoch};
pub use mailbox::Mailbox;

// Re-exported so embedders can depend on this crate alone.
pub use tempmail_api::{
    Attachment, MessageContent, MessageId, MessagePreview, Session, SessionToken,
};

//! # tempmail-api
//!
//! Typed HTTP client for a disposable-mailbox provider.
//!
//! This crate wraps the provider's four remote operations as typed
//! calls and translates its loosely-shaped JSON payloads into a strict
//! internal data model:
//! - request a temporary address and session token
//! - list the messages received by that address
//! - fetch the full content of a single message
//! - delete messages
//!
//! Transport and shape failures surface as the typed errors in
//! [`error`], with one deliberate exception: [`MailboxClient::list_messages`]
//! swallows every failure into an empty list, because the list call is
//! driven by a polling loop that must never disturb the user.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
pub mod error;
mod model;
mod wire;

pub use client::{ClientConfig, DEFAULT_BASE_URL, MailboxClient};
pub use error::{ConfigError, DeleteError, FetchError, PollError, SessionError};
pub use model::{Attachment, MessageContent, MessageId, MessagePreview, Session, SessionToken};

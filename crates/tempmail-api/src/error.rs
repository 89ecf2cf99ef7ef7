//! Error types for remote mailbox operations.
//!
//! One enum per failure class. Polling failures have no type here:
//! [`crate::MailboxClient::list_messages`] suppresses them by design.

use reqwest::StatusCode;

/// Errors from building a [`crate::MailboxClient`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configured base URL does not parse.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors from session creation (`get_email_address`).
///
/// Fatal to the current attempt; the caller decides whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned {0}")]
    Status(StatusCode),

    /// Payload decoded but is missing the address or token.
    #[error("malformed session payload: {0}")]
    MalformedResponse(String),
}

/// Errors from fetching a single message's content.
///
/// Local to that message; does not affect the session or polling.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned {0}")]
    Status(StatusCode),

    /// Response carried no message body.
    #[error("message {0} has no body in the provider response")]
    MissingBody(u64),

    /// Payload shape did not match the expected message envelope.
    #[error("malformed message payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors from one inbox poll (`check_email`).
///
/// Fully suppressed along the user-facing path: the polling loop
/// treats a failed cycle as "no update" and the UI never sees it.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned {0}")]
    Status(StatusCode),

    /// Payload shape did not match the expected inbox envelope.
    #[error("malformed inbox payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors from deleting messages.
///
/// The provider reports no partial success, so any non-success status
/// is treated as total failure. Callers log these and move on.
#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned {0}")]
    Status(StatusCode),
}

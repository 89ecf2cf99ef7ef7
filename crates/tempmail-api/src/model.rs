//! Strict internal data model.
//!
//! The wire layer normalizes the provider's loosely-typed payloads
//! into these types; everything above this crate works only with them.

use serde::{Deserialize, Serialize};

/// Opaque session credential issued by the mailbox provider.
///
/// Required on every call after session creation. Implicitly
/// invalidated whenever a new address is generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    /// Creates a token from its string form.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An active mailbox session: a temporary address plus its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The disposable email address.
    pub address: String,
    /// Credential for subsequent calls against this address.
    pub token: SessionToken,
}

/// Identifier of a message, unique within one session.
///
/// Provider-assigned; carries no meaning across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Returns the underlying value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lightweight list-row representation of a received message.
///
/// Ordering of previews is whatever the provider returned; this crate
/// never sorts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePreview {
    /// Message identifier.
    pub id: MessageId,
    /// Sender address as reported by the provider.
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Arrival timestamp, kept as the provider's opaque string.
    pub timestamp: String,
    /// Whether the provider flagged the message as carrying attachments.
    pub has_attachment: bool,
}

/// Full message body plus attachments, fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent {
    /// Message identifier; always equals the preview id that
    /// triggered the fetch.
    pub id: MessageId,
    /// Sender address.
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Arrival timestamp, provider string.
    pub timestamp: String,
    /// HTML body as delivered by the provider.
    pub body_html: String,
    /// Attachments in provider order; empty when the message has none.
    pub attachments: Vec<Attachment>,
}

/// A single attachment of a fetched message.
///
/// Exists only as part of a [`MessageContent`]; never persisted on its
/// own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename as reported by the provider.
    pub filename: String,
    /// MIME content type.
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Derived download locator (token + message id + part id baked
    /// into a provider URL).
    pub download_url: String,
}

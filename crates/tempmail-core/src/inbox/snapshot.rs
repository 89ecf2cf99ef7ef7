//! Render contract between the controller and a presentation layer.

use std::sync::Arc;

use tempmail_api::{MessageContent, MessageId, MessagePreview};

/// Everything a presentation surface needs to render the inbox.
///
/// Published through a watch channel after every state change. The
/// message list is shared behind an [`Arc`] that is swapped only when
/// a poll result differs structurally from the current list, so
/// renderers may use pointer identity to skip redraws.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InboxSnapshot {
    /// The current disposable address, once a session is active.
    pub address: Option<String>,
    /// A session-generation call is in flight.
    pub generating: bool,
    /// An inbox refresh is in flight.
    pub checking: bool,
    /// Message previews in provider order.
    pub messages: Arc<Vec<MessagePreview>>,
    /// Id of the message the user selected, if any.
    pub selected: Option<MessageId>,
    /// A content fetch for the selected message is in flight.
    pub loading_message: bool,
    /// Content of the selected message, once loaded.
    pub content: Option<MessageContent>,
    /// User-facing error line, if the last session creation or content
    /// fetch failed. Poll and delete failures never surface here.
    pub error: Option<String>,
}

//! The seam between the controller and the remote mailbox provider.

use std::future::Future;

use tempmail_api::{
    DeleteError, FetchError, MessageContent, MessageId, MessagePreview, PollError, Session,
    SessionError, SessionToken,
};

/// Remote mailbox operations as seen by the controller.
///
/// Mirrors [`tempmail_api::MailboxClient`]; tests substitute a
/// scripted implementation to drive the controller deterministically.
/// Futures must be `Send` because the controller runs each call in a
/// spawned task, parameterized with the session token captured at
/// initiation.
pub trait Mailbox: Send + Sync + 'static {
    /// Requests a new temporary address and session token.
    fn create_session(&self) -> impl Future<Output = Result<Session, SessionError>> + Send;

    /// Lists received messages. The controller suppresses failures as
    /// "no update this cycle", so an error here never clears the list
    /// and never reaches the user.
    fn list_messages(
        &self,
        token: &SessionToken,
    ) -> impl Future<Output = Result<Vec<MessagePreview>, PollError>> + Send;

    /// Fetches the full content of one message.
    fn fetch_message(
        &self,
        token: &SessionToken,
        id: MessageId,
    ) -> impl Future<Output = Result<MessageContent, FetchError>> + Send;

    /// Deletes the given messages remotely.
    fn delete_messages(
        &self,
        token: &SessionToken,
        ids: &[MessageId],
    ) -> impl Future<Output = Result<(), DeleteError>> + Send;
}

impl Mailbox for tempmail_api::MailboxClient {
    async fn create_session(&self) -> Result<Session, SessionError> {
        Self::create_session(self).await
    }

    async fn list_messages(&self, token: &SessionToken) -> Result<Vec<MessagePreview>, PollError> {
        self.try_list_messages(token).await
    }

    async fn fetch_message(
        &self,
        token: &SessionToken,
        id: MessageId,
    ) -> Result<MessageContent, FetchError> {
        Self::fetch_message(self, token, id).await
    }

    async fn delete_messages(
        &self,
        token: &SessionToken,
        ids: &[MessageId],
    ) -> Result<(), DeleteError> {
        Self::delete_messages(self, token, ids).await
    }
}

//! HTTP client for the remote mailbox provider.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ConfigError, DeleteError, FetchError, PollError, SessionError};
use crate::model::{
    Attachment, MessageContent, MessageId, MessagePreview, Session, SessionToken,
};
use crate::wire::{AddressPayload, InboxPayload, MessagePayload};

/// Default provider endpoint (Guerrilla Mail AJAX API).
pub const DEFAULT_BASE_URL: &str = "https://api.guerrillamail.com/ajax.php";

/// Configuration for [`MailboxClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Provider endpoint. All operations are query parameters against
    /// this single URL.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
            user_agent: concat!("tempmail/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Typed wrapper around the provider's four remote operations.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct MailboxClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MailboxClient {
    /// Creates a client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP
    /// client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Creates a client against the default provider endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(ClientConfig::default())
    }

    /// Requests a new temporary address and session token.
    ///
    /// No retries; the caller decides whether and when to try again.
    ///
    /// # Errors
    ///
    /// Fails if the provider is unreachable, answers with a non-success
    /// status, or returns a payload missing the address or token.
    pub async fn create_session(&self) -> Result<Session, SessionError> {
        let url = self.endpoint(&[("f", "get_email_address")]);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status(status));
        }

        let body = response.bytes().await?;
        let payload: AddressPayload = serde_json::from_slice(&body)
            .map_err(|e| SessionError::MalformedResponse(e.to_string()))?;

        let address = payload
            .email_addr
            .filter(|a| !a.is_empty())
            .ok_or_else(|| SessionError::MalformedResponse("missing email_addr".to_string()))?;
        let token = payload
            .sid_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SessionError::MalformedResponse("missing sid_token".to_string()))?;

        debug!(%address, "created mailbox session");
        Ok(Session {
            address,
            token: SessionToken::new(token),
        })
    }

    /// Lists the messages received by the session's address.
    ///
    /// This call backs a polling loop, so it never fails: any
    /// transport, status, or parse problem is logged and reported as
    /// an empty list. An empty list is indistinguishable from "no new
    /// mail" by design.
    pub async fn list_messages(&self, token: &SessionToken) -> Vec<MessagePreview> {
        match self.try_list_messages(token).await {
            Ok(previews) => previews,
            Err(error) => {
                warn!(%error, "inbox poll failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Fallible variant of [`Self::list_messages`], for callers that
    /// need to tell a failed cycle apart from a genuinely empty inbox
    /// (the polling controller treats a failure as "no update" rather
    /// than an empty list).
    ///
    /// # Errors
    ///
    /// Fails on transport problems, non-success statuses, and
    /// malformed payloads.
    pub async fn try_list_messages(
        &self,
        token: &SessionToken,
    ) -> Result<Vec<MessagePreview>, PollError> {
        let url = self.endpoint(&[
            ("f", "check_email"),
            ("seq", "0"),
            ("sid_token", token.as_str()),
        ]);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status));
        }

        let body = response.bytes().await?;
        let payload: InboxPayload = serde_json::from_slice(&body)?;

        Ok(payload
            .list
            .into_iter()
            .map(|row| MessagePreview {
                id: MessageId(row.mail_id),
                sender: row.mail_from,
                subject: row.mail_subject,
                timestamp: row.mail_date,
                has_attachment: row.att,
            })
            .collect())
    }

    /// Fetches the full content of one message.
    ///
    /// # Errors
    ///
    /// Fails on transport problems, non-success statuses, malformed
    /// payloads, and responses lacking a message body.
    pub async fn fetch_message(
        &self,
        token: &SessionToken,
        id: MessageId,
    ) -> Result<MessageContent, FetchError> {
        let url = self.endpoint(&[
            ("f", "fetch_email"),
            ("email_id", &id.to_string()),
            ("sid_token", token.as_str()),
        ]);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        let payload: MessagePayload = serde_json::from_slice(&body)?;

        let body_html = payload
            .mail_body
            .ok_or(FetchError::MissingBody(id.get()))?;

        let attachments = payload
            .att_info
            .into_iter()
            .enumerate()
            .map(|(index, att)| {
                // Providers that omit the part id get the 1-based
                // position, which is stable within this response.
                let part_id = att
                    .part_id
                    .unwrap_or_else(|| (index + 1).to_string());
                Attachment {
                    filename: att.filename,
                    content_type: att.content_type,
                    size_bytes: att.size.unwrap_or(0),
                    download_url: download_url(&self.base_url, token, id, &part_id),
                }
            })
            .collect();

        Ok(MessageContent {
            id: MessageId(payload.mail_id),
            sender: payload.mail_from,
            subject: payload.mail_subject,
            timestamp: payload.mail_date,
            body_html,
            attachments,
        })
    }

    /// Deletes the given messages from the remote mailbox.
    ///
    /// The provider reports no partial success; any non-success status
    /// is total failure.
    ///
    /// # Errors
    ///
    /// Fails on transport problems or a non-success status.
    pub async fn delete_messages(
        &self,
        token: &SessionToken,
        ids: &[MessageId],
    ) -> Result<(), DeleteError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut form: Vec<(&str, String)> = vec![
            ("f", "del_email".to_string()),
            ("sid_token", token.as_str().to_string()),
        ];
        form.extend(ids.iter().map(|id| ("email_ids[]", id.to_string())));

        let response = self
            .http
            .post(self.base_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeleteError::Status(status));
        }

        debug!(count = ids.len(), "deleted messages");
        Ok(())
    }

    /// Builds the endpoint URL with the given query parameters.
    fn endpoint(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().extend_pairs(params);
        url
    }
}

/// Derives the download locator for an attachment from the session
/// token, the message id, and the part identifier.
fn download_url(base: &Url, token: &SessionToken, id: MessageId, part_id: &str) -> String {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("f", "fetch_attachment")
        .append_pair("sid_token", token.as_str())
        .append_pair("email_id", &id.to_string())
        .append_pair("part_id", part_id);
    url.into()
}

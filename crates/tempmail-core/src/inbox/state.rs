//! Pure inbox state machine.
//!
//! Every remote call is initiated through a `begin_*` method that
//! hands back the [`SessionEpoch`] and token current at initiation,
//! and completed through a `finish_*` method that drops the result if
//! the epoch (or, for fetches, the selection) has moved on. The
//! controller shell owns the timers and tasks; nothing in this module
//! is async.

use std::sync::Arc;

use tracing::{debug, warn};

use tempmail_api::{
    FetchError, MessageContent, MessageId, MessagePreview, PollError, Session, SessionError,
    SessionToken,
};

use super::snapshot::InboxSnapshot;

/// Error line shown when session creation fails.
const GENERATE_FAILED: &str = "Failed to generate a new email address. Please try again.";
/// Error line shown when a content fetch fails.
const LOAD_FAILED: &str = "Could not load email content.";

/// Generation counter for session lifetimes.
///
/// Bumped every time a new session begins. Results of remote calls
/// carry the epoch captured at initiation; anything tagged with an
/// older epoch is stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    /// Returns the next epoch.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session lifecycle phase.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    /// No session; the user must request an address.
    Idle,
    /// A session-generation call is in flight.
    Generating,
    /// A session is active and being polled.
    Active(Session),
}

/// Selection sub-state, orthogonal to the session phase.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Detail {
    /// Nothing selected.
    None,
    /// A content fetch for this message is in flight.
    Loading(MessageId),
    /// Content is loaded and displayed.
    Loaded(Box<MessageContent>),
    /// The fetch for this message failed.
    Failed(MessageId),
}

/// The inbox state machine.
#[derive(Debug)]
pub(super) struct InboxState {
    epoch: SessionEpoch,
    phase: Phase,
    messages: Arc<Vec<MessagePreview>>,
    detail: Detail,
    error: Option<String>,
    /// An inbox refresh tagged with the current epoch is in flight.
    checking: bool,
}

impl InboxState {
    pub(super) fn new() -> Self {
        Self {
            epoch: SessionEpoch::default(),
            phase: Phase::Idle,
            messages: Arc::new(Vec::new()),
            detail: Detail::None,
            error: None,
            checking: false,
        }
    }

    /// Starts a new session, clearing all prior state before the
    /// remote call resolves. Returns the epoch to tag the call with;
    /// everything still in flight from the previous session is
    /// invalidated by the bump.
    pub(super) fn begin_session(&mut self) -> SessionEpoch {
        self.epoch = self.epoch.next();
        self.phase = Phase::Generating;
        self.messages = Arc::new(Vec::new());
        self.detail = Detail::None;
        self.error = None;
        self.checking = false;
        self.epoch
    }

    /// Applies the result of a session-generation call. On success,
    /// returns the token the caller should start polling with.
    pub(super) fn finish_session(
        &mut self,
        epoch: SessionEpoch,
        result: Result<Session, SessionError>,
    ) -> Option<SessionToken> {
        if epoch != self.epoch {
            debug!(%epoch, current = %self.epoch, "dropping stale session result");
            return None;
        }
        match result {
            Ok(session) => {
                let token = session.token.clone();
                debug!(address = %session.address, "session active");
                self.phase = Phase::Active(session);
                Some(token)
            }
            Err(error) => {
                warn!(%error, "session creation failed");
                self.phase = Phase::Idle;
                self.error = Some(GENERATE_FAILED.to_string());
                None
            }
        }
    }

    /// Starts an inbox refresh if a session is active and none is
    /// already in flight. Returns the epoch and token to call with.
    pub(super) fn begin_poll(&mut self) -> Option<(SessionEpoch, SessionToken)> {
        if self.checking {
            return None;
        }
        match &self.phase {
            Phase::Active(session) => {
                self.checking = true;
                Some((self.epoch, session.token.clone()))
            }
            Phase::Idle | Phase::Generating => None,
        }
    }

    /// Applies a poll result. A failed cycle is suppressed entirely:
    /// the list stays as it was and no error surfaces. A successful
    /// cycle replaces the list only when it differs structurally from
    /// the current one, so an unchanged inbox keeps the same `Arc`.
    /// Returns whether the list was replaced.
    pub(super) fn finish_poll(
        &mut self,
        epoch: SessionEpoch,
        result: Result<Vec<MessagePreview>, PollError>,
    ) -> bool {
        if epoch != self.epoch {
            debug!(%epoch, current = %self.epoch, "dropping stale poll result");
            return false;
        }
        self.checking = false;
        match result {
            Ok(previews) => {
                if *self.messages == previews {
                    return false;
                }
                self.messages = Arc::new(previews);
                true
            }
            Err(error) => {
                warn!(%error, "inbox poll failed, no update this cycle");
                false
            }
        }
    }

    /// Selects a message and starts a content fetch, clearing any
    /// prior content. Returns the epoch and token to call with, or
    /// `None` when no session is active.
    pub(super) fn begin_fetch(&mut self, id: MessageId) -> Option<(SessionEpoch, SessionToken)> {
        match &self.phase {
            Phase::Active(session) => {
                self.detail = Detail::Loading(id);
                Some((self.epoch, session.token.clone()))
            }
            Phase::Idle | Phase::Generating => None,
        }
    }

    /// Applies a content-fetch result. Dropped silently when the
    /// session changed or the selection moved on while the call was in
    /// flight; a payload whose id does not match the request is
    /// treated as a failed load.
    pub(super) fn finish_fetch(
        &mut self,
        epoch: SessionEpoch,
        id: MessageId,
        result: Result<MessageContent, FetchError>,
    ) {
        if epoch != self.epoch {
            debug!(%epoch, current = %self.epoch, "dropping stale fetch result");
            return;
        }
        if self.detail != Detail::Loading(id) {
            debug!(%id, "selection changed mid-flight, dropping fetch result");
            return;
        }
        match result {
            Ok(content) if content.id == id => {
                self.detail = Detail::Loaded(Box::new(content));
            }
            Ok(content) => {
                warn!(requested = %id, received = %content.id, "fetched content id mismatch");
                self.detail = Detail::Failed(id);
                self.error = Some(LOAD_FAILED.to_string());
            }
            Err(error) => {
                warn!(%id, %error, "content fetch failed");
                self.detail = Detail::Failed(id);
                self.error = Some(LOAD_FAILED.to_string());
            }
        }
    }

    /// Optimistically removes messages from the local list, clearing
    /// the selection if it was removed. Returns the token for the
    /// background delete call when a session is active. The removal
    /// stands regardless of the remote outcome; the next poll
    /// reconciles.
    pub(super) fn remove_messages(&mut self, ids: &[MessageId]) -> Option<SessionToken> {
        let retained: Vec<MessagePreview> = self
            .messages
            .iter()
            .filter(|m| !ids.contains(&m.id))
            .cloned()
            .collect();
        if retained.len() != self.messages.len() {
            self.messages = Arc::new(retained);
        }
        if self.selection().is_some_and(|sel| ids.contains(&sel)) {
            self.detail = Detail::None;
        }
        match &self.phase {
            Phase::Active(session) => Some(session.token.clone()),
            Phase::Idle | Phase::Generating => None,
        }
    }

    /// Clears the selection and content without touching the session
    /// or polling.
    pub(super) fn close_detail(&mut self) {
        self.detail = Detail::None;
    }

    /// The currently selected message id, if any.
    pub(super) fn selection(&self) -> Option<MessageId> {
        match &self.detail {
            Detail::None => None,
            Detail::Loading(id) | Detail::Failed(id) => Some(*id),
            Detail::Loaded(content) => Some(content.id),
        }
    }

    /// Renders the state for the presentation layer.
    pub(super) fn snapshot(&self) -> InboxSnapshot {
        InboxSnapshot {
            address: match &self.phase {
                Phase::Active(session) => Some(session.address.clone()),
                Phase::Idle | Phase::Generating => None,
            },
            generating: self.phase == Phase::Generating,
            checking: self.checking,
            messages: Arc::clone(&self.messages),
            selected: self.selection(),
            loading_message: matches!(self.detail, Detail::Loading(_)),
            content: match &self.detail {
                Detail::Loaded(content) => Some((**content).clone()),
                Detail::None | Detail::Loading(_) | Detail::Failed(_) => None,
            },
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::similar_names)]
mod tests {
    use super::*;
    use tempmail_api::Session;

    fn session(address: &str, token: &str) -> Session {
        Session {
            address: address.to_string(),
            token: SessionToken::new(token),
        }
    }

    fn preview(id: u64) -> MessagePreview {
        MessagePreview {
            id: MessageId(id),
            sender: format!("sender{id}@example.com"),
            subject: format!("subject {id}"),
            timestamp: "12:00:01".to_string(),
            has_attachment: false,
        }
    }

    fn content(id: u64) -> MessageContent {
        MessageContent {
            id: MessageId(id),
            sender: format!("sender{id}@example.com"),
            subject: format!("subject {id}"),
            timestamp: "12:00:01".to_string(),
            body_html: "<p>hello</p>".to_string(),
            attachments: Vec::new(),
        }
    }

    /// State with an active session, ready to poll.
    fn active_state() -> InboxState {
        let mut state = InboxState::new();
        let epoch = state.begin_session();
        state
            .finish_session(epoch, Ok(session("a@example.com", "tok1")))
            .unwrap();
        state
    }

    fn apply_poll(state: &mut InboxState, previews: Vec<MessagePreview>) -> bool {
        let (epoch, _token) = state.begin_poll().unwrap();
        state.finish_poll(epoch, Ok(previews))
    }

    fn poll_error() -> PollError {
        PollError::Malformed(serde_json::from_str::<()>("not json").unwrap_err())
    }

    mod session_lifecycle {
        use super::*;

        #[test]
        fn success_activates_and_exposes_address() {
            let mut state = InboxState::new();
            let epoch = state.begin_session();
            assert!(state.snapshot().generating);

            let token = state.finish_session(epoch, Ok(session("a@example.com", "tok1")));
            assert_eq!(token, Some(SessionToken::new("tok1")));

            let snap = state.snapshot();
            assert_eq!(snap.address.as_deref(), Some("a@example.com"));
            assert!(!snap.generating);
            assert!(snap.error.is_none());
        }

        #[test]
        fn failure_returns_to_idle_with_error() {
            let mut state = InboxState::new();
            let epoch = state.begin_session();
            let token = state.finish_session(
                epoch,
                Err(SessionError::MalformedResponse("missing sid_token".to_string())),
            );
            assert!(token.is_none());

            let snap = state.snapshot();
            assert!(snap.address.is_none());
            assert!(!snap.generating);
            assert!(snap.error.is_some());
        }

        #[test]
        fn new_address_clears_everything_before_resolution() {
            let mut state = active_state();
            apply_poll(&mut state, vec![preview(1), preview(2)]);
            let (epoch, _token) = state.begin_fetch(MessageId(1)).unwrap();
            state.finish_fetch(epoch, MessageId(1), Ok(content(1)));

            // User asks for a new address; the old one is gone at once.
            state.begin_session();
            let snap = state.snapshot();
            assert!(snap.messages.is_empty());
            assert!(snap.selected.is_none());
            assert!(snap.content.is_none());
            assert!(snap.error.is_none());
            assert!(snap.address.is_none());
        }

        #[test]
        fn stale_session_result_is_dropped() {
            let mut state = InboxState::new();
            let old_epoch = state.begin_session();
            let new_epoch = state.begin_session();

            // The superseded call resolves late; its session is ignored.
            let token = state.finish_session(old_epoch, Ok(session("old@example.com", "tokOld")));
            assert!(token.is_none());
            assert!(state.snapshot().generating);

            let token = state.finish_session(new_epoch, Ok(session("new@example.com", "tokNew")));
            assert_eq!(token, Some(SessionToken::new("tokNew")));
            assert_eq!(state.snapshot().address.as_deref(), Some("new@example.com"));
        }
    }

    mod polling {
        use super::*;

        #[test]
        fn equal_poll_keeps_the_same_list_instance() {
            let mut state = active_state();
            assert!(apply_poll(&mut state, vec![preview(1)]));
            let first = state.snapshot().messages;

            assert!(!apply_poll(&mut state, vec![preview(1)]));
            let second = state.snapshot().messages;
            assert!(Arc::ptr_eq(&first, &second));
        }

        #[test]
        fn list_grows_and_existing_entry_is_preserved() {
            let mut state = active_state();
            apply_poll(&mut state, vec![preview(1)]);
            assert_eq!(state.snapshot().messages.len(), 1);

            apply_poll(&mut state, vec![preview(1), preview(2)]);
            let snap = state.snapshot();
            assert_eq!(snap.messages.len(), 2);
            assert_eq!(snap.messages[0], preview(1));
            assert_eq!(snap.messages[1].id, MessageId(2));
        }

        #[test]
        fn failed_poll_leaves_the_list_unchanged() {
            let mut state = active_state();
            apply_poll(&mut state, vec![preview(1)]);
            let before = state.snapshot().messages;

            let (epoch, _token) = state.begin_poll().unwrap();
            assert!(!state.finish_poll(epoch, Err(poll_error())));

            let snap = state.snapshot();
            assert!(Arc::ptr_eq(&before, &snap.messages));
            assert!(snap.error.is_none());
            assert!(!snap.checking);
        }

        #[test]
        fn stale_poll_is_dropped_after_session_change() {
            let mut state = active_state();
            let (old_epoch, _token) = state.begin_poll().unwrap();

            let new_epoch = state.begin_session();
            state
                .finish_session(new_epoch, Ok(session("b@example.com", "tok2")))
                .unwrap();

            assert!(!state.finish_poll(old_epoch, Ok(vec![preview(9)])));
            assert!(state.snapshot().messages.is_empty());
        }

        #[test]
        fn polls_coalesce_while_one_is_in_flight() {
            let mut state = active_state();
            let first = state.begin_poll();
            assert!(first.is_some());
            assert!(state.begin_poll().is_none());

            let (epoch, _token) = first.unwrap();
            state.finish_poll(epoch, Ok(Vec::new()));
            assert!(state.begin_poll().is_some());
        }

        #[test]
        fn no_poll_without_an_active_session() {
            let mut state = InboxState::new();
            assert!(state.begin_poll().is_none());
            state.begin_session();
            assert!(state.begin_poll().is_none());
        }

        #[test]
        fn poll_does_not_touch_selection() {
            let mut state = active_state();
            apply_poll(&mut state, vec![preview(1)]);
            let (epoch, _token) = state.begin_fetch(MessageId(1)).unwrap();
            state.finish_fetch(epoch, MessageId(1), Ok(content(1)));

            apply_poll(&mut state, vec![preview(1), preview(2)]);
            let snap = state.snapshot();
            assert_eq!(snap.selected, Some(MessageId(1)));
            assert!(snap.content.is_some());
        }
    }

    mod selection {
        use super::*;

        #[test]
        fn fetch_success_loads_content() {
            let mut state = active_state();
            let (epoch, _token) = state.begin_fetch(MessageId(3)).unwrap();
            assert!(state.snapshot().loading_message);

            state.finish_fetch(epoch, MessageId(3), Ok(content(3)));
            let snap = state.snapshot();
            assert!(!snap.loading_message);
            assert_eq!(snap.content.unwrap().id, MessageId(3));
        }

        #[test]
        fn fetch_failure_surfaces_error_but_keeps_session() {
            let mut state = active_state();
            let (epoch, _token) = state.begin_fetch(MessageId(3)).unwrap();
            state.finish_fetch(epoch, MessageId(3), Err(FetchError::MissingBody(3)));

            let snap = state.snapshot();
            assert!(snap.content.is_none());
            assert!(snap.error.is_some());
            assert_eq!(snap.address.as_deref(), Some("a@example.com"));
            assert_eq!(snap.selected, Some(MessageId(3)));
        }

        #[test]
        fn late_fetch_does_not_overwrite_new_selection() {
            let mut state = active_state();
            let (epoch_a, _token) = state.begin_fetch(MessageId(1)).unwrap();
            let (epoch_b, _token) = state.begin_fetch(MessageId(2)).unwrap();

            // The fetch for message 1 resolves after the user moved to
            // message 2; it must be dropped silently.
            state.finish_fetch(epoch_a, MessageId(1), Ok(content(1)));
            assert!(state.snapshot().loading_message);
            assert_eq!(state.selection(), Some(MessageId(2)));

            state.finish_fetch(epoch_b, MessageId(2), Ok(content(2)));
            assert_eq!(state.snapshot().content.unwrap().id, MessageId(2));
        }

        #[test]
        fn fetch_result_after_session_change_is_dropped() {
            let mut state = active_state();
            let (old_epoch, _token) = state.begin_fetch(MessageId(1)).unwrap();

            let new_epoch = state.begin_session();
            state
                .finish_session(new_epoch, Ok(session("b@example.com", "tok2")))
                .unwrap();
            let (fetch_epoch, _token) = state.begin_fetch(MessageId(1)).unwrap();

            // Same id, previous session: still stale.
            state.finish_fetch(old_epoch, MessageId(1), Ok(content(1)));
            assert!(state.snapshot().content.is_none());

            state.finish_fetch(fetch_epoch, MessageId(1), Ok(content(1)));
            assert!(state.snapshot().content.is_some());
        }

        #[test]
        fn mismatched_content_id_is_a_failed_load() {
            let mut state = active_state();
            let (epoch, _token) = state.begin_fetch(MessageId(1)).unwrap();
            state.finish_fetch(epoch, MessageId(1), Ok(content(2)));

            let snap = state.snapshot();
            assert!(snap.content.is_none());
            assert!(snap.error.is_some());
        }

        #[test]
        fn close_detail_clears_selection_only() {
            let mut state = active_state();
            apply_poll(&mut state, vec![preview(1)]);
            let (epoch, _token) = state.begin_fetch(MessageId(1)).unwrap();
            state.finish_fetch(epoch, MessageId(1), Ok(content(1)));

            state.close_detail();
            let snap = state.snapshot();
            assert!(snap.selected.is_none());
            assert!(snap.content.is_none());
            assert_eq!(snap.messages.len(), 1);
            assert_eq!(snap.address.as_deref(), Some("a@example.com"));
        }
    }

    mod deletion {
        use super::*;

        #[test]
        fn delete_removes_locally_before_remote_resolution() {
            let mut state = active_state();
            apply_poll(&mut state, vec![preview(1), preview(5)]);

            let token = state.remove_messages(&[MessageId(5)]);
            assert_eq!(token, Some(SessionToken::new("tok1")));

            let snap = state.snapshot();
            assert_eq!(snap.messages.len(), 1);
            assert_eq!(snap.messages[0].id, MessageId(1));
        }

        #[test]
        fn deleting_the_selected_message_clears_the_detail_view() {
            let mut state = active_state();
            apply_poll(&mut state, vec![preview(1), preview(5)]);
            let (epoch, _token) = state.begin_fetch(MessageId(5)).unwrap();
            state.finish_fetch(epoch, MessageId(5), Ok(content(5)));

            state.remove_messages(&[MessageId(5)]);
            let snap = state.snapshot();
            assert!(snap.selected.is_none());
            assert!(snap.content.is_none());
            assert!(!snap.messages.iter().any(|m| m.id == MessageId(5)));
        }

        #[test]
        fn deleting_an_unselected_message_keeps_the_detail_view() {
            let mut state = active_state();
            apply_poll(&mut state, vec![preview(1), preview(2)]);
            let (epoch, _token) = state.begin_fetch(MessageId(1)).unwrap();
            state.finish_fetch(epoch, MessageId(1), Ok(content(1)));

            state.remove_messages(&[MessageId(2)]);
            let snap = state.snapshot();
            assert_eq!(snap.selected, Some(MessageId(1)));
            assert!(snap.content.is_some());
        }
    }
}

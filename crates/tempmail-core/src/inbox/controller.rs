//! Async shell around the inbox state machine.
//!
//! One driver task owns the state and serializes every mutation.
//! Remote calls run in spawned tasks parameterized with the epoch and
//! token captured at initiation; their results come back as events and
//! pass through the state machine's staleness guards. The polling
//! ticker is a scoped task tied to the active session: replaced on
//! session change, aborted on drop, so it cannot outlive its session
//! on any exit path.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tempmail_api::{
    FetchError, MessageContent, MessageId, MessagePreview, PollError, Session, SessionError,
};

use crate::mailbox::Mailbox;

use super::snapshot::InboxSnapshot;
use super::state::{InboxState, SessionEpoch};

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Inbox refresh cadence while a session is active.
    pub poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// User intent, fed in through [`InboxHandle`].
#[derive(Debug)]
enum Command {
    GenerateNewAddress,
    RefreshNow,
    SelectMessage(MessageId),
    DeleteMessages(Vec<MessageId>),
    CloseDetail,
    Shutdown,
}

/// Completion of a remote call, tagged with the epoch captured when
/// the call was initiated.
#[derive(Debug)]
enum Event {
    SessionResolved {
        epoch: SessionEpoch,
        result: Result<Session, SessionError>,
    },
    PollTick,
    PollResolved {
        epoch: SessionEpoch,
        result: Result<Vec<MessagePreview>, PollError>,
    },
    FetchResolved {
        epoch: SessionEpoch,
        id: MessageId,
        result: Result<MessageContent, FetchError>,
    },
}

/// Scoped polling ticker. Aborting on drop guarantees the timer dies
/// with its session on every exit path, including error paths during
/// session replacement.
#[derive(Debug)]
struct PollTicker {
    handle: JoinHandle<()>,
}

impl PollTicker {
    fn spawn(interval: Duration, events: mpsc::UnboundedSender<Event>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                // First tick fires immediately, giving the initial
                // list call on session entry.
                ticker.tick().await;
                if events.send(Event::PollTick).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for PollTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Handle to a running [`InboxController`].
///
/// Cloneable; commands from all clones are serialized by the driver
/// task. The controller tears down when [`Self::shutdown`] is called
/// or every handle is dropped.
#[derive(Debug, Clone)]
pub struct InboxHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<InboxSnapshot>,
}

impl InboxHandle {
    /// Discards the current session and requests a fresh address.
    pub fn generate_new_address(&self) {
        self.send(Command::GenerateNewAddress);
    }

    /// Triggers an immediate inbox refresh, off-cadence.
    pub fn refresh_now(&self) {
        self.send(Command::RefreshNow);
    }

    /// Selects a message and fetches its content.
    pub fn select_message(&self, id: MessageId) {
        self.send(Command::SelectMessage(id));
    }

    /// Deletes one message, locally at once and remotely in the
    /// background.
    pub fn delete_message(&self, id: MessageId) {
        self.delete_messages(vec![id]);
    }

    /// Deletes several messages, locally at once and remotely in the
    /// background.
    pub fn delete_messages(&self, ids: Vec<MessageId>) {
        self.send(Command::DeleteMessages(ids));
    }

    /// Closes the detail view without touching the session or polling.
    pub fn close_detail(&self) {
        self.send(Command::CloseDetail);
    }

    /// Stops the controller and its polling ticker.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> InboxSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A watch receiver for render-on-change consumers.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<InboxSnapshot> {
        self.snapshots.clone()
    }

    fn send(&self, command: Command) {
        // The controller being gone just makes the handle inert.
        if self.commands.send(command).is_err() {
            debug!("command dropped, controller is shut down");
        }
    }
}

/// Drives the inbox state machine.
///
/// Owns the session token and polling timer as plain fields with an
/// explicit lifecycle; nothing here is ambient or global.
pub struct InboxController<M: Mailbox> {
    mailbox: Arc<M>,
    config: ControllerConfig,
    state: InboxState,
    commands: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    snapshots: watch::Sender<InboxSnapshot>,
    ticker: Option<PollTicker>,
}

impl<M: Mailbox> InboxController<M> {
    /// Spawns the controller and immediately requests a first address,
    /// mirroring a page load.
    pub fn spawn(mailbox: M, config: ControllerConfig) -> InboxHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(InboxSnapshot::default());

        let controller = Self {
            mailbox: Arc::new(mailbox),
            config,
            state: InboxState::new(),
            commands: commands_rx,
            events_tx,
            events_rx,
            snapshots: snapshots_tx,
            ticker: None,
        };
        tokio::spawn(controller.run());

        let handle = InboxHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        };
        handle.generate_new_address();
        handle
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        None => break,
                        Some(command) => {
                            if !self.handle_command(command) {
                                break;
                            }
                        }
                    }
                }
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
            self.publish();
        }
        debug!("inbox controller shutting down");
        // Dropping the ticker aborts it; results of any outstanding
        // remote call have nowhere to go.
    }

    /// Applies one command. Returns `false` when the controller should
    /// stop.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::GenerateNewAddress => {
                // The old session's ticker dies before the new session
                // begins; its in-flight results are staled by the
                // epoch bump.
                self.ticker = None;
                let epoch = self.state.begin_session();
                let mailbox = Arc::clone(&self.mailbox);
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = mailbox.create_session().await;
                    let _ = events.send(Event::SessionResolved { epoch, result });
                });
            }
            Command::RefreshNow => self.start_poll(),
            Command::SelectMessage(id) => {
                if let Some((epoch, token)) = self.state.begin_fetch(id) {
                    let mailbox = Arc::clone(&self.mailbox);
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = mailbox.fetch_message(&token, id).await;
                        let _ = events.send(Event::FetchResolved { epoch, id, result });
                    });
                }
            }
            Command::DeleteMessages(ids) => {
                if let Some(token) = self.state.remove_messages(&ids) {
                    let mailbox = Arc::clone(&self.mailbox);
                    tokio::spawn(async move {
                        // Log-only: the optimistic local removal
                        // stands and the next poll reconciles.
                        if let Err(error) = mailbox.delete_messages(&token, &ids).await {
                            warn!(%error, ?ids, "remote delete failed");
                        }
                    });
                }
            }
            Command::CloseDetail => self.state.close_detail(),
            Command::Shutdown => return false,
        }
        true
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::SessionResolved { epoch, result } => {
                if self.state.finish_session(epoch, result).is_some() {
                    // One ticker per active session; first tick fires
                    // immediately.
                    self.ticker = Some(PollTicker::spawn(
                        self.config.poll_interval,
                        self.events_tx.clone(),
                    ));
                }
            }
            Event::PollTick => self.start_poll(),
            Event::PollResolved { epoch, result } => {
                self.state.finish_poll(epoch, result);
            }
            Event::FetchResolved { epoch, id, result } => {
                self.state.finish_fetch(epoch, id, result);
            }
        }
    }

    /// Starts an inbox refresh unless one is already in flight.
    fn start_poll(&mut self) {
        if let Some((epoch, token)) = self.state.begin_poll() {
            let mailbox = Arc::clone(&self.mailbox);
            let events = self.events_tx.clone();
            tokio::spawn(async move {
                let result = mailbox.list_messages(&token).await;
                let _ = events.send(Event::PollResolved { epoch, result });
            });
        }
    }

    /// Publishes the state if it changed since the last snapshot.
    fn publish(&self) {
        let next = self.state.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

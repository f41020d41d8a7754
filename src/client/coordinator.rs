/**
 * Sync Coordinator
 *
 * Client-side actor that decides when to pull, when to push and how to
 * apply what the hub sends. It owns the local board; the rest of the app
 * talks to it through [`CoordinatorHandle`] and watches the board and the
 * sync status on `watch` channels.
 *
 * # Rules
 *
 * - With a token: pull once, adopt the server board if the local one is
 *   empty or identical, otherwise push to merge
 * - Every local edit restarts a debounce timer; the push fires when it runs out
 * - A fallback push runs on a fixed interval regardless of edits
 * - `sync` from the hub replaces the board outright
 * - `taskMove` is applied at once and followed by a full push shortly after
 * - Unknown kinds schedule a full push
 * - 401 anywhere drops the token and the link, keeps the board and asks
 *   for a new login
 * - Network failures keep the local board; the next push reconciles
 */

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Duration, Instant, MissedTickBehavior};

use crate::client::api::BoardApi;
use crate::client::config::ClientConfig;
use crate::client::connection::{spawn_link, LinkEvent, LinkHandle, TaggedEvent};
use crate::client::edit::Edit;
use crate::client::error::ClientError;
use crate::client::local_store::LocalStore;
use crate::client::state::{ConnectionState, SyncStatus};
use crate::shared::{Board, SyncMessage, WireMessage};

#[derive(Debug)]
enum Command {
    Edit(Edit),
    Authenticate { token: String, identity: Option<String> },
    ForceSync,
    Logout,
    Shutdown,
}

/// Handle to a running coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    board: watch::Receiver<Board>,
    status: watch::Receiver<SyncStatus>,
}

impl CoordinatorHandle {
    fn send(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).map_err(|_| ClientError::Stopped)
    }

    pub fn edit(&self, edit: Edit) -> Result<(), ClientError> {
        self.send(Command::Edit(edit))
    }

    /// Supply a session token, e.g. after a magic-link login
    pub fn authenticate(
        &self,
        token: impl Into<String>,
        identity: Option<String>,
    ) -> Result<(), ClientError> {
        self.send(Command::Authenticate {
            token: token.into(),
            identity,
        })
    }

    /// Push now instead of waiting for a timer
    pub fn force_sync(&self) -> Result<(), ClientError> {
        self.send(Command::ForceSync)
    }

    /// Drop the token and the link. The local board stays.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.send(Command::Logout)
    }

    pub fn shutdown(&self) -> Result<(), ClientError> {
        self.send(Command::Shutdown)
    }

    pub fn board(&self) -> Board {
        self.board.borrow().clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_board(&self) -> watch::Receiver<Board> {
        self.board.clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }
}

/// Start a coordinator.
///
/// Loads the local board first so it is visible before any network I/O.
/// An unreadable local file is logged and treated as empty.
pub async fn start(config: ClientConfig) -> Result<(CoordinatorHandle, JoinHandle<()>), ClientError> {
    let api = BoardApi::new(&config)?;
    let store = config.store_dir().map(LocalStore::new);

    let board = match &store {
        Some(store) => match store.load().await {
            Ok(board) => board.unwrap_or_else(Board::initial),
            Err(e) => {
                tracing::warn!("[Coordinator] ignoring unreadable local board: {}", e);
                Board::initial()
            }
        },
        None => Board::initial(),
    };

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (board_tx, board_rx) = watch::channel(board.clone());
    let (status_tx, status_rx) = watch::channel(SyncStatus::default());
    let (link_tx, link_rx) = mpsc::unbounded_channel();

    let coordinator = Coordinator {
        token: config.token.clone(),
        config,
        api,
        store,
        board,
        board_tx,
        status_tx,
        link: None,
        link_connected: false,
        link_events: link_tx,
        generation: 0,
        push_at: None,
    };
    let task = tokio::spawn(coordinator.run(command_rx, link_rx));

    Ok((
        CoordinatorHandle {
            commands: command_tx,
            board: board_rx,
            status: status_rx,
        },
        task,
    ))
}

struct Coordinator {
    config: ClientConfig,
    api: BoardApi,
    store: Option<LocalStore>,
    token: Option<String>,
    board: Board,
    board_tx: watch::Sender<Board>,
    status_tx: watch::Sender<SyncStatus>,
    link: Option<LinkHandle>,
    link_connected: bool,
    link_events: mpsc::UnboundedSender<TaggedEvent>,
    generation: u64,
    /// Next scheduled push
    push_at: Option<Instant>,
}

impl Coordinator {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut link_events: mpsc::UnboundedReceiver<TaggedEvent>,
    ) {
        let fallback_every = self.config.timings.fallback_interval;
        let mut fallback = interval_at(Instant::now() + fallback_every, fallback_every);
        fallback.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if self.token.is_some() {
            self.begin_session().await;
        }

        loop {
            let push_at = self.push_at;
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some((generation, event)) = link_events.recv() => {
                    self.handle_link_event(generation, event).await;
                }
                _ = sleep_until(push_at.unwrap_or_else(Instant::now)), if push_at.is_some() => {
                    self.push_at = None;
                    self.push().await;
                }
                _ = fallback.tick() => {
                    if self.token.is_some() {
                        tracing::debug!("[Coordinator] fallback push");
                        self.push().await;
                    }
                }
            }
        }

        self.stop_link().await;
        tracing::info!("[Coordinator] stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Edit(edit) => self.apply_edit(edit).await,
            Command::Authenticate { token, identity } => {
                tracing::info!("[Coordinator] credential supplied");
                self.token = Some(token);
                if identity.is_some() {
                    self.config.identity = identity;
                }
                self.update_status(|s| {
                    s.needs_login = false;
                    s.last_error = None;
                });
                self.begin_session().await;
            }
            Command::ForceSync => {
                self.push_at = None;
                self.push().await;
            }
            Command::Logout => {
                tracing::info!("[Coordinator] logout");
                self.token = None;
                self.push_at = None;
                self.stop_link().await;
                self.update_status(|s| {
                    s.state = ConnectionState::Disconnected;
                    s.needs_login = false;
                });
            }
            Command::Shutdown => {}
        }
    }

    async fn apply_edit(&mut self, edit: Edit) {
        if !edit.apply(&mut self.board) {
            tracing::debug!("[Coordinator] edit changed nothing: {:?}", edit);
            return;
        }
        self.publish().await;

        if let (Some(delta), Some(link)) = (edit.task_move(), &self.link) {
            if self.link_connected {
                link.send(WireMessage::new(SyncMessage::TaskMove(delta)));
            }
        }
        if self.token.is_some() {
            // Restarts on every edit so bursts coalesce into one push
            self.push_at = Some(Instant::now() + self.config.timings.push_debounce);
        }
    }

    /// Pull, then open the realtime link
    async fn begin_session(&mut self) {
        self.update_status(|s| s.state = ConnectionState::Connecting);
        self.pull().await;
        if self.token.is_some() && self.config.realtime {
            self.start_link().await;
        }
    }

    async fn pull(&mut self) {
        let Some(token) = self.token.clone() else {
            return;
        };
        match self.api.fetch(&token).await {
            Ok(server) => {
                if self.board.is_empty() || self.board == server {
                    tracing::info!("[Coordinator] adopted server board");
                    self.replace_board(server).await;
                    self.mark_synced();
                } else {
                    tracing::info!("[Coordinator] local board differs, merging");
                    self.push().await;
                }
            }
            Err(e) => self.handle_failure("pull", e).await,
        }
    }

    async fn push(&mut self) {
        let Some(token) = self.token.clone() else {
            return;
        };
        match self.api.push(&token, &self.board).await {
            Ok(merged) => {
                tracing::debug!("[Coordinator] push merged");
                self.replace_board(merged).await;
                self.mark_synced();
            }
            Err(e) => self.handle_failure("push", e).await,
        }
    }

    async fn handle_failure(&mut self, what: &str, error: ClientError) {
        if matches!(error, ClientError::Unauthorized) {
            self.require_login().await;
            return;
        }
        tracing::warn!("[Coordinator] {} failed, keeping local board: {}", what, error);
        let polling = !self.config.realtime;
        self.update_status(|s| {
            s.last_error = Some(error.to_string());
            if polling {
                s.state = ConnectionState::Reconnecting;
            }
        });
    }

    /// Token rejected: stop everything that needs it
    async fn require_login(&mut self) {
        tracing::warn!("[Coordinator] credential rejected, login required");
        self.token = None;
        self.push_at = None;
        self.stop_link().await;
        self.update_status(|s| {
            s.state = ConnectionState::Disconnected;
            s.needs_login = true;
            s.last_error = Some(ClientError::Unauthorized.to_string());
        });
    }

    async fn start_link(&mut self) {
        self.stop_link().await;
        let Some(token) = self.token.as_deref() else {
            return;
        };
        let url = match self.config.ws_url(token) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("[Coordinator] realtime disabled: {}", e);
                return;
            }
        };
        self.generation += 1;
        self.link = Some(spawn_link(
            url,
            self.generation,
            &self.config.timings,
            self.link_events.clone(),
        ));
    }

    async fn stop_link(&mut self) {
        self.link_connected = false;
        if let Some(link) = self.link.take() {
            link.close().await;
        }
    }

    async fn handle_link_event(&mut self, generation: u64, event: LinkEvent) {
        let current = self.link.as_ref().map(LinkHandle::generation);
        if current != Some(generation) {
            tracing::debug!("[Coordinator] ignoring event from stale link {}", generation);
            return;
        }

        match event {
            LinkEvent::Connected => {
                self.link_connected = true;
                // Catch up on anything missed while disconnected
                self.push_at = None;
                self.push().await;
            }
            LinkEvent::Disconnected { reason } => {
                self.link_connected = false;
                self.update_status(|s| {
                    s.state = ConnectionState::Reconnecting;
                    s.last_error = Some(reason);
                });
            }
            LinkEvent::AuthRejected => self.require_login().await,
            LinkEvent::Message(message) => self.handle_message(message).await,
        }
    }

    async fn handle_message(&mut self, message: WireMessage) {
        match message.payload {
            SyncMessage::Sync(board) => {
                tracing::debug!("[Coordinator] board replaced by broadcast");
                self.replace_board(board).await;
                self.mark_synced();
            }
            SyncMessage::TaskMove(delta) => {
                if self.board.move_task(&delta.task_id, delta.column_id) {
                    self.publish().await;
                }
                self.schedule_push(self.config.timings.move_reconcile_delay);
            }
            SyncMessage::Pong { timestamp } => {
                tracing::debug!("[Coordinator] pong {}", timestamp);
            }
            SyncMessage::Ping => {}
            SyncMessage::Other { kind, .. } => {
                tracing::info!("[Coordinator] unknown message '{}', resyncing", kind);
                self.schedule_push(Duration::ZERO);
            }
        }
    }

    /// Push no later than `delay` from now
    fn schedule_push(&mut self, delay: Duration) {
        let at = Instant::now() + delay;
        self.push_at = Some(self.push_at.map_or(at, |current| current.min(at)));
    }

    async fn replace_board(&mut self, board: Board) {
        if self.board == board {
            return;
        }
        self.board = board;
        self.publish().await;
    }

    /// Send the board to watchers and the local store
    async fn publish(&self) {
        self.board_tx.send_replace(self.board.clone());
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.board).await {
                tracing::error!("[Coordinator] failed to persist board: {}", e);
            }
        }
    }

    fn mark_synced(&self) {
        let online = !self.config.realtime || self.link_connected;
        self.update_status(|s| {
            s.last_synced = Some(Utc::now());
            s.last_error = None;
            if online {
                s.state = ConnectionState::Synced;
            }
        });
    }

    fn update_status(&self, change: impl FnOnce(&mut SyncStatus)) {
        self.status_tx.send_modify(change);
    }
}

/**
 * Realtime Link
 *
 * Keeps one WebSocket to the hub open for the coordinator. The link task
 * owns the socket and reports what happens as [`LinkEvent`]s tagged with
 * the link's generation, so events from a link the coordinator already
 * replaced can be told apart.
 *
 * - Frames may carry several messages joined by `\n`
 * - A `ping` goes out every heartbeat interval; a failed send drops the
 *   connection like any other error
 * - After an unexpected drop the link waits `reconnect_delay` and dials
 *   again, until it is shut down or the handshake is refused with 401
 */

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::client::config::SyncTimings;
use crate::shared::{SyncMessage, WireMessage};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What the link observed
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Connected,
    Message(WireMessage),
    /// Connection lost or dial failed; a retry follows
    Disconnected { reason: String },
    /// Handshake refused with 401; the link has stopped
    AuthRejected,
}

/// Link generation plus event
pub type TaggedEvent = (u64, LinkEvent);

enum Ended {
    Shutdown,
    Lost(String),
}

/// Owner's side of a running link
#[derive(Debug)]
pub struct LinkHandle {
    generation: u64,
    outgoing: mpsc::UnboundedSender<WireMessage>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LinkHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue a message for the hub. Dropped silently while reconnecting.
    pub fn send(&self, message: WireMessage) -> bool {
        self.outgoing.send(message).is_ok()
    }

    /// Stop without reconnecting and wait for the task to finish
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("[Link] task ended abnormally: {}", e);
        }
    }
}

/// Start a link to `url` reporting into `events`
pub fn spawn_link(
    url: String,
    generation: u64,
    timings: &SyncTimings,
    events: mpsc::UnboundedSender<TaggedEvent>,
) -> LinkHandle {
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let link = Link {
        url,
        generation,
        heartbeat: timings.heartbeat_interval,
        reconnect_delay: timings.reconnect_delay,
        events,
        outgoing: outgoing_rx,
        shutdown: shutdown_rx,
    };
    let task = tokio::spawn(link.run());
    LinkHandle {
        generation,
        outgoing: outgoing_tx,
        shutdown: shutdown_tx,
        task,
    }
}

struct Link {
    url: String,
    generation: u64,
    heartbeat: Duration,
    reconnect_delay: Duration,
    events: mpsc::UnboundedSender<TaggedEvent>,
    outgoing: mpsc::UnboundedReceiver<WireMessage>,
    shutdown: watch::Receiver<bool>,
}

impl Link {
    async fn run(mut self) {
        loop {
            let dialed = tokio::select! {
                _ = self.shutdown.changed() => return,
                dialed = connect_async(self.url.as_str()) => dialed,
            };

            let reason = match dialed {
                Ok((socket, _)) => {
                    tracing::info!("[Link] connected (generation {})", self.generation);
                    self.emit(LinkEvent::Connected);
                    match self.pump(socket).await {
                        Ended::Shutdown => return,
                        Ended::Lost(reason) => reason,
                    }
                }
                Err(tungstenite::Error::Http(response)) if response.status().as_u16() == 401 => {
                    tracing::warn!("[Link] handshake rejected: unauthorized");
                    self.emit(LinkEvent::AuthRejected);
                    return;
                }
                Err(e) => e.to_string(),
            };

            tracing::info!(
                "[Link] disconnected: {}, retrying in {:?}",
                reason,
                self.reconnect_delay
            );
            self.emit(LinkEvent::Disconnected { reason });

            // Anything queued while down is stale by the time we reconnect
            while self.outgoing.try_recv().is_ok() {}

            tokio::select! {
                _ = self.shutdown.changed() => return,
                _ = sleep(self.reconnect_delay) => {}
            }
        }
    }

    async fn pump(&mut self, socket: Socket) -> Ended {
        let (mut sink, mut stream) = socket.split();
        let mut heartbeat = interval_at(Instant::now() + self.heartbeat, self.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let out = tokio::select! {
                _ = self.shutdown.changed() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ended::Shutdown;
                }
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.dispatch(&text);
                            continue;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            return Ended::Lost("closed by server".to_string());
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Ended::Lost(e.to_string()),
                    }
                }
                Some(message) = self.outgoing.recv() => message,
                _ = heartbeat.tick() => WireMessage::new(SyncMessage::Ping),
            };

            let text = match out.encode() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("[Link] cannot encode '{}': {}", out.kind(), e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text)).await {
                return Ended::Lost(format!("send failed: {}", e));
            }
        }
    }

    fn dispatch(&self, frame: &str) {
        for line in frame.split('\n').filter(|l| !l.trim().is_empty()) {
            match WireMessage::decode(line) {
                Ok(message) => {
                    tracing::debug!("[Link] received '{}'", message.kind());
                    self.emit(LinkEvent::Message(message));
                }
                Err(e) => tracing::warn!("[Link] dropped malformed message: {}", e),
            }
        }
    }

    fn emit(&self, event: LinkEvent) {
        let _ = self.events.send((self.generation, event));
    }
}

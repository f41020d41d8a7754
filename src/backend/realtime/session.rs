/**
 * Connection Session
 *
 * One live WebSocket paired with an identity. Two pumps run as separate
 * tasks and share nothing but channels:
 *
 * - **read pump**: decodes inbound frames. A `ping` gets a private `pong`.
 *   Other kinds are stamped with the session's identity and relayed
 *   through the hub. Malformed frames are logged and skipped.
 * - **write pump**: drains the outbound queue, coalescing whatever is
 *   already queued into one `\n`-separated text frame. It also sends
 *   private replies and a keep-alive ping every `ping_period`.
 *
 * # Teardown
 *
 * - Read side ends (close frame, transport error, or `pong_wait` of silence):
 *   the session unregisters. The hub closes the outbound queue, and the
 *   write pump flushes what was queued, sends a close frame and exits.
 * - Write side ends (failed or timed-out write, or closed queue): it drops
 *   its done signal. The read pump observes that and exits, which
 *   unregisters.
 */

use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::Message;
use bytes::Bytes;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

use crate::backend::realtime::hub::{HubHandle, Payload, SessionId, SessionLink};
use crate::backend::realtime::BroadcastScope;
use crate::backend::server::config::SessionConfig;
use crate::shared::{SyncMessage, WireMessage};

/// Private replies waiting for the write pump
const REPLY_CAPACITY: usize = 16;

/// Why the read pump stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEnd {
    ClosedByPeer,
    Idle,
    TransportError,
    WriterGone,
}

/// Why the write pump stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEnd {
    QueueClosed,
    WriteFailed,
    WriteTimedOut,
}

/// Run a session until either side ends.
///
/// Registers with the hub, spawns the write pump, runs the read pump on the
/// current task, then unregisters and waits for the writer to finish.
pub async fn serve<R, W, E>(
    stream: R,
    sink: W,
    identity: String,
    hub: HubHandle,
    config: SessionConfig,
    scope: BroadcastScope,
) -> (ReadEnd, Option<WriteEnd>)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: Display + Send,
{
    let link = match hub.register(identity) {
        Ok(link) => link,
        Err(e) => {
            tracing::error!("[Session] cannot register: {}", e);
            return (ReadEnd::WriterGone, None);
        }
    };
    let SessionLink {
        id,
        identity,
        outbound,
    } = link;

    let (reply_tx, reply_rx) = mpsc::channel(REPLY_CAPACITY);
    let (done_tx, done_rx) = oneshot::channel::<()>();

    let writer_config = config.clone();
    let writer = tokio::spawn(async move {
        let end = write_pump(sink, outbound, reply_rx, &writer_config).await;
        drop(done_tx);
        end
    });

    let reader = ReadPump {
        id,
        identity: &identity,
        hub: &hub,
        scope,
        replies: reply_tx,
        pong_wait: config.pong_wait(),
    };
    let read_end = reader.run(stream, done_rx).await;

    hub.unregister(id);
    let write_end = writer.await.ok();
    tracing::info!(
        "[Session] {} for {} ended (read: {:?}, write: {:?})",
        id,
        identity,
        read_end,
        write_end
    );
    (read_end, write_end)
}

struct ReadPump<'a> {
    id: SessionId,
    identity: &'a str,
    hub: &'a HubHandle,
    scope: BroadcastScope,
    replies: mpsc::Sender<Payload>,
    pong_wait: Duration,
}

impl ReadPump<'_> {
    async fn run<R, E>(self, mut stream: R, mut writer_done: oneshot::Receiver<()>) -> ReadEnd
    where
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        loop {
            let next = tokio::select! {
                _ = &mut writer_done => return ReadEnd::WriterGone,
                next = timeout(self.pong_wait, stream.next()) => next,
            };

            let frame = match next {
                Err(_) => {
                    tracing::info!("[Session] {} silent for {:?}, closing", self.id, self.pong_wait);
                    return ReadEnd::Idle;
                }
                Ok(None) => return ReadEnd::ClosedByPeer,
                Ok(Some(Err(e))) => {
                    tracing::debug!("[Session] {} read error: {}", self.id, e);
                    return ReadEnd::TransportError;
                }
                Ok(Some(Ok(frame))) => frame,
            };

            match frame {
                Message::Text(text) => self.handle_text(text.as_str()),
                Message::Binary(data) => {
                    tracing::warn!("[Session] {} sent {} binary bytes, ignored", self.id, data.len());
                }
                // Transport keep-alives only refresh the deadline
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => return ReadEnd::ClosedByPeer,
            }
        }
    }

    fn handle_text(&self, text: &str) {
        let message = match WireMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("[Session] {} dropped malformed message: {}", self.id, e);
                return;
            }
        };

        match message.payload {
            SyncMessage::Ping => self.reply_pong(),
            _ => {
                tracing::debug!(
                    "[Session] {} relaying '{}' from {}",
                    self.id,
                    message.kind(),
                    self.identity
                );
                let stamped = message.from_user(self.identity);
                let recipients = self.scope.relay_recipients(self.identity, self.id);
                if let Err(e) = self.hub.deliver(&stamped, recipients) {
                    tracing::warn!("[Session] {} relay failed: {}", self.id, e);
                }
            }
        }
    }

    fn reply_pong(&self) {
        let pong = match WireMessage::new(SyncMessage::pong_now()).encode() {
            Ok(pong) => pong,
            Err(e) => {
                tracing::error!("[Session] failed to encode pong: {}", e);
                return;
            }
        };
        if self.replies.try_send(pong.into()).is_err() {
            tracing::warn!("[Session] {} reply queue full, pong skipped", self.id);
        }
    }
}

async fn write_pump<W>(
    mut sink: W,
    mut outbound: mpsc::Receiver<Payload>,
    mut replies: mpsc::Receiver<Payload>,
    config: &SessionConfig,
) -> WriteEnd
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let write_wait = config.write_wait();
    let ping_period = config.ping_period();
    let mut ticker = interval_at(Instant::now() + ping_period, ping_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let frame = tokio::select! {
            biased;
            queued = outbound.recv() => match queued {
                Some(first) => Message::Text(coalesce(first, &mut outbound).into()),
                None => {
                    // Queue closed by the hub: everything before the close is already sent
                    let _ = send_frame(&mut sink, Message::Close(None), write_wait).await;
                    return WriteEnd::QueueClosed;
                }
            },
            Some(reply) = replies.recv() => Message::Text(reply.to_string().into()),
            _ = ticker.tick() => Message::Ping(Bytes::new()),
        };

        if let Err(end) = send_frame(&mut sink, frame, write_wait).await {
            return end;
        }
    }
}

/// Join `first` with whatever is already waiting in the queue
fn coalesce(first: Payload, outbound: &mut mpsc::Receiver<Payload>) -> String {
    let waiting = outbound.len();
    let mut batch = String::from(&*first);
    for _ in 0..waiting {
        match outbound.try_recv() {
            Ok(next) => {
                batch.push('\n');
                batch.push_str(&next);
            }
            Err(_) => break,
        }
    }
    batch
}

async fn send_frame<W>(sink: &mut W, frame: Message, write_wait: Duration) -> Result<(), WriteEnd>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    match timeout(write_wait, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::debug!("[Session] write failed: {}", e);
            Err(WriteEnd::WriteFailed)
        }
        Err(_) => {
            tracing::warn!("[Session] write exceeded {:?}", write_wait);
            Err(WriteEnd::WriteTimedOut)
        }
    }
}

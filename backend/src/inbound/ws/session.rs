//! Per-connection WebSocket handler.
//!
//! Keeps framing and heartbeats at the edge and defers all data shaping to
//! the domain query ports. A hub signal never carries content: on every
//! change this handler recomputes the affected snapshot for its own reader,
//! so the spoiler gate and membership checks apply to pushed data exactly
//! as they do to polled data.
//!
//! The public contract pings every 5s and treats a connection as idle after
//! 10s without client traffic; tests shorten both.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::ids::{BookId, GuildId, UserId};
use crate::domain::sync::{Change, Topic};
use crate::inbound::ws::messages::ServerMessage;
use crate::inbound::ws::state::WsState;

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(500);

pub(super) async fn handle_ws_session(
    state: Arc<WsState>,
    reader: UserId,
    guild_id: GuildId,
    book_id: BookId,
    session: Session,
    stream: MessageStream,
) {
    WsSession::new(state, reader, guild_id, book_id)
        .run(session, stream)
        .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
    /// The reader is no longer a member of the guild they subscribed under.
    MembershipLost,
}

#[derive(Clone, Copy)]
enum Snapshot {
    Roster,
    Progress,
    Notes,
}

struct WsSession {
    state: Arc<WsState>,
    reader: UserId,
    guild_id: GuildId,
    book_id: BookId,
}

impl WsSession {
    fn new(state: Arc<WsState>, reader: UserId, guild_id: GuildId, book_id: BookId) -> Self {
        Self {
            state,
            reader,
            guild_id,
            book_id,
        }
    }

    fn topic(&self, snapshot: Snapshot) -> Topic {
        match snapshot {
            Snapshot::Roster => Topic::Roster(self.guild_id),
            Snapshot::Progress => Topic::Progress(self.guild_id, self.book_id.clone()),
            Snapshot::Notes => Topic::Notes(self.guild_id, self.book_id.clone()),
        }
    }

    async fn run(&self, mut session: Session, mut stream: MessageStream) {
        let mut roster_rx = self.state.hub.subscribe(&self.topic(Snapshot::Roster));
        let mut progress_rx = self.state.hub.subscribe(&self.topic(Snapshot::Progress));
        let mut notes_rx = self.state.hub.subscribe(&self.topic(Snapshot::Notes));

        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        let mut result = self.send_all_snapshots(&mut session).await;
        while result.is_ok() {
            result = tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
                change = roster_rx.recv() => {
                    self.handle_change(&mut session, &mut roster_rx, Snapshot::Roster, change).await
                }
                change = progress_rx.recv() => {
                    self.handle_change(&mut session, &mut progress_rx, Snapshot::Progress, change).await
                }
                change = notes_rx.recv() => {
                    self.handle_change(&mut session, &mut notes_rx, Snapshot::Notes, change).await
                }
            };
        }

        if let Err(error) = result {
            self.log_shutdown_reason(&error);
            self.close_session_if_needed(session, &error).await;
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };
        match message {
            Ok(Message::Ping(payload)) => {
                *last_heartbeat = Instant::now();
                session.pong(&payload).await.map_err(SessionError::Network)
            }
            // The downstream contract is push-only; inbound frames count as
            // liveness and nothing more.
            Ok(
                Message::Text(_)
                | Message::Pong(_)
                | Message::Binary(_)
                | Message::Continuation(_)
                | Message::Nop,
            ) => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Ok(Message::Close(reason)) => Err(SessionError::ClientClosed(reason)),
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_change(
        &self,
        session: &mut Session,
        rx: &mut broadcast::Receiver<Change>,
        snapshot: Snapshot,
        change: Result<Change, RecvError>,
    ) -> Result<(), SessionError> {
        match change {
            Ok(_) => self.send_snapshot(session, snapshot).await,
            Err(RecvError::Lagged(skipped)) => {
                // Missed signals are harmless as long as the client ends up
                // on the latest snapshots.
                debug!(skipped, "websocket reader lagged behind the hub");
                self.send_all_snapshots(session).await
            }
            Err(RecvError::Closed) => {
                *rx = self.state.hub.subscribe(&self.topic(snapshot));
                self.send_snapshot(session, snapshot).await
            }
        }
    }

    async fn send_all_snapshots(&self, session: &mut Session) -> Result<(), SessionError> {
        self.send_snapshot(session, Snapshot::Roster).await?;
        self.send_snapshot(session, Snapshot::Progress).await?;
        self.send_snapshot(session, Snapshot::Notes).await
    }

    async fn send_snapshot(
        &self,
        session: &mut Session,
        snapshot: Snapshot,
    ) -> Result<(), SessionError> {
        let message = match snapshot {
            Snapshot::Roster => {
                let overview = self
                    .state
                    .membership
                    .overview(&self.reader)
                    .await
                    .map_err(|_| SessionError::MembershipLost)?;
                if overview.guild.id != self.guild_id {
                    return Err(SessionError::MembershipLost);
                }
                ServerMessage::Guild { overview }
            }
            Snapshot::Progress => {
                let ghosts = self
                    .state
                    .progress
                    .ghost_progress(&self.reader, &self.book_id)
                    .await
                    .map_err(|_| SessionError::MembershipLost)?;
                ServerMessage::GhostProgress {
                    book_id: self.book_id.clone(),
                    ghosts,
                }
            }
            Snapshot::Notes => {
                let timeline = self
                    .state
                    .notes
                    .timeline(&self.reader, &self.book_id)
                    .await
                    .map_err(|_| SessionError::MembershipLost)?;
                ServerMessage::Notes {
                    book_id: self.book_id.clone(),
                    timeline,
                }
            }
        };
        self.send_json(session, &message).await
    }

    async fn send_json(
        &self,
        session: &mut Session,
        payload: &ServerMessage,
    ) -> Result<(), SessionError> {
        match serde_json::to_string(payload) {
            Ok(body) => session.text(body).await.map_err(SessionError::Network),
            Err(error) => {
                warn!(error = %error, "failed to serialize websocket payload");
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!(user_id = %self.reader, "websocket heartbeat timeout, closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "websocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "websocket send failed, closing connection");
            }
            SessionError::MembershipLost => {
                debug!(user_id = %self.reader, guild_id = %self.guild_id, "closing websocket after membership change");
            }
            SessionError::ClientClosed(_) | SessionError::StreamClosed => {}
        }
    }

    async fn close_session_if_needed(&self, session: Session, error: &SessionError) {
        let reason = match error {
            SessionError::HeartbeatTimeout => Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            }),
            SessionError::Protocol(_) => Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            }),
            SessionError::MembershipLost => Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("membership changed".to_owned()),
            }),
            SessionError::ClientClosed(reason) => reason.clone(),
            SessionError::StreamClosed | SessionError::Network(_) => return,
        };
        if let Err(error) = session.close(reason).await {
            warn!(error = %error, "failed to close websocket session");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

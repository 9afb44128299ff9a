//! Per-connection WebSocket handler.
//!
//! Keeps framing and heartbeats at the edge while the content comes from
//! the reconciler's snapshot channel and the notification source. The
//! public contract pings every 5s and considers a connection idle after
//! 10s without client traffic; tests shorten both to speed up feedback.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::UserId;
use crate::domain::ports::Notification;
use crate::inbound::ws::messages::ServerFrame;
use crate::inbound::ws::state::WsState;

/// Time between heartbeats to the client.
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client.
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn handle_ws_session(
    state: WsState,
    user: Option<UserId>,
    session: Session,
    stream: MessageStream,
) {
    WsSession::new(state, user).run(session, stream).await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
    SnapshotSourceGone,
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    state: WsState,
    notifications: Option<broadcast::Receiver<Notification>>,
}

impl WsSession {
    fn new(state: WsState, user: Option<UserId>) -> Self {
        let notifications = user.map(|id| state.notifications.subscribe(&id));
        Self {
            state,
            notifications,
        }
    }

    async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);
        let mut board = self.state.board.clone();
        let mut notifications = self.notifications.take();

        // New connections start from the complete current snapshot.
        let initial = board.borrow_and_update().clone();
        if self
            .send_frame(&mut session, &ServerFrame::Snapshot(&initial))
            .await
            .is_err()
        {
            return;
        }

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                changed = board.changed() => {
                    match changed {
                        Ok(()) => {
                            let snapshot = board.borrow_and_update().clone();
                            self.send_frame(&mut session, &ServerFrame::Snapshot(&snapshot))
                                .await
                                .map_err(SessionError::Network)
                        }
                        Err(_) => Err(SessionError::SnapshotSourceGone),
                    }
                }
                notification = next_notification(&mut notifications) => {
                    self.send_frame(
                        &mut session,
                        &ServerFrame::Notification {
                            title: &notification.title,
                            body: &notification.body,
                        },
                    )
                    .await
                    .map_err(SessionError::Network)
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut last_heartbeat, message)
                }
            };

            if let Err(error) = result {
                self.log_shutdown_reason(&error);
                let close_action = Self::close_action_for(&error);
                Self::close_session_if_needed(session, close_action).await;
                return;
            }
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

    fn handle_stream_message(
        &self,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(Message::Close(reason)) => Err(SessionError::ClientClosed(reason)),
            // The stream is server-push only; any client traffic just
            // refreshes the heartbeat.
            Ok(_) => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn send_frame(
        &self,
        session: &mut Session,
        frame: &ServerFrame<'_>,
    ) -> Result<(), Closed> {
        match serde_json::to_string(frame) {
            Ok(body) => session.text(body).await,
            Err(error) => {
                // In debug builds fail fast so schema drift is fixed; in
                // release we log and keep the connection alive.
                if cfg!(debug_assertions) {
                    panic!("server frames must serialize: {error}");
                } else {
                    warn!(error = %error, "Failed to serialize WebSocket payload");
                }
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::SnapshotSourceGone => {
                debug!("snapshot channel closed; WebSocket session ending");
            }
            SessionError::ClientClosed(_) | SessionError::StreamClosed => {}
        }
    }

    fn close_action_for(error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::SnapshotSourceGone => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Away,
                description: Some("server shutting down".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action {
            if let Err(error) = session.close(reason).await {
                warn!(error = %error, "Failed to close WebSocket session");
            }
        }
    }
}

/// Next notification for the session's user, or pending forever for
/// anonymous connections (they still receive board snapshots).
async fn next_notification(
    receiver: &mut Option<broadcast::Receiver<Notification>>,
) -> Notification {
    match receiver {
        Some(rx) => loop {
            match rx.recv().await {
                Ok(notification) => break notification,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "session lagged behind its notifications");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break std::future::pending().await;
                }
            }
        },
        None => std::future::pending().await,
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live notification delivery over WebSocket.
//!
//! Every stored notification is pushed through [`LiveGateway`], which
//! fans it out on a broadcast channel. Each connected client receives
//! only the messages addressed to the user it authenticated as.
//!
//! Delivery is best-effort. A client that is not connected, or falls
//! too far behind, misses messages and must read its inbox over HTTP.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use turnover_api::{
    AuthenticatedActor, DeliveryResult, GatewayError, NotificationGateway, PushMessage,
    format_instant,
};

use crate::AppState;
use crate::session::CurrentUser;

/// Messages buffered per subscriber before the oldest are dropped.
const EVENT_BUFFER_SIZE: usize = 256;

/// Frames sent to a live client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Sent once when the socket opens.
    Connected {
        /// The user the stream is filtered for.
        user_id: i64,
        /// Server time, RFC 3339.
        timestamp: String,
    },
    /// A notification for the connected user.
    Notification(PushMessage),
}

/// A notification gateway backed by a broadcast channel.
#[derive(Debug, Clone)]
pub struct LiveGateway {
    tx: broadcast::Sender<PushMessage>,
}

impl LiveGateway {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Subscribes to every future message.
    pub fn subscribe(&self) -> broadcast::Receiver<PushMessage> {
        self.tx.subscribe()
    }
}

impl Default for LiveGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationGateway for LiveGateway {
    fn push(&self, message: &PushMessage) -> Result<DeliveryResult, GatewayError> {
        // No live clients is normal; the inbox still has the notification.
        let recipients: usize = self.tx.send(message.clone()).unwrap_or(0);
        debug!(
            user_id = message.user_id,
            recipients, "Broadcast live notification"
        );
        Ok(DeliveryResult { recipients })
    }
}

/// Handler for GET `/live`.
///
/// Upgrades the connection and streams the caller's notifications.
pub async fn live_notifications_handler(
    ws: WebSocketUpgrade,
    CurrentUser(actor, _user): CurrentUser,
    AxumState(app_state): AxumState<AppState>,
) -> Response {
    let rx: broadcast::Receiver<PushMessage> = app_state.gateway.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, actor, rx))
}

async fn handle_socket(
    socket: WebSocket,
    actor: AuthenticatedActor,
    mut rx: broadcast::Receiver<PushMessage>,
) {
    info!(user_id = actor.user_id, "Client connected to live notifications");

    let (mut sender, mut receiver) = socket.split();

    let connected: LiveEvent = LiveEvent::Connected {
        user_id: actor.user_id,
        timestamp: format_instant(OffsetDateTime::now_utc()),
    };
    if let Ok(json) = serde_json::to_string(&connected)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!(user_id = actor.user_id, "Failed to send connection confirmation");
        return;
    }

    let user_id: i64 = actor.user_id;
    let mut send_task = tokio::spawn(async move {
        loop {
            let message: PushMessage = match rx.recv().await {
                Ok(message) => message,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(user_id, skipped, "Live client fell behind");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if message.user_id != user_id {
                continue;
            }
            match serde_json::to_string(&LiveEvent::Notification(message)) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(?e, "Failed to serialize live notification");
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from live client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Live client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    info!(user_id, "Client disconnected from live notifications");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use turnover_api::PushMetadata;

    fn create_test_message(user_id: i64) -> PushMessage {
        PushMessage {
            user_id,
            title: String::from("New Shift Assigned"),
            body: String::from("Seaside 2B on 2026-03-10 at 11:00"),
            metadata: PushMetadata {
                notification_id: 7,
                notification_type: String::from("shift_assigned"),
                related_shift_id: Some(3),
            },
        }
    }

    #[test]
    fn test_push_without_clients_succeeds() {
        let gateway: LiveGateway = LiveGateway::new();
        let result: DeliveryResult = gateway.push(&create_test_message(1)).unwrap();
        assert_eq!(result.recipients, 0);
    }

    #[test]
    fn test_push_reaches_every_subscriber() {
        let gateway: LiveGateway = LiveGateway::new();
        let mut first: broadcast::Receiver<PushMessage> = gateway.subscribe();
        let mut second: broadcast::Receiver<PushMessage> = gateway.subscribe();

        let result: DeliveryResult = gateway.push(&create_test_message(1)).unwrap();

        assert_eq!(result.recipients, 2);
        assert_eq!(first.try_recv().unwrap().user_id, 1);
        assert_eq!(second.try_recv().unwrap().metadata.notification_id, 7);
    }

    #[test]
    fn test_event_wire_format() {
        let event: LiveEvent = LiveEvent::Notification(create_test_message(4));
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "notification");
        assert_eq!(json["user_id"], 4);
        assert_eq!(json["metadata"]["notification_type"], "shift_assigned");

        let parsed: LiveEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }
}

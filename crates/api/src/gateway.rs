// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Outbound delivery of stored notifications.
//!
//! Delivery is best-effort. A notification row is the source of truth;
//! failing to push it to a device never fails the mutation that created
//! it.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use turnover_domain::Notification;

/// Errors raised by a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The recipient has no registered delivery target.
    #[error("user {user_id} has no delivery target")]
    NoRecipient {
        /// The intended recipient.
        user_id: i64,
    },
    /// The channel refused or lost the message.
    #[error("delivery failed: {0}")]
    Delivery(String),
    /// The channel did not answer in time.
    #[error("delivery timed out after {millis} ms")]
    Timeout {
        /// How long the channel was given.
        millis: u64,
    },
}

/// Routing data attached to a pushed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMetadata {
    pub notification_id: i64,
    pub notification_type: String,
    pub related_shift_id: Option<i64>,
}

/// A message ready for a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub metadata: PushMetadata,
}

impl PushMessage {
    /// Builds the push form of a stored notification.
    #[must_use]
    pub fn from_notification(notification_id: i64, notification: &Notification) -> Self {
        Self {
            user_id: notification.user_id,
            title: notification.title.clone(),
            body: notification.message.clone(),
            metadata: PushMetadata {
                notification_id,
                notification_type: notification.notification_type.as_str().to_string(),
                related_shift_id: notification.related_shift_id,
            },
        }
    }
}

/// What a channel reports after accepting a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryResult {
    /// Devices or sessions the message reached.
    pub recipients: usize,
}

/// A channel that pushes notifications to users.
pub trait NotificationGateway: Send + Sync {
    /// Pushes one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot deliver the message.
    fn push(&self, message: &PushMessage) -> Result<DeliveryResult, GatewayError>;
}

/// A gateway that drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGateway;

impl NotificationGateway for NullGateway {
    fn push(&self, message: &PushMessage) -> Result<DeliveryResult, GatewayError> {
        debug!(user_id = message.user_id, "Discarding push message");
        Ok(DeliveryResult { recipients: 0 })
    }
}

/// A gateway that keeps every message it is given.
///
/// Useful for inspection in tests and local tooling.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<PushMessage>>,
}

impl RecordingGateway {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every message pushed so far.
    #[must_use]
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl NotificationGateway for RecordingGateway {
    fn push(&self, message: &PushMessage) -> Result<DeliveryResult, GatewayError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| GatewayError::Delivery(String::from("recorder poisoned")))?;
        sent.push(message.clone());
        Ok(DeliveryResult { recipients: 1 })
    }
}

/// Pushes a message and swallows any failure.
///
/// Returns true if the channel accepted the message.
pub fn deliver(gateway: &dyn NotificationGateway, message: &PushMessage) -> bool {
    match gateway.push(message) {
        Ok(result) => {
            debug!(
                user_id = message.user_id,
                notification_id = message.metadata.notification_id,
                recipients = result.recipients,
                "Pushed notification"
            );
            true
        }
        Err(e) => {
            warn!(
                user_id = message.user_id,
                notification_id = message.metadata.notification_id,
                error = %e,
                "Notification delivery failed"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingGateway;

    impl NotificationGateway for FailingGateway {
        fn push(&self, _message: &PushMessage) -> Result<DeliveryResult, GatewayError> {
            Err(GatewayError::Timeout { millis: 2000 })
        }
    }

    fn create_test_message() -> PushMessage {
        PushMessage {
            user_id: 3,
            title: String::from("New Shift Assigned"),
            body: String::from("Seaside 2B on 2026-03-10 at 11:00"),
            metadata: PushMetadata {
                notification_id: 9,
                notification_type: String::from("shift_assigned"),
                related_shift_id: Some(42),
            },
        }
    }

    #[test]
    fn test_failed_delivery_is_swallowed() {
        assert!(!deliver(&FailingGateway, &create_test_message()));
    }

    #[test]
    fn test_recording_gateway_keeps_messages() {
        let gateway: RecordingGateway = RecordingGateway::new();
        assert!(deliver(&gateway, &create_test_message()));
        assert_eq!(gateway.sent(), vec![create_test_message()]);
    }

    #[test]
    fn test_gateway_error_messages() {
        assert_eq!(
            GatewayError::NoRecipient { user_id: 3 }.to_string(),
            "user 3 has no delivery target"
        );
        assert_eq!(
            GatewayError::Timeout { millis: 2000 }.to_string(),
            "delivery timed out after 2000 ms"
        );
    }
}

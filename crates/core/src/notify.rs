// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Notification intents.
//!
//! The core decides whether and what to send. Storing the notification
//! and pushing it to a device happen outside.

use time::OffsetDateTime;
use turnover_domain::{Apartment, DedupKey, Notification, NotificationType, Shift, excerpt};

/// A notification the core wants created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    /// `None` for a shift that has not been persisted yet.
    pub related_shift_id: Option<i64>,
    pub dedup_key: Option<DedupKey>,
}

impl NotificationIntent {
    /// Creates an intent about a shift.
    #[must_use]
    pub fn about_shift(
        user_id: i64,
        notification_type: NotificationType,
        title: &str,
        message: String,
        shift: &Shift,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            title: title.to_string(),
            message,
            related_shift_id: shift.shift_id,
            dedup_key: None,
        }
    }

    /// Fills in the shift id once the shift has been stored.
    #[must_use]
    pub fn with_shift_id(mut self, shift_id: i64) -> Self {
        self.related_shift_id.get_or_insert(shift_id);
        self
    }

    /// Builds the stored notification, unread.
    #[must_use]
    pub fn into_notification(self, now: OffsetDateTime) -> Notification {
        Notification {
            notification_id: None,
            user_id: self.user_id,
            notification_type: self.notification_type,
            title: self.title,
            message: self.message,
            read: false,
            created_at: now,
            related_shift_id: self.related_shift_id,
            dedup_key: self.dedup_key,
        }
    }
}

fn slot(apartment: &Apartment, shift: &Shift) -> String {
    format!(
        "{} on {} at {}",
        apartment.name, shift.scheduled_date, shift.scheduled_start_time
    )
}

pub(crate) fn shift_assigned(apartment: &Apartment, shift: &Shift) -> NotificationIntent {
    NotificationIntent::about_shift(
        shift.operator_id,
        NotificationType::ShiftAssigned,
        "New Shift Assigned",
        format!("You have been assigned to clean {}", slot(apartment, shift)),
        shift,
    )
}

pub(crate) fn shift_reassigned(
    previous_operator: i64,
    apartment: &Apartment,
    shift: &Shift,
) -> NotificationIntent {
    NotificationIntent::about_shift(
        previous_operator,
        NotificationType::ShiftAssigned,
        "Shift Reassigned",
        format!(
            "Your shift at {} has been reassigned to another operator",
            slot(apartment, shift)
        ),
        shift,
    )
}

pub(crate) fn shift_time_changed(apartment: &Apartment, shift: &Shift) -> NotificationIntent {
    NotificationIntent::about_shift(
        shift.operator_id,
        NotificationType::ShiftTimeChanged,
        "Shift Time Changed",
        format!("Your shift has been moved to {}", slot(apartment, shift)),
        shift,
    )
}

pub(crate) fn guest_count_updated(apartment: &Apartment, shift: &Shift) -> NotificationIntent {
    NotificationIntent::about_shift(
        shift.operator_id,
        NotificationType::GuestCountUpdated,
        "Guest Count Updated",
        format!(
            "Guest count for {} is now {}",
            slot(apartment, shift),
            shift.guest_count
        ),
        shift,
    )
}

pub(crate) fn shift_deleted(apartment: &Apartment, shift: &Shift) -> NotificationIntent {
    NotificationIntent::about_shift(
        shift.operator_id,
        NotificationType::ShiftDeleted,
        "Shift Deleted",
        format!("Your shift at {} has been deleted", slot(apartment, shift)),
        shift,
    )
}

pub(crate) fn shift_confirmed(apartment: &Apartment, shift: &Shift) -> NotificationIntent {
    NotificationIntent::about_shift(
        apartment.owner_id,
        NotificationType::ShiftConfirmed,
        "Shift Confirmed",
        format!("The operator has seen the shift at {}", slot(apartment, shift)),
        shift,
    )
}

pub(crate) fn time_change_requested(
    recipient: i64,
    by_admin: bool,
    apartment: &Apartment,
    shift: &Shift,
) -> NotificationIntent {
    let (notification_type, title) = if by_admin {
        (
            NotificationType::TimeChangeRequestedByAdmin,
            "Confirmation Required",
        )
    } else {
        (NotificationType::TimeChangeRequest, "Time Change Requested")
    };
    NotificationIntent::about_shift(
        recipient,
        notification_type,
        title,
        format!(
            "A change to the shift at {} is waiting for your answer",
            slot(apartment, shift)
        ),
        shift,
    )
}

pub(crate) fn time_change_answered(
    recipient: i64,
    notification_type: NotificationType,
    apartment: &Apartment,
    shift: &Shift,
) -> NotificationIntent {
    let (title, verb) = match notification_type {
        NotificationType::TimeChangeApproved => ("Time Change Approved", "approved"),
        NotificationType::TimeChangeConfirmedByOperator => ("Time Change Confirmed", "confirmed"),
        _ => ("Time Change Rejected", "rejected"),
    };
    NotificationIntent::about_shift(
        recipient,
        notification_type,
        title,
        format!(
            "Your time change request for {} was {verb}",
            slot(apartment, shift)
        ),
        shift,
    )
}

pub(crate) fn comment_added(
    recipient: i64,
    apartment: &Apartment,
    shift: &Shift,
    text: &str,
) -> NotificationIntent {
    NotificationIntent::about_shift(
        recipient,
        NotificationType::CommentAdded,
        "New Comment",
        format!("{}: {}", apartment.name, excerpt(text)),
        shift,
    )
}

pub(crate) fn problem_reported(
    recipient: i64,
    apartment: &Apartment,
    shift: &Shift,
    description: &str,
) -> NotificationIntent {
    NotificationIntent::about_shift(
        recipient,
        NotificationType::ProblemReported,
        "Problem Reported",
        format!("{}: {}", apartment.name, excerpt(description)),
        shift,
    )
}

pub(crate) fn instruction_photo_added(apartment: &Apartment, shift: &Shift) -> NotificationIntent {
    NotificationIntent::about_shift(
        shift.operator_id,
        NotificationType::InstructionPhotoAdded,
        "New Instructions",
        format!("A new instruction photo was added for {}", slot(apartment, shift)),
        shift,
    )
}

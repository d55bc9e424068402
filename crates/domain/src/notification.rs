// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Month, OffsetDateTime};

use crate::error::DomainError;

/// Every kind of notification the system emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ShiftAssigned,
    TimeChangeRequest,
    TimeChangeApproved,
    TimeChangeRejected,
    ProblemReported,
    ShiftConfirmed,
    TimeChangeRequestedByAdmin,
    TimeChangeConfirmedByOperator,
    ShiftTimeChanged,
    InstructionPhotoAdded,
    CalendarUpdated,
    CalendarUpdatedNewDays,
    ShiftDeleted,
    GuestCountUpdated,
    CommentAdded,
    UnavailabilityRequest,
    UnavailabilityRequestReviewed,
}

impl NotificationType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ShiftAssigned => "shift_assigned",
            Self::TimeChangeRequest => "time_change_request",
            Self::TimeChangeApproved => "time_change_approved",
            Self::TimeChangeRejected => "time_change_rejected",
            Self::ProblemReported => "problem_reported",
            Self::ShiftConfirmed => "shift_confirmed",
            Self::TimeChangeRequestedByAdmin => "time_change_requested_by_admin",
            Self::TimeChangeConfirmedByOperator => "time_change_confirmed_by_operator",
            Self::ShiftTimeChanged => "shift_time_changed",
            Self::InstructionPhotoAdded => "instruction_photo_added",
            Self::CalendarUpdated => "calendar_updated",
            Self::CalendarUpdatedNewDays => "calendar_updated_new_days",
            Self::ShiftDeleted => "shift_deleted",
            Self::GuestCountUpdated => "guest_count_updated",
            Self::CommentAdded => "comment_added",
            Self::UnavailabilityRequest => "unavailability_request",
            Self::UnavailabilityRequestReviewed => "unavailability_request_reviewed",
        }
    }
}

impl FromStr for NotificationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shift_assigned" => Ok(Self::ShiftAssigned),
            "time_change_request" => Ok(Self::TimeChangeRequest),
            "time_change_approved" => Ok(Self::TimeChangeApproved),
            "time_change_rejected" => Ok(Self::TimeChangeRejected),
            "problem_reported" => Ok(Self::ProblemReported),
            "shift_confirmed" => Ok(Self::ShiftConfirmed),
            "time_change_requested_by_admin" => Ok(Self::TimeChangeRequestedByAdmin),
            "time_change_confirmed_by_operator" => Ok(Self::TimeChangeConfirmedByOperator),
            "shift_time_changed" => Ok(Self::ShiftTimeChanged),
            "instruction_photo_added" => Ok(Self::InstructionPhotoAdded),
            "calendar_updated" => Ok(Self::CalendarUpdated),
            "calendar_updated_new_days" => Ok(Self::CalendarUpdatedNewDays),
            "shift_deleted" => Ok(Self::ShiftDeleted),
            "guest_count_updated" => Ok(Self::GuestCountUpdated),
            "comment_added" => Ok(Self::CommentAdded),
            "unavailability_request" => Ok(Self::UnavailabilityRequest),
            "unavailability_request_reviewed" => Ok(Self::UnavailabilityRequestReviewed),
            _ => Err(DomainError::InvalidNotificationType(s.to_string())),
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured identity used to suppress repeated notifications.
///
/// Two notifications with equal keys created within the dedup window are
/// considered the same alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub apartment_id: i64,
    pub year: i32,
    pub month: Month,
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub notification_id: Option<i64>,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: OffsetDateTime,
    pub related_shift_id: Option<i64>,
    pub dedup_key: Option<DedupKey>,
}

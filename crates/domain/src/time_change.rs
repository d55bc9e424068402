// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Time-change requests.
//!
//! A time-change request carries a proposed change to a shift that could
//! not be applied directly. It has two independent signals: the owner's
//! review `status` and the operator's confirmation. Which signal applies
//! the change depends on who opened the request:
//!
//! - opened by an admin or owner: the assigned operator's confirmation
//!   applies it
//! - opened by the operator: the owner's approval applies it
//!
//! Any rejection closes the request. A closed request is archived and
//! the shift may receive a new one.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, OffsetDateTime, Time};

use crate::error::DomainError;
use crate::types::{Role, Shift, ShiftPatch};

/// Owner-facing review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeChangeStatus {
    Pending,
    Approved,
    Rejected,
}

impl TimeChangeStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for TimeChangeStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidTimeChangeStatus(s.to_string())),
        }
    }
}

/// The proposed values. `new_start_time` is always present; the other
/// fields are present only when they change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeChangeDraft {
    pub new_scheduled_date: Option<Date>,
    pub new_start_time: Time,
    pub new_end_time: Option<Time>,
    pub new_apartment_id: Option<i64>,
    pub new_operator_id: Option<i64>,
}

impl TimeChangeDraft {
    /// Builds a draft from an effective patch. The start time falls back to
    /// the shift's current start when the patch leaves it alone.
    #[must_use]
    pub fn from_patch(patch: &ShiftPatch, shift: &Shift) -> Self {
        Self {
            new_scheduled_date: patch.scheduled_date,
            new_start_time: patch
                .scheduled_start_time
                .unwrap_or(shift.scheduled_start_time),
            new_end_time: patch.scheduled_end_time,
            new_apartment_id: patch.apartment_id,
            new_operator_id: patch.operator_id,
        }
    }

    /// Every requested field as a patch.
    #[must_use]
    pub fn to_patch(&self) -> ShiftPatch {
        ShiftPatch {
            apartment_id: self.new_apartment_id,
            operator_id: self.new_operator_id,
            scheduled_date: self.new_scheduled_date,
            scheduled_start_time: Some(self.new_start_time),
            scheduled_end_time: self.new_end_time,
            ..ShiftPatch::default()
        }
    }

    /// Only the date and time fields as a patch.
    #[must_use]
    pub fn to_time_patch(&self) -> ShiftPatch {
        ShiftPatch {
            scheduled_date: self.new_scheduled_date,
            scheduled_start_time: Some(self.new_start_time),
            scheduled_end_time: self.new_end_time,
            ..ShiftPatch::default()
        }
    }
}

/// What the caller must do after a party answers a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The answer was stored; nothing changes on the shift.
    Recorded,
    /// Apply this patch to the shift, then close the request.
    Apply(ShiftPatch),
    /// The request was rejected and is now closed.
    Closed,
}

/// A proposed change awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeChangeRequest {
    pub request_id: Option<i64>,
    pub shift_id: i64,
    pub requested_by: i64,
    pub initiator: Role,
    pub draft: TimeChangeDraft,
    pub reason: Option<String>,
    pub status: TimeChangeStatus,
    pub operator_confirmed: Option<bool>,
    pub operator_confirmed_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub closed_at: Option<OffsetDateTime>,
}

impl TimeChangeRequest {
    /// Opens a new pending request.
    #[must_use]
    pub const fn open(
        shift_id: i64,
        requested_by: i64,
        initiator: Role,
        draft: TimeChangeDraft,
        reason: Option<String>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            request_id: None,
            shift_id,
            requested_by,
            initiator,
            draft,
            reason,
            status: TimeChangeStatus::Pending,
            operator_confirmed: None,
            operator_confirmed_at: None,
            created_at: now,
            closed_at: None,
        }
    }

    /// True until the request has been closed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// The role whose acceptance applies this request.
    #[must_use]
    pub const fn counterparty(&self) -> Role {
        match self.initiator {
            Role::Operator => Role::Owner,
            Role::Admin | Role::Owner | Role::Viewer => Role::Operator,
        }
    }

    /// Closes the request.
    pub const fn close(&mut self, now: OffsetDateTime) {
        self.closed_at = Some(now);
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DomainError::NoOpenTimeChangeRequest {
                shift_id: self.shift_id,
            })
        }
    }

    /// Records the owner's review.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is closed or already reviewed.
    pub fn record_owner_review(
        &mut self,
        approve: bool,
        now: OffsetDateTime,
    ) -> Result<Resolution, DomainError> {
        self.ensure_open()?;
        if self.status != TimeChangeStatus::Pending {
            return Err(DomainError::TimeChangeAlreadyDecided {
                decision: self.status.as_str().to_string(),
            });
        }

        if !approve {
            self.status = TimeChangeStatus::Rejected;
            self.close(now);
            return Ok(Resolution::Closed);
        }

        self.status = TimeChangeStatus::Approved;
        if self.counterparty() == Role::Owner {
            Ok(Resolution::Apply(self.draft.to_time_patch()))
        } else {
            Ok(Resolution::Recorded)
        }
    }

    /// Records the operator's confirmation or decline.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is closed, already answered, or was
    /// opened by the operator themselves.
    pub fn record_operator_response(
        &mut self,
        confirm: bool,
        now: OffsetDateTime,
    ) -> Result<Resolution, DomainError> {
        self.ensure_open()?;
        if self.initiator == Role::Operator {
            return Err(DomainError::Forbidden {
                field: String::from("time_change_request"),
                reason: String::from("operators cannot confirm their own request"),
            });
        }
        if let Some(previous) = self.operator_confirmed {
            return Err(DomainError::TimeChangeAlreadyDecided {
                decision: if previous {
                    String::from("confirmed")
                } else {
                    String::from("declined")
                },
            });
        }

        self.operator_confirmed = Some(confirm);
        self.operator_confirmed_at = Some(now);

        if confirm {
            Ok(Resolution::Apply(self.draft.to_patch()))
        } else {
            self.close(now);
            Ok(Resolution::Closed)
        }
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::time_change::TimeChangeRequest;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, OffsetDateTime, Time};

/// The role a user holds.
///
/// Authorization decisions read the role and identity only; they never
/// mutate the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Fleet administrator: schedules and reassigns shifts.
    Admin,
    /// Property owner: owns apartments and submits booking calendars.
    Owner,
    /// Field operator: performs the cleaning.
    Operator,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
            Self::Operator => "operator",
            Self::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            "operator" => Ok(Self::Operator),
            "viewer" => Ok(Self::Viewer),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// Created, not yet started.
    Scheduled,
    /// Operator has recorded an actual start.
    InProgress,
    /// Both actual times recorded with the minimum duration met.
    Completed,
    /// Cancelled; ignored by every conflict check.
    Cancelled,
}

impl ShiftStatus {
    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ShiftStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidShiftStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl User {
    /// Creates a new `User`.
    #[must_use]
    pub const fn new(user_id: i64, role: Role, name: String, email: String) -> Self {
        Self {
            user_id,
            role,
            name,
            email,
        }
    }
}

/// A rental apartment and its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apartment {
    pub apartment_id: i64,
    pub name: String,
    pub owner_id: i64,
}

impl Apartment {
    /// Creates a new `Apartment`.
    #[must_use]
    pub const fn new(apartment_id: i64, name: String, owner_id: i64) -> Self {
        Self {
            apartment_id,
            name,
            owner_id,
        }
    }

    /// Returns true if the given user owns this apartment.
    #[must_use]
    pub const fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

/// Whether the assigned operator has acknowledged the shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfirmedSeen {
    pub confirmed: bool,
    pub confirmed_at: Option<OffsetDateTime>,
}

impl ConfirmedSeen {
    /// An acknowledgement recorded at `at`.
    #[must_use]
    pub const fn at(at: OffsetDateTime) -> Self {
        Self {
            confirmed: true,
            confirmed_at: Some(at),
        }
    }
}

/// One cleaning assignment.
///
/// `shift_id` is `None` until the shift has been persisted. Comments,
/// problems and instruction photos are separate entities referencing
/// the shift by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub shift_id: Option<i64>,
    pub apartment_id: i64,
    pub operator_id: i64,
    pub created_by: i64,
    pub scheduled_date: Date,
    pub scheduled_start_time: Time,
    pub scheduled_end_time: Option<Time>,
    pub actual_start_time: Option<OffsetDateTime>,
    pub actual_end_time: Option<OffsetDateTime>,
    pub status: ShiftStatus,
    pub guest_count: u32,
    pub notes: Option<String>,
    pub confirmed_seen: ConfirmedSeen,
    pub time_change_request: Option<TimeChangeRequest>,
}

impl Shift {
    /// Creates a new, unpersisted shift in the `scheduled` state.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        apartment_id: i64,
        operator_id: i64,
        created_by: i64,
        scheduled_date: Date,
        scheduled_start_time: Time,
        scheduled_end_time: Option<Time>,
        guest_count: u32,
        notes: Option<String>,
    ) -> Self {
        Self {
            shift_id: None,
            apartment_id,
            operator_id,
            created_by,
            scheduled_date,
            scheduled_start_time,
            scheduled_end_time,
            actual_start_time: None,
            actual_end_time: None,
            status: ShiftStatus::Scheduled,
            guest_count,
            notes,
            confirmed_seen: ConfirmedSeen {
                confirmed: false,
                confirmed_at: None,
            },
            time_change_request: None,
        }
    }

    /// Returns the same shift carrying a persisted id.
    #[must_use]
    pub fn with_id(mut self, shift_id: i64) -> Self {
        self.shift_id = Some(shift_id);
        self
    }

    /// Returns the persisted id, or 0 for an unpersisted shift.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.shift_id.unwrap_or_default()
    }

    /// True when started and not yet finished.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.actual_start_time.is_some() && self.actual_end_time.is_none()
    }

    /// True when the shift takes part in conflict checks.
    #[must_use]
    pub fn counts_toward_limits(&self) -> bool {
        self.status != ShiftStatus::Cancelled
    }

    /// True while a time-change request is live on this shift.
    #[must_use]
    pub fn has_open_time_change(&self) -> bool {
        self.time_change_request
            .as_ref()
            .is_some_and(TimeChangeRequest::is_open)
    }

    /// Writes every field present in `patch` onto this shift.
    pub fn apply_patch(&mut self, patch: &ShiftPatch) {
        if let Some(apartment_id) = patch.apartment_id {
            self.apartment_id = apartment_id;
        }
        if let Some(operator_id) = patch.operator_id {
            self.operator_id = operator_id;
        }
        if let Some(date) = patch.scheduled_date {
            self.scheduled_date = date;
        }
        if let Some(start) = patch.scheduled_start_time {
            self.scheduled_start_time = start;
        }
        if let Some(end) = patch.scheduled_end_time {
            self.scheduled_end_time = Some(end);
        }
        if let Some(start) = patch.actual_start_time {
            self.actual_start_time = Some(start);
        }
        if let Some(end) = patch.actual_end_time {
            self.actual_end_time = Some(end);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(guest_count) = patch.guest_count {
            self.guest_count = guest_count;
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
    }
}

/// Individually addressable fields of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftField {
    Apartment,
    Operator,
    ScheduledDate,
    ScheduledStartTime,
    ScheduledEndTime,
    ActualStartTime,
    ActualEndTime,
    Status,
    GuestCount,
    Notes,
}

impl ShiftField {
    /// Returns the wire name of the field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::Operator => "operator",
            Self::ScheduledDate => "scheduled_date",
            Self::ScheduledStartTime => "scheduled_start_time",
            Self::ScheduledEndTime => "scheduled_end_time",
            Self::ActualStartTime => "actual_start_time",
            Self::ActualEndTime => "actual_end_time",
            Self::Status => "status",
            Self::GuestCount => "guest_count",
            Self::Notes => "notes",
        }
    }

    /// True for the fields that move the shift in time or space.
    #[must_use]
    pub const fn is_schedule_field(&self) -> bool {
        matches!(
            self,
            Self::Apartment | Self::ScheduledDate | Self::ScheduledStartTime | Self::ScheduledEndTime
        )
    }
}

impl std::fmt::Display for ShiftField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed partial update to a shift. Absent fields are untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShiftPatch {
    pub apartment_id: Option<i64>,
    pub operator_id: Option<i64>,
    pub scheduled_date: Option<Date>,
    pub scheduled_start_time: Option<Time>,
    pub scheduled_end_time: Option<Time>,
    pub actual_start_time: Option<OffsetDateTime>,
    pub actual_end_time: Option<OffsetDateTime>,
    pub status: Option<ShiftStatus>,
    pub guest_count: Option<u32>,
    pub notes: Option<String>,
}

impl ShiftPatch {
    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Lists the fields present in this patch.
    #[must_use]
    pub fn fields(&self) -> Vec<ShiftField> {
        let mut fields: Vec<ShiftField> = Vec::new();
        if self.apartment_id.is_some() {
            fields.push(ShiftField::Apartment);
        }
        if self.operator_id.is_some() {
            fields.push(ShiftField::Operator);
        }
        if self.scheduled_date.is_some() {
            fields.push(ShiftField::ScheduledDate);
        }
        if self.scheduled_start_time.is_some() {
            fields.push(ShiftField::ScheduledStartTime);
        }
        if self.scheduled_end_time.is_some() {
            fields.push(ShiftField::ScheduledEndTime);
        }
        if self.actual_start_time.is_some() {
            fields.push(ShiftField::ActualStartTime);
        }
        if self.actual_end_time.is_some() {
            fields.push(ShiftField::ActualEndTime);
        }
        if self.status.is_some() {
            fields.push(ShiftField::Status);
        }
        if self.guest_count.is_some() {
            fields.push(ShiftField::GuestCount);
        }
        if self.notes.is_some() {
            fields.push(ShiftField::Notes);
        }
        fields
    }

    /// Returns a patch containing only the fields whose value differs
    /// from `shift`.
    ///
    /// Clients commonly resubmit a whole form; unchanged values must not
    /// count as edits for authorization purposes.
    #[must_use]
    pub fn effective_against(&self, shift: &Shift) -> Self {
        Self {
            apartment_id: self.apartment_id.filter(|v| *v != shift.apartment_id),
            operator_id: self.operator_id.filter(|v| *v != shift.operator_id),
            scheduled_date: self.scheduled_date.filter(|v| *v != shift.scheduled_date),
            scheduled_start_time: self
                .scheduled_start_time
                .filter(|v| *v != shift.scheduled_start_time),
            scheduled_end_time: self
                .scheduled_end_time
                .filter(|v| Some(*v) != shift.scheduled_end_time),
            actual_start_time: self
                .actual_start_time
                .filter(|v| Some(*v) != shift.actual_start_time),
            actual_end_time: self
                .actual_end_time
                .filter(|v| Some(*v) != shift.actual_end_time),
            status: self.status.filter(|v| *v != shift.status),
            guest_count: self.guest_count.filter(|v| *v != shift.guest_count),
            notes: self
                .notes
                .clone()
                .filter(|v| Some(v) != shift.notes.as_ref()),
        }
    }

    /// True if the apartment, date or scheduled times change.
    #[must_use]
    pub const fn changes_schedule(&self) -> bool {
        self.apartment_id.is_some()
            || self.scheduled_date.is_some()
            || self.scheduled_start_time.is_some()
            || self.scheduled_end_time.is_some()
    }

    /// True if the assigned operator changes.
    #[must_use]
    pub const fn changes_operator(&self) -> bool {
        self.operator_id.is_some()
    }
}

/// A free-text comment left on a shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftComment {
    pub comment_id: Option<i64>,
    pub shift_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: OffsetDateTime,
}

/// Category of a reported problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// Damage or other issue found in the apartment.
    Issue,
    /// Something a guest left behind.
    ForgottenItem,
}

impl ProblemKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::ForgottenItem => "forgotten_item",
        }
    }
}

impl FromStr for ProblemKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issue" => Ok(Self::Issue),
            "forgotten_item" => Ok(Self::ForgottenItem),
            _ => Err(DomainError::InvalidProblemKind(s.to_string())),
        }
    }
}

/// A problem reported by the operator during a shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftProblem {
    pub problem_id: Option<i64>,
    pub shift_id: i64,
    pub reported_by: i64,
    pub kind: ProblemKind,
    pub description: String,
    pub photo_urls: Vec<String>,
    pub created_at: OffsetDateTime,
}

/// A reference to an instruction photo stored elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPhoto {
    pub photo_id: Option<i64>,
    pub shift_id: i64,
    pub uploaded_by: i64,
    pub url: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

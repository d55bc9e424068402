// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Dates are `YYYY-MM-DD`, times of day are `HH:MM` and instants are
//! RFC 3339 strings on the wire.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, Time};
use turnover_audit::AuditEvent;
use turnover_domain::{
    Apartment, Booking, InstructionPhoto, Notification, Shift, ShiftComment, ShiftProblem,
    TimeChangeRequest, UnavailabilityRequest, User,
};
use turnover_persistence::OperatorWorkload;

/// Formats a time of day as `HH:MM`.
#[must_use]
pub fn format_time(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Formats an instant as RFC 3339.
#[must_use]
pub fn format_instant(instant: OffsetDateTime) -> String {
    instant
        .format(&Rfc3339)
        .unwrap_or_else(|_| instant.to_string())
}

fn format_optional_instant(instant: Option<OffsetDateTime>) -> Option<String> {
    instant.map(format_instant)
}

// ============================================================================
// Directory
// ============================================================================

/// API request to register a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserRequest {
    /// One of `admin`, `owner`, `operator`, `viewer`.
    pub role: String,
    pub name: String,
    pub email: String,
}

/// API request to register an apartment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateApartmentRequest {
    pub name: String,
    /// Must reference a user holding the owner role.
    pub owner_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: i64,
    pub role: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            role: user.role.as_str().to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApartmentInfo {
    pub apartment_id: i64,
    pub name: String,
    pub owner_id: i64,
}

impl From<&Apartment> for ApartmentInfo {
    fn from(apartment: &Apartment) -> Self {
        Self {
            apartment_id: apartment.apartment_id,
            name: apartment.name.clone(),
            owner_id: apartment.owner_id,
        }
    }
}

/// API response describing the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    pub user: UserInfo,
    pub capabilities: GlobalCapabilities,
}

/// API response listing users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserInfo>,
}

/// API response listing apartments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListApartmentsResponse {
    pub apartments: Vec<ApartmentInfo>,
}

// ============================================================================
// Shifts
// ============================================================================

/// API request to schedule a shift.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateShiftRequest {
    pub apartment_id: i64,
    pub operator_id: i64,
    /// `YYYY-MM-DD`.
    pub scheduled_date: String,
    /// `HH:MM`.
    pub scheduled_start_time: String,
    /// `HH:MM`, after the start.
    #[serde(default)]
    pub scheduled_end_time: Option<String>,
    pub guest_count: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// API request to edit a shift. Absent fields are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct UpdateShiftRequest {
    pub apartment_id: Option<i64>,
    pub operator_id: Option<i64>,
    pub scheduled_date: Option<String>,
    pub scheduled_start_time: Option<String>,
    pub scheduled_end_time: Option<String>,
    /// RFC 3339.
    pub actual_start_time: Option<String>,
    /// RFC 3339.
    pub actual_end_time: Option<String>,
    pub status: Option<String>,
    pub guest_count: Option<i64>,
    pub notes: Option<String>,
}

/// API request to propose a change that needs the other party's agreement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct OpenTimeChangeRequest {
    pub scheduled_date: Option<String>,
    pub scheduled_start_time: Option<String>,
    pub scheduled_end_time: Option<String>,
    pub apartment_id: Option<i64>,
    pub operator_id: Option<i64>,
    pub reason: Option<String>,
}

/// API request for the owner's review of a live request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReviewTimeChangeRequest {
    pub approve: bool,
}

/// API request for the operator's answer to a live request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RespondTimeChangeRequest {
    pub confirm: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

/// API request to report a problem found during a shift.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportProblemRequest {
    /// `issue` or `forgotten_item`.
    pub kind: String,
    pub description: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddInstructionPhotoRequest {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Query for listing shifts in an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListShiftsRequest {
    pub from: String,
    pub to: String,
    /// Narrow an admin's or viewer's listing to one apartment.
    #[serde(default)]
    pub apartment_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeChangeInfo {
    pub request_id: Option<i64>,
    pub shift_id: i64,
    pub requested_by: i64,
    pub initiator: String,
    pub new_scheduled_date: Option<String>,
    pub new_start_time: String,
    pub new_end_time: Option<String>,
    pub new_apartment_id: Option<i64>,
    pub new_operator_id: Option<i64>,
    pub reason: Option<String>,
    pub status: String,
    pub operator_confirmed: Option<bool>,
    pub operator_confirmed_at: Option<String>,
    pub created_at: String,
    pub closed_at: Option<String>,
}

impl From<&TimeChangeRequest> for TimeChangeInfo {
    fn from(request: &TimeChangeRequest) -> Self {
        Self {
            request_id: request.request_id,
            shift_id: request.shift_id,
            requested_by: request.requested_by,
            initiator: request.initiator.as_str().to_string(),
            new_scheduled_date: request.draft.new_scheduled_date.map(|d| d.to_string()),
            new_start_time: format_time(request.draft.new_start_time),
            new_end_time: request.draft.new_end_time.map(format_time),
            new_apartment_id: request.draft.new_apartment_id,
            new_operator_id: request.draft.new_operator_id,
            reason: request.reason.clone(),
            status: request.status.as_str().to_string(),
            operator_confirmed: request.operator_confirmed,
            operator_confirmed_at: format_optional_instant(request.operator_confirmed_at),
            created_at: format_instant(request.created_at),
            closed_at: format_optional_instant(request.closed_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftInfo {
    pub shift_id: i64,
    pub apartment_id: i64,
    pub operator_id: i64,
    pub created_by: i64,
    pub scheduled_date: String,
    pub scheduled_start_time: String,
    pub scheduled_end_time: Option<String>,
    pub actual_start_time: Option<String>,
    pub actual_end_time: Option<String>,
    pub status: String,
    pub guest_count: u32,
    pub notes: Option<String>,
    pub confirmed_seen: bool,
    pub confirmed_seen_at: Option<String>,
    pub time_change_request: Option<TimeChangeInfo>,
}

impl From<&Shift> for ShiftInfo {
    fn from(shift: &Shift) -> Self {
        Self {
            shift_id: shift.id(),
            apartment_id: shift.apartment_id,
            operator_id: shift.operator_id,
            created_by: shift.created_by,
            scheduled_date: shift.scheduled_date.to_string(),
            scheduled_start_time: format_time(shift.scheduled_start_time),
            scheduled_end_time: shift.scheduled_end_time.map(format_time),
            actual_start_time: format_optional_instant(shift.actual_start_time),
            actual_end_time: format_optional_instant(shift.actual_end_time),
            status: shift.status.as_str().to_string(),
            guest_count: shift.guest_count,
            notes: shift.notes.clone(),
            confirmed_seen: shift.confirmed_seen.confirmed,
            confirmed_seen_at: format_optional_instant(shift.confirmed_seen.confirmed_at),
            time_change_request: shift
                .time_change_request
                .as_ref()
                .filter(|request| request.is_open())
                .map(TimeChangeInfo::from),
        }
    }
}

/// API response for any successful shift mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftMutationResponse {
    /// The shift as stored afterwards; `None` once deleted.
    pub shift: Option<ShiftInfo>,
    /// The audit event recorded for the mutation.
    pub event_id: i64,
    /// The request opened, answered or closed by the mutation.
    pub time_change_request: Option<TimeChangeInfo>,
    /// The comment, problem or photo created by the mutation.
    pub attachment_id: Option<i64>,
    pub notifications_created: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentInfo {
    pub comment_id: Option<i64>,
    pub author_id: i64,
    pub text: String,
    pub created_at: String,
}

impl From<&ShiftComment> for CommentInfo {
    fn from(comment: &ShiftComment) -> Self {
        Self {
            comment_id: comment.comment_id,
            author_id: comment.author_id,
            text: comment.text.clone(),
            created_at: format_instant(comment.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemInfo {
    pub problem_id: Option<i64>,
    pub reported_by: i64,
    pub kind: String,
    pub description: String,
    pub photo_urls: Vec<String>,
    pub created_at: String,
}

impl From<&ShiftProblem> for ProblemInfo {
    fn from(problem: &ShiftProblem) -> Self {
        Self {
            problem_id: problem.problem_id,
            reported_by: problem.reported_by,
            kind: problem.kind.as_str().to_string(),
            description: problem.description.clone(),
            photo_urls: problem.photo_urls.clone(),
            created_at: format_instant(problem.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoInfo {
    pub photo_id: Option<i64>,
    pub uploaded_by: i64,
    pub url: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<&InstructionPhoto> for PhotoInfo {
    fn from(photo: &InstructionPhoto) -> Self {
        Self {
            photo_id: photo.photo_id,
            uploaded_by: photo.uploaded_by,
            url: photo.url.clone(),
            description: photo.description.clone(),
            created_at: format_instant(photo.created_at),
        }
    }
}

/// Advisory flags for what the current user may do to a shift.
///
/// Edit modes are `direct`, `request` or `denied`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ShiftCapabilitiesInfo {
    pub edit_guest_count: bool,
    pub edit_schedule: String,
    pub reassign_operator: String,
    pub start: bool,
    pub finish: bool,
    pub delete: bool,
    pub comment: bool,
    pub request_time_change: bool,
}

/// Role-level flags for the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalCapabilities {
    pub can_manage_directory: bool,
    pub can_create_shift: bool,
    pub can_submit_schedule: bool,
    pub can_view_reports: bool,
}

/// API response for a single shift with everything attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDetailResponse {
    pub shift: ShiftInfo,
    pub comments: Vec<CommentInfo>,
    pub problems: Vec<ProblemInfo>,
    pub instruction_photos: Vec<PhotoInfo>,
    pub capabilities: ShiftCapabilitiesInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListShiftsResponse {
    pub shifts: Vec<ShiftInfo>,
}

/// API response for the time-change history of a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeChangeResponse {
    /// The request awaiting an answer, if any.
    pub live: Option<TimeChangeInfo>,
    /// Every request ever opened for the shift, oldest first.
    pub history: Vec<TimeChangeInfo>,
}

// ============================================================================
// Schedules
// ============================================================================

/// One guest stay as submitted by an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInput {
    /// RFC 3339, with the offset the owner's calendar uses.
    pub check_in: String,
    /// RFC 3339.
    pub check_out: String,
    pub guest_count: i64,
}

/// API request to replace an apartment's bookings for one month.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitScheduleRequest {
    pub year: i32,
    pub month: u8,
    pub bookings: Vec<BookingInput>,
    #[serde(default)]
    pub notify_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInfo {
    pub check_in: String,
    pub check_out: String,
    pub guest_count: u32,
}

impl From<&Booking> for BookingInfo {
    fn from(booking: &Booking) -> Self {
        Self {
            check_in: format_instant(booking.check_in),
            check_out: format_instant(booking.check_out),
            guest_count: booking.guest_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub apartment_id: i64,
    pub year: i32,
    pub month: u8,
    pub bookings: Vec<BookingInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitScheduleResponse {
    pub apartment_id: i64,
    pub year: i32,
    pub month: u8,
    /// Bookings stored after the submission; zero when the month was cleared.
    pub stored_bookings: usize,
    /// Bookings not present before this submission.
    pub newly_added: Vec<BookingInfo>,
    pub event_id: i64,
    pub notifications_created: usize,
}

// ============================================================================
// Notifications, audit and reports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationInfo {
    pub notification_id: Option<i64>,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
    pub related_shift_id: Option<i64>,
}

impl From<&Notification> for NotificationInfo {
    fn from(notification: &Notification) -> Self {
        Self {
            notification_id: notification.notification_id,
            notification_type: notification.notification_type.as_str().to_string(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            read: notification.read,
            created_at: format_instant(notification.created_at),
            related_shift_id: notification.related_shift_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNotificationsResponse {
    pub notifications: Vec<NotificationInfo>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReadResponse {
    /// Notifications that changed from unread to read.
    pub updated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEventInfo {
    pub event_id: Option<i64>,
    pub apartment_id: i64,
    pub shift_id: Option<i64>,
    pub actor_id: i64,
    pub actor_role: String,
    pub cause_id: String,
    pub cause_description: String,
    pub action: String,
    pub details: Option<String>,
    pub before: String,
    pub after: String,
}

impl From<&AuditEvent> for AuditEventInfo {
    fn from(event: &AuditEvent) -> Self {
        Self {
            event_id: event.event_id,
            apartment_id: event.apartment_id,
            shift_id: event.shift_id,
            actor_id: event.actor.user_id,
            actor_role: event.actor.role.clone(),
            cause_id: event.cause.id.clone(),
            cause_description: event.cause.description.clone(),
            action: event.action.name.clone(),
            details: event.action.details.clone(),
            before: event.before.data.clone(),
            after: event.after.data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAuditEventsResponse {
    pub shift_id: i64,
    pub events: Vec<AuditEventInfo>,
}

/// Query for the operator work-days report, inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkDaysReportRequest {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorWorkloadInfo {
    pub operator_id: i64,
    pub operator_name: String,
    pub work_days: usize,
    pub shift_count: usize,
}

impl From<&OperatorWorkload> for OperatorWorkloadInfo {
    fn from(workload: &OperatorWorkload) -> Self {
        Self {
            operator_id: workload.operator_id,
            operator_name: workload.operator_name.clone(),
            work_days: workload.work_days,
            shift_count: workload.shift_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDaysReportResponse {
    pub from: String,
    pub to: String,
    pub operators: Vec<OperatorWorkloadInfo>,
}

// ============================================================================
// History
// ============================================================================

/// Query for completed shifts. Instants bound the actual end time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct HistoryRequest {
    pub apartment_id: Option<i64>,
    pub operator_id: Option<i64>,
    pub ended_from: Option<String>,
    pub ended_to: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub shifts: Vec<ShiftInfo>,
}

// ============================================================================
// Unavailability
// ============================================================================

/// API request for time off on one or more days.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitUnavailabilityRequest {
    /// `YYYY-MM-DD` days.
    pub dates: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReviewUnavailabilityRequest {
    pub approve: bool,
}

/// Query for listing unavailability requests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ListUnavailabilityRequest {
    /// Admins only; operators always see their own.
    pub operator_id: Option<i64>,
    /// `pending`, `approved` or `rejected`.
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailabilityInfo {
    pub request_id: Option<i64>,
    pub operator_id: i64,
    pub dates: Vec<String>,
    pub reason: Option<String>,
    pub status: String,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
}

impl From<&UnavailabilityRequest> for UnavailabilityInfo {
    fn from(request: &UnavailabilityRequest) -> Self {
        Self {
            request_id: request.request_id,
            operator_id: request.operator_id,
            dates: request.dates.iter().map(ToString::to_string).collect(),
            reason: request.reason.clone(),
            status: request.status.as_str().to_string(),
            reviewed_by: request.reviewed_by,
            reviewed_at: format_optional_instant(request.reviewed_at),
            created_at: format_instant(request.created_at),
        }
    }
}

/// API response for submitting or reviewing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailabilityResponse {
    pub request: UnavailabilityInfo,
    pub notifications_created: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUnavailabilityResponse {
    pub requests: Vec<UnavailabilityInfo>,
}

/// Operators with approved time off on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableOperatorsResponse {
    pub date: String,
    pub operator_ids: Vec<i64>,
}

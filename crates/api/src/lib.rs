// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

//! API boundary for the turnover shift coordination system.
//!
//! The API resolves identities, gates whole operations by role, parses
//! wire values and drives the core and persistence. Transport lives in
//! the server crate.

mod auth;
mod capabilities;
mod error;
mod gateway;
mod handlers;
mod reports;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, new_cause};
pub use capabilities::{compute_global_capabilities, compute_shift_capabilities};
pub use error::{
    ApiError, AuthError, translate_constraint, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use gateway::{
    DeliveryResult, GatewayError, NotificationGateway, NullGateway, PushMessage, PushMetadata,
    RecordingGateway, deliver,
};
pub use handlers::{
    ApiContext, DEFAULT_HISTORY_LIMIT, DEFAULT_NOTIFICATION_LIMIT, MAX_NOTIFICATION_LIMIT,
    add_comment, add_instruction_photo, check_unavailable_operators, confirm_seen,
    create_apartment, create_shift, create_user, delete_comment, delete_shift, finish_shift,
    get_schedule, get_shift, get_shift_capabilities, get_time_change, list_apartments,
    list_history, list_notifications, list_shift_audit_events, list_shifts, list_unavailability,
    list_users, mark_all_notifications_read, mark_notification_read, open_time_change,
    report_problem, respond_time_change, review_time_change, review_unavailability, start_shift,
    submit_schedule, submit_unavailability, update_shift, whoami, withdraw_unavailability,
};
pub use reports::{operator_work_days, work_days_csv};
pub use request_response::{
    AddCommentRequest, AddInstructionPhotoRequest, ApartmentInfo, AuditEventInfo, BookingInfo,
    BookingInput, CommentInfo, CreateApartmentRequest, CreateShiftRequest, CreateUserRequest,
    GlobalCapabilities, HistoryRequest, HistoryResponse, ListApartmentsResponse,
    ListAuditEventsResponse, ListNotificationsResponse, ListShiftsRequest, ListShiftsResponse,
    ListUnavailabilityRequest, ListUnavailabilityResponse, ListUsersResponse, MarkReadResponse,
    NotificationInfo, OpenTimeChangeRequest, OperatorWorkloadInfo, PhotoInfo, ProblemInfo,
    ReportProblemRequest, RespondTimeChangeRequest, ReviewTimeChangeRequest,
    ReviewUnavailabilityRequest, ScheduleResponse, ShiftCapabilitiesInfo, ShiftDetailResponse,
    ShiftInfo, ShiftMutationResponse, SubmitScheduleRequest, SubmitScheduleResponse,
    SubmitUnavailabilityRequest, TimeChangeInfo, TimeChangeResponse, UnavailabilityInfo,
    UnavailabilityResponse, UnavailableOperatorsResponse, UpdateShiftRequest, UserInfo,
    WhoAmIResponse, WorkDaysReportRequest, WorkDaysReportResponse, format_instant, format_time,
};

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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod live;
mod session;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono_tz::Tz;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info};
use turnover::{Clock, ShiftPolicy, SystemClock};
use turnover_api::{
    AddCommentRequest, AddInstructionPhotoRequest, ApiContext, ApiError, ApartmentInfo,
    CreateApartmentRequest, CreateShiftRequest, CreateUserRequest, HistoryRequest,
    HistoryResponse, ListApartmentsResponse, ListAuditEventsResponse, ListNotificationsResponse,
    ListShiftsRequest, ListShiftsResponse, ListUnavailabilityRequest,
    ListUnavailabilityResponse, ListUsersResponse, MarkReadResponse, OpenTimeChangeRequest,
    ReportProblemRequest, RespondTimeChangeRequest, ReviewTimeChangeRequest,
    ReviewUnavailabilityRequest, ScheduleResponse, ShiftCapabilitiesInfo, ShiftDetailResponse,
    ShiftMutationResponse, SubmitScheduleRequest, SubmitScheduleResponse,
    SubmitUnavailabilityRequest, TimeChangeResponse, UnavailabilityResponse,
    UnavailableOperatorsResponse, UpdateShiftRequest, UserInfo, WhoAmIResponse,
    WorkDaysReportRequest, WorkDaysReportResponse,
};
use turnover_domain::parse_timezone;
use turnover_persistence::SqlitePersistence;

use crate::live::{LiveGateway, live_notifications_handler};
use crate::session::CurrentUser;

/// Turnover Server - HTTP server for cleaning shift coordination
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// IANA timezone in which shift dates and times are interpreted
    #[arg(short, long, default_value = "UTC")]
    timezone: String,

    /// Seconds within which an equivalent notification is not repeated
    #[arg(long, default_value_t = 300)]
    dedup_window_secs: u64,
}

/// Application state shared across handlers.
///
/// The persistence layer is wrapped in a Mutex; every request holds it
/// for the whole read-decide-write cycle, which serialises mutations.
#[derive(Clone)]
pub struct AppState {
    persistence: Arc<Mutex<SqlitePersistence>>,
    gateway: Arc<LiveGateway>,
    clock: Arc<dyn Clock>,
    policy: Arc<ShiftPolicy>,
}

impl AppState {
    fn new(persistence: SqlitePersistence, policy: ShiftPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            persistence: Arc::new(Mutex::new(persistence)),
            gateway: Arc::new(LiveGateway::new()),
            clock,
            policy: Arc::new(policy),
        }
    }

    fn context<'a>(&'a self, persistence: &'a mut SqlitePersistence) -> ApiContext<'a> {
        ApiContext {
            persistence,
            gateway: self.gateway.as_ref(),
            clock: self.clock.as_ref(),
            policy: self.policy.as_ref(),
        }
    }
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
pub struct HttpError {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error message.
    pub message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::SchedulingConflict { .. } => StatusCode::CONFLICT,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Query parameters for listing notifications.
#[derive(Debug, Deserialize)]
struct NotificationsQuery {
    /// Maximum number of notifications to return.
    limit: Option<i64>,
}

/// Query parameters for the unavailability day check.
#[derive(Debug, Deserialize)]
struct UnavailabilityCheckQuery {
    /// `YYYY-MM-DD`.
    date: String,
}

// ============================================================================
// Directory
// ============================================================================

/// Handler for POST `/users` endpoint.
///
/// The first user may be registered anonymously and must be an admin.
async fn handle_create_user(
    AxumState(app_state): AxumState<AppState>,
    caller: Option<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<UserInfo>, HttpError> {
    info!(role = %req.role, "Handling create_user request");

    let actor = caller.map(|CurrentUser(actor, _)| actor);
    let mut persistence = app_state.persistence.lock().await;
    let user: UserInfo = turnover_api::create_user(
        &mut persistence,
        &req,
        actor.as_ref(),
        app_state.clock.now(),
    )?;
    drop(persistence);

    Ok(Json(user))
}

/// Handler for GET `/users` endpoint.
async fn handle_list_users(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
) -> Result<Json<ListUsersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListUsersResponse = turnover_api::list_users(&mut persistence, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for GET `/whoami` endpoint.
async fn handle_whoami(CurrentUser(actor, user): CurrentUser) -> Json<WhoAmIResponse> {
    Json(turnover_api::whoami(&actor, &user))
}

/// Handler for POST `/apartments` endpoint.
async fn handle_create_apartment(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Json(req): Json<CreateApartmentRequest>,
) -> Result<Json<ApartmentInfo>, HttpError> {
    info!(owner_id = req.owner_id, "Handling create_apartment request");

    let mut persistence = app_state.persistence.lock().await;
    let apartment: ApartmentInfo = turnover_api::create_apartment(&mut persistence, &req, &actor)?;
    drop(persistence);
    Ok(Json(apartment))
}

/// Handler for GET `/apartments` endpoint.
async fn handle_list_apartments(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
) -> Result<Json<ListApartmentsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListApartmentsResponse =
        turnover_api::list_apartments(&mut persistence, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

// ============================================================================
// Cleaning schedules
// ============================================================================

/// Handler for GET `/apartments/{apartment_id}/schedules/{year}/{month}`.
async fn handle_get_schedule(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path((apartment_id, year, month)): Path<(i64, i32, u8)>,
) -> Result<Json<ScheduleResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ScheduleResponse =
        turnover_api::get_schedule(&mut persistence, apartment_id, year, month, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for PUT `/apartments/{apartment_id}/schedules`.
///
/// Replaces the bookings of the month named in the body.
async fn handle_submit_schedule(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(apartment_id): Path<i64>,
    Json(req): Json<SubmitScheduleRequest>,
) -> Result<Json<SubmitScheduleResponse>, HttpError> {
    info!(
        apartment_id,
        year = req.year,
        month = req.month,
        bookings = req.bookings.len(),
        "Handling submit_schedule request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: SubmitScheduleResponse =
        turnover_api::submit_schedule(&mut context, apartment_id, &req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

// ============================================================================
// Shifts
// ============================================================================

/// Handler for POST `/shifts` endpoint.
async fn handle_create_shift(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Json(req): Json<CreateShiftRequest>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        apartment_id = req.apartment_id,
        operator_id = req.operator_id,
        date = %req.scheduled_date,
        "Handling create_shift request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::create_shift(&mut context, &req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for GET `/shifts` endpoint.
async fn handle_list_shifts(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Query(query): Query<ListShiftsRequest>,
) -> Result<Json<ListShiftsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListShiftsResponse = turnover_api::list_shifts(&mut persistence, &query, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for GET `/history` endpoint.
async fn handle_list_history(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Query(query): Query<HistoryRequest>,
) -> Result<Json<HistoryResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: HistoryResponse = turnover_api::list_history(&mut persistence, &query, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for GET `/shifts/{shift_id}` endpoint.
async fn handle_get_shift(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
) -> Result<Json<ShiftDetailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftDetailResponse = turnover_api::get_shift(&mut context, shift_id, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for PATCH `/shifts/{shift_id}` endpoint.
///
/// Edits that fall inside a protected window come back as an open
/// time-change request instead of an applied change.
async fn handle_update_shift(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
    Json(req): Json<UpdateShiftRequest>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        shift_id, "Handling update_shift request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::update_shift(&mut context, shift_id, &req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for DELETE `/shifts/{shift_id}` endpoint.
async fn handle_delete_shift(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        shift_id, "Handling delete_shift request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::delete_shift(&mut context, shift_id, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/shifts/{shift_id}/start` endpoint.
async fn handle_start_shift(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::start_shift(&mut context, shift_id, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/shifts/{shift_id}/finish` endpoint.
async fn handle_finish_shift(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::finish_shift(&mut context, shift_id, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/shifts/{shift_id}/confirm_seen` endpoint.
async fn handle_confirm_seen(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::confirm_seen(&mut context, shift_id, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for GET `/shifts/{shift_id}/capabilities` endpoint.
async fn handle_get_shift_capabilities(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
) -> Result<Json<ShiftCapabilitiesInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftCapabilitiesInfo =
        turnover_api::get_shift_capabilities(&mut context, shift_id, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for GET `/shifts/{shift_id}/audit` endpoint.
///
/// Works for deleted shifts too.
async fn handle_list_shift_audit(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
) -> Result<Json<ListAuditEventsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListAuditEventsResponse =
        turnover_api::list_shift_audit_events(&mut persistence, shift_id, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

// ============================================================================
// Time-change requests
// ============================================================================

/// Handler for GET `/shifts/{shift_id}/time_change` endpoint.
async fn handle_get_time_change(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
) -> Result<Json<TimeChangeResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: TimeChangeResponse =
        turnover_api::get_time_change(&mut persistence, shift_id, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/shifts/{shift_id}/time_change` endpoint.
async fn handle_open_time_change(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
    Json(req): Json<OpenTimeChangeRequest>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        shift_id, "Handling open_time_change request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::open_time_change(&mut context, shift_id, &req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/shifts/{shift_id}/time_change/review` endpoint.
async fn handle_review_time_change(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
    Json(req): Json<ReviewTimeChangeRequest>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        shift_id,
        approve = req.approve,
        "Handling review_time_change request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::review_time_change(&mut context, shift_id, req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/shifts/{shift_id}/time_change/respond` endpoint.
async fn handle_respond_time_change(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
    Json(req): Json<RespondTimeChangeRequest>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        shift_id,
        confirm = req.confirm,
        "Handling respond_time_change request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::respond_time_change(&mut context, shift_id, req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

// ============================================================================
// Attachments
// ============================================================================

/// Handler for POST `/shifts/{shift_id}/comments` endpoint.
async fn handle_add_comment(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
    Json(req): Json<AddCommentRequest>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::add_comment(&mut context, shift_id, &req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for DELETE `/shifts/{shift_id}/comments/{comment_id}` endpoint.
async fn handle_delete_comment(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path((shift_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        shift_id, comment_id, "Handling delete_comment request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::delete_comment(&mut context, shift_id, comment_id, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/shifts/{shift_id}/problems` endpoint.
async fn handle_report_problem(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
    Json(req): Json<ReportProblemRequest>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        shift_id,
        kind = %req.kind,
        "Handling report_problem request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::report_problem(&mut context, shift_id, &req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/shifts/{shift_id}/photos` endpoint.
async fn handle_add_instruction_photo(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(shift_id): Path<i64>,
    Json(req): Json<AddInstructionPhotoRequest>,
) -> Result<Json<ShiftMutationResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: ShiftMutationResponse =
        turnover_api::add_instruction_photo(&mut context, shift_id, &req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

// ============================================================================
// Unavailability
// ============================================================================

/// Handler for POST `/unavailability` endpoint.
async fn handle_submit_unavailability(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Json(req): Json<SubmitUnavailabilityRequest>,
) -> Result<Json<UnavailabilityResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        days = req.dates.len(),
        "Handling submit_unavailability request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: UnavailabilityResponse =
        turnover_api::submit_unavailability(&mut context, &req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for GET `/unavailability` endpoint.
async fn handle_list_unavailability(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Query(query): Query<ListUnavailabilityRequest>,
) -> Result<Json<ListUnavailabilityResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListUnavailabilityResponse =
        turnover_api::list_unavailability(&mut persistence, &query, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/unavailability/{request_id}/review` endpoint.
async fn handle_review_unavailability(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(request_id): Path<i64>,
    Json(req): Json<ReviewUnavailabilityRequest>,
) -> Result<Json<UnavailabilityResponse>, HttpError> {
    info!(
        user_id = actor.user_id,
        request_id,
        approve = req.approve,
        "Handling review_unavailability request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let mut context: ApiContext<'_> = app_state.context(&mut persistence);
    let response: UnavailabilityResponse =
        turnover_api::review_unavailability(&mut context, request_id, req, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for DELETE `/unavailability/{request_id}` endpoint.
async fn handle_withdraw_unavailability(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(request_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    turnover_api::withdraw_unavailability(&mut persistence, request_id, &actor)?;
    drop(persistence);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/unavailability/check` endpoint.
async fn handle_check_unavailability(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Query(query): Query<UnavailabilityCheckQuery>,
) -> Result<Json<UnavailableOperatorsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: UnavailableOperatorsResponse =
        turnover_api::check_unavailable_operators(&mut persistence, &query.date, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

// ============================================================================
// Notifications
// ============================================================================

/// Handler for GET `/notifications` endpoint.
async fn handle_list_notifications(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<ListNotificationsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListNotificationsResponse =
        turnover_api::list_notifications(&mut persistence, &actor, query.limit)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/notifications/{notification_id}/read` endpoint.
async fn handle_mark_notification_read(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<MarkReadResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: MarkReadResponse =
        turnover_api::mark_notification_read(&mut persistence, &actor, notification_id)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/notifications/read_all` endpoint.
async fn handle_mark_all_notifications_read(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
) -> Result<Json<MarkReadResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: MarkReadResponse =
        turnover_api::mark_all_notifications_read(&mut persistence, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

// ============================================================================
// Reports
// ============================================================================

async fn work_days_report(
    app_state: &AppState,
    actor: &turnover_api::AuthenticatedActor,
    query: &WorkDaysReportRequest,
) -> Result<WorkDaysReportResponse, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let report: WorkDaysReportResponse =
        turnover_api::operator_work_days(&mut persistence, query, actor)?;
    drop(persistence);
    Ok(report)
}

/// Handler for GET `/reports/work_days` endpoint.
async fn handle_work_days_report(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Query(query): Query<WorkDaysReportRequest>,
) -> Result<Json<WorkDaysReportResponse>, HttpError> {
    Ok(Json(work_days_report(&app_state, &actor, &query).await?))
}

/// Handler for GET `/reports/work_days.csv` endpoint.
async fn handle_work_days_csv(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(actor, _): CurrentUser,
    Query(query): Query<WorkDaysReportRequest>,
) -> Result<Response, HttpError> {
    let report: WorkDaysReportResponse = work_days_report(&app_state, &actor, &query).await?;
    let csv: String = turnover_api::work_days_csv(&report)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv).into_response())
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/users", post(handle_create_user).get(handle_list_users))
        .route("/whoami", get(handle_whoami))
        .route(
            "/apartments",
            post(handle_create_apartment).get(handle_list_apartments),
        )
        .route(
            "/apartments/{apartment_id}/schedules",
            put(handle_submit_schedule),
        )
        .route(
            "/apartments/{apartment_id}/schedules/{year}/{month}",
            get(handle_get_schedule),
        )
        .route("/shifts", post(handle_create_shift).get(handle_list_shifts))
        .route(
            "/shifts/{shift_id}",
            get(handle_get_shift)
                .patch(handle_update_shift)
                .delete(handle_delete_shift),
        )
        .route("/shifts/{shift_id}/start", post(handle_start_shift))
        .route("/shifts/{shift_id}/finish", post(handle_finish_shift))
        .route("/shifts/{shift_id}/confirm_seen", post(handle_confirm_seen))
        .route(
            "/shifts/{shift_id}/capabilities",
            get(handle_get_shift_capabilities),
        )
        .route("/shifts/{shift_id}/audit", get(handle_list_shift_audit))
        .route(
            "/shifts/{shift_id}/time_change",
            get(handle_get_time_change).post(handle_open_time_change),
        )
        .route(
            "/shifts/{shift_id}/time_change/review",
            post(handle_review_time_change),
        )
        .route(
            "/shifts/{shift_id}/time_change/respond",
            post(handle_respond_time_change),
        )
        .route("/shifts/{shift_id}/comments", post(handle_add_comment))
        .route(
            "/shifts/{shift_id}/comments/{comment_id}",
            delete(handle_delete_comment),
        )
        .route("/shifts/{shift_id}/problems", post(handle_report_problem))
        .route(
            "/shifts/{shift_id}/photos",
            post(handle_add_instruction_photo),
        )
        .route("/history", get(handle_list_history))
        .route(
            "/unavailability",
            post(handle_submit_unavailability).get(handle_list_unavailability),
        )
        .route("/unavailability/check", get(handle_check_unavailability))
        .route(
            "/unavailability/{request_id}",
            delete(handle_withdraw_unavailability),
        )
        .route(
            "/unavailability/{request_id}/review",
            post(handle_review_unavailability),
        )
        .route("/notifications", get(handle_list_notifications))
        .route(
            "/notifications/read_all",
            post(handle_mark_all_notifications_read),
        )
        .route(
            "/notifications/{notification_id}/read",
            post(handle_mark_notification_read),
        )
        .route("/reports/work_days", get(handle_work_days_report))
        .route("/reports/work_days.csv", get(handle_work_days_csv))
        .route("/live", get(live_notifications_handler))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Turnover Server");

    let timezone: Tz = parse_timezone(&args.timezone)?;
    let dedup_window: Duration =
        Duration::seconds(i64::try_from(args.dedup_window_secs).unwrap_or(i64::MAX));
    let policy: ShiftPolicy = ShiftPolicy::default()
        .with_timezone(timezone)
        .with_dedup_window(dedup_window);
    info!(
        timezone = %timezone,
        dedup_window_secs = args.dedup_window_secs,
        "Loaded shift policy"
    );

    let persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };

    let app_state: AppState = AppState::new(persistence, policy, Arc::new(SystemClock));
    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

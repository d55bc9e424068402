// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handlers.
//!
//! Each handler resolves what the core needs from persistence, runs the
//! core decision, persists the result atomically and only then creates
//! and pushes notifications.

use std::str::FromStr;

use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime, Time};
use tracing::{debug, info, warn};
use turnover::{
    Clock, Command, Deduper, NotificationIntent, ScheduleContext, ScheduleOutcome,
    ScheduleSubmission, ShiftChange, ShiftConflicts, ShiftContext, ShiftPolicy, ShiftTargets,
    TransitionResult, UnavailabilityOutcome, apply, authorize_schedule_access,
    authorize_withdrawal, unavailability_scope,
};
use turnover_audit::AuditEvent;
use turnover_domain::{
    Apartment, Booking, DomainError, Notification, ProblemKind, Role, Shift, ShiftComment,
    ShiftPatch, ShiftStatus, StoredSchedule, TimeChangeRequest, UnavailabilityRequest,
    UnavailabilityStatus, User, normalize_text, parse_date, parse_time_of_day,
    validate_guest_count, validate_month,
};
use turnover_persistence::{
    HistoryFilter, PersistedTransition, PersistenceError, ShiftFilter, SqlitePersistence,
};

use crate::auth::{AuthenticatedActor, AuthorizationService, new_cause};
use crate::capabilities::{compute_global_capabilities, compute_shift_capabilities};
use crate::error::{
    ApiError, translate_constraint, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
use crate::gateway::{NotificationGateway, PushMessage, deliver};
use crate::request_response::{
    AddCommentRequest, AddInstructionPhotoRequest, ApartmentInfo, AuditEventInfo, BookingInfo,
    BookingInput, CommentInfo, CreateApartmentRequest, CreateShiftRequest, CreateUserRequest,
    HistoryRequest, HistoryResponse, ListApartmentsResponse, ListAuditEventsResponse,
    ListNotificationsResponse, ListShiftsRequest, ListShiftsResponse, ListUnavailabilityRequest,
    ListUnavailabilityResponse, ListUsersResponse, MarkReadResponse, NotificationInfo,
    OpenTimeChangeRequest, PhotoInfo, ProblemInfo, ReportProblemRequest,
    RespondTimeChangeRequest, ReviewTimeChangeRequest, ReviewUnavailabilityRequest,
    ScheduleResponse, ShiftCapabilitiesInfo, ShiftDetailResponse, ShiftInfo,
    ShiftMutationResponse, SubmitScheduleRequest, SubmitScheduleResponse,
    SubmitUnavailabilityRequest, TimeChangeInfo, TimeChangeResponse, UnavailabilityInfo,
    UnavailabilityResponse, UnavailableOperatorsResponse, UpdateShiftRequest, UserInfo,
    WhoAmIResponse,
};

/// Notifications returned when the caller does not ask for a limit.
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;
/// The most notifications one listing returns.
pub const MAX_NOTIFICATION_LIMIT: i64 = 200;
/// Completed shifts returned by one history listing.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Everything a shift or schedule handler needs besides its request.
pub struct ApiContext<'a> {
    pub persistence: &'a mut SqlitePersistence,
    pub gateway: &'a dyn NotificationGateway,
    pub clock: &'a dyn Clock,
    pub policy: &'a ShiftPolicy,
}

// ============================================================================
// Lookups and parsing
// ============================================================================

fn load_shift(persistence: &mut SqlitePersistence, shift_id: i64) -> Result<Shift, ApiError> {
    persistence
        .get_shift(shift_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| translate_domain_error(DomainError::ShiftNotFound(shift_id)))
}

fn load_apartment(
    persistence: &mut SqlitePersistence,
    apartment_id: i64,
) -> Result<Apartment, ApiError> {
    persistence
        .get_apartment(apartment_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| translate_domain_error(DomainError::ApartmentNotFound(apartment_id)))
}

fn load_user(persistence: &mut SqlitePersistence, user_id: i64) -> Result<User, ApiError> {
    persistence
        .get_user(user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| translate_domain_error(DomainError::UserNotFound(user_id)))
}

/// Checks that a user exists and can be assigned shifts.
fn require_operator(persistence: &mut SqlitePersistence, user_id: i64) -> Result<(), ApiError> {
    let user: User = load_user(persistence, user_id)?;
    if user.role == Role::Operator {
        Ok(())
    } else {
        Err(ApiError::InvalidInput {
            field: String::from("operator_id"),
            message: format!("user {user_id} is not an operator"),
        })
    }
}

/// Checks that the apartment and operator a change points at exist.
fn require_references(
    persistence: &mut SqlitePersistence,
    apartment_id: Option<i64>,
    operator_id: Option<i64>,
) -> Result<(), ApiError> {
    if let Some(apartment_id) = apartment_id {
        load_apartment(persistence, apartment_id)?;
    }
    if let Some(operator_id) = operator_id {
        require_operator(persistence, operator_id)?;
    }
    Ok(())
}

fn parse_date_field(field: &str, value: &str) -> Result<Date, ApiError> {
    parse_date(value).map_err(|e| ApiError::InvalidInput {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn parse_time_field(field: &str, value: &str) -> Result<Time, ApiError> {
    parse_time_of_day(value).map_err(|e| ApiError::InvalidInput {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn parse_instant_field(field: &str, value: &str) -> Result<OffsetDateTime, ApiError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| ApiError::InvalidInput {
        field: field.to_string(),
        message: format!("'{value}' is not an RFC 3339 instant: {e}"),
    })
}

fn parse_optional<T>(
    field: &str,
    value: Option<&str>,
    parse: fn(&str, &str) -> Result<T, ApiError>,
) -> Result<Option<T>, ApiError> {
    value.map(|v| parse(field, v)).transpose()
}

fn parse_patch(request: &UpdateShiftRequest) -> Result<ShiftPatch, ApiError> {
    Ok(ShiftPatch {
        apartment_id: request.apartment_id,
        operator_id: request.operator_id,
        scheduled_date: parse_optional(
            "scheduled_date",
            request.scheduled_date.as_deref(),
            parse_date_field,
        )?,
        scheduled_start_time: parse_optional(
            "scheduled_start_time",
            request.scheduled_start_time.as_deref(),
            parse_time_field,
        )?,
        scheduled_end_time: parse_optional(
            "scheduled_end_time",
            request.scheduled_end_time.as_deref(),
            parse_time_field,
        )?,
        actual_start_time: parse_optional(
            "actual_start_time",
            request.actual_start_time.as_deref(),
            parse_instant_field,
        )?,
        actual_end_time: parse_optional(
            "actual_end_time",
            request.actual_end_time.as_deref(),
            parse_instant_field,
        )?,
        status: request
            .status
            .as_deref()
            .map(ShiftStatus::from_str)
            .transpose()
            .map_err(translate_domain_error)?,
        guest_count: request
            .guest_count
            .map(validate_guest_count)
            .transpose()
            .map_err(translate_domain_error)?,
        notes: request.notes.clone(),
    })
}

fn parse_date_range(from: &str, to: &str) -> Result<(Date, Date), ApiError> {
    let from: Date = parse_date_field("from", from)?;
    let to: Date = parse_date_field("to", to)?;
    if to < from {
        return Err(ApiError::InvalidInput {
            field: String::from("to"),
            message: format!("range end {to} is before its start {from}"),
        });
    }
    Ok((from, to))
}

// ============================================================================
// Shift command pipeline
// ============================================================================

/// The targets of a shift that is not moving.
fn current_targets(shift: &Shift) -> ShiftTargets {
    ShiftTargets::after(shift, &ShiftPatch::default())
}

/// Creates, dedups and pushes notifications for a committed change.
///
/// Returns how many notifications were stored. Failures are logged and
/// never surface to the caller.
fn dispatch_notifications(
    context: &mut ApiContext<'_>,
    intents: Vec<NotificationIntent>,
    now: OffsetDateTime,
) -> usize {
    let deduper: Deduper = Deduper::new(context.policy.dedup_window);
    let mut created: usize = 0;

    for intent in intents {
        let last_sent_at: Option<OffsetDateTime> = intent.dedup_key.as_ref().and_then(|key| {
            context
                .persistence
                .latest_notification_for_key(key)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Dedup lookup failed, sending anyway");
                    None
                })
        });
        if !deduper.should_send(intent.dedup_key.as_ref(), last_sent_at, now) {
            debug!(
                user_id = intent.user_id,
                notification_type = intent.notification_type.as_str(),
                window_secs = deduper.window().whole_seconds(),
                "Suppressed duplicate notification"
            );
            continue;
        }

        let notification: Notification = intent.into_notification(now);
        match context.persistence.insert_notification(&notification) {
            Ok(notification_id) => {
                created += 1;
                deliver(
                    context.gateway,
                    &PushMessage::from_notification(notification_id, &notification),
                );
            }
            Err(e) => {
                warn!(
                    user_id = notification.user_id,
                    error = %e,
                    "Failed to store notification"
                );
            }
        }
    }

    created
}

/// Runs one command against a shift and commits the result.
///
/// This function:
/// - Counts what occupies the command's targets
/// - Applies the command via the core
/// - Persists shift, request, attachment and audit event in one transaction
/// - Creates and pushes notifications after the commit
/// - Reloads the stored shift for the response
#[allow(clippy::too_many_lines)]
fn execute(
    context: &mut ApiContext<'_>,
    shift: Option<&Shift>,
    apartment: &Apartment,
    targets: ShiftTargets,
    command: Command,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let now: OffsetDateTime = context.clock.now();
    let name: &'static str = command.name();
    let existing_id: Option<i64> = shift.and_then(|s| s.shift_id);

    let conflicts: ShiftConflicts = context
        .persistence
        .find_conflicts(&targets, existing_id)
        .map_err(translate_persistence_error)?;
    let admin_ids: Vec<i64> = context
        .persistence
        .list_admin_ids()
        .map_err(translate_persistence_error)?;

    let shift_context: ShiftContext<'_> = ShiftContext {
        shift,
        apartment,
        conflicts,
        admin_ids: &admin_ids,
        now,
    };
    let result: TransitionResult = apply(
        &shift_context,
        command,
        actor.to_shift_actor(),
        new_cause(name, now),
        context.policy,
    )
    .map_err(translate_core_error)?;

    let daily_cap: u32 = context.policy.operator_daily_cap;
    let persisted: PersistedTransition = context
        .persistence
        .persist_transition(&result, now)
        .map_err(|e| match e {
            PersistenceError::ConstraintViolation(constraint) => {
                warn!(action = name, %constraint, "Write rejected by scheduling guard");
                translate_domain_error(translate_constraint(
                    constraint,
                    &targets,
                    existing_id.unwrap_or_default(),
                    daily_cap,
                ))
            }
            other => translate_persistence_error(other),
        })?;

    let TransitionResult {
        change,
        time_change,
        notifications,
        ..
    } = result;
    let deleted: bool = change == ShiftChange::Deleted;

    // A deleted shift can no longer be referenced.
    let intents: Vec<NotificationIntent> = notifications
        .into_iter()
        .map(|intent| {
            if deleted {
                NotificationIntent {
                    related_shift_id: None,
                    ..intent
                }
            } else {
                intent.with_shift_id(persisted.shift_id)
            }
        })
        .collect();
    let notifications_created: usize = dispatch_notifications(context, intents, now);

    let stored: Option<ShiftInfo> = if deleted {
        None
    } else {
        Some(ShiftInfo::from(&load_shift(
            context.persistence,
            persisted.shift_id,
        )?))
    };
    let time_change_request: Option<TimeChangeInfo> = time_change.map(|mut request| {
        request.request_id = request.request_id.or(persisted.request_id);
        TimeChangeInfo::from(&request)
    });

    info!(
        action = name,
        shift_id = persisted.shift_id,
        event_id = persisted.event_id,
        actor_id = actor.user_id,
        notifications_created,
        "Applied shift command"
    );

    Ok(ShiftMutationResponse {
        shift: stored,
        event_id: persisted.event_id,
        time_change_request,
        attachment_id: persisted.attachment_id,
        notifications_created,
        message: format!("{name} applied to shift {}", persisted.shift_id),
    })
}

/// Loads a shift the actor can see, with its apartment.
fn load_visible_shift(
    persistence: &mut SqlitePersistence,
    shift_id: i64,
    actor: &AuthenticatedActor,
) -> Result<(Shift, Apartment), ApiError> {
    let shift: Shift = load_shift(persistence, shift_id)?;
    let apartment: Apartment = load_apartment(persistence, shift.apartment_id)?;
    AuthorizationService::authorize_view_shift(actor, &shift, &apartment)?;
    Ok((shift, apartment))
}

/// Runs a command that does not move the shift.
fn execute_in_place(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    command: Command,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let (shift, apartment) = load_visible_shift(context.persistence, shift_id, actor)?;
    execute(
        context,
        Some(&shift),
        &apartment,
        current_targets(&shift),
        command,
        actor,
    )
}

fn execute_patch(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    patch: ShiftPatch,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let (shift, apartment) = load_visible_shift(context.persistence, shift_id, actor)?;
    require_references(context.persistence, patch.apartment_id, patch.operator_id)?;
    let targets: ShiftTargets = ShiftTargets::after(&shift, &patch);
    execute(
        context,
        Some(&shift),
        &apartment,
        targets,
        Command::UpdateShift { patch },
        actor,
    )
}

// ============================================================================
// Shift handlers
// ============================================================================

/// Schedules a new shift.
///
/// This function:
/// - Verifies the actor is an admin
/// - Checks the apartment and operator exist
/// - Rejects the shift if the apartment is taken that day or the
///   operator is at the daily limit
/// - Notifies the assigned operator
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The apartment or operator does not exist
/// - Any field is invalid
/// - A scheduling rule rejects the shift
pub fn create_shift(
    context: &mut ApiContext<'_>,
    request: &CreateShiftRequest,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    AuthorizationService::authorize_create_shift(actor)?;

    let apartment: Apartment = load_apartment(context.persistence, request.apartment_id)?;
    require_operator(context.persistence, request.operator_id)?;

    let scheduled_date: Date = parse_date_field("scheduled_date", &request.scheduled_date)?;
    let scheduled_start_time: Time =
        parse_time_field("scheduled_start_time", &request.scheduled_start_time)?;
    let scheduled_end_time: Option<Time> = parse_optional(
        "scheduled_end_time",
        request.scheduled_end_time.as_deref(),
        parse_time_field,
    )?;

    let targets: ShiftTargets = ShiftTargets {
        apartment_id: request.apartment_id,
        operator_id: request.operator_id,
        date: scheduled_date,
    };
    let command: Command = Command::CreateShift {
        apartment_id: request.apartment_id,
        operator_id: request.operator_id,
        scheduled_date,
        scheduled_start_time,
        scheduled_end_time,
        guest_count: request.guest_count,
        notes: request.notes.clone(),
    };

    execute(context, None, &apartment, targets, command, actor)
}

/// Edits a shift.
///
/// Each field is applied directly, turned into a time-change request or
/// rejected depending on the actor's role and how close the shift is.
///
/// # Errors
///
/// Returns an error if the shift is not visible to the actor, a field
/// is invalid, or any requested field is not permitted.
pub fn update_shift(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    request: &UpdateShiftRequest,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let patch: ShiftPatch = parse_patch(request)?;
    execute_patch(context, shift_id, patch, actor)
}

/// Records that the assigned operator started work now.
///
/// # Errors
///
/// Returns an error if the actor may not start the shift, it is too
/// early, or the operator already has an active shift.
pub fn start_shift(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let patch: ShiftPatch = ShiftPatch {
        actual_start_time: Some(context.clock.now()),
        ..ShiftPatch::default()
    };
    execute_patch(context, shift_id, patch, actor)
}

/// Records that the assigned operator finished work now.
///
/// # Errors
///
/// Returns an error if the actor may not finish the shift or the
/// minimum working time has not passed.
pub fn finish_shift(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let patch: ShiftPatch = ShiftPatch {
        actual_end_time: Some(context.clock.now()),
        ..ShiftPatch::default()
    };
    execute_patch(context, shift_id, patch, actor)
}

/// Deletes a shift. Its audit trail is kept.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the shift does not exist.
pub fn delete_shift(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    execute_in_place(context, shift_id, Command::DeleteShift, actor)
}

/// Records that the assigned operator has seen the shift.
///
/// # Errors
///
/// Returns an error if the actor is not the assigned operator.
pub fn confirm_seen(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    execute_in_place(context, shift_id, Command::ConfirmSeen, actor)
}

// ============================================================================
// Time-change requests
// ============================================================================

/// Opens a time-change request on a shift.
///
/// # Errors
///
/// Returns an error if the shift already has a live request, the
/// request window has closed, nothing would change, or the actor may
/// not propose changes to this shift.
pub fn open_time_change(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    request: &OpenTimeChangeRequest,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let (shift, apartment) = load_visible_shift(context.persistence, shift_id, actor)?;
    let patch: ShiftPatch = ShiftPatch {
        apartment_id: request.apartment_id,
        operator_id: request.operator_id,
        scheduled_date: parse_optional(
            "scheduled_date",
            request.scheduled_date.as_deref(),
            parse_date_field,
        )?,
        scheduled_start_time: parse_optional(
            "scheduled_start_time",
            request.scheduled_start_time.as_deref(),
            parse_time_field,
        )?,
        scheduled_end_time: parse_optional(
            "scheduled_end_time",
            request.scheduled_end_time.as_deref(),
            parse_time_field,
        )?,
        ..ShiftPatch::default()
    };
    require_references(context.persistence, patch.apartment_id, patch.operator_id)?;

    let targets: ShiftTargets = ShiftTargets::after(&shift, &patch);
    let command: Command = Command::OpenTimeChange {
        patch,
        reason: request.reason.clone(),
    };
    execute(context, Some(&shift), &apartment, targets, command, actor)
}

/// The targets the live request would move the shift to.
fn request_targets(shift: &Shift) -> ShiftTargets {
    shift
        .time_change_request
        .as_ref()
        .filter(|request| request.is_open())
        .map_or_else(
            || current_targets(shift),
            |request| ShiftTargets::of_request(shift, request),
        )
}

/// Records the owner's approval or rejection of the live request.
///
/// # Errors
///
/// Returns an error if there is no live request, the actor is not the
/// apartment's owner, or applying the approved change breaks a rule.
pub fn review_time_change(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    request: ReviewTimeChangeRequest,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let (shift, apartment) = load_visible_shift(context.persistence, shift_id, actor)?;
    let targets: ShiftTargets = request_targets(&shift);
    let command: Command = Command::ReviewTimeChange {
        approve: request.approve,
    };
    execute(context, Some(&shift), &apartment, targets, command, actor)
}

/// Records the assigned operator's answer to the live request.
///
/// # Errors
///
/// Returns an error if there is no live request, the actor is not the
/// assigned operator, or applying the confirmed change breaks a rule.
pub fn respond_time_change(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    request: RespondTimeChangeRequest,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let (shift, apartment) = load_visible_shift(context.persistence, shift_id, actor)?;
    let targets: ShiftTargets = request_targets(&shift);
    let command: Command = Command::RespondTimeChange {
        confirm: request.confirm,
    };
    execute(context, Some(&shift), &apartment, targets, command, actor)
}

/// Returns the live request and the request history of a shift.
///
/// # Errors
///
/// Returns an error if the shift is not visible to the actor.
pub fn get_time_change(
    persistence: &mut SqlitePersistence,
    shift_id: i64,
    actor: &AuthenticatedActor,
) -> Result<TimeChangeResponse, ApiError> {
    load_visible_shift(persistence, shift_id, actor)?;

    let live: Option<TimeChangeRequest> = persistence
        .get_live_time_change(shift_id)
        .map_err(translate_persistence_error)?;
    let history: Vec<TimeChangeRequest> = persistence
        .list_time_changes(shift_id)
        .map_err(translate_persistence_error)?;

    Ok(TimeChangeResponse {
        live: live.as_ref().map(TimeChangeInfo::from),
        history: history.iter().map(TimeChangeInfo::from).collect(),
    })
}

// ============================================================================
// Attachments
// ============================================================================

/// Adds a comment to a shift.
///
/// # Errors
///
/// Returns an error if the text is empty or the actor may not comment.
pub fn add_comment(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    request: &AddCommentRequest,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let command: Command = Command::AddComment {
        text: request.text.clone(),
    };
    execute_in_place(context, shift_id, command, actor)
}

/// Deletes a comment from a shift.
///
/// Admins may delete any comment; other participants only their own.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the comment does not exist on this
/// shift, or `Forbidden` if the actor may not delete it.
pub fn delete_comment(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    comment_id: i64,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let comment: ShiftComment = context
        .persistence
        .get_comment(comment_id)
        .map_err(translate_persistence_error)?
        .filter(|comment| comment.shift_id == shift_id)
        .ok_or_else(|| {
            translate_domain_error(DomainError::CommentNotFound {
                shift_id,
                comment_id,
            })
        })?;
    execute_in_place(context, shift_id, Command::DeleteComment { comment }, actor)
}

/// Reports a problem or a forgotten item found during a shift.
///
/// # Errors
///
/// Returns an error if the kind is unknown, the description is empty,
/// or the actor is not the assigned operator or an admin.
pub fn report_problem(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    request: &ReportProblemRequest,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let kind: ProblemKind = ProblemKind::from_str(&request.kind).map_err(translate_domain_error)?;
    let command: Command = Command::ReportProblem {
        kind,
        description: request.description.clone(),
        photo_urls: request.photo_urls.clone(),
    };
    execute_in_place(context, shift_id, command, actor)
}

/// Attaches an instruction photo to a shift.
///
/// # Errors
///
/// Returns an error if the URL is empty or the actor is not the owner
/// or an admin.
pub fn add_instruction_photo(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    request: &AddInstructionPhotoRequest,
    actor: &AuthenticatedActor,
) -> Result<ShiftMutationResponse, ApiError> {
    let command: Command = Command::AddInstructionPhoto {
        url: request.url.clone(),
        description: request.description.clone(),
    };
    execute_in_place(context, shift_id, command, actor)
}

// ============================================================================
// Shift reads
// ============================================================================

/// Returns a shift with its comments, problems, photos and capabilities.
///
/// # Errors
///
/// Returns an error if the shift does not exist or is not visible.
pub fn get_shift(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    actor: &AuthenticatedActor,
) -> Result<ShiftDetailResponse, ApiError> {
    let (shift, apartment) = load_visible_shift(context.persistence, shift_id, actor)?;
    let capabilities: ShiftCapabilitiesInfo = compute_shift_capabilities(
        actor,
        &shift,
        &apartment,
        context.clock.now(),
        context.policy,
    )?;

    let persistence: &mut SqlitePersistence = context.persistence;
    let comments: Vec<CommentInfo> = persistence
        .list_comments(shift_id)
        .map_err(translate_persistence_error)?
        .iter()
        .map(CommentInfo::from)
        .collect();
    let problems: Vec<ProblemInfo> = persistence
        .list_problems(shift_id)
        .map_err(translate_persistence_error)?
        .iter()
        .map(ProblemInfo::from)
        .collect();
    let instruction_photos: Vec<PhotoInfo> = persistence
        .list_instruction_photos(shift_id)
        .map_err(translate_persistence_error)?
        .iter()
        .map(PhotoInfo::from)
        .collect();

    Ok(ShiftDetailResponse {
        shift: ShiftInfo::from(&shift),
        comments,
        problems,
        instruction_photos,
        capabilities,
    })
}

/// Returns what the actor may currently do to a shift.
///
/// # Errors
///
/// Returns an error if the shift does not exist or is not visible.
pub fn get_shift_capabilities(
    context: &mut ApiContext<'_>,
    shift_id: i64,
    actor: &AuthenticatedActor,
) -> Result<ShiftCapabilitiesInfo, ApiError> {
    let (shift, apartment) = load_visible_shift(context.persistence, shift_id, actor)?;
    compute_shift_capabilities(
        actor,
        &shift,
        &apartment,
        context.clock.now(),
        context.policy,
    )
}

/// Lists the shifts visible to the actor in a date range.
///
/// Admins and viewers see every shift, owners the shifts on their
/// apartments and operators their own.
///
/// # Errors
///
/// Returns an error if the range is invalid or an owner names an
/// apartment they do not own.
pub fn list_shifts(
    persistence: &mut SqlitePersistence,
    request: &ListShiftsRequest,
    actor: &AuthenticatedActor,
) -> Result<ListShiftsResponse, ApiError> {
    let (from, to) = parse_date_range(&request.from, &request.to)?;

    let filter: ShiftFilter = match (actor.role, request.apartment_id) {
        (Role::Admin | Role::Viewer, Some(apartment_id)) => ShiftFilter::Apartment(apartment_id),
        (Role::Admin | Role::Viewer, None) => ShiftFilter::All,
        (Role::Owner, Some(apartment_id)) => {
            let apartment: Apartment = load_apartment(persistence, apartment_id)?;
            if !apartment.is_owned_by(actor.user_id) {
                return Err(ApiError::Forbidden {
                    action: String::from("list_shifts"),
                    reason: format!("apartment {apartment_id} belongs to another owner"),
                });
            }
            ShiftFilter::Apartment(apartment_id)
        }
        (Role::Owner, None) => ShiftFilter::Owner(actor.user_id),
        (Role::Operator, _) => ShiftFilter::Operator(actor.user_id),
    };

    let shifts: Vec<ShiftInfo> = persistence
        .list_shifts(filter, from, to)
        .map_err(translate_persistence_error)?
        .iter()
        .filter(|shift| {
            actor.role != Role::Operator
                || request
                    .apartment_id
                    .is_none_or(|apartment_id| shift.apartment_id == apartment_id)
        })
        .map(ShiftInfo::from)
        .collect();

    Ok(ListShiftsResponse { shifts })
}

/// Lists completed shifts, most recently finished first.
///
/// Operators see their own work and owners the work done on their
/// apartments. Admins and viewers see everything and may narrow by
/// apartment or operator.
///
/// # Errors
///
/// Returns an error if an instant is malformed or an owner names an
/// apartment they do not own.
pub fn list_history(
    persistence: &mut SqlitePersistence,
    request: &HistoryRequest,
    actor: &AuthenticatedActor,
) -> Result<HistoryResponse, ApiError> {
    let mut filter: HistoryFilter = HistoryFilter {
        apartment_id: request.apartment_id,
        operator_id: request.operator_id,
        owner_id: None,
        ended_from: parse_optional(
            "ended_from",
            request.ended_from.as_deref(),
            parse_instant_field,
        )?,
        ended_to: parse_optional(
            "ended_to",
            request.ended_to.as_deref(),
            parse_instant_field,
        )?,
    };

    match actor.role {
        Role::Admin | Role::Viewer => {}
        Role::Owner => {
            if let Some(apartment_id) = request.apartment_id {
                let apartment: Apartment = load_apartment(persistence, apartment_id)?;
                if !apartment.is_owned_by(actor.user_id) {
                    return Err(ApiError::Forbidden {
                        action: String::from("list_history"),
                        reason: format!("apartment {apartment_id} belongs to another owner"),
                    });
                }
            }
            filter.owner_id = Some(actor.user_id);
        }
        Role::Operator => filter.operator_id = Some(actor.user_id),
    }

    let limit: i64 = request
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, DEFAULT_HISTORY_LIMIT);
    let shifts: Vec<ShiftInfo> = persistence
        .list_completed_shifts(filter, limit)
        .map_err(translate_persistence_error)?
        .iter()
        .map(ShiftInfo::from)
        .collect();

    Ok(HistoryResponse { shifts })
}

// ============================================================================
// Cleaning schedules
// ============================================================================

fn parse_booking(booking: &BookingInput) -> Result<Booking, ApiError> {
    let check_in: OffsetDateTime = parse_instant_field("check_in", &booking.check_in)?;
    let check_out: OffsetDateTime = parse_instant_field("check_out", &booking.check_out)?;
    // Non-positive counts are carried as zero and dropped as malformed.
    let guest_count: u32 = u32::try_from(booking.guest_count).unwrap_or(0);
    Ok(Booking::new(check_in, check_out, guest_count))
}

/// Returns the stored bookings for one apartment and month.
///
/// # Errors
///
/// Returns an error if the actor is not the owner or an admin, or the
/// month is out of range.
pub fn get_schedule(
    persistence: &mut SqlitePersistence,
    apartment_id: i64,
    year: i32,
    month: u8,
    actor: &AuthenticatedActor,
) -> Result<ScheduleResponse, ApiError> {
    let apartment: Apartment = load_apartment(persistence, apartment_id)?;
    authorize_schedule_access(&apartment, actor.to_shift_actor()).map_err(translate_core_error)?;
    let calendar_month: Month = validate_month(month).map_err(translate_domain_error)?;

    let bookings: Vec<Booking> = persistence
        .get_schedule(apartment_id, year, calendar_month)
        .map_err(translate_persistence_error)?;

    Ok(ScheduleResponse {
        apartment_id,
        year,
        month,
        bookings: bookings.iter().map(BookingInfo::from).collect(),
    })
}

/// Replaces an apartment's bookings for one month.
///
/// This function:
/// - Drops malformed bookings and reconciles the rest with what is stored
/// - Replaces the stored month, or deletes it when nothing remains
/// - Notifies admins of newly added bookings when asked, at most once
///   per apartment and month within the dedup window
///
/// # Errors
///
/// Returns an error if the actor is not the owner or an admin, a
/// booking instant is malformed, or the year or month is out of range.
pub fn submit_schedule(
    context: &mut ApiContext<'_>,
    apartment_id: i64,
    request: &SubmitScheduleRequest,
    actor: &AuthenticatedActor,
) -> Result<SubmitScheduleResponse, ApiError> {
    let now: OffsetDateTime = context.clock.now();
    let apartment: Apartment = load_apartment(context.persistence, apartment_id)?;
    authorize_schedule_access(&apartment, actor.to_shift_actor()).map_err(translate_core_error)?;
    let month: Month = validate_month(request.month).map_err(translate_domain_error)?;

    let bookings: Vec<Booking> = request
        .bookings
        .iter()
        .map(parse_booking)
        .collect::<Result<_, _>>()?;
    let existing: Vec<Booking> = context
        .persistence
        .get_schedule(apartment_id, request.year, month)
        .map_err(translate_persistence_error)?;
    let admin_ids: Vec<i64> = context
        .persistence
        .list_admin_ids()
        .map_err(translate_persistence_error)?;

    let schedule_context: ScheduleContext<'_> = ScheduleContext {
        apartment: &apartment,
        existing: &existing,
        admin_ids: &admin_ids,
        now,
    };
    let submission: ScheduleSubmission = ScheduleSubmission {
        year: request.year,
        month: request.month,
        bookings,
        notify_admin: request.notify_admin,
    };
    let outcome: ScheduleOutcome = turnover::submit_schedule(
        &schedule_context,
        submission,
        actor.to_shift_actor(),
        new_cause("SubmitSchedule", now),
    )
    .map_err(translate_core_error)?;

    let event_id: i64 = context
        .persistence
        .persist_schedule(apartment_id, &outcome, now)
        .map_err(translate_persistence_error)?;

    let stored_bookings: usize = match &outcome.stored {
        StoredSchedule::Replace(bookings) => bookings.len(),
        StoredSchedule::Delete => 0,
    };
    let newly_added: Vec<BookingInfo> = outcome.newly_added.iter().map(BookingInfo::from).collect();
    let notifications_created: usize = dispatch_notifications(context, outcome.notifications, now);

    info!(
        apartment_id,
        year = request.year,
        month = request.month,
        stored_bookings,
        newly_added = newly_added.len(),
        notifications_created,
        "Submitted cleaning schedule"
    );

    Ok(SubmitScheduleResponse {
        apartment_id,
        year: request.year,
        month: request.month,
        stored_bookings,
        newly_added,
        event_id,
        notifications_created,
    })
}

// ============================================================================
// Unavailability
// ============================================================================

fn load_unavailability(
    persistence: &mut SqlitePersistence,
    request_id: i64,
) -> Result<UnavailabilityRequest, ApiError> {
    persistence
        .get_unavailability(request_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| {
            translate_domain_error(DomainError::UnavailabilityRequestNotFound(request_id))
        })
}

/// Records an operator's request for time off and tells every admin.
///
/// # Errors
///
/// Returns an error if the actor is not an operator, a date is
/// malformed or past, or no date is given.
pub fn submit_unavailability(
    context: &mut ApiContext<'_>,
    request: &SubmitUnavailabilityRequest,
    actor: &AuthenticatedActor,
) -> Result<UnavailabilityResponse, ApiError> {
    let now: OffsetDateTime = context.clock.now();
    let dates: Vec<Date> = request
        .dates
        .iter()
        .map(|value| parse_date_field("dates", value))
        .collect::<Result<_, _>>()?;
    let operator: User = load_user(context.persistence, actor.user_id)?;
    let admin_ids: Vec<i64> = context
        .persistence
        .list_admin_ids()
        .map_err(translate_persistence_error)?;

    let outcome: UnavailabilityOutcome = turnover::submit_unavailability(
        actor.to_shift_actor(),
        &operator.name,
        dates,
        request.reason.as_deref(),
        &admin_ids,
        now,
        context.policy,
    )
    .map_err(translate_core_error)?;

    let request_id: i64 = context
        .persistence
        .insert_unavailability(&outcome.request)
        .map_err(translate_persistence_error)?;
    let stored: UnavailabilityRequest = outcome.request.with_id(request_id);
    let notifications_created: usize =
        dispatch_notifications(context, outcome.notifications, now);

    info!(
        request_id,
        operator_id = actor.user_id,
        days = stored.dates.len(),
        notifications_created,
        "Submitted unavailability request"
    );
    Ok(UnavailabilityResponse {
        request: UnavailabilityInfo::from(&stored),
        notifications_created,
    })
}

/// Approves or rejects a pending request and tells the operator.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the request does not
/// exist or it was already reviewed.
pub fn review_unavailability(
    context: &mut ApiContext<'_>,
    request_id: i64,
    review: ReviewUnavailabilityRequest,
    actor: &AuthenticatedActor,
) -> Result<UnavailabilityResponse, ApiError> {
    let now: OffsetDateTime = context.clock.now();
    let request: UnavailabilityRequest = load_unavailability(context.persistence, request_id)?;
    let outcome: UnavailabilityOutcome =
        turnover::review_unavailability(actor.to_shift_actor(), request, review.approve, now)
            .map_err(translate_core_error)?;

    context
        .persistence
        .save_unavailability_review(&outcome.request)
        .map_err(translate_persistence_error)?;
    let notifications_created: usize =
        dispatch_notifications(context, outcome.notifications, now);

    info!(
        request_id,
        reviewer_id = actor.user_id,
        status = %outcome.request.status,
        "Reviewed unavailability request"
    );
    Ok(UnavailabilityResponse {
        request: UnavailabilityInfo::from(&outcome.request),
        notifications_created,
    })
}

/// Withdraws a pending request.
///
/// # Errors
///
/// Returns an error if the request does not exist, was already reviewed
/// or belongs to another operator.
pub fn withdraw_unavailability(
    persistence: &mut SqlitePersistence,
    request_id: i64,
    actor: &AuthenticatedActor,
) -> Result<(), ApiError> {
    let request: UnavailabilityRequest = load_unavailability(persistence, request_id)?;
    authorize_withdrawal(actor.to_shift_actor(), &request).map_err(translate_core_error)?;
    persistence
        .delete_unavailability(request_id)
        .map_err(translate_persistence_error)?;
    info!(request_id, actor_id = actor.user_id, "Withdrew unavailability request");
    Ok(())
}

/// Lists unavailability requests, newest first.
///
/// # Errors
///
/// Returns an error if the actor is neither an operator nor an admin or
/// the status is unknown.
pub fn list_unavailability(
    persistence: &mut SqlitePersistence,
    request: &ListUnavailabilityRequest,
    actor: &AuthenticatedActor,
) -> Result<ListUnavailabilityResponse, ApiError> {
    let operator_id: Option<i64> =
        unavailability_scope(actor.to_shift_actor(), request.operator_id)
            .map_err(translate_core_error)?;
    let status: Option<UnavailabilityStatus> = request
        .status
        .as_deref()
        .map(UnavailabilityStatus::from_str)
        .transpose()
        .map_err(translate_domain_error)?;

    let requests: Vec<UnavailabilityInfo> = persistence
        .list_unavailability(operator_id, status)
        .map_err(translate_persistence_error)?
        .iter()
        .map(UnavailabilityInfo::from)
        .collect();
    Ok(ListUnavailabilityResponse { requests })
}

/// Lists the operators with approved time off on a day.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the date is
/// malformed.
pub fn check_unavailable_operators(
    persistence: &mut SqlitePersistence,
    date: &str,
    actor: &AuthenticatedActor,
) -> Result<UnavailableOperatorsResponse, ApiError> {
    AuthorizationService::authorize_check_unavailability(actor)?;
    let day: Date = parse_date_field("date", date)?;
    let operator_ids: Vec<i64> = persistence
        .unavailable_operator_ids(day)
        .map_err(translate_persistence_error)?;
    Ok(UnavailableOperatorsResponse {
        date: day.to_string(),
        operator_ids,
    })
}

// ============================================================================
// Notifications
// ============================================================================

/// Lists the actor's notifications, newest first, with the unread count.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_notifications(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
    limit: Option<i64>,
) -> Result<ListNotificationsResponse, ApiError> {
    let limit: i64 = limit
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .clamp(1, MAX_NOTIFICATION_LIMIT);
    let notifications: Vec<NotificationInfo> = persistence
        .list_notifications(actor.user_id, limit)
        .map_err(translate_persistence_error)?
        .iter()
        .map(NotificationInfo::from)
        .collect();
    let unread_count: i64 = persistence
        .count_unread_notifications(actor.user_id)
        .map_err(translate_persistence_error)?;

    Ok(ListNotificationsResponse {
        notifications,
        unread_count,
    })
}

/// Marks one of the actor's notifications as read.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the notification does not exist or
/// belongs to someone else.
pub fn mark_notification_read(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
    notification_id: i64,
) -> Result<MarkReadResponse, ApiError> {
    persistence
        .mark_notification_read(actor.user_id, notification_id)
        .map_err(|e| match e {
            PersistenceError::NotFound(_) => {
                translate_domain_error(DomainError::NotificationNotFound(notification_id))
            }
            other => translate_persistence_error(other),
        })?;
    Ok(MarkReadResponse { updated: 1 })
}

/// Marks all of the actor's notifications as read.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_all_notifications_read(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
) -> Result<MarkReadResponse, ApiError> {
    let updated: usize = persistence
        .mark_all_notifications_read(actor.user_id)
        .map_err(translate_persistence_error)?;
    Ok(MarkReadResponse { updated })
}

// ============================================================================
// Audit
// ============================================================================

/// Returns the audit trail of a shift, including after deletion.
///
/// # Errors
///
/// Returns an error if no shift with this id ever existed, or the actor
/// is neither an admin nor the apartment's owner.
pub fn list_shift_audit_events(
    persistence: &mut SqlitePersistence,
    shift_id: i64,
    actor: &AuthenticatedActor,
) -> Result<ListAuditEventsResponse, ApiError> {
    let events: Vec<AuditEvent> = persistence
        .list_shift_audit_events(shift_id)
        .map_err(translate_persistence_error)?;

    let apartment_id: i64 = match events.first() {
        Some(event) => event.apartment_id,
        None => load_shift(persistence, shift_id)?.apartment_id,
    };
    let apartment: Apartment = load_apartment(persistence, apartment_id)?;
    AuthorizationService::authorize_view_audit(actor, &apartment)?;

    Ok(ListAuditEventsResponse {
        shift_id,
        events: events.iter().map(AuditEventInfo::from).collect(),
    })
}

// ============================================================================
// Directory
// ============================================================================

/// Registers a user.
///
/// The first user of an empty directory must be an admin and needs no
/// caller. After that only admins may register users.
///
/// # Errors
///
/// Returns an error if:
/// - The directory is not empty and the actor is missing or not an admin
/// - The first user is not an admin
/// - The role is unknown or the name or email is empty
/// - The email is already registered
pub fn create_user(
    persistence: &mut SqlitePersistence,
    request: &CreateUserRequest,
    actor: Option<&AuthenticatedActor>,
    now: OffsetDateTime,
) -> Result<UserInfo, ApiError> {
    let role: Role = Role::from_str(&request.role).map_err(translate_domain_error)?;
    let name: String = normalize_text("name", &request.name).map_err(translate_domain_error)?;
    let email: String = normalize_text("email", &request.email).map_err(translate_domain_error)?;
    if !email.contains('@') {
        return Err(ApiError::InvalidInput {
            field: String::from("email"),
            message: format!("'{email}' is not an email address"),
        });
    }

    let existing: Vec<User> = persistence
        .list_users()
        .map_err(translate_persistence_error)?;
    if existing.is_empty() {
        if role != Role::Admin {
            return Err(ApiError::DomainRuleViolation {
                rule: String::from("first_user_is_admin"),
                message: String::from("the first registered user must be an admin"),
            });
        }
    } else {
        let actor: &AuthenticatedActor = actor.ok_or_else(|| ApiError::AuthenticationFailed {
            reason: String::from("registering users requires an identity"),
        })?;
        AuthorizationService::authorize_manage_directory(actor)?;
    }
    if existing
        .iter()
        .any(|user| user.email.eq_ignore_ascii_case(&email))
    {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("unique_email"),
            message: format!("email '{email}' is already registered"),
        });
    }

    let user_id: i64 = persistence
        .create_user(role, &name, &email, now)
        .map_err(translate_persistence_error)?;
    let user: User = load_user(persistence, user_id)?;

    info!(user_id, role = %role, "Registered user");
    Ok(UserInfo::from(&user))
}

/// Lists every registered user.
///
/// # Errors
///
/// Returns an error if the actor is not an admin.
pub fn list_users(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
) -> Result<ListUsersResponse, ApiError> {
    AuthorizationService::authorize_manage_directory(actor)?;
    let users: Vec<UserInfo> = persistence
        .list_users()
        .map_err(translate_persistence_error)?
        .iter()
        .map(UserInfo::from)
        .collect();
    Ok(ListUsersResponse { users })
}

/// Describes the caller and what they may do in general.
#[must_use]
pub fn whoami(actor: &AuthenticatedActor, user: &User) -> WhoAmIResponse {
    WhoAmIResponse {
        user: UserInfo::from(user),
        capabilities: compute_global_capabilities(actor),
    }
}

/// Registers an apartment for an owner.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the name is empty, or
/// the owner does not exist or does not hold the owner role.
pub fn create_apartment(
    persistence: &mut SqlitePersistence,
    request: &CreateApartmentRequest,
    actor: &AuthenticatedActor,
) -> Result<ApartmentInfo, ApiError> {
    AuthorizationService::authorize_manage_directory(actor)?;
    let name: String = normalize_text("name", &request.name).map_err(translate_domain_error)?;

    let owner: User = load_user(persistence, request.owner_id)?;
    if owner.role != Role::Owner {
        return Err(ApiError::InvalidInput {
            field: String::from("owner_id"),
            message: format!("user {} is not an owner", request.owner_id),
        });
    }

    let apartment_id: i64 = persistence
        .create_apartment(&name, request.owner_id)
        .map_err(translate_persistence_error)?;
    let apartment: Apartment = load_apartment(persistence, apartment_id)?;

    info!(apartment_id, owner_id = request.owner_id, "Registered apartment");
    Ok(ApartmentInfo::from(&apartment))
}

/// Lists the apartments visible to the actor.
///
/// # Errors
///
/// Returns `Forbidden` for operators, who see apartments only through
/// their shifts.
pub fn list_apartments(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
) -> Result<ListApartmentsResponse, ApiError> {
    let owner_filter: Option<i64> = match actor.role {
        Role::Admin | Role::Viewer => None,
        Role::Owner => Some(actor.user_id),
        Role::Operator => {
            return Err(ApiError::Forbidden {
                action: String::from("list_apartments"),
                reason: String::from("operators see apartments through their shifts"),
            });
        }
    };
    let apartments: Vec<ApartmentInfo> = persistence
        .list_apartments(owner_filter)
        .map_err(translate_persistence_error)?
        .iter()
        .map(ApartmentInfo::from)
        .collect();
    Ok(ListApartmentsResponse { apartments })
}

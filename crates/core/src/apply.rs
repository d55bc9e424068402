// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::Duration;
use turnover_audit::{Action, AuditEvent, Cause, StateSnapshot};
use turnover_domain::{
    ConfirmedSeen, DomainError, InstructionPhoto, NotificationType, ProblemKind, Resolution, Role,
    Shift, ShiftComment, ShiftField, ShiftPatch, ShiftProblem, TimeChangeDraft, TimeChangeRequest,
    normalize_text, validate_guest_count, validate_time_range,
};

use crate::authorization::{Decision, EditContext, decide, validate_slot};
use crate::command::Command;
use crate::error::CoreError;
use crate::notify::{self, NotificationIntent};
use crate::policy::ShiftPolicy;
use crate::state::{ShiftActor, ShiftChange, ShiftContext, TransitionResult, shift_snapshot};

/// Applies a command to a shift, producing the new shift, one audit event
/// and the notifications to create.
///
/// # Arguments
///
/// * `context` - The shift, its apartment, conflicts at the targets and now
/// * `command` - The command to apply
/// * `actor` - The user performing this action
/// * `cause` - The cause or reason for this action
/// * `policy` - Time windows and limits
///
/// # Errors
///
/// Returns an error if:
/// - The actor's role or ownership does not permit the command
/// - The command violates a scheduling or time-window rule
/// - The command needs a shift and the context has none
#[allow(clippy::too_many_lines)]
pub fn apply(
    context: &ShiftContext<'_>,
    command: Command,
    actor: ShiftActor,
    cause: Cause,
    policy: &ShiftPolicy,
) -> Result<TransitionResult, CoreError> {
    let name: &'static str = command.name();
    match command {
        Command::CreateShift {
            apartment_id,
            operator_id,
            scheduled_date,
            scheduled_start_time,
            scheduled_end_time,
            guest_count,
            notes,
        } => {
            let guest_count: u32 = validate_guest_count(guest_count)?;
            if let Some(end) = scheduled_end_time {
                validate_time_range(scheduled_start_time, end)?;
            }
            let shift: Shift = Shift::new(
                apartment_id,
                operator_id,
                actor.user_id,
                scheduled_date,
                scheduled_start_time,
                scheduled_end_time,
                guest_count,
                notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            );
            create_shift(context, shift, actor, cause, policy)
        }
        Command::UpdateShift { patch } => {
            update_shift(context, require_shift(context, name)?, &patch, actor, cause, policy)
        }
        Command::DeleteShift => delete_shift(context, require_shift(context, name)?, actor, cause),
        Command::OpenTimeChange { patch, reason } => open_time_change(
            context,
            require_shift(context, name)?,
            &patch,
            reason,
            actor,
            cause,
            policy,
        ),
        Command::ReviewTimeChange { approve } => {
            let shift: &Shift = require_shift(context, name)?;
            if actor.role != Role::Owner || !context.apartment.is_owned_by(actor.user_id) {
                return Err(forbidden(
                    "time_change_request",
                    "only the apartment owner may review a request",
                ));
            }
            let mut request: TimeChangeRequest = live_request(shift)?;
            let resolution: Resolution = request.record_owner_review(approve, context.now)?;
            let answer: NotificationType = if approve {
                NotificationType::TimeChangeApproved
            } else {
                NotificationType::TimeChangeRejected
            };
            resolve_time_change(
                context, shift, request, resolution, answer, actor, cause, policy,
            )
        }
        Command::RespondTimeChange { confirm } => {
            let shift: &Shift = require_shift(context, name)?;
            if actor.role != Role::Operator || shift.operator_id != actor.user_id {
                return Err(forbidden(
                    "time_change_request",
                    "only the assigned operator may confirm a request",
                ));
            }
            let mut request: TimeChangeRequest = live_request(shift)?;
            let resolution: Resolution = request.record_operator_response(confirm, context.now)?;
            let answer: NotificationType = if confirm {
                NotificationType::TimeChangeConfirmedByOperator
            } else {
                NotificationType::TimeChangeRejected
            };
            resolve_time_change(
                context, shift, request, resolution, answer, actor, cause, policy,
            )
        }
        Command::ConfirmSeen => confirm_seen(context, require_shift(context, name)?, actor, cause),
        Command::AddComment { text } => {
            add_comment(context, require_shift(context, name)?, &text, actor, cause)
        }
        Command::DeleteComment { comment } => {
            delete_comment(context, require_shift(context, name)?, &comment, actor, cause)
        }
        Command::ReportProblem {
            kind,
            description,
            photo_urls,
        } => report_problem(
            context,
            require_shift(context, name)?,
            kind,
            &description,
            photo_urls,
            actor,
            cause,
        ),
        Command::AddInstructionPhoto { url, description } => add_instruction_photo(
            context,
            require_shift(context, name)?,
            &url,
            description,
            actor,
            cause,
        ),
    }
}

fn require_shift<'a>(
    context: &ShiftContext<'a>,
    command: &'static str,
) -> Result<&'a Shift, CoreError> {
    context.shift.ok_or(CoreError::MissingShift { command })
}

fn forbidden(field: &str, reason: &str) -> CoreError {
    CoreError::DomainViolation(DomainError::Forbidden {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}

fn live_request(shift: &Shift) -> Result<TimeChangeRequest, CoreError> {
    shift
        .time_change_request
        .clone()
        .filter(TimeChangeRequest::is_open)
        .ok_or_else(|| {
            CoreError::DomainViolation(DomainError::NoOpenTimeChangeRequest {
                shift_id: shift.id(),
            })
        })
}

fn event(
    context: &ShiftContext<'_>,
    shift: &Shift,
    actor: ShiftActor,
    cause: Cause,
    action: Action,
    before: StateSnapshot,
    after: StateSnapshot,
) -> AuditEvent {
    AuditEvent::new(
        context.apartment.apartment_id,
        shift.shift_id,
        actor.to_audit_actor(),
        cause,
        action,
        before,
        after,
    )
}

fn create_shift(
    context: &ShiftContext<'_>,
    shift: Shift,
    actor: ShiftActor,
    cause: Cause,
    policy: &ShiftPolicy,
) -> Result<TransitionResult, CoreError> {
    if actor.role != Role::Admin {
        return Err(forbidden("shift", "only admins may create shifts"));
    }

    // Surfaces a nonexistent local time before anything is stored.
    policy.scheduled_start(&shift)?;

    if context.conflicts.apartment_taken {
        return Err(CoreError::DomainViolation(
            DomainError::ApartmentAlreadyBooked {
                apartment_id: shift.apartment_id,
                date: shift.scheduled_date,
            },
        ));
    }
    if policy.operator_is_full(context.conflicts.operator_count) {
        return Err(CoreError::DomainViolation(
            DomainError::OperatorDailyLimitExceeded {
                operator_id: shift.operator_id,
                date: shift.scheduled_date,
                limit: policy.operator_daily_cap,
            },
        ));
    }

    let action: Action = Action::new(
        String::from("CreateShift"),
        Some(format!(
            "Scheduled {} on {} for operator {}",
            context.apartment.name, shift.scheduled_date, shift.operator_id
        )),
    );
    let audit_event: AuditEvent = event(
        context,
        &shift,
        actor,
        cause,
        action,
        StateSnapshot::absent(),
        shift_snapshot(&shift),
    );
    let notifications: Vec<NotificationIntent> =
        vec![notify::shift_assigned(context.apartment, &shift)];

    Ok(TransitionResult {
        shift,
        change: ShiftChange::Created,
        time_change: None,
        audit_event,
        notifications,
    })
}

fn describe_fields(patch: &ShiftPatch) -> String {
    patch
        .fields()
        .iter()
        .map(ShiftField::as_str)
        .collect::<Vec<&str>>()
        .join(",")
}

fn update_shift(
    context: &ShiftContext<'_>,
    shift: &Shift,
    patch: &ShiftPatch,
    actor: ShiftActor,
    cause: Cause,
    policy: &ShiftPolicy,
) -> Result<TransitionResult, CoreError> {
    let edit: EditContext = EditContext {
        now: context.now,
        apartment_owner_id: context.apartment.owner_id,
        conflicts: context.conflicts,
    };
    let decision: Decision = decide(actor, shift, patch, &edit, policy)?.into_accepted()?;
    if decision.is_noop() {
        return Err(CoreError::DomainViolation(DomainError::NoChangesRequested));
    }

    let mut updated: Shift = shift.clone();
    updated.apply_patch(&decision.applied);

    let mut notifications: Vec<NotificationIntent> = Vec::new();
    if decision.applied.changes_operator() {
        notifications.push(notify::shift_reassigned(
            shift.operator_id,
            context.apartment,
            &updated,
        ));
        notifications.push(notify::shift_assigned(context.apartment, &updated));
    } else if decision.applied.changes_schedule() {
        notifications.push(notify::shift_time_changed(context.apartment, &updated));
    }
    if decision.applied.guest_count.is_some() {
        notifications.push(notify::guest_count_updated(context.apartment, &updated));
    }

    let mut time_change: Option<TimeChangeRequest> = None;
    if let Some(draft) = decision.deferred {
        let request: TimeChangeRequest = TimeChangeRequest::open(
            shift.id(),
            actor.user_id,
            actor.role,
            draft,
            None,
            context.now,
        );
        updated.time_change_request = Some(request.clone());
        notifications.push(notify::time_change_requested(
            shift.operator_id,
            actor.role == Role::Admin,
            context.apartment,
            &updated,
        ));
        time_change = Some(request);
    }

    let details: String = if time_change.is_some() {
        format!(
            "applied [{}], deferred to a time change request",
            describe_fields(&decision.applied)
        )
    } else {
        format!("applied [{}]", describe_fields(&decision.applied))
    };
    let audit_event: AuditEvent = event(
        context,
        shift,
        actor,
        cause,
        Action::new(String::from("UpdateShift"), Some(details)),
        shift_snapshot(shift),
        shift_snapshot(&updated),
    );

    Ok(TransitionResult {
        shift: updated,
        change: ShiftChange::Updated,
        time_change,
        audit_event,
        notifications,
    })
}

fn delete_shift(
    context: &ShiftContext<'_>,
    shift: &Shift,
    actor: ShiftActor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let permitted: bool = match actor.role {
        Role::Admin => true,
        Role::Owner => {
            shift.created_by == actor.user_id && context.apartment.is_owned_by(actor.user_id)
        }
        Role::Operator | Role::Viewer => false,
    };
    if !permitted {
        return Err(forbidden(
            "shift",
            "owners may only delete shifts they created on their own apartments",
        ));
    }

    let audit_event: AuditEvent = event(
        context,
        shift,
        actor,
        cause,
        Action::new(String::from("DeleteShift"), None),
        shift_snapshot(shift),
        StateSnapshot::absent(),
    );

    Ok(TransitionResult {
        shift: shift.clone(),
        change: ShiftChange::Deleted,
        time_change: None,
        audit_event,
        notifications: vec![notify::shift_deleted(context.apartment, shift)],
    })
}

#[allow(clippy::too_many_lines)]
fn open_time_change(
    context: &ShiftContext<'_>,
    shift: &Shift,
    patch: &ShiftPatch,
    reason: Option<String>,
    actor: ShiftActor,
    cause: Cause,
    policy: &ShiftPolicy,
) -> Result<TransitionResult, CoreError> {
    let permitted: bool = match actor.role {
        Role::Admin => true,
        Role::Owner => context.apartment.is_owned_by(actor.user_id),
        Role::Operator => shift.operator_id == actor.user_id,
        Role::Viewer => false,
    };
    if !permitted {
        return Err(forbidden(
            "time_change_request",
            "only the shift's operator, the apartment owner or an admin may request a change",
        ));
    }
    if shift.has_open_time_change() {
        return Err(CoreError::DomainViolation(
            DomainError::TimeChangeRequestAlreadyOpen {
                shift_id: shift.id(),
            },
        ));
    }

    let effective: ShiftPatch = patch.effective_against(shift);
    let touches_other: bool = effective.actual_start_time.is_some()
        || effective.actual_end_time.is_some()
        || effective.status.is_some()
        || effective.guest_count.is_some()
        || effective.notes.is_some();
    if touches_other {
        return Err(forbidden(
            "time_change_request",
            "requests may only change the date, times, apartment or operator",
        ));
    }
    if actor.role != Role::Admin
        && (effective.apartment_id.is_some() || effective.operator_id.is_some())
    {
        return Err(forbidden(
            "time_change_request",
            "only admins may request a different apartment or operator",
        ));
    }
    if effective.is_empty() {
        return Err(CoreError::DomainViolation(DomainError::NoChangesRequested));
    }

    let lead: Duration = policy.lead_time(shift, context.now)?;
    if lead < policy.request_cutoff {
        return Err(CoreError::DomainViolation(
            DomainError::RequestWindowClosed {
                cutoff_minutes: policy.request_cutoff.whole_minutes(),
            },
        ));
    }
    validate_slot(shift, &effective, &context.conflicts, policy, false)?;

    let reason: Option<String> = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    let request: TimeChangeRequest = TimeChangeRequest::open(
        shift.id(),
        actor.user_id,
        actor.role,
        TimeChangeDraft::from_patch(&effective, shift),
        reason,
        context.now,
    );

    let mut updated: Shift = shift.clone();
    updated.time_change_request = Some(request.clone());

    let recipient: i64 = match request.counterparty() {
        Role::Owner => context.apartment.owner_id,
        Role::Admin | Role::Operator | Role::Viewer => shift.operator_id,
    };
    let mut notifications: Vec<NotificationIntent> = Vec::new();
    if recipient != actor.user_id {
        notifications.push(notify::time_change_requested(
            recipient,
            actor.role == Role::Admin,
            context.apartment,
            &updated,
        ));
    }

    let audit_event: AuditEvent = event(
        context,
        shift,
        actor,
        cause,
        Action::new(
            String::from("OpenTimeChange"),
            Some(format!("requested [{}]", describe_fields(&effective))),
        ),
        shift_snapshot(shift),
        shift_snapshot(&updated),
    );

    Ok(TransitionResult {
        shift: updated,
        change: ShiftChange::Updated,
        time_change: Some(request),
        audit_event,
        notifications,
    })
}

/// Carries out the outcome of an owner review or operator response.
///
/// When the answer applies the request, the change is re-validated
/// against the current conflicts first. On failure nothing is returned
/// to persist, so the request stays pending.
#[allow(clippy::too_many_arguments)]
fn resolve_time_change(
    context: &ShiftContext<'_>,
    shift: &Shift,
    mut request: TimeChangeRequest,
    resolution: Resolution,
    answer: NotificationType,
    actor: ShiftActor,
    cause: Cause,
    policy: &ShiftPolicy,
) -> Result<TransitionResult, CoreError> {
    let mut updated: Shift = shift.clone();
    let mut notifications: Vec<NotificationIntent> = Vec::new();

    let outcome: &str = match resolution {
        Resolution::Recorded => {
            updated.time_change_request = Some(request.clone());
            "recorded"
        }
        Resolution::Apply(patch) => {
            let effective: ShiftPatch = patch.effective_against(shift);
            validate_slot(shift, &effective, &context.conflicts, policy, true)?;
            updated.apply_patch(&effective);
            request.close(context.now);
            updated.time_change_request = None;
            if effective.changes_operator() {
                notifications.push(notify::shift_assigned(context.apartment, &updated));
            } else if effective.changes_schedule()
                && updated.operator_id != actor.user_id
                && updated.operator_id != request.requested_by
            {
                // The requester hears about it through the answer below.
                notifications.push(notify::shift_time_changed(context.apartment, &updated));
            }
            "applied"
        }
        Resolution::Closed => {
            updated.time_change_request = None;
            "closed"
        }
    };

    if request.requested_by != actor.user_id {
        notifications.push(notify::time_change_answered(
            request.requested_by,
            answer,
            context.apartment,
            &updated,
        ));
    }

    let audit_event: AuditEvent = event(
        context,
        shift,
        actor,
        cause,
        Action::new(
            String::from(if actor.role == Role::Owner {
                "ReviewTimeChange"
            } else {
                "RespondTimeChange"
            }),
            Some(format!("{answer}: {outcome}")),
        ),
        shift_snapshot(shift),
        shift_snapshot(&updated),
    );

    Ok(TransitionResult {
        shift: updated,
        change: ShiftChange::Updated,
        time_change: Some(request),
        audit_event,
        notifications,
    })
}

fn confirm_seen(
    context: &ShiftContext<'_>,
    shift: &Shift,
    actor: ShiftActor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    if actor.role != Role::Operator || shift.operator_id != actor.user_id {
        return Err(forbidden(
            "confirmed_seen",
            "only the assigned operator may confirm a shift",
        ));
    }

    let mut updated: Shift = shift.clone();
    updated.confirmed_seen = ConfirmedSeen::at(context.now);

    let audit_event: AuditEvent = event(
        context,
        shift,
        actor,
        cause,
        Action::new(String::from("ConfirmSeen"), None),
        StateSnapshot::new(format!("confirmed={}", shift.confirmed_seen.confirmed)),
        StateSnapshot::new(String::from("confirmed=true")),
    );

    Ok(TransitionResult {
        notifications: vec![notify::shift_confirmed(context.apartment, &updated)],
        shift: updated,
        change: ShiftChange::Updated,
        time_change: None,
        audit_event,
    })
}

fn may_discuss(context: &ShiftContext<'_>, shift: &Shift, actor: ShiftActor) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Owner => context.apartment.is_owned_by(actor.user_id),
        Role::Operator => shift.operator_id == actor.user_id,
        Role::Viewer => false,
    }
}

fn child_event(
    context: &ShiftContext<'_>,
    shift: &Shift,
    actor: ShiftActor,
    cause: Cause,
    name: &str,
    details: String,
) -> AuditEvent {
    event(
        context,
        shift,
        actor,
        cause,
        Action::new(name.to_string(), Some(details)),
        shift_snapshot(shift),
        shift_snapshot(shift),
    )
}

fn add_comment(
    context: &ShiftContext<'_>,
    shift: &Shift,
    text: &str,
    actor: ShiftActor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    if !may_discuss(context, shift, actor) {
        return Err(forbidden("comment", "not a participant of this shift"));
    }
    let text: String = normalize_text("text", text)?;

    let recipient: i64 = if actor.role == Role::Operator {
        context.apartment.owner_id
    } else {
        shift.operator_id
    };
    let mut notifications: Vec<NotificationIntent> = Vec::new();
    if recipient != actor.user_id {
        notifications.push(notify::comment_added(
            recipient,
            context.apartment,
            shift,
            &text,
        ));
    }

    let comment: ShiftComment = ShiftComment {
        comment_id: None,
        shift_id: shift.id(),
        author_id: actor.user_id,
        text,
        created_at: context.now,
    };

    Ok(TransitionResult {
        shift: shift.clone(),
        audit_event: child_event(
            context,
            shift,
            actor,
            cause,
            "AddComment",
            format!("{} characters", comment.text.chars().count()),
        ),
        change: ShiftChange::CommentAdded(comment),
        time_change: None,
        notifications,
    })
}

fn delete_comment(
    context: &ShiftContext<'_>,
    shift: &Shift,
    comment: &ShiftComment,
    actor: ShiftActor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let comment_id: i64 = comment.comment_id.unwrap_or_default();
    if comment.shift_id != shift.id() {
        return Err(CoreError::DomainViolation(DomainError::CommentNotFound {
            shift_id: shift.id(),
            comment_id,
        }));
    }
    let is_author: bool = comment.author_id == actor.user_id && may_discuss(context, shift, actor);
    if actor.role != Role::Admin && !is_author {
        return Err(forbidden(
            "comment",
            "only the author or an admin may delete a comment",
        ));
    }

    Ok(TransitionResult {
        shift: shift.clone(),
        audit_event: child_event(
            context,
            shift,
            actor,
            cause,
            "DeleteComment",
            format!("comment {comment_id} by user {}", comment.author_id),
        ),
        change: ShiftChange::CommentDeleted(comment_id),
        time_change: None,
        notifications: Vec::new(),
    })
}

fn report_problem(
    context: &ShiftContext<'_>,
    shift: &Shift,
    kind: ProblemKind,
    description: &str,
    photo_urls: Vec<String>,
    actor: ShiftActor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    if actor.role != Role::Operator || shift.operator_id != actor.user_id {
        return Err(forbidden(
            "problem",
            "only the assigned operator may report problems",
        ));
    }
    let description: String = normalize_text("description", description)?;
    let photo_urls: Vec<String> = photo_urls
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();

    let mut recipients: Vec<i64> = vec![context.apartment.owner_id];
    for admin in context.admin_ids {
        if !recipients.contains(admin) {
            recipients.push(*admin);
        }
    }
    let notifications: Vec<NotificationIntent> = recipients
        .into_iter()
        .map(|recipient| notify::problem_reported(recipient, context.apartment, shift, &description))
        .collect();

    let problem: ShiftProblem = ShiftProblem {
        problem_id: None,
        shift_id: shift.id(),
        reported_by: actor.user_id,
        kind,
        description,
        photo_urls,
        created_at: context.now,
    };

    Ok(TransitionResult {
        shift: shift.clone(),
        audit_event: child_event(
            context,
            shift,
            actor,
            cause,
            "ReportProblem",
            format!("{} with {} photos", kind.as_str(), problem.photo_urls.len()),
        ),
        change: ShiftChange::ProblemReported(problem),
        time_change: None,
        notifications,
    })
}

fn add_instruction_photo(
    context: &ShiftContext<'_>,
    shift: &Shift,
    url: &str,
    description: Option<String>,
    actor: ShiftActor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let permitted: bool = match actor.role {
        Role::Admin => true,
        Role::Owner => context.apartment.is_owned_by(actor.user_id),
        Role::Operator | Role::Viewer => false,
    };
    if !permitted {
        return Err(forbidden(
            "instruction_photo",
            "only the apartment owner or an admin may add instructions",
        ));
    }
    let url: String = normalize_text("url", url)?;
    let description: Option<String> = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let photo: InstructionPhoto = InstructionPhoto {
        photo_id: None,
        shift_id: shift.id(),
        uploaded_by: actor.user_id,
        url,
        description,
        created_at: context.now,
    };

    Ok(TransitionResult {
        shift: shift.clone(),
        audit_event: child_event(
            context,
            shift,
            actor,
            cause,
            "AddInstructionPhoto",
            photo.url.clone(),
        ),
        change: ShiftChange::PhotoAdded(photo),
        time_change: None,
        notifications: vec![notify::instruction_photo_added(context.apartment, shift)],
    })
}

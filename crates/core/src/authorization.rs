// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The shift authorization engine.
//!
//! Given an actor, a shift and a proposed patch, [`decide`] splits the
//! patch into fields applied directly, fields deferred into a
//! time-change request and fields rejected with a reason. It never
//! touches storage: the conflict counts it needs are looked up by the
//! caller for the shift's [`ShiftTargets`](crate::ShiftTargets).
//!
//! Rules by role:
//!
//! - operator (own shift only): actual start, actual end, status, notes
//! - owner (own apartment only): guest count and notes, until the shift
//!   starts
//! - admin: guest count, notes and status always; date, time and
//!   apartment directly with at least 18h of lead; the operator alone
//!   directly with at least 10h of lead; otherwise deferred
//! - viewer: nothing

use time::{Duration, OffsetDateTime};
use turnover_domain::{
    DomainError, Role, Shift, ShiftField, ShiftPatch, ShiftStatus, TimeChangeDraft,
    validate_time_range,
};

use crate::policy::ShiftPolicy;
use crate::state::{ShiftActor, ShiftConflicts};

/// A field the actor may not change, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: ShiftField,
    pub error: DomainError,
}

/// Outcome of authorizing a patch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decision {
    /// Fields to write onto the shift now.
    pub applied: ShiftPatch,
    /// Fields that must go through a time-change request.
    pub deferred: Option<TimeChangeDraft>,
    pub rejected: Vec<FieldError>,
}

impl Decision {
    /// True if nothing is applied, deferred or rejected.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.deferred.is_none() && self.rejected.is_empty()
    }

    /// Returns the decision if no field was rejected.
    ///
    /// # Errors
    ///
    /// Returns the first rejection otherwise.
    pub fn into_accepted(self) -> Result<Self, DomainError> {
        match self.rejected.into_iter().next() {
            Some(rejection) => Err(rejection.error),
            None => Ok(Self {
                applied: self.applied,
                deferred: self.deferred,
                rejected: Vec::new(),
            }),
        }
    }

    fn reject(&mut self, field: ShiftField, error: DomainError) {
        self.rejected.push(FieldError { field, error });
    }

    fn reject_all(&mut self, fields: &[ShiftField], error: &DomainError) {
        for field in fields {
            self.reject(*field, error.clone());
        }
    }
}

/// Inputs read alongside the patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditContext {
    pub now: OffsetDateTime,
    /// Owner of the shift's current apartment.
    pub apartment_owner_id: i64,
    /// Conflicts at the patch's targets, excluding this shift.
    pub conflicts: ShiftConflicts,
}

/// Decides how a patch may be applied.
///
/// Only fields whose value actually differs from the shift are
/// considered. Lead times are always measured against the shift's
/// current schedule, never the proposed one.
///
/// # Errors
///
/// Returns an error if the shift's scheduled start cannot be resolved in
/// the policy's timezone.
pub fn decide(
    actor: ShiftActor,
    shift: &Shift,
    patch: &ShiftPatch,
    context: &EditContext,
    policy: &ShiftPolicy,
) -> Result<Decision, DomainError> {
    let effective: ShiftPatch = patch.effective_against(shift);
    let mut decision: Decision = Decision::default();
    if effective.is_empty() {
        return Ok(decision);
    }

    match actor.role {
        Role::Operator => decide_operator(actor, shift, &effective, context, policy, &mut decision)?,
        Role::Owner => decide_owner(actor, shift, &effective, context, policy, &mut decision)?,
        Role::Admin => decide_admin(shift, &effective, context, policy, &mut decision)?,
        Role::Viewer => decision.reject_all(
            &effective.fields(),
            &forbidden_field("shift", "viewers have read-only access"),
        ),
    }

    Ok(decision)
}

fn forbidden_field(field: &str, reason: &str) -> DomainError {
    DomainError::Forbidden {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Validates actual start and end and derives the resulting status.
///
/// Shared by the operator and admin paths.
fn decide_actual_times(
    shift: &Shift,
    effective: &ShiftPatch,
    conflicts: &ShiftConflicts,
    policy: &ShiftPolicy,
    decision: &mut Decision,
) -> Result<(), DomainError> {
    let mut started_at: Option<OffsetDateTime> = shift.actual_start_time;

    if let Some(start) = effective.actual_start_time {
        let scheduled: OffsetDateTime = policy.scheduled_start(shift)?;
        if conflicts.operator_active {
            decision.reject(
                ShiftField::ActualStartTime,
                DomainError::ConflictingActiveShift {
                    operator_id: shift.operator_id,
                },
            );
        } else if start < scheduled {
            decision.reject(
                ShiftField::ActualStartTime,
                DomainError::StartBeforeScheduled {
                    scheduled,
                    attempted: start,
                },
            );
        } else if shift.actual_end_time.is_some() && effective.actual_end_time.is_none() {
            decision.reject(
                ShiftField::ActualStartTime,
                DomainError::InvalidStatusTransition {
                    from: shift.status.as_str().to_string(),
                    to: ShiftStatus::InProgress.as_str().to_string(),
                    reason: String::from("the shift already has an actual end time"),
                },
            );
        } else {
            decision.applied.actual_start_time = Some(start);
            started_at = Some(start);
        }
    }

    if let Some(end) = effective.actual_end_time {
        match started_at {
            None => decision.reject(
                ShiftField::ActualEndTime,
                DomainError::MinimumDurationNotMet {
                    required_minutes: policy.minimum_duration.whole_minutes(),
                    actual_minutes: None,
                },
            ),
            Some(start) if end - start < policy.minimum_duration => decision.reject(
                ShiftField::ActualEndTime,
                DomainError::MinimumDurationNotMet {
                    required_minutes: policy.minimum_duration.whole_minutes(),
                    actual_minutes: Some((end - start).whole_minutes()),
                },
            ),
            Some(_) => decision.applied.actual_end_time = Some(end),
        }
    }

    let finished_at: Option<OffsetDateTime> =
        decision.applied.actual_end_time.or(shift.actual_end_time);

    // A new start may not be paired with an end it was not validated against.
    if decision.applied.actual_start_time.is_some()
        && decision.applied.actual_end_time.is_none()
        && shift.actual_end_time.is_some()
    {
        decision.applied.actual_start_time = None;
        decision.reject(
            ShiftField::ActualStartTime,
            DomainError::InvalidStatusTransition {
                from: shift.status.as_str().to_string(),
                to: ShiftStatus::InProgress.as_str().to_string(),
                reason: String::from("the shift already has an actual end time"),
            },
        );
        started_at = shift.actual_start_time;
    }

    if let Some(status) = effective.status {
        let needs_times: bool = status == ShiftStatus::Completed;
        let reopens: bool = matches!(status, ShiftStatus::Scheduled | ShiftStatus::InProgress)
            && finished_at.is_some();
        if needs_times && !(started_at.is_some() && finished_at.is_some()) {
            decision.reject(
                ShiftField::Status,
                DomainError::InvalidStatusTransition {
                    from: shift.status.as_str().to_string(),
                    to: status.as_str().to_string(),
                    reason: String::from("both actual start and end must be recorded"),
                },
            );
        } else if reopens {
            decision.reject(
                ShiftField::Status,
                DomainError::InvalidStatusTransition {
                    from: shift.status.as_str().to_string(),
                    to: status.as_str().to_string(),
                    reason: String::from("the shift already has an actual end time"),
                },
            );
        } else {
            decision.applied.status = Some(status);
        }
    }

    if decision.applied.actual_end_time.is_some() {
        decision.applied.status = Some(ShiftStatus::Completed);
    } else if decision.applied.actual_start_time.is_some()
        && effective.status.is_none()
        && finished_at.is_none()
    {
        decision.applied.status = Some(ShiftStatus::InProgress);
    }

    Ok(())
}

fn decide_operator(
    actor: ShiftActor,
    shift: &Shift,
    effective: &ShiftPatch,
    context: &EditContext,
    policy: &ShiftPolicy,
    decision: &mut Decision,
) -> Result<(), DomainError> {
    if shift.operator_id != actor.user_id {
        decision.reject_all(
            &effective.fields(),
            &forbidden_field("shift", "operators may only edit their own shifts"),
        );
        return Ok(());
    }

    for field in effective.fields() {
        match field {
            ShiftField::ActualStartTime | ShiftField::ActualEndTime | ShiftField::Status => {}
            ShiftField::Notes => decision.applied.notes.clone_from(&effective.notes),
            other => decision.reject(
                other,
                forbidden_field(other.as_str(), "operators cannot change this field"),
            ),
        }
    }

    decide_actual_times(shift, effective, &context.conflicts, policy, decision)
}

fn decide_owner(
    actor: ShiftActor,
    shift: &Shift,
    effective: &ShiftPatch,
    context: &EditContext,
    policy: &ShiftPolicy,
    decision: &mut Decision,
) -> Result<(), DomainError> {
    if context.apartment_owner_id != actor.user_id {
        decision.reject_all(
            &effective.fields(),
            &forbidden_field("shift", "owners may only edit shifts on their own apartments"),
        );
        return Ok(());
    }

    let started: bool = policy.has_started(shift, context.now)?;

    for field in effective.fields() {
        match field {
            ShiftField::GuestCount | ShiftField::Notes if started => {
                decision.reject(field, DomainError::ShiftAlreadyStarted);
            }
            ShiftField::GuestCount => decision.applied.guest_count = effective.guest_count,
            ShiftField::Notes => decision.applied.notes.clone_from(&effective.notes),
            other => decision.reject(
                other,
                forbidden_field(other.as_str(), "owners may only change guest count and notes"),
            ),
        }
    }

    Ok(())
}

/// Checks the date, time, apartment and operator portion of an admin
/// edit against the target slot.
pub(crate) fn validate_slot(
    shift: &Shift,
    moving: &ShiftPatch,
    conflicts: &ShiftConflicts,
    policy: &ShiftPolicy,
    check_apartment: bool,
) -> Result<(), DomainError> {
    let start = moving
        .scheduled_start_time
        .unwrap_or(shift.scheduled_start_time);
    if let Some(end) = moving.scheduled_end_time.or(shift.scheduled_end_time) {
        validate_time_range(start, end)?;
    }

    let date = moving.scheduled_date.unwrap_or(shift.scheduled_date);
    let changes_slot: bool = moving.apartment_id.is_some() || moving.scheduled_date.is_some();

    if check_apartment && changes_slot && conflicts.apartment_taken {
        return Err(DomainError::ApartmentAlreadyBooked {
            apartment_id: moving.apartment_id.unwrap_or(shift.apartment_id),
            date,
        });
    }

    let lands_on_new_day: bool = moving.operator_id.is_some() || moving.scheduled_date.is_some();
    if lands_on_new_day && policy.operator_is_full(conflicts.operator_count) {
        return Err(DomainError::OperatorDailyLimitExceeded {
            operator_id: moving.operator_id.unwrap_or(shift.operator_id),
            date,
            limit: policy.operator_daily_cap,
        });
    }

    Ok(())
}

fn decide_admin(
    shift: &Shift,
    effective: &ShiftPatch,
    context: &EditContext,
    policy: &ShiftPolicy,
    decision: &mut Decision,
) -> Result<(), DomainError> {
    decision.applied.guest_count = effective.guest_count;
    decision.applied.notes.clone_from(&effective.notes);

    if effective.actual_start_time.is_some()
        || effective.actual_end_time.is_some()
        || effective.status.is_some()
    {
        decide_actual_times(shift, effective, &context.conflicts, policy, decision)?;
    }

    let moving: ShiftPatch = ShiftPatch {
        apartment_id: effective.apartment_id,
        operator_id: effective.operator_id,
        scheduled_date: effective.scheduled_date,
        scheduled_start_time: effective.scheduled_start_time,
        scheduled_end_time: effective.scheduled_end_time,
        ..ShiftPatch::default()
    };
    if moving.is_empty() {
        return Ok(());
    }
    let moving_fields: Vec<ShiftField> = moving.fields();

    let lead: Duration = policy.lead_time(shift, context.now)?;
    let required: Duration = if moving.changes_schedule() {
        policy.date_time_edit_lead
    } else {
        policy.operator_edit_lead
    };

    if lead >= required {
        match validate_slot(shift, &moving, &context.conflicts, policy, true) {
            Ok(()) => {
                decision.applied.apartment_id = moving.apartment_id;
                decision.applied.operator_id = moving.operator_id;
                decision.applied.scheduled_date = moving.scheduled_date;
                decision.applied.scheduled_start_time = moving.scheduled_start_time;
                decision.applied.scheduled_end_time = moving.scheduled_end_time;
            }
            Err(error) => decision.reject_all(&moving_fields, &error),
        }
        return Ok(());
    }

    if shift.has_open_time_change() {
        decision.reject_all(
            &moving_fields,
            &DomainError::TimeChangeRequestAlreadyOpen {
                shift_id: shift.id(),
            },
        );
        return Ok(());
    }

    // Apartment availability is re-checked when the request is applied.
    match validate_slot(shift, &moving, &context.conflicts, policy, false) {
        Ok(()) => decision.deferred = Some(TimeChangeDraft::from_patch(&moving, shift)),
        Err(error) => decision.reject_all(&moving_fields, &error),
    }

    Ok(())
}

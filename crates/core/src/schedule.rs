// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Owner calendar submissions.

use time::{Month, OffsetDateTime};
use turnover_audit::{Action, AuditEvent, Cause, StateSnapshot};
use turnover_domain::{
    Apartment, Booking, DedupKey, DomainError, NotificationType, Reconciliation, Role,
    StoredSchedule, reconcile, validate_month,
};

use crate::error::CoreError;
use crate::notify::NotificationIntent;
use crate::state::ShiftActor;

/// Years accepted for a schedule.
pub const SCHEDULE_YEARS: std::ops::RangeInclusive<i32> = 2000..=2100;

/// A month of bookings submitted for one apartment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSubmission {
    pub year: i32,
    /// 1-based month number, validated on submission.
    pub month: u8,
    pub bookings: Vec<Booking>,
    /// Ask for the admins to be told about new bookings.
    pub notify_admin: bool,
}

/// Stored state read before a submission.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleContext<'a> {
    pub apartment: &'a Apartment,
    /// Bookings currently stored for the month; empty when none.
    pub existing: &'a [Booking],
    pub admin_ids: &'a [i64],
    pub now: OffsetDateTime,
}

/// What the caller must persist and send after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOutcome {
    pub year: i32,
    pub month: Month,
    pub stored: StoredSchedule,
    pub newly_added: Vec<Booking>,
    pub audit_event: AuditEvent,
    /// Admin notifications, each carrying a dedup key.
    pub notifications: Vec<NotificationIntent>,
}

/// Checks that the actor may read or write an apartment's calendar.
///
/// # Errors
///
/// Returns `Forbidden` unless the actor is an admin or the owner.
pub fn authorize_schedule_access(apartment: &Apartment, actor: ShiftActor) -> Result<(), CoreError> {
    let permitted: bool = match actor.role {
        Role::Admin => true,
        Role::Owner => apartment.is_owned_by(actor.user_id),
        Role::Operator | Role::Viewer => false,
    };
    if permitted {
        Ok(())
    } else {
        Err(CoreError::DomainViolation(DomainError::Forbidden {
            field: String::from("cleaning_schedule"),
            reason: String::from("only the apartment owner or an admin may manage the calendar"),
        }))
    }
}

/// Validates a submission, reconciles it and decides who to notify.
///
/// Malformed bookings (no guests, checkout not after check-in) are
/// dropped before reconciliation. An empty result deletes the stored
/// schedule.
///
/// # Errors
///
/// Returns an error if the actor may not manage the calendar or the
/// year or month is out of range.
pub fn submit_schedule(
    context: &ScheduleContext<'_>,
    submission: ScheduleSubmission,
    actor: ShiftActor,
    cause: Cause,
) -> Result<ScheduleOutcome, CoreError> {
    authorize_schedule_access(context.apartment, actor)?;
    let month: Month = validate_month(submission.month)?;
    if !SCHEDULE_YEARS.contains(&submission.year) {
        return Err(CoreError::DomainViolation(DomainError::InvalidYear(
            submission.year,
        )));
    }

    let submitted: Vec<Booking> = submission
        .bookings
        .into_iter()
        .filter(Booking::is_well_formed)
        .collect();
    let reconciliation: Reconciliation = reconcile(context.existing, &submitted);
    let removed_any: bool = !reconcile(&submitted, context.existing)
        .newly_added
        .is_empty();

    let wants_notice: bool = submission.notify_admin && actor.role == Role::Owner;
    let notification_type: Option<NotificationType> = match (wants_notice, removed_any) {
        (false, _) => None,
        _ if !reconciliation.newly_added.is_empty() => Some(NotificationType::CalendarUpdatedNewDays),
        (true, true) => Some(NotificationType::CalendarUpdated),
        (true, false) => None,
    };

    let notifications: Vec<NotificationIntent> = notification_type
        .map(|notification_type| {
            context
                .admin_ids
                .iter()
                .map(|admin| {
                    calendar_notification(
                        *admin,
                        notification_type,
                        context.apartment,
                        submission.year,
                        month,
                        reconciliation.newly_added.len(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let after: StateSnapshot = match &reconciliation.stored {
        StoredSchedule::Replace(bookings) => StateSnapshot::new(format!("bookings={}", bookings.len())),
        StoredSchedule::Delete => StateSnapshot::absent(),
    };
    let before: StateSnapshot = if context.existing.is_empty() {
        StateSnapshot::absent()
    } else {
        StateSnapshot::new(format!("bookings={}", context.existing.len()))
    };
    let audit_event: AuditEvent = AuditEvent::new(
        context.apartment.apartment_id,
        None,
        actor.to_audit_actor(),
        cause,
        Action::new(
            String::from("SubmitSchedule"),
            Some(format!(
                "{month} {}: {} new bookings",
                submission.year,
                reconciliation.newly_added.len()
            )),
        ),
        before,
        after,
    );

    Ok(ScheduleOutcome {
        year: submission.year,
        month,
        stored: reconciliation.stored,
        newly_added: reconciliation.newly_added,
        audit_event,
        notifications,
    })
}

fn calendar_notification(
    admin_id: i64,
    notification_type: NotificationType,
    apartment: &Apartment,
    year: i32,
    month: Month,
    new_bookings: usize,
) -> NotificationIntent {
    let (title, message) = if notification_type == NotificationType::CalendarUpdatedNewDays {
        (
            "New Bookings",
            format!(
                "{} has {new_bookings} new bookings in {month} {year}",
                apartment.name
            ),
        )
    } else {
        (
            "Calendar Updated",
            format!("{} updated its calendar for {month} {year}", apartment.name),
        )
    };

    NotificationIntent {
        user_id: admin_id,
        notification_type,
        title: title.to_string(),
        message,
        related_shift_id: None,
        dedup_key: Some(DedupKey {
            user_id: admin_id,
            notification_type,
            apartment_id: apartment.apartment_id,
            year,
            month,
        }),
    }
}

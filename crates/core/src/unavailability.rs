// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator unavailability requests.

use time::{Date, OffsetDateTime};
use turnover_domain::{DomainError, NotificationType, Role, UnavailabilityRequest, local_date};

use crate::error::CoreError;
use crate::notify::NotificationIntent;
use crate::policy::ShiftPolicy;
use crate::state::ShiftActor;

/// What the caller must persist and send after an unavailability transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailabilityOutcome {
    pub request: UnavailabilityRequest,
    pub notifications: Vec<NotificationIntent>,
}

fn forbidden(reason: &str) -> CoreError {
    CoreError::DomainViolation(DomainError::Forbidden {
        field: String::from("unavailability_request"),
        reason: reason.to_string(),
    })
}

fn days(count: usize) -> String {
    if count == 1 {
        String::from("1 day")
    } else {
        format!("{count} days")
    }
}

/// Opens a request for the acting operator and tells every admin.
///
/// Days are judged against today in the policy's timezone.
///
/// # Arguments
///
/// * `actor` - The operator asking for time off
/// * `operator_name` - Display name used in the admin notification
/// * `dates` - The requested days
/// * `reason` - Optional free text
/// * `admin_ids` - Recipients of the notification
/// * `now` - The current instant
/// * `policy` - Supplies the timezone
///
/// # Errors
///
/// Returns an error if the actor is not an operator, no day is given or
/// any day is already past.
pub fn submit_unavailability(
    actor: ShiftActor,
    operator_name: &str,
    dates: Vec<Date>,
    reason: Option<&str>,
    admin_ids: &[i64],
    now: OffsetDateTime,
    policy: &ShiftPolicy,
) -> Result<UnavailabilityOutcome, CoreError> {
    if actor.role != Role::Operator {
        return Err(forbidden("only operators may request unavailability"));
    }
    let today: Date = local_date(now, policy.timezone)?;
    let request: UnavailabilityRequest =
        UnavailabilityRequest::open(actor.user_id, dates, reason, today, now)?;

    let message: String = format!(
        "{operator_name} has requested to be unavailable for {}",
        days(request.dates.len())
    );
    let notifications: Vec<NotificationIntent> = admin_ids
        .iter()
        .map(|admin| NotificationIntent {
            user_id: *admin,
            notification_type: NotificationType::UnavailabilityRequest,
            title: String::from("Unavailability Request"),
            message: message.clone(),
            related_shift_id: None,
            dedup_key: None,
        })
        .collect();

    Ok(UnavailabilityOutcome {
        request,
        notifications,
    })
}

/// Records an admin's decision and tells the operator.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the request was
/// already reviewed.
pub fn review_unavailability(
    actor: ShiftActor,
    mut request: UnavailabilityRequest,
    approve: bool,
    now: OffsetDateTime,
) -> Result<UnavailabilityOutcome, CoreError> {
    if actor.role != Role::Admin {
        return Err(forbidden("only admins may review unavailability requests"));
    }
    request.review(approve, actor.user_id, now)?;

    let (title, verb) = if approve {
        ("Unavailability Request Approved", "approved")
    } else {
        ("Unavailability Request Rejected", "rejected")
    };
    let notification: NotificationIntent = NotificationIntent {
        user_id: request.operator_id,
        notification_type: NotificationType::UnavailabilityRequestReviewed,
        title: title.to_string(),
        message: format!(
            "Your request to be unavailable for {} has been {verb}",
            days(request.dates.len())
        ),
        related_shift_id: None,
        dedup_key: None,
    };

    Ok(UnavailabilityOutcome {
        request,
        notifications: vec![notification],
    })
}

/// Checks that the actor may withdraw a request.
///
/// # Errors
///
/// Returns an error unless the actor is an admin or the requesting
/// operator, or if the request was already reviewed.
pub fn authorize_withdrawal(
    actor: ShiftActor,
    request: &UnavailabilityRequest,
) -> Result<(), CoreError> {
    let permitted: bool = match actor.role {
        Role::Admin => true,
        Role::Operator => request.operator_id == actor.user_id,
        Role::Owner | Role::Viewer => false,
    };
    if !permitted {
        return Err(forbidden("only the requesting operator or an admin may withdraw"));
    }
    request.ensure_withdrawable()?;
    Ok(())
}

/// The operator whose requests `actor` may list, or `None` for all.
///
/// Operators always see only their own; admins may narrow by operator.
///
/// # Errors
///
/// Returns `Forbidden` for owners and viewers.
pub fn unavailability_scope(
    actor: ShiftActor,
    operator_filter: Option<i64>,
) -> Result<Option<i64>, CoreError> {
    match actor.role {
        Role::Operator => Ok(Some(actor.user_id)),
        Role::Admin => Ok(operator_filter),
        Role::Owner | Role::Viewer => Err(forbidden(
            "only operators and admins may see unavailability requests",
        )),
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use turnover::{CoreError, ShiftTargets};
use turnover_domain::DomainError;
use turnover_persistence::{Constraint, PersistenceError};

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
/// Each variant corresponds to one HTTP status class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No usable identity was presented.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// The identity is known but its role or ownership does not permit the action.
    Forbidden {
        /// The action or field that was attempted.
        action: String,
        /// Why it is not permitted.
        reason: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The change collides with another shift or request.
    SchedulingConflict {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the conflict.
        message: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Forbidden { action, reason } => {
                write!(f, "Forbidden ({action}): {reason}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::SchedulingConflict { rule, message } => {
                write!(f, "Scheduling conflict ({rule}): {message}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Forbidden {
                action,
                reason: format!("requires {required_role} role"),
            },
        }
    }
}

fn invalid(field: &str, err: &DomainError) -> ApiError {
    ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    }
}

fn conflict(rule: &str, err: &DomainError) -> ApiError {
    ApiError::SchedulingConflict {
        rule: rule.to_string(),
        message: err.to_string(),
    }
}

fn rule(rule: &str, err: &DomainError) -> ApiError {
    ApiError::DomainRuleViolation {
        rule: rule.to_string(),
        message: err.to_string(),
    }
}

fn not_found(resource_type: &str, err: &DomainError) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: resource_type.to_string(),
        message: err.to_string(),
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match &err {
        DomainError::Forbidden { field, reason } => ApiError::Forbidden {
            action: field.clone(),
            reason: reason.clone(),
        },
        DomainError::InvalidGuestCount(_) => invalid("guest_count", &err),
        DomainError::InvalidTimeRange { .. } => invalid("scheduled_end_time", &err),
        DomainError::InvalidMonth(_) => invalid("month", &err),
        DomainError::InvalidYear(_) => invalid("year", &err),
        DomainError::DateParseError { .. } | DomainError::DateArithmeticOverflow { .. } => {
            invalid("date", &err)
        }
        DomainError::EmptyText { field } => invalid(field, &err),
        DomainError::InvalidRole(_) => invalid("role", &err),
        DomainError::InvalidShiftStatus(_) | DomainError::InvalidTimeChangeStatus(_) => {
            invalid("status", &err)
        }
        DomainError::InvalidNotificationType(_) => invalid("notification_type", &err),
        DomainError::InvalidProblemKind(_) => invalid("kind", &err),
        DomainError::InvalidTimezone(_) => invalid("timezone", &err),
        DomainError::AmbiguousLocalTime { .. } => invalid("scheduled_start_time", &err),
        DomainError::NoChangesRequested => invalid("changes", &err),
        DomainError::NoDatesRequested | DomainError::PastDateRequested { .. } => {
            invalid("dates", &err)
        }
        DomainError::InvalidUnavailabilityStatus(_) => invalid("status", &err),
        DomainError::ConflictingActiveShift { .. } => conflict("single_active_shift", &err),
        DomainError::OperatorDailyLimitExceeded { .. } => conflict("operator_daily_limit", &err),
        DomainError::ApartmentAlreadyBooked { .. } => conflict("one_shift_per_apartment_day", &err),
        DomainError::TimeChangeRequestAlreadyOpen { .. } => {
            conflict("one_live_time_change_request", &err)
        }
        DomainError::TimeChangeAlreadyDecided { .. } => conflict("time_change_decided", &err),
        DomainError::UnavailabilityAlreadyReviewed { .. } => {
            conflict("unavailability_reviewed", &err)
        }
        DomainError::StartBeforeScheduled { .. } => rule("start_not_before_scheduled", &err),
        DomainError::MinimumDurationNotMet { .. } => rule("minimum_work_duration", &err),
        DomainError::ShiftAlreadyStarted => rule("shift_already_started", &err),
        DomainError::RequestWindowClosed { .. } => rule("time_change_request_window", &err),
        DomainError::InvalidStatusTransition { .. } => rule("status_transition", &err),
        DomainError::ShiftNotFound(_) => not_found("Shift", &err),
        DomainError::ApartmentNotFound(_) => not_found("Apartment", &err),
        DomainError::UserNotFound(_) => not_found("User", &err),
        DomainError::NotificationNotFound(_) => not_found("Notification", &err),
        DomainError::NoOpenTimeChangeRequest { .. } => not_found("Time change request", &err),
        DomainError::CommentNotFound { .. } => not_found("Comment", &err),
        DomainError::UnavailabilityRequestNotFound(_) => {
            not_found("Unavailability request", &err)
        }
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::MissingShift { .. } => ApiError::Internal {
            message: err.to_string(),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Constraint violations reported here lack the context needed to name
/// the colliding shift; callers that know the targets should use
/// [`translate_constraint`] first.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::NotFound(message) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message,
        },
        PersistenceError::ConstraintViolation(constraint) => ApiError::SchedulingConflict {
            rule: constraint_rule(constraint).to_string(),
            message: constraint.to_string(),
        },
        other => ApiError::Internal {
            message: format!("Persistence failure: {other}"),
        },
    }
}

const fn constraint_rule(constraint: Constraint) -> &'static str {
    match constraint {
        Constraint::ApartmentDay => "one_shift_per_apartment_day",
        Constraint::OperatorDailyLimit => "operator_daily_limit",
        Constraint::OperatorActive => "single_active_shift",
        Constraint::LiveTimeChangeRequest => "one_live_time_change_request",
    }
}

/// Rebuilds the domain error behind a database guard.
///
/// A guard fires when a concurrent write slipped between the conflict
/// lookup and the insert. The caller's targets name the slot that was
/// taken.
#[must_use]
pub const fn translate_constraint(
    constraint: Constraint,
    targets: &ShiftTargets,
    shift_id: i64,
    daily_limit: u32,
) -> DomainError {
    match constraint {
        Constraint::ApartmentDay => DomainError::ApartmentAlreadyBooked {
            apartment_id: targets.apartment_id,
            date: targets.date,
        },
        Constraint::OperatorDailyLimit => DomainError::OperatorDailyLimitExceeded {
            operator_id: targets.operator_id,
            date: targets.date,
            limit: daily_limit,
        },
        Constraint::OperatorActive => DomainError::ConflictingActiveShift {
            operator_id: targets.operator_id,
        },
        Constraint::LiveTimeChangeRequest => DomainError::TimeChangeRequestAlreadyOpen { shift_id },
    }
}

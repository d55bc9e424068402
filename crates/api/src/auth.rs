// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.
//!
//! Identity is established outside this system; the API receives a user
//! id and resolves it against the directory. Field-level rules live in
//! the core. This module only gates whole operations by role and
//! ownership.

use time::OffsetDateTime;
use tracing::debug;
use turnover::ShiftActor;
use turnover_audit::{Actor, Cause};
use turnover_domain::{Apartment, Role, Shift, User};
use turnover_persistence::SqlitePersistence;

use crate::error::{ApiError, AuthError};

/// An authenticated user with an associated role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The user's directory id.
    pub user_id: i64,
    /// The role the user holds.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    /// The identity the core makes decisions for.
    #[must_use]
    pub const fn to_shift_actor(self) -> ShiftActor {
        ShiftActor::new(self.user_id, self.role)
    }

    /// Converts this actor into an audit `Actor`.
    #[must_use]
    pub fn to_audit_actor(self) -> Actor {
        Actor::new(self.user_id, self.role.as_str().to_string())
    }
}

/// Creates a cause for a request, with a fresh random id.
#[must_use]
pub fn new_cause(description: &str, now: OffsetDateTime) -> Cause {
    let cause_id: String = format!(
        "req_{}_{}",
        now.unix_timestamp(),
        rand::random::<u64>()
    );
    Cause::new(cause_id, description.to_string())
}

/// Resolves request identities against the user directory.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Resolves a presented user id to an authenticated actor.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` if no such user exists or the
    /// directory cannot be read.
    pub fn authenticate(
        persistence: &mut SqlitePersistence,
        user_id: i64,
    ) -> Result<(AuthenticatedActor, User), AuthError> {
        let user: User = persistence
            .get_user(user_id)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("directory lookup failed: {e}"),
            })?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: format!("unknown user {user_id}"),
            })?;

        debug!(user_id, role = %user.role, "Authenticated user");
        Ok((AuthenticatedActor::new(user.user_id, user.role), user))
    }
}

/// Authorization service for enforcing role-based access control.
///
/// This service determines whether an authenticated actor may perform an
/// operation as a whole. Whether a particular field may change is decided
/// by the core.
pub struct AuthorizationService;

impl AuthorizationService {
    fn require_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Owner | Role::Operator | Role::Viewer => Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("Admin"),
            }),
        }
    }

    /// Checks if an actor is authorized to manage users and apartments.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin.
    pub fn authorize_manage_directory(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "manage_directory")
    }

    /// Checks if an actor is authorized to create shifts.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin.
    pub fn authorize_create_shift(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "create_shift")
    }

    /// Checks if an actor is authorized to read operator reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin.
    pub fn authorize_view_reports(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "view_reports")
    }

    /// Checks if an actor is authorized to see who is off on a day.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin.
    pub fn authorize_check_unavailability(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "check_unavailability")
    }

    /// Returns true if the actor may see the shift at all.
    ///
    /// Admins and viewers see everything. Owners see shifts on their
    /// apartments. Operators see the shifts assigned to them.
    #[must_use]
    pub const fn can_view_shift(
        actor: &AuthenticatedActor,
        shift: &Shift,
        apartment: &Apartment,
    ) -> bool {
        match actor.role {
            Role::Admin | Role::Viewer => true,
            Role::Owner => apartment.is_owned_by(actor.user_id),
            Role::Operator => shift.operator_id == actor.user_id,
        }
    }

    /// Checks that the actor may see the shift.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` otherwise.
    pub fn authorize_view_shift(
        actor: &AuthenticatedActor,
        shift: &Shift,
        apartment: &Apartment,
    ) -> Result<(), ApiError> {
        if Self::can_view_shift(actor, shift, apartment) {
            Ok(())
        } else {
            Err(ApiError::Forbidden {
                action: String::from("view_shift"),
                reason: format!("shift {} is not visible to this user", shift.id()),
            })
        }
    }

    /// Checks that the actor may read a shift's audit trail.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` unless the actor is an admin or owns the
    /// apartment.
    pub fn authorize_view_audit(
        actor: &AuthenticatedActor,
        apartment: &Apartment,
    ) -> Result<(), ApiError> {
        let permitted: bool = match actor.role {
            Role::Admin => true,
            Role::Owner => apartment.is_owned_by(actor.user_id),
            Role::Operator | Role::Viewer => false,
        };
        if permitted {
            Ok(())
        } else {
            Err(ApiError::Forbidden {
                action: String::from("view_audit"),
                reason: String::from("only admins and the apartment owner may read the audit trail"),
            })
        }
    }
}

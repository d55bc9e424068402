// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capability computation for authorization-aware UI gating.
//!
//! Capabilities expose what actions a user is permitted to perform
//! without leaking domain internals. They are advisory only and do not
//! replace backend authorization checks.

use time::OffsetDateTime;
use turnover::{EditMode, ShiftCapabilities, ShiftPolicy, shift_capabilities};
use turnover_domain::{Apartment, Role, Shift};

use crate::auth::AuthenticatedActor;
use crate::error::{ApiError, translate_domain_error};
use crate::request_response::{GlobalCapabilities, ShiftCapabilitiesInfo};

const fn edit_mode_str(mode: EditMode) -> &'static str {
    match mode {
        EditMode::Direct => "direct",
        EditMode::Request => "request",
        EditMode::Denied => "denied",
    }
}

/// Computes role-level capabilities for an authenticated user.
///
/// Global capabilities depend only on the role. Ownership and time
/// windows are evaluated per shift.
#[must_use]
pub const fn compute_global_capabilities(actor: &AuthenticatedActor) -> GlobalCapabilities {
    match actor.role {
        Role::Admin => GlobalCapabilities {
            can_manage_directory: true,
            can_create_shift: true,
            can_submit_schedule: true,
            can_view_reports: true,
        },
        Role::Owner => GlobalCapabilities {
            can_manage_directory: false,
            can_create_shift: false,
            can_submit_schedule: true,
            can_view_reports: false,
        },
        Role::Operator | Role::Viewer => GlobalCapabilities {
            can_manage_directory: false,
            can_create_shift: false,
            can_submit_schedule: false,
            can_view_reports: false,
        },
    }
}

/// Computes what the actor may do to one shift at `now`.
///
/// # Errors
///
/// Returns an error if the shift's scheduled start cannot be resolved
/// in the configured timezone.
pub fn compute_shift_capabilities(
    actor: &AuthenticatedActor,
    shift: &Shift,
    apartment: &Apartment,
    now: OffsetDateTime,
    policy: &ShiftPolicy,
) -> Result<ShiftCapabilitiesInfo, ApiError> {
    let capabilities: ShiftCapabilities =
        shift_capabilities(actor.to_shift_actor(), shift, apartment, now, policy)
            .map_err(translate_domain_error)?;

    Ok(ShiftCapabilitiesInfo {
        edit_guest_count: capabilities.edit_guest_count,
        edit_schedule: edit_mode_str(capabilities.edit_schedule).to_string(),
        reassign_operator: edit_mode_str(capabilities.reassign_operator).to_string(),
        start: capabilities.start,
        finish: capabilities.finish,
        delete: capabilities.delete,
        comment: capabilities.comment,
        request_time_change: capabilities.request_time_change,
    })
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::{Duration, OffsetDateTime};
use turnover_domain::{Apartment, DomainError, Role, Shift};

use crate::policy::ShiftPolicy;
use crate::state::ShiftActor;

/// How an actor may change a group of fields right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// The change is written immediately.
    Direct,
    /// The change becomes a time-change request.
    Request,
    Denied,
}

/// Advisory view of what an actor may currently do to a shift.
///
/// This mirrors [`decide`](crate::decide) but ignores conflicts, which
/// depend on the proposed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ShiftCapabilities {
    pub edit_guest_count: bool,
    pub edit_schedule: EditMode,
    pub reassign_operator: EditMode,
    pub start: bool,
    pub finish: bool,
    pub delete: bool,
    pub comment: bool,
    pub request_time_change: bool,
}

/// Computes capabilities for `actor` on `shift`.
///
/// # Errors
///
/// Returns an error if the shift's scheduled start cannot be resolved.
pub fn shift_capabilities(
    actor: ShiftActor,
    shift: &Shift,
    apartment: &Apartment,
    now: OffsetDateTime,
    policy: &ShiftPolicy,
) -> Result<ShiftCapabilities, DomainError> {
    let lead: Duration = policy.lead_time(shift, now)?;
    let is_operator: bool = actor.role == Role::Operator && shift.operator_id == actor.user_id;
    let is_owner: bool = actor.role == Role::Owner && apartment.is_owned_by(actor.user_id);
    let is_admin: bool = actor.role == Role::Admin;
    let request_window_open: bool = lead >= policy.request_cutoff && !shift.has_open_time_change();

    let gated = |required: Duration| {
        if !is_admin {
            EditMode::Denied
        } else if lead >= required {
            EditMode::Direct
        } else if shift.has_open_time_change() {
            EditMode::Denied
        } else {
            EditMode::Request
        }
    };

    Ok(ShiftCapabilities {
        edit_guest_count: is_admin || (is_owner && lead > Duration::ZERO),
        edit_schedule: gated(policy.date_time_edit_lead),
        reassign_operator: gated(policy.operator_edit_lead),
        start: is_operator && shift.actual_start_time.is_none() && lead <= Duration::ZERO,
        finish: is_operator && shift.is_active(),
        delete: is_admin || (is_owner && shift.created_by == actor.user_id),
        comment: is_admin || is_owner || is_operator,
        request_time_change: (is_admin || is_owner || is_operator) && request_window_open,
    })
}

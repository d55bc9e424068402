// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::{Date, Time};
use turnover_domain::{ProblemKind, ShiftComment, ShiftPatch};

/// A command represents user intent against one shift as data only.
///
/// Commands are the only way to request shift state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Schedule a new shift.
    CreateShift {
        apartment_id: i64,
        operator_id: i64,
        scheduled_date: Date,
        scheduled_start_time: Time,
        scheduled_end_time: Option<Time>,
        /// Raw value; validated to be at least one.
        guest_count: i64,
        notes: Option<String>,
    },
    /// Edit a shift. Fields are applied, deferred or rejected per role.
    UpdateShift {
        patch: ShiftPatch,
    },
    /// Remove a shift.
    DeleteShift,
    /// Propose a change that needs the other party's agreement.
    OpenTimeChange {
        patch: ShiftPatch,
        reason: Option<String>,
    },
    /// The owner approves or rejects the live request.
    ReviewTimeChange {
        approve: bool,
    },
    /// The assigned operator confirms or declines the live request.
    RespondTimeChange {
        confirm: bool,
    },
    /// The assigned operator acknowledges the shift.
    ConfirmSeen,
    AddComment {
        text: String,
    },
    /// Remove a stored comment; the caller loads it first.
    DeleteComment {
        comment: ShiftComment,
    },
    ReportProblem {
        kind: ProblemKind,
        description: String,
        photo_urls: Vec<String>,
    },
    AddInstructionPhoto {
        url: String,
        description: Option<String>,
    },
}

impl Command {
    /// The action name recorded in the audit trail.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateShift { .. } => "CreateShift",
            Self::UpdateShift { .. } => "UpdateShift",
            Self::DeleteShift => "DeleteShift",
            Self::OpenTimeChange { .. } => "OpenTimeChange",
            Self::ReviewTimeChange { .. } => "ReviewTimeChange",
            Self::RespondTimeChange { .. } => "RespondTimeChange",
            Self::ConfirmSeen => "ConfirmSeen",
            Self::AddComment { .. } => "AddComment",
            Self::DeleteComment { .. } => "DeleteComment",
            Self::ReportProblem { .. } => "ReportProblem",
            Self::AddInstructionPhoto { .. } => "AddInstructionPhoto",
        }
    }
}

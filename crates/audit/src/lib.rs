// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

/// The user who performed an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The acting user's id.
    pub user_id: i64,
    /// The role the user acted in (e.g., "admin", "operator").
    pub role: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The acting user's id
    /// * `role` - The role the user acted in
    #[must_use]
    pub const fn new(user_id: i64, role: String) -> Self {
        Self { user_id, role }
    }
}

/// Why an action was initiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// Identifier of the triggering request.
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The name of the action (e.g., "`UpdateShift`", "`SubmitSchedule`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// A serialized view of the affected record.
///
/// An empty snapshot stands for "did not exist", for example the state
/// before a shift was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }

    /// The snapshot of a record that does not exist.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            data: String::new(),
        }
    }

    /// True for the snapshot of a record that does not exist.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.data.is_empty()
    }
}

/// An immutable record of one successful state change.
///
/// Every successful mutation produces exactly one event. Events are
/// scoped to an apartment and, when the mutation concerns a shift, to
/// that shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Assigned on persistence; `None` before that.
    pub event_id: Option<i64>,
    /// The apartment the change concerns.
    pub apartment_id: i64,
    /// The shift the change concerns, if any.
    pub shift_id: Option<i64>,
    pub actor: Actor,
    pub cause: Cause,
    pub action: Action,
    pub before: StateSnapshot,
    pub after: StateSnapshot,
}

impl AuditEvent {
    /// Creates a new, unpersisted `AuditEvent`.
    ///
    /// # Arguments
    ///
    /// * `apartment_id` - The apartment the change concerns
    /// * `shift_id` - The shift the change concerns, if any
    /// * `actor` - The user who initiated the change
    /// * `cause` - The reason for the change
    /// * `action` - The action that was performed
    /// * `before` - The state before the transition
    /// * `after` - The state after the transition
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        apartment_id: i64,
        shift_id: Option<i64>,
        actor: Actor,
        cause: Cause,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            event_id: None,
            apartment_id,
            shift_id,
            actor,
            cause,
            action,
            before,
            after,
        }
    }

    /// Returns the same event with the shift scope set.
    ///
    /// Used when the shift id is only known after the insert.
    #[must_use]
    pub const fn for_shift(mut self, shift_id: i64) -> Self {
        self.shift_id = Some(shift_id);
        self
    }
}

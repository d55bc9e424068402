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
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod apply;
mod authorization;
mod capabilities;
mod clock;
mod command;
mod dedup;
mod error;
mod notify;
mod policy;
mod schedule;
mod state;
mod unavailability;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use apply::apply;
pub use authorization::{Decision, EditContext, FieldError, decide};
pub use capabilities::{EditMode, ShiftCapabilities, shift_capabilities};
pub use clock::{Clock, FixedClock, SystemClock};
pub use command::Command;
pub use dedup::Deduper;
pub use error::CoreError;
pub use notify::NotificationIntent;
pub use policy::ShiftPolicy;
pub use schedule::{
    SCHEDULE_YEARS, ScheduleContext, ScheduleOutcome, ScheduleSubmission,
    authorize_schedule_access, submit_schedule,
};
pub use state::{
    ShiftActor, ShiftChange, ShiftConflicts, ShiftContext, ShiftTargets, TransitionResult,
    shift_snapshot,
};
pub use unavailability::{
    UnavailabilityOutcome, authorize_withdrawal, review_unavailability, submit_unavailability,
    unavailability_scope,
};

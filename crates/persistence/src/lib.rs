// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the turnover shift coordination system.
//!
//! This crate stores shifts, time-change requests, booking calendars,
//! notifications and the audit trail in `SQLite` through Diesel.
//!
//! ## Scheduling guards
//!
//! The conflict checks in `turnover` are read-then-write. Two concurrent
//! requests can both pass them, so the schema repeats each rule:
//!
//! - a partial unique index keeps one live shift per apartment and day
//! - a trigger caps live shifts per operator and day
//! - a partial unique index keeps one active shift per operator
//! - a partial unique index keeps one open time-change request per shift
//!
//! Operator unavailability requests live beside the shift tables; their
//! days are stored one row each so the availability check is an indexed
//! lookup.
//!
//! A violated guard surfaces as [`PersistenceError::ConstraintViolation`].
//!
//! ## Testing
//!
//! Tests use [`Persistence::new_in_memory`], which gives every instance
//! its own shared-cache database.

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
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{Date, Month, OffsetDateTime};
use turnover::{ScheduleOutcome, ShiftConflicts, ShiftTargets, TransitionResult};
use turnover_audit::AuditEvent;
use turnover_domain::{
    Apartment, Booking, DedupKey, InstructionPhoto, Notification, Role, Shift, ShiftComment,
    ShiftProblem, TimeChangeRequest, UnavailabilityRequest, UnavailabilityStatus, User,
};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod backend;
mod codec;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::OperatorWorkload;
pub use error::{Constraint, PersistenceError};
pub use mutations::PersistedTransition;
pub use queries::shifts::{HistoryFilter, ShiftFilter};

use backend::PersistenceBackend;

/// Type alias used by the API and server crates.
pub type SqlitePersistence = Persistence;

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation without time-based collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        self.conn.verify_foreign_key_enforcement()
    }

    // ========================================================================
    // Users & Apartments
    // ========================================================================

    /// Creates a user and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is taken or the insert fails.
    pub fn create_user(
        &mut self,
        role: Role,
        name: &str,
        email: &str,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::directory::create_user(&mut self.conn, role, name, email, now)
    }

    /// Retrieves a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_user(&mut self, user_id: i64) -> Result<Option<User>, PersistenceError> {
        queries::directory::get_user(&mut self.conn, user_id)
    }

    /// Lists every user.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_users(&mut self) -> Result<Vec<User>, PersistenceError> {
        queries::directory::list_users(&mut self.conn)
    }

    /// Lists the IDs of every admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_admin_ids(&mut self) -> Result<Vec<i64>, PersistenceError> {
        queries::directory::list_admin_ids(&mut self.conn)
    }

    /// Creates an apartment and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist.
    pub fn create_apartment(&mut self, name: &str, owner_id: i64) -> Result<i64, PersistenceError> {
        mutations::directory::create_apartment(&mut self.conn, name, owner_id)
    }

    /// Retrieves an apartment.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_apartment(&mut self, apartment_id: i64) -> Result<Option<Apartment>, PersistenceError> {
        queries::directory::get_apartment(&mut self.conn, apartment_id)
    }

    /// Lists apartments, optionally those of one owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_apartments(
        &mut self,
        owner_id: Option<i64>,
    ) -> Result<Vec<Apartment>, PersistenceError> {
        queries::directory::list_apartments(&mut self.conn, owner_id)
    }

    // ========================================================================
    // Shifts
    // ========================================================================

    /// Retrieves a shift with its live time-change request.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_shift(&mut self, shift_id: i64) -> Result<Option<Shift>, PersistenceError> {
        queries::shifts::get_shift(&mut self.conn, shift_id)
    }

    /// Counts what occupies the targets of a create or edit.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_conflicts(
        &mut self,
        targets: &ShiftTargets,
        exclude_shift_id: Option<i64>,
    ) -> Result<ShiftConflicts, PersistenceError> {
        queries::shifts::find_conflicts(&mut self.conn, targets, exclude_shift_id)
    }

    /// Lists shifts in a date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_shifts(
        &mut self,
        filter: ShiftFilter,
        from: Date,
        to: Date,
    ) -> Result<Vec<Shift>, PersistenceError> {
        queries::shifts::list_shifts(&mut self.conn, filter, from, to)
    }

    /// Persists a shift transition atomically.
    ///
    /// The shift, its request, any attachment and the audit event are
    /// written in one immediate transaction. On a constraint failure
    /// nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation` when a scheduling guard rejects the
    /// write, or another error if persistence fails.
    pub fn persist_transition(
        &mut self,
        result: &TransitionResult,
        now: OffsetDateTime,
    ) -> Result<PersistedTransition, PersistenceError> {
        self.conn.immediate_transaction(|conn| {
            mutations::shifts::persist_transition(conn, result, now)
        })
    }

    /// Retrieves the open time-change request of a shift.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_live_time_change(
        &mut self,
        shift_id: i64,
    ) -> Result<Option<TimeChangeRequest>, PersistenceError> {
        queries::time_change::get_live_request(&mut self.conn, shift_id)
    }

    /// Lists every request opened for a shift, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_time_changes(
        &mut self,
        shift_id: i64,
    ) -> Result<Vec<TimeChangeRequest>, PersistenceError> {
        queries::time_change::list_requests_for_shift(&mut self.conn, shift_id)
    }

    /// Lists a shift's comments.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_comments(&mut self, shift_id: i64) -> Result<Vec<ShiftComment>, PersistenceError> {
        queries::discussion::list_comments(&mut self.conn, shift_id)
    }

    /// Retrieves one comment.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_comment(&mut self, comment_id: i64) -> Result<Option<ShiftComment>, PersistenceError> {
        queries::discussion::get_comment(&mut self.conn, comment_id)
    }

    /// Lists completed shifts, most recently finished first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_completed_shifts(
        &mut self,
        filter: HistoryFilter,
        limit: i64,
    ) -> Result<Vec<Shift>, PersistenceError> {
        queries::shifts::list_completed(&mut self.conn, filter, limit)
    }

    /// Lists a shift's problem reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_problems(&mut self, shift_id: i64) -> Result<Vec<ShiftProblem>, PersistenceError> {
        queries::discussion::list_problems(&mut self.conn, shift_id)
    }

    /// Lists a shift's instruction photos.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_instruction_photos(
        &mut self,
        shift_id: i64,
    ) -> Result<Vec<InstructionPhoto>, PersistenceError> {
        queries::discussion::list_instruction_photos(&mut self.conn, shift_id)
    }

    // ========================================================================
    // Schedules
    // ========================================================================

    /// Retrieves the stored bookings for a month.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_schedule(
        &mut self,
        apartment_id: i64,
        year: i32,
        month: Month,
    ) -> Result<Vec<Booking>, PersistenceError> {
        queries::schedules::get_schedule(&mut self.conn, apartment_id, year, month)
    }

    /// Replaces the stored bookings for a month.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn replace_schedule(
        &mut self,
        apartment_id: i64,
        year: i32,
        month: Month,
        bookings: &[Booking],
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::schedules::replace_schedule(
            &mut self.conn,
            apartment_id,
            year,
            month,
            bookings,
            now,
        )
    }

    /// Deletes the stored bookings for a month.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_schedule(
        &mut self,
        apartment_id: i64,
        year: i32,
        month: Month,
    ) -> Result<(), PersistenceError> {
        mutations::schedules::delete_schedule(&mut self.conn, apartment_id, year, month)
    }

    /// Applies a reconciled submission and its audit event atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails.
    pub fn persist_schedule(
        &mut self,
        apartment_id: i64,
        outcome: &ScheduleOutcome,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        self.conn.immediate_transaction(|conn| {
            mutations::schedules::persist_schedule(conn, apartment_id, outcome, now)
        })
    }

    // ========================================================================
    // Unavailability
    // ========================================================================

    /// Stores a new unavailability request and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; nothing is stored then.
    pub fn insert_unavailability(
        &mut self,
        request: &UnavailabilityRequest,
    ) -> Result<i64, PersistenceError> {
        self.conn.immediate_transaction(|conn| {
            mutations::unavailability::insert_request(conn, request)
        })
    }

    /// Stores the review of an unavailability request.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the request does not exist.
    pub fn save_unavailability_review(
        &mut self,
        request: &UnavailabilityRequest,
    ) -> Result<(), PersistenceError> {
        mutations::unavailability::save_review(&mut self.conn, request)
    }

    /// Deletes an unavailability request.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the request does not exist.
    pub fn delete_unavailability(&mut self, request_id: i64) -> Result<(), PersistenceError> {
        mutations::unavailability::delete_request(&mut self.conn, request_id)
    }

    /// Retrieves an unavailability request.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_unavailability(
        &mut self,
        request_id: i64,
    ) -> Result<Option<UnavailabilityRequest>, PersistenceError> {
        queries::unavailability::get_request(&mut self.conn, request_id)
    }

    /// Lists unavailability requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_unavailability(
        &mut self,
        operator_id: Option<i64>,
        status: Option<UnavailabilityStatus>,
    ) -> Result<Vec<UnavailabilityRequest>, PersistenceError> {
        queries::unavailability::list_requests(&mut self.conn, operator_id, status)
    }

    /// Operators with an approved request covering `day`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn unavailable_operator_ids(&mut self, day: Date) -> Result<Vec<i64>, PersistenceError> {
        queries::unavailability::unavailable_operator_ids(&mut self.conn, day)
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Stores a notification and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_notification(
        &mut self,
        notification: &Notification,
    ) -> Result<i64, PersistenceError> {
        mutations::notifications::insert_notification(&mut self.conn, notification)
    }

    /// Returns when a notification with this key was last created.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn latest_notification_for_key(
        &mut self,
        key: &DedupKey,
    ) -> Result<Option<OffsetDateTime>, PersistenceError> {
        queries::notifications::latest_for_key(&mut self.conn, key)
    }

    /// Lists a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_notifications(
        &mut self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Notification>, PersistenceError> {
        queries::notifications::list_notifications(&mut self.conn, user_id, limit)
    }

    /// Counts a user's unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_unread_notifications(&mut self, user_id: i64) -> Result<i64, PersistenceError> {
        queries::notifications::count_unread(&mut self.conn, user_id)
    }

    /// Marks one of a user's notifications as read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist or is someone else's.
    pub fn mark_notification_read(
        &mut self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<(), PersistenceError> {
        mutations::notifications::mark_read(&mut self.conn, user_id, notification_id)
    }

    /// Marks all of a user's notifications as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn mark_all_notifications_read(&mut self, user_id: i64) -> Result<usize, PersistenceError> {
        mutations::notifications::mark_all_read(&mut self.conn, user_id)
    }

    // ========================================================================
    // Audit & Reports
    // ========================================================================

    /// Retrieves a single audit event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the event does not exist.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, event_id)
    }

    /// Lists the audit trail of a shift.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_shift_audit_events(
        &mut self,
        shift_id: i64,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::list_events_for_shift(&mut self.conn, shift_id)
    }

    /// Aggregates live shifts per operator over a date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn operator_workloads(
        &mut self,
        from: Date,
        to: Date,
    ) -> Result<Vec<OperatorWorkload>, PersistenceError> {
        queries::reports::operator_workloads(&mut self.conn, from, to)
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Writes the outcome of a shift transition.

use diesel::SqliteConnection;
use diesel::prelude::*;
use num_traits::ToPrimitive;
use time::OffsetDateTime;
use tracing::{debug, info};
use turnover::{ShiftChange, TransitionResult};
use turnover_audit::AuditEvent;
use turnover_domain::{InstructionPhoto, Shift, ShiftComment, ShiftProblem, TimeChangeRequest};

use crate::backend::PersistenceBackend;
use crate::codec::{encode_date, encode_instant, encode_optional_instant, encode_time};
use crate::data_models::{ShiftRecord, TimeChangeRecord};
use crate::diesel_schema::{
    instruction_photos, shift_comments, shift_problems, shifts, time_change_requests,
};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;

/// Ids assigned while persisting a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedTransition {
    pub shift_id: i64,
    pub event_id: i64,
    /// The request written, when the transition carried one.
    pub request_id: Option<i64>,
    /// The comment, problem or photo inserted, if any.
    pub attachment_id: Option<i64>,
}

fn shift_record(shift: &Shift, now: OffsetDateTime) -> Result<ShiftRecord, PersistenceError> {
    let guest_count: i32 = shift
        .guest_count
        .to_i32()
        .ok_or_else(|| PersistenceError::Other("Guest count out of range".to_string()))?;

    Ok(ShiftRecord {
        apartment_id: shift.apartment_id,
        operator_id: shift.operator_id,
        created_by: shift.created_by,
        scheduled_date: encode_date(shift.scheduled_date)?,
        scheduled_start_time: encode_time(shift.scheduled_start_time)?,
        scheduled_end_time: shift.scheduled_end_time.map(encode_time).transpose()?,
        actual_start_time: encode_optional_instant(shift.actual_start_time)?,
        actual_end_time: encode_optional_instant(shift.actual_end_time)?,
        status: shift.status.as_str().to_string(),
        guest_count,
        notes: shift.notes.clone(),
        confirmed_seen: i32::from(shift.confirmed_seen.confirmed),
        confirmed_seen_at: encode_optional_instant(shift.confirmed_seen.confirmed_at)?,
        updated_at: encode_instant(now)?,
    })
}

fn time_change_record(
    request: &TimeChangeRequest,
    shift_id: i64,
) -> Result<TimeChangeRecord, PersistenceError> {
    Ok(TimeChangeRecord {
        shift_id,
        requested_by: request.requested_by,
        initiator: request.initiator.as_str().to_string(),
        new_scheduled_date: request.draft.new_scheduled_date.map(encode_date).transpose()?,
        new_start_time: encode_time(request.draft.new_start_time)?,
        new_end_time: request.draft.new_end_time.map(encode_time).transpose()?,
        new_apartment_id: request.draft.new_apartment_id,
        new_operator_id: request.draft.new_operator_id,
        reason: request.reason.clone(),
        status: request.status.as_str().to_string(),
        operator_confirmed: request.operator_confirmed.map(i32::from),
        operator_confirmed_at: encode_optional_instant(request.operator_confirmed_at)?,
        created_at: encode_instant(request.created_at)?,
        closed_at: encode_optional_instant(request.closed_at)?,
    })
}

/// Inserts a new shift.
///
/// # Errors
///
/// Returns `ConstraintViolation` when the apartment is already booked
/// that day or the operator is at the daily limit.
pub fn insert_shift(
    conn: &mut SqliteConnection,
    shift: &Shift,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let record: ShiftRecord = shift_record(shift, now)?;
    diesel::insert_into(shifts::table)
        .values((&record, shifts::created_at.eq(encode_instant(now)?)))
        .execute(conn)?;

    let shift_id: i64 = conn.get_last_insert_rowid()?;
    info!(
        shift_id,
        apartment_id = shift.apartment_id,
        operator_id = shift.operator_id,
        date = %shift.scheduled_date,
        "Inserted shift"
    );
    Ok(shift_id)
}

/// Overwrites every column of a stored shift.
///
/// # Errors
///
/// Returns `NotFound` if the shift does not exist, or
/// `ConstraintViolation` if the new values break a scheduling guard.
pub fn update_shift(
    conn: &mut SqliteConnection,
    shift: &Shift,
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    let shift_id: i64 = shift.id();
    let record: ShiftRecord = shift_record(shift, now)?;
    let rows_affected: usize = diesel::update(shifts::table.filter(shifts::shift_id.eq(shift_id)))
        .set(&record)
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::NotFound(format!("Shift {shift_id}")));
    }
    debug!(shift_id, status = %shift.status, "Updated shift");
    Ok(())
}

/// Deletes a shift. Requests, comments, problems and photos cascade.
///
/// # Errors
///
/// Returns `NotFound` if the shift does not exist.
pub fn delete_shift(conn: &mut SqliteConnection, shift_id: i64) -> Result<(), PersistenceError> {
    let rows_affected: usize =
        diesel::delete(shifts::table.filter(shifts::shift_id.eq(shift_id))).execute(conn)?;
    if rows_affected == 0 {
        return Err(PersistenceError::NotFound(format!("Shift {shift_id}")));
    }
    info!(shift_id, "Deleted shift");
    Ok(())
}

/// Inserts a new request or updates a stored one.
///
/// # Errors
///
/// Returns `ConstraintViolation` when inserting a second live request
/// for the shift.
pub fn save_time_change(
    conn: &mut SqliteConnection,
    request: &TimeChangeRequest,
    shift_id: i64,
) -> Result<i64, PersistenceError> {
    let record: TimeChangeRecord = time_change_record(request, shift_id)?;

    if let Some(request_id) = request.request_id {
        diesel::update(
            time_change_requests::table.filter(time_change_requests::request_id.eq(request_id)),
        )
        .set(&record)
        .execute(conn)?;
        debug!(request_id, shift_id, status = %request.status.as_str(), "Updated time change request");
        return Ok(request_id);
    }

    diesel::insert_into(time_change_requests::table)
        .values(&record)
        .execute(conn)?;
    let request_id: i64 = conn.get_last_insert_rowid()?;
    info!(request_id, shift_id, initiator = %request.initiator, "Opened time change request");
    Ok(request_id)
}

fn insert_comment(
    conn: &mut SqliteConnection,
    comment: &ShiftComment,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(shift_comments::table)
        .values((
            shift_comments::shift_id.eq(comment.shift_id),
            shift_comments::author_id.eq(comment.author_id),
            shift_comments::text.eq(&comment.text),
            shift_comments::created_at.eq(encode_instant(comment.created_at)?),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}

fn delete_comment(
    conn: &mut SqliteConnection,
    shift_id: i64,
    comment_id: i64,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::delete(
        shift_comments::table
            .filter(shift_comments::comment_id.eq(comment_id))
            .filter(shift_comments::shift_id.eq(shift_id)),
    )
    .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Comment {comment_id} on shift {shift_id}"
        )));
    }
    Ok(())
}

fn insert_problem(
    conn: &mut SqliteConnection,
    problem: &ShiftProblem,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(shift_problems::table)
        .values((
            shift_problems::shift_id.eq(problem.shift_id),
            shift_problems::reported_by.eq(problem.reported_by),
            shift_problems::kind.eq(problem.kind.as_str()),
            shift_problems::description.eq(&problem.description),
            shift_problems::photo_urls_json.eq(serde_json::to_string(&problem.photo_urls)?),
            shift_problems::created_at.eq(encode_instant(problem.created_at)?),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}

fn insert_photo(
    conn: &mut SqliteConnection,
    photo: &InstructionPhoto,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(instruction_photos::table)
        .values((
            instruction_photos::shift_id.eq(photo.shift_id),
            instruction_photos::uploaded_by.eq(photo.uploaded_by),
            instruction_photos::url.eq(&photo.url),
            instruction_photos::description.eq(photo.description.as_deref()),
            instruction_photos::created_at.eq(encode_instant(photo.created_at)?),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}

/// Persists a shift transition and its audit event.
///
/// The caller runs this inside a transaction so a constraint failure
/// leaves nothing behind, including a pending request.
///
/// # Errors
///
/// Returns an error if any write fails.
pub fn persist_transition(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
    now: OffsetDateTime,
) -> Result<PersistedTransition, PersistenceError> {
    let mut attachment_id: Option<i64> = None;
    let shift_id: i64 = match &result.change {
        ShiftChange::Created => insert_shift(conn, &result.shift, now)?,
        ShiftChange::Updated => {
            update_shift(conn, &result.shift, now)?;
            result.shift.id()
        }
        ShiftChange::Deleted => {
            delete_shift(conn, result.shift.id())?;
            result.shift.id()
        }
        ShiftChange::CommentAdded(comment) => {
            attachment_id = Some(insert_comment(conn, comment)?);
            comment.shift_id
        }
        ShiftChange::CommentDeleted(comment_id) => {
            delete_comment(conn, result.shift.id(), *comment_id)?;
            result.shift.id()
        }
        ShiftChange::ProblemReported(problem) => {
            attachment_id = Some(insert_problem(conn, problem)?);
            problem.shift_id
        }
        ShiftChange::PhotoAdded(photo) => {
            attachment_id = Some(insert_photo(conn, photo)?);
            photo.shift_id
        }
    };

    let request_id: Option<i64> = result
        .time_change
        .as_ref()
        .map(|request| save_time_change(conn, request, shift_id))
        .transpose()?;

    let event: AuditEvent = result.audit_event.clone().for_shift(shift_id);
    let event_id: i64 = persist_audit_event(conn, &event, now)?;

    info!(
        shift_id,
        event_id,
        action = %event.action.name,
        "Persisted shift transition"
    );
    Ok(PersistedTransition {
        shift_id,
        event_id,
        request_id,
        attachment_id,
    })
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Writes operator unavailability requests.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::info;
use turnover_domain::UnavailabilityRequest;

use crate::backend::PersistenceBackend;
use crate::codec::{encode_date, encode_instant, encode_optional_instant};
use crate::diesel_schema::{unavailability_days, unavailability_requests};
use crate::error::PersistenceError;

/// Inserts a new request with one row per day.
///
/// # Errors
///
/// Returns an error if the operator does not exist or a write fails.
pub fn insert_request(
    conn: &mut SqliteConnection,
    request: &UnavailabilityRequest,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(unavailability_requests::table)
        .values((
            unavailability_requests::operator_id.eq(request.operator_id),
            unavailability_requests::reason.eq(request.reason.as_deref()),
            unavailability_requests::status.eq(request.status.as_str()),
            unavailability_requests::reviewed_by.eq(request.reviewed_by),
            unavailability_requests::reviewed_at.eq(encode_optional_instant(request.reviewed_at)?),
            unavailability_requests::created_at.eq(encode_instant(request.created_at)?),
        ))
        .execute(conn)?;
    let request_id: i64 = conn.get_last_insert_rowid()?;

    for day in &request.dates {
        diesel::insert_into(unavailability_days::table)
            .values((
                unavailability_days::request_id.eq(request_id),
                unavailability_days::day.eq(encode_date(*day)?),
            ))
            .execute(conn)?;
    }

    info!(
        request_id,
        operator_id = request.operator_id,
        days = request.dates.len(),
        "Stored unavailability request"
    );
    Ok(request_id)
}

/// Writes the review fields of an existing request.
///
/// # Errors
///
/// Returns `NotFound` if the request does not exist.
pub fn save_review(
    conn: &mut SqliteConnection,
    request: &UnavailabilityRequest,
) -> Result<(), PersistenceError> {
    let request_id: i64 = request.id();
    let rows_affected: usize = diesel::update(
        unavailability_requests::table.filter(unavailability_requests::request_id.eq(request_id)),
    )
    .set((
        unavailability_requests::status.eq(request.status.as_str()),
        unavailability_requests::reviewed_by.eq(request.reviewed_by),
        unavailability_requests::reviewed_at.eq(encode_optional_instant(request.reviewed_at)?),
    ))
    .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Unavailability request {request_id}"
        )));
    }
    info!(request_id, status = %request.status, "Reviewed unavailability request");
    Ok(())
}

/// Deletes a request; its days go with it.
///
/// # Errors
///
/// Returns `NotFound` if the request does not exist.
pub fn delete_request(conn: &mut SqliteConnection, request_id: i64) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::delete(
        unavailability_requests::table.filter(unavailability_requests::request_id.eq(request_id)),
    )
    .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Unavailability request {request_id}"
        )));
    }
    info!(request_id, "Withdrew unavailability request");
    Ok(())
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator unavailability requests and the days they cover.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::Date;
use turnover_domain::{UnavailabilityRequest, UnavailabilityStatus};

use crate::codec::{corrupt, decode_date, decode_instant, decode_optional_instant, encode_date};
use crate::diesel_schema::{unavailability_days, unavailability_requests};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = unavailability_requests)]
struct RequestRow {
    request_id: i64,
    operator_id: i64,
    reason: Option<String>,
    status: String,
    reviewed_by: Option<i64>,
    reviewed_at: Option<String>,
    created_at: String,
}

fn load_days(conn: &mut SqliteConnection, request_id: i64) -> Result<Vec<Date>, PersistenceError> {
    unavailability_days::table
        .filter(unavailability_days::request_id.eq(request_id))
        .order(unavailability_days::day.asc())
        .select(unavailability_days::day)
        .load::<String>(conn)?
        .iter()
        .map(|day| decode_date(day))
        .collect()
}

fn into_request(
    conn: &mut SqliteConnection,
    row: RequestRow,
) -> Result<UnavailabilityRequest, PersistenceError> {
    let status: UnavailabilityStatus = row
        .status
        .parse()
        .map_err(corrupt("unavailability_requests.status"))?;
    Ok(UnavailabilityRequest {
        request_id: Some(row.request_id),
        operator_id: row.operator_id,
        dates: load_days(conn, row.request_id)?,
        reason: row.reason,
        status,
        reviewed_by: row.reviewed_by,
        reviewed_at: decode_optional_instant(row.reviewed_at.as_deref())?,
        created_at: decode_instant(&row.created_at)?,
    })
}

/// Retrieves a request with its days.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
/// Returns `Ok(None)` if the request does not exist.
pub fn get_request(
    conn: &mut SqliteConnection,
    request_id: i64,
) -> Result<Option<UnavailabilityRequest>, PersistenceError> {
    let Some(row) = unavailability_requests::table
        .filter(unavailability_requests::request_id.eq(request_id))
        .select(RequestRow::as_select())
        .first(conn)
        .optional()?
    else {
        return Ok(None);
    };
    into_request(conn, row).map(Some)
}

/// Lists requests newest first, optionally narrowed by operator and status.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn list_requests(
    conn: &mut SqliteConnection,
    operator_id: Option<i64>,
    status: Option<UnavailabilityStatus>,
) -> Result<Vec<UnavailabilityRequest>, PersistenceError> {
    let mut query = unavailability_requests::table
        .select(RequestRow::as_select())
        .order((
            unavailability_requests::created_at.desc(),
            unavailability_requests::request_id.desc(),
        ))
        .into_boxed();
    if let Some(operator_id) = operator_id {
        query = query.filter(unavailability_requests::operator_id.eq(operator_id));
    }
    if let Some(status) = status {
        query = query.filter(unavailability_requests::status.eq(status.as_str()));
    }

    let rows: Vec<RequestRow> = query.load(conn)?;
    rows.into_iter().map(|row| into_request(conn, row)).collect()
}

/// Operators with an approved request covering `day`, ascending.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn unavailable_operator_ids(
    conn: &mut SqliteConnection,
    day: Date,
) -> Result<Vec<i64>, PersistenceError> {
    Ok(unavailability_requests::table
        .inner_join(unavailability_days::table)
        .filter(unavailability_days::day.eq(encode_date(day)?))
        .filter(unavailability_requests::status.eq(UnavailabilityStatus::Approved.as_str()))
        .select(unavailability_requests::operator_id)
        .distinct()
        .order(unavailability_requests::operator_id.asc())
        .load(conn)?)
}

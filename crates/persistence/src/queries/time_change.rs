// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use turnover_domain::{Role, TimeChangeDraft, TimeChangeRequest, TimeChangeStatus};

use crate::codec::{corrupt, decode_date, decode_instant, decode_optional_instant, decode_time};
use crate::diesel_schema::time_change_requests;
use crate::error::PersistenceError;

/// Diesel Queryable struct for time-change request rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = time_change_requests)]
struct TimeChangeRow {
    request_id: i64,
    shift_id: i64,
    requested_by: i64,
    initiator: String,
    new_scheduled_date: Option<String>,
    new_start_time: String,
    new_end_time: Option<String>,
    new_apartment_id: Option<i64>,
    new_operator_id: Option<i64>,
    reason: Option<String>,
    status: String,
    operator_confirmed: Option<i32>,
    operator_confirmed_at: Option<String>,
    created_at: String,
    closed_at: Option<String>,
}

impl TimeChangeRow {
    fn into_request(self) -> Result<TimeChangeRequest, PersistenceError> {
        let initiator: Role = self
            .initiator
            .parse()
            .map_err(corrupt("time_change_requests.initiator"))?;
        let status: TimeChangeStatus = self
            .status
            .parse()
            .map_err(corrupt("time_change_requests.status"))?;

        Ok(TimeChangeRequest {
            request_id: Some(self.request_id),
            shift_id: self.shift_id,
            requested_by: self.requested_by,
            initiator,
            draft: TimeChangeDraft {
                new_scheduled_date: self
                    .new_scheduled_date
                    .as_deref()
                    .map(decode_date)
                    .transpose()?,
                new_start_time: decode_time(&self.new_start_time)?,
                new_end_time: self.new_end_time.as_deref().map(decode_time).transpose()?,
                new_apartment_id: self.new_apartment_id,
                new_operator_id: self.new_operator_id,
            },
            reason: self.reason,
            status,
            operator_confirmed: self.operator_confirmed.map(|value| value != 0),
            operator_confirmed_at: decode_optional_instant(self.operator_confirmed_at.as_deref())?,
            created_at: decode_instant(&self.created_at)?,
            closed_at: decode_optional_instant(self.closed_at.as_deref())?,
        })
    }
}

/// Retrieves the open time-change request for a shift.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn get_live_request(
    conn: &mut SqliteConnection,
    shift_id: i64,
) -> Result<Option<TimeChangeRequest>, PersistenceError> {
    time_change_requests::table
        .filter(time_change_requests::shift_id.eq(shift_id))
        .filter(time_change_requests::closed_at.is_null())
        .select(TimeChangeRow::as_select())
        .first(conn)
        .optional()?
        .map(TimeChangeRow::into_request)
        .transpose()
}

/// Lists every request ever opened for a shift, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn list_requests_for_shift(
    conn: &mut SqliteConnection,
    shift_id: i64,
) -> Result<Vec<TimeChangeRequest>, PersistenceError> {
    time_change_requests::table
        .filter(time_change_requests::shift_id.eq(shift_id))
        .order(time_change_requests::request_id.asc())
        .select(TimeChangeRow::as_select())
        .load(conn)?
        .into_iter()
        .map(TimeChangeRow::into_request)
        .collect()
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shift lookups and the conflict check run before every write.

use diesel::SqliteConnection;
use diesel::prelude::*;
use num_traits::ToPrimitive;
use time::{Date, OffsetDateTime};
use tracing::debug;
use turnover::{ShiftConflicts, ShiftTargets};
use turnover_domain::{ConfirmedSeen, Shift, ShiftStatus};

use crate::codec::{
    corrupt, decode_date, decode_optional_instant, decode_time, encode_date, encode_instant,
};
use crate::diesel_schema::shifts;
use crate::error::PersistenceError;
use crate::queries::time_change::get_live_request;

const CANCELLED: &str = "cancelled";

/// Diesel Queryable struct for shift rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = shifts)]
pub(crate) struct ShiftRow {
    shift_id: i64,
    apartment_id: i64,
    operator_id: i64,
    created_by: i64,
    scheduled_date: String,
    scheduled_start_time: String,
    scheduled_end_time: Option<String>,
    actual_start_time: Option<String>,
    actual_end_time: Option<String>,
    status: String,
    guest_count: i32,
    notes: Option<String>,
    confirmed_seen: i32,
    confirmed_seen_at: Option<String>,
}

impl ShiftRow {
    /// Decodes the row without its time-change request.
    pub(crate) fn into_shift(self) -> Result<Shift, PersistenceError> {
        let status: ShiftStatus = self.status.parse().map_err(corrupt("shifts.status"))?;
        let guest_count: u32 = self.guest_count.to_u32().ok_or_else(|| {
            PersistenceError::SerializationError(format!(
                "shifts.guest_count out of range: {}",
                self.guest_count
            ))
        })?;

        let mut shift: Shift = Shift::new(
            self.apartment_id,
            self.operator_id,
            self.created_by,
            decode_date(&self.scheduled_date)?,
            decode_time(&self.scheduled_start_time)?,
            self.scheduled_end_time.as_deref().map(decode_time).transpose()?,
            guest_count,
            self.notes,
        )
        .with_id(self.shift_id);
        shift.actual_start_time = decode_optional_instant(self.actual_start_time.as_deref())?;
        shift.actual_end_time = decode_optional_instant(self.actual_end_time.as_deref())?;
        shift.status = status;
        shift.confirmed_seen = ConfirmedSeen {
            confirmed: self.confirmed_seen != 0,
            confirmed_at: decode_optional_instant(self.confirmed_seen_at.as_deref())?,
        };
        Ok(shift)
    }
}

/// Retrieves a shift with its live time-change request, if any.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
/// Returns `Ok(None)` if the shift does not exist.
pub fn get_shift(conn: &mut SqliteConnection, shift_id: i64) -> Result<Option<Shift>, PersistenceError> {
    debug!(shift_id, "Looking up shift");

    let Some(row) = shifts::table
        .filter(shifts::shift_id.eq(shift_id))
        .select(ShiftRow::as_select())
        .first(conn)
        .optional()?
    else {
        return Ok(None);
    };

    let mut shift: Shift = row.into_shift()?;
    shift.time_change_request = get_live_request(conn, shift_id)?;
    Ok(Some(shift))
}

/// Counts what already occupies the targets of a create or edit.
///
/// Cancelled shifts never count. `exclude_shift_id` leaves the shift
/// being edited out of every count.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_conflicts(
    conn: &mut SqliteConnection,
    targets: &ShiftTargets,
    exclude_shift_id: Option<i64>,
) -> Result<ShiftConflicts, PersistenceError> {
    let date: String = encode_date(targets.date)?;
    // Row ids start at 1, so 0 excludes nothing.
    let excluded: i64 = exclude_shift_id.unwrap_or_default();

    let apartment_count: i64 = shifts::table
        .filter(shifts::apartment_id.eq(targets.apartment_id))
        .filter(shifts::scheduled_date.eq(&date))
        .filter(shifts::status.ne(CANCELLED))
        .filter(shifts::shift_id.ne(excluded))
        .count()
        .get_result(conn)?;

    let operator_count: i64 = shifts::table
        .filter(shifts::operator_id.eq(targets.operator_id))
        .filter(shifts::scheduled_date.eq(&date))
        .filter(shifts::status.ne(CANCELLED))
        .filter(shifts::shift_id.ne(excluded))
        .count()
        .get_result(conn)?;

    let active_count: i64 = shifts::table
        .filter(shifts::operator_id.eq(targets.operator_id))
        .filter(shifts::actual_start_time.is_not_null())
        .filter(shifts::actual_end_time.is_null())
        .filter(shifts::shift_id.ne(excluded))
        .count()
        .get_result(conn)?;

    let conflicts: ShiftConflicts = ShiftConflicts {
        apartment_taken: apartment_count > 0,
        operator_count: operator_count.to_u32().unwrap_or(u32::MAX),
        operator_active: active_count > 0,
    };
    debug!(
        apartment_id = targets.apartment_id,
        operator_id = targets.operator_id,
        date = %targets.date,
        ?conflicts,
        "Computed shift conflicts"
    );
    Ok(conflicts)
}

/// Which shifts to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftFilter {
    All,
    Apartment(i64),
    Operator(i64),
    /// Shifts on any apartment owned by this user.
    Owner(i64),
}

/// Lists shifts in `[from, to]`, ordered by date and start time.
///
/// Listed shifts do not carry their time-change request.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn list_shifts(
    conn: &mut SqliteConnection,
    filter: ShiftFilter,
    from: Date,
    to: Date,
) -> Result<Vec<Shift>, PersistenceError> {
    use crate::diesel_schema::apartments;

    let mut query = shifts::table
        .select(ShiftRow::as_select())
        .filter(shifts::scheduled_date.ge(encode_date(from)?))
        .filter(shifts::scheduled_date.le(encode_date(to)?))
        .order((
            shifts::scheduled_date.asc(),
            shifts::scheduled_start_time.asc(),
            shifts::shift_id.asc(),
        ))
        .into_boxed();

    query = match filter {
        ShiftFilter::All => query,
        ShiftFilter::Apartment(apartment_id) => {
            query.filter(shifts::apartment_id.eq(apartment_id))
        }
        ShiftFilter::Operator(operator_id) => query.filter(shifts::operator_id.eq(operator_id)),
        ShiftFilter::Owner(owner_id) => query.filter(
            shifts::apartment_id.eq_any(
                apartments::table
                    .filter(apartments::owner_id.eq(owner_id))
                    .select(apartments::apartment_id),
            ),
        ),
    };

    query
        .load(conn)?
        .into_iter()
        .map(ShiftRow::into_shift)
        .collect()
}

/// Which completed shifts to list, and over what period of actual end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryFilter {
    pub apartment_id: Option<i64>,
    pub operator_id: Option<i64>,
    /// Restrict to apartments owned by this user.
    pub owner_id: Option<i64>,
    pub ended_from: Option<OffsetDateTime>,
    pub ended_to: Option<OffsetDateTime>,
}

/// Lists completed shifts, most recently finished first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn list_completed(
    conn: &mut SqliteConnection,
    filter: HistoryFilter,
    limit: i64,
) -> Result<Vec<Shift>, PersistenceError> {
    use crate::diesel_schema::apartments;

    let mut query = shifts::table
        .select(ShiftRow::as_select())
        .filter(shifts::status.eq(ShiftStatus::Completed.as_str()))
        .order((shifts::actual_end_time.desc(), shifts::shift_id.desc()))
        .limit(limit)
        .into_boxed();

    if let Some(apartment_id) = filter.apartment_id {
        query = query.filter(shifts::apartment_id.eq(apartment_id));
    }
    if let Some(operator_id) = filter.operator_id {
        query = query.filter(shifts::operator_id.eq(operator_id));
    }
    if let Some(owner_id) = filter.owner_id {
        query = query.filter(
            shifts::apartment_id.eq_any(
                apartments::table
                    .filter(apartments::owner_id.eq(owner_id))
                    .select(apartments::apartment_id),
            ),
        );
    }
    // Stored instants are UTC RFC 3339, so text order is time order.
    if let Some(from) = filter.ended_from {
        query = query.filter(shifts::actual_end_time.ge(encode_instant(from)?));
    }
    if let Some(to) = filter.ended_to {
        query = query.filter(shifts::actual_end_time.le(encode_instant(to)?));
    }

    query
        .load(conn)?
        .into_iter()
        .map(ShiftRow::into_shift)
        .collect()
}

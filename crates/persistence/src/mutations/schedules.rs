// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking calendar writes. A month is always replaced as a whole.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::{Month, OffsetDateTime};
use tracing::{debug, info};
use turnover::ScheduleOutcome;
use turnover_domain::{Booking, StoredSchedule};

use crate::codec::{encode_instant, encode_instant_with_offset};
use crate::data_models::BookingData;
use crate::diesel_schema::cleaning_schedules;
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;

fn month_number(month: Month) -> i32 {
    i32::from(u8::from(month))
}

/// Replaces the stored bookings for an apartment and month.
///
/// # Errors
///
/// Returns an error if the apartment does not exist or the write fails.
pub fn replace_schedule(
    conn: &mut SqliteConnection,
    apartment_id: i64,
    year: i32,
    month: Month,
    bookings: &[Booking],
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    let stored: Vec<BookingData> = bookings
        .iter()
        .map(|booking| -> Result<BookingData, PersistenceError> {
            Ok(BookingData {
                check_in: encode_instant_with_offset(booking.check_in)?,
                check_out: encode_instant_with_offset(booking.check_out)?,
                guest_count: booking.guest_count,
            })
        })
        .collect::<Result<Vec<BookingData>, PersistenceError>>()?;
    let bookings_json: String = serde_json::to_string(&stored)?;
    let updated_at: String = encode_instant(now)?;

    diesel::insert_into(cleaning_schedules::table)
        .values((
            cleaning_schedules::apartment_id.eq(apartment_id),
            cleaning_schedules::year.eq(year),
            cleaning_schedules::month.eq(month_number(month)),
            cleaning_schedules::bookings_json.eq(&bookings_json),
            cleaning_schedules::updated_at.eq(&updated_at),
        ))
        .on_conflict((
            cleaning_schedules::apartment_id,
            cleaning_schedules::year,
            cleaning_schedules::month,
        ))
        .do_update()
        .set((
            cleaning_schedules::bookings_json.eq(&bookings_json),
            cleaning_schedules::updated_at.eq(&updated_at),
        ))
        .execute(conn)?;

    debug!(apartment_id, year, %month, count = bookings.len(), "Replaced schedule");
    Ok(())
}

/// Deletes the stored bookings for an apartment and month.
///
/// Deleting a month that was never stored is not an error.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_schedule(
    conn: &mut SqliteConnection,
    apartment_id: i64,
    year: i32,
    month: Month,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::delete(
        cleaning_schedules::table
            .filter(cleaning_schedules::apartment_id.eq(apartment_id))
            .filter(cleaning_schedules::year.eq(year))
            .filter(cleaning_schedules::month.eq(month_number(month))),
    )
    .execute(conn)?;

    debug!(apartment_id, year, %month, rows_affected, "Deleted schedule");
    Ok(())
}

/// Applies a reconciled submission and records its audit event.
///
/// # Errors
///
/// Returns an error if any write fails.
pub fn persist_schedule(
    conn: &mut SqliteConnection,
    apartment_id: i64,
    outcome: &ScheduleOutcome,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    match &outcome.stored {
        StoredSchedule::Replace(bookings) => {
            replace_schedule(conn, apartment_id, outcome.year, outcome.month, bookings, now)?;
        }
        StoredSchedule::Delete => {
            delete_schedule(conn, apartment_id, outcome.year, outcome.month)?;
        }
    }
    let event_id: i64 = persist_audit_event(conn, &outcome.audit_event, now)?;

    info!(
        apartment_id,
        year = outcome.year,
        month = %outcome.month,
        newly_added = outcome.newly_added.len(),
        event_id,
        "Persisted schedule submission"
    );
    Ok(event_id)
}

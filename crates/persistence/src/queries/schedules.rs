// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::Month;
use turnover_domain::Booking;

use crate::codec::decode_instant;
use crate::data_models::BookingData;
use crate::diesel_schema::cleaning_schedules;
use crate::error::PersistenceError;

/// Decodes a stored bookings document.
pub(crate) fn decode_bookings(json: &str) -> Result<Vec<Booking>, PersistenceError> {
    let stored: Vec<BookingData> = serde_json::from_str(json)?;
    stored
        .into_iter()
        .map(|data| -> Result<Booking, PersistenceError> {
            Ok(Booking::new(
                decode_instant(&data.check_in)?,
                decode_instant(&data.check_out)?,
                data.guest_count,
            ))
        })
        .collect()
}

/// Retrieves the stored bookings for an apartment and month.
///
/// A month with no stored schedule yields an empty list.
///
/// # Errors
///
/// Returns an error if the query fails or the stored document is corrupt.
pub fn get_schedule(
    conn: &mut SqliteConnection,
    apartment_id: i64,
    year: i32,
    month: Month,
) -> Result<Vec<Booking>, PersistenceError> {
    let stored: Option<String> = cleaning_schedules::table
        .filter(cleaning_schedules::apartment_id.eq(apartment_id))
        .filter(cleaning_schedules::year.eq(year))
        .filter(cleaning_schedules::month.eq(i32::from(u8::from(month))))
        .select(cleaning_schedules::bookings_json)
        .first(conn)
        .optional()?;

    stored.map_or_else(|| Ok(Vec::new()), |json| decode_bookings(&json))
}

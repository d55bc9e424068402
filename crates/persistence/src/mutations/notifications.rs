// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;
use turnover_domain::Notification;

use crate::backend::PersistenceBackend;
use crate::codec::encode_instant;
use crate::diesel_schema::notifications;
use crate::error::PersistenceError;

/// Stores a notification with its dedup key columns.
///
/// # Errors
///
/// Returns an error if the recipient does not exist or the insert fails.
pub fn insert_notification(
    conn: &mut SqliteConnection,
    notification: &Notification,
) -> Result<i64, PersistenceError> {
    let key = notification.dedup_key.as_ref();

    diesel::insert_into(notifications::table)
        .values((
            notifications::user_id.eq(notification.user_id),
            notifications::notification_type.eq(notification.notification_type.as_str()),
            notifications::title.eq(&notification.title),
            notifications::message.eq(&notification.message),
            notifications::is_read.eq(i32::from(notification.read)),
            notifications::created_at.eq(encode_instant(notification.created_at)?),
            notifications::related_shift_id.eq(notification.related_shift_id),
            notifications::dedup_apartment_id.eq(key.map(|k| k.apartment_id)),
            notifications::dedup_year.eq(key.map(|k| k.year)),
            notifications::dedup_month.eq(key.map(|k| i32::from(u8::from(k.month)))),
        ))
        .execute(conn)?;

    let notification_id: i64 = conn.get_last_insert_rowid()?;
    debug!(
        notification_id,
        user_id = notification.user_id,
        notification_type = %notification.notification_type,
        "Created notification"
    );
    Ok(notification_id)
}

/// Marks one of the user's notifications as read.
///
/// # Errors
///
/// Returns `NotFound` if the notification does not exist or belongs to
/// someone else.
pub fn mark_read(
    conn: &mut SqliteConnection,
    user_id: i64,
    notification_id: i64,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(
        notifications::table
            .filter(notifications::notification_id.eq(notification_id))
            .filter(notifications::user_id.eq(user_id)),
    )
    .set(notifications::is_read.eq(1))
    .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Notification {notification_id}"
        )));
    }
    Ok(())
}

/// Marks every notification of a user as read.
///
/// # Returns
///
/// The number of notifications that changed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_all_read(conn: &mut SqliteConnection, user_id: i64) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::update(
        notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(0)),
    )
    .set(notifications::is_read.eq(1))
    .execute(conn)?;

    debug!(user_id, rows_affected, "Marked notifications read");
    Ok(rows_affected)
}

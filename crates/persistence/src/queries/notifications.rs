// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inbox reads and the dedup lookup.

use diesel::SqliteConnection;
use diesel::prelude::*;
use num_traits::ToPrimitive;
use time::{Month, OffsetDateTime};
use turnover_domain::{DedupKey, Notification, NotificationType};

use crate::codec::{corrupt, decode_instant};
use crate::diesel_schema::notifications;
use crate::error::PersistenceError;

/// Diesel Queryable struct for notification rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = notifications)]
struct NotificationRow {
    notification_id: i64,
    user_id: i64,
    notification_type: String,
    title: String,
    message: String,
    is_read: i32,
    created_at: String,
    related_shift_id: Option<i64>,
    dedup_apartment_id: Option<i64>,
    dedup_year: Option<i32>,
    dedup_month: Option<i32>,
}

impl NotificationRow {
    fn into_notification(self) -> Result<Notification, PersistenceError> {
        let notification_type: NotificationType = self
            .notification_type
            .parse()
            .map_err(corrupt("notifications.notification_type"))?;

        let dedup_key: Option<DedupKey> = match (
            self.dedup_apartment_id,
            self.dedup_year,
            self.dedup_month,
        ) {
            (Some(apartment_id), Some(year), Some(month)) => {
                let month: Month = month
                    .to_u8()
                    .and_then(|m| Month::try_from(m).ok())
                    .ok_or_else(|| {
                        PersistenceError::SerializationError(format!(
                            "notifications.dedup_month out of range: {month}"
                        ))
                    })?;
                Some(DedupKey {
                    user_id: self.user_id,
                    notification_type,
                    apartment_id,
                    year,
                    month,
                })
            }
            _ => None,
        };

        Ok(Notification {
            notification_id: Some(self.notification_id),
            user_id: self.user_id,
            notification_type,
            title: self.title,
            message: self.message,
            read: self.is_read != 0,
            created_at: decode_instant(&self.created_at)?,
            related_shift_id: self.related_shift_id,
            dedup_key,
        })
    }
}

/// Lists a user's notifications, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn list_notifications(
    conn: &mut SqliteConnection,
    user_id: i64,
    limit: i64,
) -> Result<Vec<Notification>, PersistenceError> {
    notifications::table
        .filter(notifications::user_id.eq(user_id))
        .order(notifications::notification_id.desc())
        .limit(limit)
        .select(NotificationRow::as_select())
        .load(conn)?
        .into_iter()
        .map(NotificationRow::into_notification)
        .collect()
}

/// Counts a user's unread notifications.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_unread(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, PersistenceError> {
    Ok(notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::is_read.eq(0))
        .count()
        .get_result(conn)?)
}

/// Returns when a notification with this key was last created.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn latest_for_key(
    conn: &mut SqliteConnection,
    key: &DedupKey,
) -> Result<Option<OffsetDateTime>, PersistenceError> {
    let created_at: Option<String> = notifications::table
        .filter(notifications::user_id.eq(key.user_id))
        .filter(notifications::notification_type.eq(key.notification_type.as_str()))
        .filter(notifications::dedup_apartment_id.eq(key.apartment_id))
        .filter(notifications::dedup_year.eq(key.year))
        .filter(notifications::dedup_month.eq(i32::from(u8::from(key.month))))
        .order(notifications::notification_id.desc())
        .select(notifications::created_at)
        .first(conn)
        .optional()?;

    created_at.as_deref().map(decode_instant).transpose()
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::info;
use turnover_domain::Role;

use crate::backend::PersistenceBackend;
use crate::codec::encode_instant;
use crate::diesel_schema::{apartments, users};
use crate::error::PersistenceError;

/// Creates a user.
///
/// # Errors
///
/// Returns an error if the email is already taken or the insert fails.
pub fn create_user(
    conn: &mut SqliteConnection,
    role: Role,
    name: &str,
    email: &str,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(users::table)
        .values((
            users::role.eq(role.as_str()),
            users::name.eq(name),
            users::email.eq(email.trim().to_lowercase()),
            users::created_at.eq(encode_instant(now)?),
        ))
        .execute(conn)?;

    let user_id: i64 = conn.get_last_insert_rowid()?;
    info!(user_id, role = %role, "Created user");
    Ok(user_id)
}

/// Creates an apartment owned by `owner_id`.
///
/// # Errors
///
/// Returns an error if the owner does not exist or the insert fails.
pub fn create_apartment(
    conn: &mut SqliteConnection,
    name: &str,
    owner_id: i64,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(apartments::table)
        .values((apartments::name.eq(name), apartments::owner_id.eq(owner_id)))
        .execute(conn)?;

    let apartment_id: i64 = conn.get_last_insert_rowid()?;
    info!(apartment_id, owner_id, "Created apartment");
    Ok(apartment_id)
}

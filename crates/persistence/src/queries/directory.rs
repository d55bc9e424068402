// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User and apartment lookups.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;
use turnover_domain::{Apartment, Role, User};

use crate::codec::corrupt;
use crate::diesel_schema::{apartments, users};
use crate::error::PersistenceError;

/// Diesel Queryable struct for user rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
struct UserRow {
    user_id: i64,
    role: String,
    name: String,
    email: String,
}

impl UserRow {
    fn into_user(self) -> Result<User, PersistenceError> {
        let role: Role = self.role.parse().map_err(corrupt("users.role"))?;
        Ok(User::new(self.user_id, role, self.name, self.email))
    }
}

/// Diesel Queryable struct for apartment rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = apartments)]
struct ApartmentRow {
    apartment_id: i64,
    name: String,
    owner_id: i64,
}

impl From<ApartmentRow> for Apartment {
    fn from(row: ApartmentRow) -> Self {
        Self::new(row.apartment_id, row.name, row.owner_id)
    }
}

/// Retrieves a user by ID.
///
/// # Errors
///
/// Returns an error if the query fails. Returns `Ok(None)` if the user
/// does not exist.
pub fn get_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<User>, PersistenceError> {
    debug!(user_id, "Looking up user");

    users::table
        .filter(users::user_id.eq(user_id))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?
        .map(UserRow::into_user)
        .transpose()
}

/// Lists every user, ordered by ID.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_users(conn: &mut SqliteConnection) -> Result<Vec<User>, PersistenceError> {
    users::table
        .order(users::user_id.asc())
        .select(UserRow::as_select())
        .load(conn)?
        .into_iter()
        .map(UserRow::into_user)
        .collect()
}

/// Lists the IDs of every admin.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_admin_ids(conn: &mut SqliteConnection) -> Result<Vec<i64>, PersistenceError> {
    Ok(users::table
        .filter(users::role.eq(Role::Admin.as_str()))
        .order(users::user_id.asc())
        .select(users::user_id)
        .load(conn)?)
}

/// Retrieves an apartment by ID.
///
/// # Errors
///
/// Returns an error if the query fails. Returns `Ok(None)` if the
/// apartment does not exist.
pub fn get_apartment(
    conn: &mut SqliteConnection,
    apartment_id: i64,
) -> Result<Option<Apartment>, PersistenceError> {
    Ok(apartments::table
        .filter(apartments::apartment_id.eq(apartment_id))
        .select(ApartmentRow::as_select())
        .first(conn)
        .optional()?
        .map(Apartment::from))
}

/// Lists apartments, optionally only those of one owner.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_apartments(
    conn: &mut SqliteConnection,
    owner_id: Option<i64>,
) -> Result<Vec<Apartment>, PersistenceError> {
    let mut query = apartments::table
        .select(ApartmentRow::as_select())
        .order(apartments::name.asc())
        .into_boxed();
    if let Some(owner_id) = owner_id {
        query = query.filter(apartments::owner_id.eq(owner_id));
    }
    Ok(query.load(conn)?.into_iter().map(Apartment::from).collect())
}

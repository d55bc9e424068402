// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.
//!
//! Every other test opens an in-memory database, so migrations and
//! connection setup are exercised throughout. These cover isolation,
//! foreign keys and the directory tables directly.

use turnover_domain::{Apartment, Role, User};

use super::NOW;
use crate::{PersistenceError, SqlitePersistence};

#[test]
fn test_persistence_initialization() {
    let result: Result<SqlitePersistence, PersistenceError> = SqlitePersistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_foreign_key_enforcement_is_enabled() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());

    let orphan: Result<i64, PersistenceError> = persistence.create_apartment("Nowhere", 404);
    assert!(orphan.is_err());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let mut db2: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    db1.create_user(Role::Admin, "Ada Admin", "ada@example.com", NOW)
        .unwrap();

    assert_eq!(db1.list_users().unwrap().len(), 1);
    assert_eq!(db2.list_users().unwrap().len(), 0);
}

#[test]
fn test_emails_are_unique_regardless_of_case() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    persistence
        .create_user(Role::Operator, "Otto", "otto@example.com", NOW)
        .unwrap();

    let duplicate: Result<i64, PersistenceError> =
        persistence.create_user(Role::Operator, "Otto Again", "OTTO@example.com", NOW);

    assert!(duplicate.is_err());
}

#[test]
fn test_directory_lookups() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let admin_id: i64 = persistence
        .create_user(Role::Admin, "Ada Admin", "ada@example.com", NOW)
        .unwrap();
    let owner_id: i64 = persistence
        .create_user(Role::Owner, "Olga Owner", "olga@example.com", NOW)
        .unwrap();
    let other_owner_id: i64 = persistence
        .create_user(Role::Owner, "Omar Owner", "omar@example.com", NOW)
        .unwrap();
    persistence.create_apartment("Seaside 2B", owner_id).unwrap();
    persistence.create_apartment("Harbour 7", other_owner_id).unwrap();

    let owner: User = persistence.get_user(owner_id).unwrap().unwrap();
    let owned: Vec<Apartment> = persistence.list_apartments(Some(owner_id)).unwrap();

    assert_eq!(owner.role, Role::Owner);
    assert_eq!(persistence.list_admin_ids().unwrap(), vec![admin_id]);
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].name, "Seaside 2B");
    assert_eq!(persistence.list_apartments(None).unwrap().len(), 2);
    assert_eq!(persistence.get_user(999).unwrap(), None);
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! ## Module Organization
//!
//! - `audit`: Audit event persistence
//! - `directory`: Users and apartments
//! - `shifts`: Shift transitions with their requests and attachments
//! - `schedules`: Booking calendar replacement and deletion
//! - `notifications`: Notification creation and read state
//! - `unavailability`: Operator unavailability requests
//!
//! Row ids come from `PersistenceBackend::get_last_insert_rowid`.

pub mod audit;
pub mod directory;
pub mod notifications;
pub mod schedules;
pub mod shifts;
pub mod unavailability;

pub use shifts::PersistedTransition;

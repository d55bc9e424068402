// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! ## Module Organization
//!
//! - `directory`: Users and apartments
//! - `shifts`: Shifts, conflict lookups, date-range listings and history
//! - `discussion`: Comments, problem reports and instruction photos
//! - `time_change`: Time-change requests
//! - `schedules`: Owner booking calendars
//! - `notifications`: Inbox reads and dedup lookups
//! - `audit`: Audit trail
//! - `reports`: Operator workload aggregation
//! - `unavailability`: Operator unavailability requests

pub mod audit;
pub mod directory;
pub mod discussion;
pub mod notifications;
pub mod reports;
pub mod schedules;
pub mod shifts;
pub mod time_change;
pub mod unavailability;

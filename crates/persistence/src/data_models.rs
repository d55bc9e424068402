// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::diesel_schema::{shifts, time_change_requests};

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub user_id: i64,
    pub role: String,
}

/// Serializable representation of a Cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseData {
    pub id: String,
    pub description: String,
}

/// Serializable representation of an Action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub details: Option<String>,
}

/// Serializable representation of a `StateSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshotData {
    pub data: String,
}

/// Serializable representation of a `Booking`.
///
/// Instants are RFC 3339 strings with their original offset, so the
/// reconciler sees exactly what the owner submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingData {
    pub check_in: String,
    pub check_out: String,
    pub guest_count: u32,
}

/// Shift counts for one operator over a date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorWorkload {
    pub operator_id: i64,
    pub operator_name: String,
    /// Distinct dates with at least one live shift.
    pub work_days: usize,
    pub shift_count: usize,
}

/// Column values written for a shift on insert and update.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = shifts)]
#[diesel(treat_none_as_null = true)]
pub struct ShiftRecord {
    pub apartment_id: i64,
    pub operator_id: i64,
    pub created_by: i64,
    pub scheduled_date: String,
    pub scheduled_start_time: String,
    pub scheduled_end_time: Option<String>,
    pub actual_start_time: Option<String>,
    pub actual_end_time: Option<String>,
    pub status: String,
    pub guest_count: i32,
    pub notes: Option<String>,
    pub confirmed_seen: i32,
    pub confirmed_seen_at: Option<String>,
    pub updated_at: String,
}

/// Column values written for a time-change request.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = time_change_requests)]
#[diesel(treat_none_as_null = true)]
pub struct TimeChangeRecord {
    pub shift_id: i64,
    pub requested_by: i64,
    pub initiator: String,
    pub new_scheduled_date: Option<String>,
    pub new_start_time: String,
    pub new_end_time: Option<String>,
    pub new_apartment_id: Option<i64>,
    pub new_operator_id: Option<i64>,
    pub reason: Option<String>,
    pub status: String,
    pub operator_confirmed: Option<i32>,
    pub operator_confirmed_at: Option<String>,
    pub created_at: String,
    pub closed_at: Option<String>,
}

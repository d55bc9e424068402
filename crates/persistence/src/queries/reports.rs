// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::{BTreeMap, BTreeSet};

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::Date;

use crate::codec::encode_date;
use crate::data_models::OperatorWorkload;
use crate::diesel_schema::{shifts, users};
use crate::error::PersistenceError;

/// Aggregates live shifts in `[from, to]` per operator.
///
/// Cancelled shifts are ignored. Operators without shifts in the range
/// are omitted. Results are ordered by operator name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn operator_workloads(
    conn: &mut SqliteConnection,
    from: Date,
    to: Date,
) -> Result<Vec<OperatorWorkload>, PersistenceError> {
    let rows: Vec<(i64, String)> = shifts::table
        .filter(shifts::scheduled_date.ge(encode_date(from)?))
        .filter(shifts::scheduled_date.le(encode_date(to)?))
        .filter(shifts::status.ne("cancelled"))
        .select((shifts::operator_id, shifts::scheduled_date))
        .load(conn)?;

    let mut days: BTreeMap<i64, (BTreeSet<String>, usize)> = BTreeMap::new();
    for (operator_id, date) in rows {
        let entry: &mut (BTreeSet<String>, usize) = days.entry(operator_id).or_default();
        entry.0.insert(date);
        entry.1 += 1;
    }

    let names: BTreeMap<i64, String> = users::table
        .filter(users::user_id.eq_any(days.keys().copied().collect::<Vec<i64>>()))
        .select((users::user_id, users::name))
        .load::<(i64, String)>(conn)?
        .into_iter()
        .collect();

    let mut workloads: Vec<OperatorWorkload> = days
        .into_iter()
        .map(|(operator_id, (dates, shift_count))| OperatorWorkload {
            operator_id,
            operator_name: names.get(&operator_id).cloned().unwrap_or_default(),
            work_days: dates.len(),
            shift_count,
        })
        .collect();
    workloads.sort_by(|a, b| {
        a.operator_name
            .cmp(&b.operator_name)
            .then(a.operator_id.cmp(&b.operator_id))
    });
    Ok(workloads)
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::debug;
use turnover_audit::AuditEvent;

use crate::backend::PersistenceBackend;
use crate::codec::encode_instant;
use crate::data_models::{ActionData, ActorData, CauseData, StateSnapshotData};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Persists an audit event.
///
/// # Returns
///
/// The event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if persistence or serialization fails.
pub fn persist_audit_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let actor_data: ActorData = ActorData {
        user_id: event.actor.user_id,
        role: event.actor.role.clone(),
    };
    let cause_data: CauseData = CauseData {
        id: event.cause.id.clone(),
        description: event.cause.description.clone(),
    };
    let action_data: ActionData = ActionData {
        name: event.action.name.clone(),
        details: event.action.details.clone(),
    };
    let before_data: StateSnapshotData = StateSnapshotData {
        data: event.before.data.clone(),
    };
    let after_data: StateSnapshotData = StateSnapshotData {
        data: event.after.data.clone(),
    };

    diesel::insert_into(audit_events::table)
        .values((
            audit_events::apartment_id.eq(event.apartment_id),
            audit_events::shift_id.eq(event.shift_id),
            audit_events::actor_json.eq(serde_json::to_string(&actor_data)?),
            audit_events::cause_json.eq(serde_json::to_string(&cause_data)?),
            audit_events::action_json.eq(serde_json::to_string(&action_data)?),
            audit_events::before_snapshot_json.eq(serde_json::to_string(&before_data)?),
            audit_events::after_snapshot_json.eq(serde_json::to_string(&after_data)?),
            audit_events::created_at.eq(encode_instant(now)?),
        ))
        .execute(conn)?;

    let event_id: i64 = conn.get_last_insert_rowid()?;
    debug!(
        event_id,
        action = %event.action.name,
        shift_id = ?event.shift_id,
        "Persisted audit event"
    );
    Ok(event_id)
}

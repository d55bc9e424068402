// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Comments, problem reports and instruction photos attached to a shift.

use diesel::SqliteConnection;
use diesel::prelude::*;
use turnover_domain::{InstructionPhoto, ProblemKind, ShiftComment, ShiftProblem};

use crate::codec::{corrupt, decode_instant};
use crate::diesel_schema::{instruction_photos, shift_comments, shift_problems};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = shift_comments)]
struct CommentRow {
    comment_id: i64,
    shift_id: i64,
    author_id: i64,
    text: String,
    created_at: String,
}

impl CommentRow {
    fn into_comment(self) -> Result<ShiftComment, PersistenceError> {
        Ok(ShiftComment {
            comment_id: Some(self.comment_id),
            shift_id: self.shift_id,
            author_id: self.author_id,
            text: self.text,
            created_at: decode_instant(&self.created_at)?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = shift_problems)]
struct ProblemRow {
    problem_id: i64,
    shift_id: i64,
    reported_by: i64,
    kind: String,
    description: String,
    photo_urls_json: String,
    created_at: String,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = instruction_photos)]
struct PhotoRow {
    photo_id: i64,
    shift_id: i64,
    uploaded_by: i64,
    url: String,
    description: Option<String>,
    created_at: String,
}

/// Lists a shift's comments, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn list_comments(
    conn: &mut SqliteConnection,
    shift_id: i64,
) -> Result<Vec<ShiftComment>, PersistenceError> {
    shift_comments::table
        .filter(shift_comments::shift_id.eq(shift_id))
        .order(shift_comments::comment_id.asc())
        .select(CommentRow::as_select())
        .load(conn)?
        .into_iter()
        .map(CommentRow::into_comment)
        .collect()
}

/// Retrieves one comment.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
/// Returns `Ok(None)` if the comment does not exist.
pub fn get_comment(
    conn: &mut SqliteConnection,
    comment_id: i64,
) -> Result<Option<ShiftComment>, PersistenceError> {
    shift_comments::table
        .filter(shift_comments::comment_id.eq(comment_id))
        .select(CommentRow::as_select())
        .first(conn)
        .optional()?
        .map(CommentRow::into_comment)
        .transpose()
}

/// Lists a shift's problem reports, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn list_problems(
    conn: &mut SqliteConnection,
    shift_id: i64,
) -> Result<Vec<ShiftProblem>, PersistenceError> {
    shift_problems::table
        .filter(shift_problems::shift_id.eq(shift_id))
        .order(shift_problems::problem_id.asc())
        .select(ProblemRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|row| -> Result<ShiftProblem, PersistenceError> {
            let kind: ProblemKind = row.kind.parse().map_err(corrupt("shift_problems.kind"))?;
            Ok(ShiftProblem {
                problem_id: Some(row.problem_id),
                shift_id: row.shift_id,
                reported_by: row.reported_by,
                kind,
                description: row.description,
                photo_urls: serde_json::from_str(&row.photo_urls_json)?,
                created_at: decode_instant(&row.created_at)?,
            })
        })
        .collect()
}

/// Lists a shift's instruction photos, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn list_instruction_photos(
    conn: &mut SqliteConnection,
    shift_id: i64,
) -> Result<Vec<InstructionPhoto>, PersistenceError> {
    instruction_photos::table
        .filter(instruction_photos::shift_id.eq(shift_id))
        .order(instruction_photos::photo_id.asc())
        .select(PhotoRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|row| -> Result<InstructionPhoto, PersistenceError> {
            Ok(InstructionPhoto {
                photo_id: Some(row.photo_id),
                shift_id: row.shift_id,
                uploaded_by: row.uploaded_by,
                url: row.url,
                description: row.description,
                created_at: decode_instant(&row.created_at)?,
            })
        })
        .collect()
}

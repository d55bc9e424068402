// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::Error as DieselError;

/// Database-level guards behind the scheduling rules.
///
/// The application checks these before writing. The database repeats
/// them so two concurrent requests cannot both pass a read-then-write
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Partial unique index on `(apartment_id, scheduled_date)`.
    ApartmentDay,
    /// Trigger capping live shifts per operator and day.
    OperatorDailyLimit,
    /// Partial unique index on started, unfinished shifts per operator.
    OperatorActive,
    /// Partial unique index on open time-change requests per shift.
    LiveTimeChangeRequest,
}

impl Constraint {
    /// Recognizes the guard behind a `SQLite` constraint message.
    fn from_message(message: &str) -> Option<Self> {
        if message.contains("operator_daily_limit") {
            Some(Self::OperatorDailyLimit)
        } else if message.contains("shifts.apartment_id, shifts.scheduled_date") {
            Some(Self::ApartmentDay)
        } else if message.contains("time_change_requests.shift_id") {
            Some(Self::LiveTimeChangeRequest)
        } else if message.contains("shifts.operator_id") {
            Some(Self::OperatorActive)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApartmentDay => write!(f, "apartment already has a shift on that day"),
            Self::OperatorDailyLimit => write!(f, "operator daily shift limit reached"),
            Self::OperatorActive => write!(f, "operator already has an active shift"),
            Self::LiveTimeChangeRequest => {
                write!(f, "shift already has an open time change request")
            }
        }
    }
}

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// A scheduling guard rejected the write.
    ConstraintViolation(Constraint),
    /// A stored value could not be encoded or decoded.
    SerializationError(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// The requested resource was not found.
    NotFound(String),
    /// A general error occurred.
    Other(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::ConstraintViolation(constraint) => {
                write!(f, "Constraint violated: {constraint}")
            }
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound("Record not found".to_string()),
            DieselError::DatabaseError(_, ref info) => Constraint::from_message(info.message())
                .map_or_else(|| Self::DatabaseError(err.to_string()), Self::ConstraintViolation),
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<time::error::Format> for PersistenceError {
    fn from(err: time::error::Format) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<time::error::Parse> for PersistenceError {
    fn from(err: time::error::Parse) -> Self {
        Self::SerializationError(err.to_string())
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator unavailability.
//!
//! An operator asks to be kept off a set of days. An admin approves or
//! rejects the request once; only approved requests make the operator
//! unavailable. A pending request may be withdrawn.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, OffsetDateTime};

use crate::error::DomainError;

/// Review status of an unavailability request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailabilityStatus {
    Pending,
    Approved,
    Rejected,
}

impl UnavailabilityStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for UnavailabilityStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidUnavailabilityStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for UnavailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operator's request to be kept off some days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailabilityRequest {
    pub request_id: Option<i64>,
    pub operator_id: i64,
    /// Sorted and free of duplicates.
    pub dates: Vec<Date>,
    pub reason: Option<String>,
    pub status: UnavailabilityStatus,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl UnavailabilityRequest {
    /// Opens a pending request.
    ///
    /// # Arguments
    ///
    /// * `operator_id` - The operator asking for time off
    /// * `dates` - The requested days, in any order
    /// * `reason` - Optional free text; blank is treated as absent
    /// * `today` - The current local day; earlier days are refused
    /// * `now` - Creation instant
    ///
    /// # Errors
    ///
    /// Returns an error if no day is given or any day is before `today`.
    pub fn open(
        operator_id: i64,
        mut dates: Vec<Date>,
        reason: Option<&str>,
        today: Date,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        dates.sort_unstable();
        dates.dedup();

        let Some(first) = dates.first() else {
            return Err(DomainError::NoDatesRequested);
        };
        if *first < today {
            return Err(DomainError::PastDateRequested { date: *first });
        }

        Ok(Self {
            request_id: None,
            operator_id,
            dates,
            reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            status: UnavailabilityStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
        })
    }

    /// Returns the persisted id, or 0 for an unpersisted request.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.request_id.unwrap_or_default()
    }

    /// Sets the persisted id.
    #[must_use]
    pub fn with_id(mut self, request_id: i64) -> Self {
        self.request_id = Some(request_id);
        self
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, UnavailabilityStatus::Pending)
    }

    /// True if the request is approved and names `day`.
    #[must_use]
    pub fn blocks(&self, day: Date) -> bool {
        matches!(self.status, UnavailabilityStatus::Approved)
            && self.dates.binary_search(&day).is_ok()
    }

    fn ensure_pending(&self) -> Result<(), DomainError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(DomainError::UnavailabilityAlreadyReviewed {
                decision: self.status.as_str().to_string(),
            })
        }
    }

    /// Records an admin's decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the request was already reviewed.
    pub fn review(
        &mut self,
        approve: bool,
        reviewer_id: i64,
        now: OffsetDateTime,
    ) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.status = if approve {
            UnavailabilityStatus::Approved
        } else {
            UnavailabilityStatus::Rejected
        };
        self.reviewed_by = Some(reviewer_id);
        self.reviewed_at = Some(now);
        Ok(())
    }

    /// Checks that the request may still be withdrawn.
    ///
    /// # Errors
    ///
    /// Returns an error once the request has been reviewed.
    pub fn ensure_withdrawable(&self) -> Result<(), DomainError> {
        self.ensure_pending()
    }
}

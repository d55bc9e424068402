// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono_tz::Tz;
use time::{Duration, OffsetDateTime};
use turnover_domain::{DomainError, Shift, scheduled_instant, time_until};

/// Thresholds governing who may change what, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftPolicy {
    /// Minimum lead for an admin to move a shift in time or space directly.
    pub date_time_edit_lead: Duration,
    /// Minimum lead for an admin to reassign the operator directly.
    pub operator_edit_lead: Duration,
    /// Minimum gap between actual start and actual end.
    pub minimum_duration: Duration,
    /// Time-change requests may not be opened later than this before start.
    pub request_cutoff: Duration,
    /// Maximum non-cancelled shifts per operator per day.
    pub operator_daily_cap: u32,
    /// Window in which an equivalent notification is suppressed.
    pub dedup_window: Duration,
    /// Zone in which scheduled dates and times are expressed.
    pub timezone: Tz,
}

impl Default for ShiftPolicy {
    fn default() -> Self {
        Self {
            date_time_edit_lead: Duration::hours(18),
            operator_edit_lead: Duration::hours(10),
            minimum_duration: Duration::hours(1),
            request_cutoff: Duration::hours(1),
            operator_daily_cap: 3,
            dedup_window: Duration::minutes(5),
            timezone: Tz::UTC,
        }
    }
}

impl ShiftPolicy {
    /// Returns the policy with a different timezone.
    #[must_use]
    pub const fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Returns the policy with a different dedup window.
    #[must_use]
    pub const fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    /// The instant the shift is scheduled to begin.
    ///
    /// # Errors
    ///
    /// Returns an error if the local time does not resolve to exactly one
    /// instant.
    pub fn scheduled_start(&self, shift: &Shift) -> Result<OffsetDateTime, DomainError> {
        scheduled_instant(shift, self.timezone)
    }

    /// Time from `now` until the shift's current scheduled start.
    ///
    /// # Errors
    ///
    /// See [`ShiftPolicy::scheduled_start`].
    pub fn lead_time(&self, shift: &Shift, now: OffsetDateTime) -> Result<Duration, DomainError> {
        Ok(time_until(self.scheduled_start(shift)?, now))
    }

    /// True once `now` has reached the shift's scheduled start.
    ///
    /// # Errors
    ///
    /// See [`ShiftPolicy::scheduled_start`].
    pub fn has_started(&self, shift: &Shift, now: OffsetDateTime) -> Result<bool, DomainError> {
        Ok(self.lead_time(shift, now)? <= Duration::ZERO)
    }

    /// True if `operator_count` existing shifts leave no room for another.
    #[must_use]
    pub const fn operator_is_full(&self, operator_count: u32) -> bool {
        operator_count >= self.operator_daily_cap
    }
}

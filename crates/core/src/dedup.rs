// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::{Duration, OffsetDateTime};
use turnover_domain::DedupKey;

/// Suppresses repeats of a keyed notification inside a time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deduper {
    window: Duration,
}

impl Deduper {
    /// Creates a deduper with the given window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window }
    }

    /// The suppression window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Decides whether a candidate notification should be created.
    ///
    /// # Arguments
    ///
    /// * `key` - The candidate's dedup key; unkeyed candidates always pass
    /// * `last_sent_at` - Creation time of the most recent notification
    ///   stored under the same key, if any
    /// * `now` - The current instant
    #[must_use]
    pub fn should_send(
        &self,
        key: Option<&DedupKey>,
        last_sent_at: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> bool {
        if key.is_none() {
            return true;
        }
        match last_sent_at {
            Some(sent_at) => now - sent_at >= self.window,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;
    use time::macros::datetime;
    use turnover_domain::NotificationType;

    fn create_test_key() -> DedupKey {
        DedupKey {
            user_id: 1,
            notification_type: NotificationType::CalendarUpdatedNewDays,
            apartment_id: 4,
            year: 2024,
            month: Month::January,
        }
    }

    #[test]
    fn test_first_notification_is_sent() {
        let deduper: Deduper = Deduper::new(Duration::minutes(5));
        let key: DedupKey = create_test_key();
        assert!(deduper.should_send(Some(&key), None, datetime!(2024-01-05 10:00 UTC)));
    }

    #[test]
    fn test_repeat_inside_window_is_suppressed() {
        let deduper: Deduper = Deduper::new(Duration::minutes(5));
        let key: DedupKey = create_test_key();
        assert!(!deduper.should_send(
            Some(&key),
            Some(datetime!(2024-01-05 10:00 UTC)),
            datetime!(2024-01-05 10:04:59 UTC),
        ));
    }

    #[test]
    fn test_repeat_after_window_is_sent() {
        let deduper: Deduper = Deduper::new(Duration::minutes(5));
        let key: DedupKey = create_test_key();
        assert!(deduper.should_send(
            Some(&key),
            Some(datetime!(2024-01-05 10:00 UTC)),
            datetime!(2024-01-05 10:05 UTC),
        ));
    }

    #[test]
    fn test_unkeyed_notification_is_always_sent() {
        let deduper: Deduper = Deduper::new(Duration::minutes(5));
        assert!(deduper.should_send(
            None,
            Some(datetime!(2024-01-05 10:00 UTC)),
            datetime!(2024-01-05 10:01 UTC),
        ));
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono_tz::Tz;
use time::macros::{date, datetime};
use time::{Date, OffsetDateTime};
use turnover_domain::{
    DomainError, NotificationType, Role, UnavailabilityRequest, UnavailabilityStatus,
};

use crate::tests::helpers::{ADMIN_ID, OPERATOR_ID, OTHER_OPERATOR_ID, admin, operator, owner};
use crate::{
    CoreError, ShiftActor, ShiftPolicy, UnavailabilityOutcome, authorize_withdrawal,
    review_unavailability, submit_unavailability, unavailability_scope,
};

const NOW: OffsetDateTime = datetime!(2026-03-01 23:30 UTC);
const ADMINS: [i64; 2] = [ADMIN_ID, 7];

fn submit(dates: Vec<Date>, policy: &ShiftPolicy) -> Result<UnavailabilityOutcome, CoreError> {
    submit_unavailability(operator(), "Otto", dates, Some("family"), &ADMINS, NOW, policy)
}

fn pending() -> UnavailabilityRequest {
    submit(vec![date!(2026 - 03 - 10)], &ShiftPolicy::default())
        .unwrap()
        .request
        .with_id(5)
}

#[test]
fn test_submission_notifies_every_admin() {
    let outcome: UnavailabilityOutcome = submit(
        vec![date!(2026 - 03 - 10), date!(2026 - 03 - 11)],
        &ShiftPolicy::default(),
    )
    .unwrap();

    assert_eq!(outcome.request.operator_id, OPERATOR_ID);
    let recipients: Vec<i64> = outcome.notifications.iter().map(|n| n.user_id).collect();
    assert_eq!(recipients, vec![ADMIN_ID, 7]);
    assert_eq!(
        outcome.notifications[0].notification_type,
        NotificationType::UnavailabilityRequest
    );
    assert_eq!(
        outcome.notifications[0].message,
        "Otto has requested to be unavailable for 2 days"
    );
}

#[test]
fn test_today_is_judged_in_the_policy_zone() {
    // 23:30 UTC on March 1st is already March 2nd in Zagreb
    let zoned: ShiftPolicy = ShiftPolicy::default().with_timezone(Tz::Europe__Zagreb);

    assert!(submit(vec![date!(2026 - 03 - 01)], &ShiftPolicy::default()).is_ok());
    assert_eq!(
        submit(vec![date!(2026 - 03 - 01)], &zoned),
        Err(CoreError::DomainViolation(DomainError::PastDateRequested {
            date: date!(2026 - 03 - 01)
        }))
    );
}

#[test]
fn test_only_operators_submit() {
    let result = submit_unavailability(
        admin(),
        "Ada",
        vec![date!(2026 - 03 - 10)],
        None,
        &ADMINS,
        NOW,
        &ShiftPolicy::default(),
    );
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(DomainError::Forbidden { .. }))
    ));
}

#[test]
fn test_review_notifies_the_operator() {
    let outcome: UnavailabilityOutcome =
        review_unavailability(admin(), pending(), false, NOW).unwrap();

    assert_eq!(outcome.request.status, UnavailabilityStatus::Rejected);
    assert_eq!(outcome.request.reviewed_by, Some(ADMIN_ID));
    assert_eq!(outcome.notifications.len(), 1);
    assert_eq!(outcome.notifications[0].user_id, OPERATOR_ID);
    assert_eq!(
        outcome.notifications[0].title,
        "Unavailability Request Rejected"
    );
}

#[test]
fn test_non_admin_cannot_review() {
    let result = review_unavailability(operator(), pending(), true, NOW);
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(DomainError::Forbidden { .. }))
    ));
}

#[test]
fn test_withdrawal_rules() {
    let request: UnavailabilityRequest = pending();
    let other: ShiftActor = ShiftActor::new(OTHER_OPERATOR_ID, Role::Operator);

    assert!(authorize_withdrawal(operator(), &request).is_ok());
    assert!(authorize_withdrawal(admin(), &request).is_ok());
    assert!(authorize_withdrawal(other, &request).is_err());

    let reviewed: UnavailabilityRequest = review_unavailability(admin(), request, true, NOW)
        .unwrap()
        .request;
    assert!(matches!(
        authorize_withdrawal(operator(), &reviewed),
        Err(CoreError::DomainViolation(
            DomainError::UnavailabilityAlreadyReviewed { .. }
        ))
    ));
}

#[test]
fn test_listing_scope_by_role() {
    assert_eq!(unavailability_scope(operator(), Some(9)), Ok(Some(OPERATOR_ID)));
    assert_eq!(unavailability_scope(admin(), None), Ok(None));
    assert_eq!(unavailability_scope(admin(), Some(9)), Ok(Some(9)));
    assert!(unavailability_scope(owner(), None).is_err());
}

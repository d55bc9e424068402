// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::Date;
use time::macros::date;
use turnover_domain::{UnavailabilityRequest, UnavailabilityStatus};

use super::{Fixture, NOW, create_fixture};
use crate::PersistenceError;

fn store(fixture: &mut Fixture, operator_id: i64, dates: Vec<Date>) -> i64 {
    let request: UnavailabilityRequest =
        UnavailabilityRequest::open(operator_id, dates, Some("holiday"), date!(2026 - 03 - 01), NOW)
            .unwrap();
    fixture.persistence.insert_unavailability(&request).unwrap()
}

#[test]
fn test_request_round_trips_with_its_days() {
    let mut fixture: Fixture = create_fixture();
    let operator_id: i64 = fixture.operator_id;
    let request_id: i64 = store(
        &mut fixture,
        operator_id,
        vec![date!(2026 - 03 - 12), date!(2026 - 03 - 10)],
    );

    let stored: UnavailabilityRequest = fixture
        .persistence
        .get_unavailability(request_id)
        .unwrap()
        .unwrap();

    assert_eq!(stored.request_id, Some(request_id));
    assert_eq!(stored.dates, vec![date!(2026 - 03 - 10), date!(2026 - 03 - 12)]);
    assert_eq!(stored.reason.as_deref(), Some("holiday"));
    assert_eq!(stored.status, UnavailabilityStatus::Pending);
    assert_eq!(stored.created_at, NOW);
}

#[test]
fn test_only_approved_days_make_operators_unavailable() {
    let mut fixture: Fixture = create_fixture();
    let (operator_id, other_operator_id) = (fixture.operator_id, fixture.other_operator_id);
    let approved: i64 = store(&mut fixture, operator_id, vec![date!(2026 - 03 - 10)]);
    store(&mut fixture, other_operator_id, vec![date!(2026 - 03 - 10)]);

    assert!(fixture
        .persistence
        .unavailable_operator_ids(date!(2026 - 03 - 10))
        .unwrap()
        .is_empty());

    let mut request: UnavailabilityRequest =
        fixture.persistence.get_unavailability(approved).unwrap().unwrap();
    request.review(true, fixture.admin_id, NOW).unwrap();
    fixture.persistence.save_unavailability_review(&request).unwrap();

    assert_eq!(
        fixture
            .persistence
            .unavailable_operator_ids(date!(2026 - 03 - 10))
            .unwrap(),
        vec![operator_id]
    );
    assert!(fixture
        .persistence
        .unavailable_operator_ids(date!(2026 - 03 - 11))
        .unwrap()
        .is_empty());

    let reviewed: UnavailabilityRequest =
        fixture.persistence.get_unavailability(approved).unwrap().unwrap();
    assert_eq!(reviewed.reviewed_by, Some(fixture.admin_id));
    assert_eq!(reviewed.reviewed_at, Some(NOW));
}

#[test]
fn test_listing_filters_by_operator_and_status() {
    let mut fixture: Fixture = create_fixture();
    let (operator_id, other_operator_id) = (fixture.operator_id, fixture.other_operator_id);
    store(&mut fixture, operator_id, vec![date!(2026 - 03 - 10)]);
    let second: i64 = store(&mut fixture, operator_id, vec![date!(2026 - 03 - 20)]);
    store(&mut fixture, other_operator_id, vec![date!(2026 - 03 - 10)]);

    let mine: Vec<UnavailabilityRequest> = fixture
        .persistence
        .list_unavailability(Some(operator_id), None)
        .unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].request_id, Some(second));

    assert_eq!(
        fixture
            .persistence
            .list_unavailability(None, Some(UnavailabilityStatus::Pending))
            .unwrap()
            .len(),
        3
    );
    assert!(fixture
        .persistence
        .list_unavailability(None, Some(UnavailabilityStatus::Approved))
        .unwrap()
        .is_empty());
}

#[test]
fn test_withdrawn_request_takes_its_days_along() {
    let mut fixture: Fixture = create_fixture();
    let operator_id: i64 = fixture.operator_id;
    let request_id: i64 = store(&mut fixture, operator_id, vec![date!(2026 - 03 - 10)]);

    fixture.persistence.delete_unavailability(request_id).unwrap();

    assert_eq!(fixture.persistence.get_unavailability(request_id).unwrap(), None);
    assert!(matches!(
        fixture.persistence.delete_unavailability(request_id),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn test_request_for_unknown_operator_is_refused() {
    let mut fixture: Fixture = create_fixture();
    let request: UnavailabilityRequest =
        UnavailabilityRequest::open(404, vec![date!(2026 - 03 - 10)], None, date!(2026 - 03 - 01), NOW)
            .unwrap();

    assert!(fixture.persistence.insert_unavailability(&request).is_err());
    assert!(fixture
        .persistence
        .list_unavailability(None, None)
        .unwrap()
        .is_empty());
}

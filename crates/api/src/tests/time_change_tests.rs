// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::macros::datetime;

use super::helpers::{SHIFT_DAY, TestEnv, create_test_env};
use crate::{
    ApiError, AuthenticatedActor, OpenTimeChangeRequest, RespondTimeChangeRequest,
    ReviewTimeChangeRequest, ShiftInfo, ShiftMutationResponse, TimeChangeInfo,
    TimeChangeResponse, get_shift, get_time_change, open_time_change, respond_time_change,
    review_time_change,
};

fn propose_start(start: &str) -> OpenTimeChangeRequest {
    OpenTimeChangeRequest {
        scheduled_start_time: Some(start.to_string()),
        reason: Some(String::from("Guests leave late")),
        ..OpenTimeChangeRequest::default()
    }
}

fn propose_date(date: &str) -> OpenTimeChangeRequest {
    OpenTimeChangeRequest {
        scheduled_date: Some(date.to_string()),
        ..OpenTimeChangeRequest::default()
    }
}

fn review(
    env: &mut TestEnv,
    shift_id: i64,
    approve: bool,
) -> Result<ShiftMutationResponse, ApiError> {
    let owner: AuthenticatedActor = env.owner;
    review_time_change(
        &mut env.context(),
        shift_id,
        ReviewTimeChangeRequest { approve },
        &owner,
    )
}

fn respond(
    env: &mut TestEnv,
    shift_id: i64,
    confirm: bool,
) -> Result<ShiftMutationResponse, ApiError> {
    let operator: AuthenticatedActor = env.operator;
    respond_time_change(
        &mut env.context(),
        shift_id,
        RespondTimeChangeRequest { confirm },
        &operator,
    )
}

fn current_shift(env: &mut TestEnv, shift_id: i64) -> ShiftInfo {
    let admin: AuthenticatedActor = env.admin;
    get_shift(&mut env.context(), shift_id, &admin).unwrap().shift
}

#[test]
fn test_operator_request_applied_on_owner_approval() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let operator: AuthenticatedActor = env.operator;
    let owner: AuthenticatedActor = env.owner;

    let opened: ShiftMutationResponse =
        open_time_change(&mut env.context(), shift_id, &propose_start("13:00"), &operator)
            .unwrap();
    let request: TimeChangeInfo = opened.time_change_request.unwrap();
    assert_eq!(request.initiator, "operator");
    assert_eq!(request.status, "pending");
    assert_eq!(request.reason.as_deref(), Some("Guests leave late"));
    assert!(request.request_id.is_some());
    assert_eq!(env.inbox_types(&owner), vec!["time_change_request"]);
    // Nothing moves until the owner answers.
    assert_eq!(current_shift(&mut env, shift_id).scheduled_start_time, "11:00");

    let approved: ShiftMutationResponse = review(&mut env, shift_id, true).unwrap();
    let closed: TimeChangeInfo = approved.time_change_request.unwrap();
    assert_eq!(closed.status, "approved");
    assert!(closed.closed_at.is_some());

    let shift: ShiftInfo = approved.shift.unwrap();
    assert_eq!(shift.scheduled_start_time, "13:00");
    assert!(shift.time_change_request.is_none());
    assert_eq!(env.inbox_types(&operator)[0], "time_change_approved");
}

#[test]
fn test_owner_rejection_closes_request_and_keeps_shift() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let operator: AuthenticatedActor = env.operator;

    open_time_change(&mut env.context(), shift_id, &propose_start("13:00"), &operator).unwrap();
    let rejected: ShiftMutationResponse = review(&mut env, shift_id, false).unwrap();

    assert_eq!(rejected.shift.unwrap().scheduled_start_time, "11:00");
    assert_eq!(env.inbox_types(&operator)[0], "time_change_rejected");

    let history: TimeChangeResponse =
        get_time_change(&mut env.persistence, shift_id, &operator).unwrap();
    assert!(history.live.is_none());
    assert_eq!(history.history.len(), 1);
    assert_eq!(history.history[0].status, "rejected");

    // A closed request frees the shift for a new one.
    assert!(
        open_time_change(&mut env.context(), shift_id, &propose_start("14:00"), &operator).is_ok()
    );
}

#[test]
fn test_admin_request_applied_on_operator_confirmation() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let admin: AuthenticatedActor = env.admin;
    let operator: AuthenticatedActor = env.operator;

    open_time_change(&mut env.context(), shift_id, &propose_date("2026-03-11"), &admin).unwrap();
    assert_eq!(
        env.inbox_types(&operator)[0],
        "time_change_requested_by_admin"
    );

    let confirmed: ShiftMutationResponse = respond(&mut env, shift_id, true).unwrap();
    let request: TimeChangeInfo = confirmed.time_change_request.unwrap();
    assert_eq!(request.operator_confirmed, Some(true));
    assert!(request.operator_confirmed_at.is_some());
    assert!(request.closed_at.is_some());
    assert_eq!(confirmed.shift.unwrap().scheduled_date, "2026-03-11");
    assert_eq!(
        env.inbox_types(&admin),
        vec!["time_change_confirmed_by_operator"]
    );
}

#[test]
fn test_owner_approval_of_admin_request_is_only_recorded() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let admin: AuthenticatedActor = env.admin;

    open_time_change(&mut env.context(), shift_id, &propose_date("2026-03-11"), &admin).unwrap();

    let recorded: ShiftMutationResponse = review(&mut env, shift_id, true).unwrap();
    let shift: ShiftInfo = recorded.shift.unwrap();
    assert_eq!(shift.scheduled_date, SHIFT_DAY);
    let live: TimeChangeInfo = shift.time_change_request.unwrap();
    assert_eq!(live.status, "approved");
    assert!(live.closed_at.is_none());

    // The operator still decides.
    let confirmed: ShiftMutationResponse = respond(&mut env, shift_id, true).unwrap();
    assert_eq!(confirmed.shift.unwrap().scheduled_date, "2026-03-11");

    // A second owner review finds nothing open.
    let err: ApiError = review(&mut env, shift_id, true).unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound { .. }), "{err:?}");
}

#[test]
fn test_operator_decline_closes_admin_request() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let admin: AuthenticatedActor = env.admin;

    open_time_change(&mut env.context(), shift_id, &propose_date("2026-03-11"), &admin).unwrap();
    let declined: ShiftMutationResponse = respond(&mut env, shift_id, false).unwrap();

    let request: TimeChangeInfo = declined.time_change_request.unwrap();
    assert_eq!(request.operator_confirmed, Some(false));
    assert!(request.closed_at.is_some());
    assert_eq!(declined.shift.unwrap().scheduled_date, SHIFT_DAY);
    assert_eq!(env.inbox_types(&admin), vec!["time_change_rejected"]);
}

#[test]
fn test_one_live_request_per_shift() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let operator: AuthenticatedActor = env.operator;
    let admin: AuthenticatedActor = env.admin;

    open_time_change(&mut env.context(), shift_id, &propose_start("13:00"), &operator).unwrap();
    let err: ApiError =
        open_time_change(&mut env.context(), shift_id, &propose_date("2026-03-12"), &admin)
            .unwrap_err();
    assert!(
        matches!(err, ApiError::SchedulingConflict { ref rule, .. } if rule == "one_live_time_change_request"),
        "{err:?}"
    );
}

#[test]
fn test_requests_close_an_hour_before_start() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let operator: AuthenticatedActor = env.operator;
    env.set_now(datetime!(2026-03-10 10:30 UTC));

    let err: ApiError =
        open_time_change(&mut env.context(), shift_id, &propose_start("13:00"), &operator)
            .unwrap_err();
    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "time_change_request_window"),
        "{err:?}"
    );
}

#[test]
fn test_operator_cannot_confirm_own_request() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let operator: AuthenticatedActor = env.operator;

    open_time_change(&mut env.context(), shift_id, &propose_start("13:00"), &operator).unwrap();
    let err: ApiError = respond(&mut env, shift_id, true).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");
}

#[test]
fn test_only_admins_request_reassignment() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let owner: AuthenticatedActor = env.owner;
    let request: OpenTimeChangeRequest = OpenTimeChangeRequest {
        operator_id: Some(env.other_operator.user_id),
        ..OpenTimeChangeRequest::default()
    };

    let err: ApiError =
        open_time_change(&mut env.context(), shift_id, &request, &owner).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");
}

#[test]
fn test_confirmation_revalidates_and_keeps_request_pending() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let admin: AuthenticatedActor = env.admin;
    let operator: AuthenticatedActor = env.operator;
    let other_id: i64 = env.other_operator.user_id;

    let reassign: OpenTimeChangeRequest = OpenTimeChangeRequest {
        operator_id: Some(other_id),
        ..OpenTimeChangeRequest::default()
    };
    open_time_change(&mut env.context(), shift_id, &reassign, &admin).unwrap();

    // The proposed operator fills up while the request waits.
    for (name, start) in [("Lighthouse 1", "08:00"), ("Dune 4", "13:00"), ("Pier 9", "16:00")] {
        let apartment_id: i64 = env.add_apartment(name);
        env.schedule(apartment_id, other_id, SHIFT_DAY, start);
    }

    let err: ApiError = respond(&mut env, shift_id, true).unwrap_err();
    assert!(
        matches!(err, ApiError::SchedulingConflict { ref rule, .. } if rule == "operator_daily_limit"),
        "{err:?}"
    );

    let state: TimeChangeResponse =
        get_time_change(&mut env.persistence, shift_id, &operator).unwrap();
    let live: TimeChangeInfo = state.live.unwrap();
    assert_eq!(live.status, "pending");
    assert_eq!(live.operator_confirmed, None);
    assert_eq!(current_shift(&mut env, shift_id).operator_id, operator.user_id);
}

#[test]
fn test_review_without_live_request() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();

    let err: ApiError = review(&mut env, shift_id, true).unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound { .. }), "{err:?}");
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::macros::datetime;
use turnover_domain::{DomainError, Role, User};
use turnover_persistence::SqlitePersistence;

use super::helpers::{NOW, SHIFT_DAY, TestEnv, create_test_env};
use crate::{
    ApiError, AuthError, AuthenticatedActor, AuthenticationService, CreateApartmentRequest,
    CreateUserRequest, ListApartmentsResponse, ListAuditEventsResponse, ListShiftsRequest,
    ListShiftsResponse, ListUsersResponse, ShiftCapabilitiesInfo, ShiftDetailResponse, UserInfo,
    WhoAmIResponse, create_apartment, create_user, get_shift, get_shift_capabilities,
    list_apartments, list_shift_audit_events, list_shifts, list_users, translate_domain_error,
    whoami,
};

fn march() -> ListShiftsRequest {
    ListShiftsRequest {
        from: String::from("2026-03-01"),
        to: String::from("2026-03-31"),
        apartment_id: None,
    }
}

fn listed_ids(env: &mut TestEnv, actor: &AuthenticatedActor) -> Vec<i64> {
    let response: ListShiftsResponse = list_shifts(&mut env.persistence, &march(), actor).unwrap();
    response.shifts.iter().map(|shift| shift.shift_id).collect()
}

// ============================================================================
// Shift visibility
// ============================================================================

#[test]
fn test_shift_visibility_by_role() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();

    for actor in [env.admin, env.owner, env.operator, env.viewer] {
        assert!(
            get_shift(&mut env.context(), shift_id, &actor).is_ok(),
            "{actor:?} should see the shift"
        );
    }
    for actor in [env.other_owner, env.other_operator] {
        let err: ApiError = get_shift(&mut env.context(), shift_id, &actor).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");
    }
}

#[test]
fn test_missing_shift_is_not_found() {
    let mut env: TestEnv = create_test_env();
    let admin: AuthenticatedActor = env.admin;

    let err: ApiError = get_shift(&mut env.context(), 999, &admin).unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound { .. }), "{err:?}");
}

#[test]
fn test_list_shifts_scoped_by_role() {
    let mut env: TestEnv = create_test_env();
    let first: i64 = env.schedule_default();
    let second_apartment: i64 = env.second_apartment_id;
    let bea: i64 = env.other_operator.user_id;
    let second: i64 = env
        .schedule(second_apartment, bea, SHIFT_DAY, "14:00")
        .shift
        .unwrap()
        .shift_id;

    let admin: AuthenticatedActor = env.admin;
    let viewer: AuthenticatedActor = env.viewer;
    let owner: AuthenticatedActor = env.owner;
    let other_owner: AuthenticatedActor = env.other_owner;
    let operator: AuthenticatedActor = env.operator;
    let other_operator: AuthenticatedActor = env.other_operator;

    assert_eq!(listed_ids(&mut env, &admin), vec![first, second]);
    assert_eq!(listed_ids(&mut env, &viewer), vec![first, second]);
    assert_eq!(listed_ids(&mut env, &owner), vec![first, second]);
    assert!(listed_ids(&mut env, &other_owner).is_empty());
    assert_eq!(listed_ids(&mut env, &operator), vec![first]);
    assert_eq!(listed_ids(&mut env, &other_operator), vec![second]);
}

#[test]
fn test_list_shifts_apartment_filter() {
    let mut env: TestEnv = create_test_env();
    env.schedule_default();
    let second_apartment: i64 = env.second_apartment_id;
    let bea: i64 = env.other_operator.user_id;
    let second: i64 = env
        .schedule(second_apartment, bea, SHIFT_DAY, "14:00")
        .shift
        .unwrap()
        .shift_id;
    let admin: AuthenticatedActor = env.admin;
    let other_owner: AuthenticatedActor = env.other_owner;

    let request: ListShiftsRequest = ListShiftsRequest {
        apartment_id: Some(second_apartment),
        ..march()
    };
    let response: ListShiftsResponse =
        list_shifts(&mut env.persistence, &request, &admin).unwrap();
    assert_eq!(response.shifts.len(), 1);
    assert_eq!(response.shifts[0].shift_id, second);

    let err: ApiError = list_shifts(&mut env.persistence, &request, &other_owner).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");
}

#[test]
fn test_list_shifts_rejects_inverted_range() {
    let mut env: TestEnv = create_test_env();
    let admin: AuthenticatedActor = env.admin;
    let request: ListShiftsRequest = ListShiftsRequest {
        from: String::from("2026-03-31"),
        to: String::from("2026-03-01"),
        apartment_id: None,
    };

    let err: ApiError = list_shifts(&mut env.persistence, &request, &admin).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput { .. }), "{err:?}");
}

// ============================================================================
// Directory
// ============================================================================

#[test]
fn test_first_user_must_be_admin() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let request: CreateUserRequest = CreateUserRequest {
        role: String::from("owner"),
        name: String::from("Olga Owner"),
        email: String::from("olga@example.com"),
    };

    let err: ApiError = create_user(&mut persistence, &request, None, NOW).unwrap_err();
    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "first_user_is_admin"),
        "{err:?}"
    );
}

#[test]
fn test_later_users_need_an_admin() {
    let mut env: TestEnv = create_test_env();
    let owner: AuthenticatedActor = env.owner;
    let request: CreateUserRequest = CreateUserRequest {
        role: String::from("operator"),
        name: String::from("Nia New"),
        email: String::from("nia@example.com"),
    };

    let err: ApiError = create_user(&mut env.persistence, &request, None, NOW).unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationFailed { .. }), "{err:?}");

    let err: ApiError =
        create_user(&mut env.persistence, &request, Some(&owner), NOW).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");
}

#[test]
fn test_user_input_validation() {
    let mut env: TestEnv = create_test_env();
    let admin: AuthenticatedActor = env.admin;

    let duplicate: CreateUserRequest = CreateUserRequest {
        role: String::from("operator"),
        name: String::from("Otto Again"),
        email: String::from("OTTO@example.com"),
    };
    let err: ApiError =
        create_user(&mut env.persistence, &duplicate, Some(&admin), NOW).unwrap_err();
    assert!(
        matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "unique_email"),
        "{err:?}"
    );

    let no_at: CreateUserRequest = CreateUserRequest {
        email: String::from("nobody"),
        ..duplicate.clone()
    };
    let err: ApiError = create_user(&mut env.persistence, &no_at, Some(&admin), NOW).unwrap_err();
    assert!(
        matches!(err, ApiError::InvalidInput { ref field, .. } if field == "email"),
        "{err:?}"
    );

    let bad_role: CreateUserRequest = CreateUserRequest {
        role: String::from("janitor"),
        email: String::from("jan@example.com"),
        ..duplicate
    };
    let err: ApiError =
        create_user(&mut env.persistence, &bad_role, Some(&admin), NOW).unwrap_err();
    assert!(
        matches!(err, ApiError::InvalidInput { ref field, .. } if field == "role"),
        "{err:?}"
    );
}

#[test]
fn test_list_users_admin_only() {
    let mut env: TestEnv = create_test_env();
    let admin: AuthenticatedActor = env.admin;
    let viewer: AuthenticatedActor = env.viewer;

    let users: ListUsersResponse = list_users(&mut env.persistence, &admin).unwrap();
    assert_eq!(users.users.len(), 6);

    let err: ApiError = list_users(&mut env.persistence, &viewer).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");
}

#[test]
fn test_apartment_owner_must_hold_owner_role() {
    let mut env: TestEnv = create_test_env();
    let admin: AuthenticatedActor = env.admin;
    let request: CreateApartmentRequest = CreateApartmentRequest {
        name: String::from("Attic 1"),
        owner_id: env.operator.user_id,
    };

    let err: ApiError = create_apartment(&mut env.persistence, &request, &admin).unwrap_err();
    assert!(
        matches!(err, ApiError::InvalidInput { ref field, .. } if field == "owner_id"),
        "{err:?}"
    );
}

#[test]
fn test_list_apartments_by_role() {
    let mut env: TestEnv = create_test_env();
    let admin: AuthenticatedActor = env.admin;
    let owner: AuthenticatedActor = env.owner;
    let other_owner: AuthenticatedActor = env.other_owner;
    let operator: AuthenticatedActor = env.operator;

    let all: ListApartmentsResponse = list_apartments(&mut env.persistence, &admin).unwrap();
    assert_eq!(all.apartments.len(), 2);
    let own: ListApartmentsResponse = list_apartments(&mut env.persistence, &owner).unwrap();
    assert_eq!(own.apartments.len(), 2);
    let none: ListApartmentsResponse =
        list_apartments(&mut env.persistence, &other_owner).unwrap();
    assert!(none.apartments.is_empty());

    let err: ApiError = list_apartments(&mut env.persistence, &operator).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");
}

#[test]
fn test_authenticate_and_whoami() {
    let mut env: TestEnv = create_test_env();
    let owner_id: i64 = env.owner.user_id;

    let (actor, user): (AuthenticatedActor, User) =
        AuthenticationService::authenticate(&mut env.persistence, owner_id).unwrap();
    assert_eq!(actor.role, Role::Owner);

    let me: WhoAmIResponse = whoami(&actor, &user);
    assert_eq!(me.user.name, "Olga Owner");
    assert!(me.capabilities.can_submit_schedule);
    assert!(!me.capabilities.can_create_shift);

    let err: AuthError =
        AuthenticationService::authenticate(&mut env.persistence, 4242).unwrap_err();
    assert!(matches!(err, AuthError::AuthenticationFailed { .. }), "{err:?}");
    assert!(matches!(
        ApiError::from(err),
        ApiError::AuthenticationFailed { .. }
    ));
}

// ============================================================================
// Audit access
// ============================================================================

#[test]
fn test_audit_visible_to_admin_and_owner_only() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let owner: AuthenticatedActor = env.owner;
    let operator: AuthenticatedActor = env.operator;
    let other_owner: AuthenticatedActor = env.other_owner;

    let trail: ListAuditEventsResponse =
        list_shift_audit_events(&mut env.persistence, shift_id, &owner).unwrap();
    assert_eq!(trail.events.len(), 1);

    for actor in [operator, other_owner] {
        let err: ApiError =
            list_shift_audit_events(&mut env.persistence, shift_id, &actor).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");
    }
}

// ============================================================================
// Capabilities
// ============================================================================

fn admin_capabilities(env: &mut TestEnv, shift_id: i64) -> ShiftCapabilitiesInfo {
    let admin: AuthenticatedActor = env.admin;
    get_shift_capabilities(&mut env.context(), shift_id, &admin).unwrap()
}

#[test]
fn test_admin_edit_modes_follow_lead_time() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();

    let early: ShiftCapabilitiesInfo = admin_capabilities(&mut env, shift_id);
    assert_eq!(early.edit_schedule, "direct");
    assert_eq!(early.reassign_operator, "direct");

    env.set_now(datetime!(2026-03-09 20:00 UTC));
    let evening_before: ShiftCapabilitiesInfo = admin_capabilities(&mut env, shift_id);
    assert_eq!(evening_before.edit_schedule, "request");
    assert_eq!(evening_before.reassign_operator, "direct");

    env.set_now(datetime!(2026-03-10 05:00 UTC));
    let same_morning: ShiftCapabilitiesInfo = admin_capabilities(&mut env, shift_id);
    assert_eq!(same_morning.edit_schedule, "request");
    assert_eq!(same_morning.reassign_operator, "request");
}

#[test]
fn test_participant_capabilities() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let owner: AuthenticatedActor = env.owner;
    let operator: AuthenticatedActor = env.operator;

    let detail: ShiftDetailResponse = get_shift(&mut env.context(), shift_id, &owner).unwrap();
    assert!(detail.capabilities.edit_guest_count);
    assert_eq!(detail.capabilities.edit_schedule, "denied");
    assert!(!detail.capabilities.delete);
    assert!(detail.capabilities.request_time_change);

    let before: ShiftCapabilitiesInfo =
        get_shift_capabilities(&mut env.context(), shift_id, &operator).unwrap();
    assert!(!before.start);
    assert!(before.comment);

    env.set_now(datetime!(2026-03-10 11:00 UTC));
    let at_start: ShiftCapabilitiesInfo =
        get_shift_capabilities(&mut env.context(), shift_id, &operator).unwrap();
    assert!(at_start.start);
    assert!(!at_start.finish);
    assert!(!at_start.request_time_change);
}

// ============================================================================
// Error mapping
// ============================================================================

#[test]
fn test_domain_errors_map_to_api_categories() {
    let conflict: ApiError = translate_domain_error(DomainError::ShiftAlreadyStarted);
    assert!(
        matches!(conflict, ApiError::DomainRuleViolation { ref rule, .. } if rule == "shift_already_started")
    );

    let missing: ApiError = translate_domain_error(DomainError::ShiftNotFound(7));
    assert!(matches!(missing, ApiError::ResourceNotFound { .. }));

    let input: ApiError = translate_domain_error(DomainError::InvalidMonth(13));
    assert!(matches!(input, ApiError::InvalidInput { ref field, .. } if field == "month"));

    let denied: ApiError = translate_domain_error(DomainError::Forbidden {
        field: String::from("guest_count"),
        reason: String::from("the shift has started"),
    });
    assert!(matches!(denied, ApiError::Forbidden { .. }));
    assert!(denied.to_string().contains("guest_count"));
}

#[test]
fn test_unregistered_user_cannot_create_apartment() {
    let mut env: TestEnv = create_test_env();
    let admin: AuthenticatedActor = env.admin;
    let request: CreateApartmentRequest = CreateApartmentRequest {
        name: String::from("Ghost House"),
        owner_id: 4242,
    };

    let err: ApiError = create_apartment(&mut env.persistence, &request, &admin).unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound { .. }), "{err:?}");

    // The directory is unchanged.
    let info: Vec<UserInfo> = list_users(&mut env.persistence, &admin).unwrap().users;
    assert!(info.iter().all(|user| user.user_id != 4242));
}

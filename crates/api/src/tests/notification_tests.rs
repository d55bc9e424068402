// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{SHIFT_DAY, TestEnv, create_test_env, shift_request};
use crate::{
    AddCommentRequest, AddInstructionPhotoRequest, ApiContext, ApiError, AuthenticatedActor,
    CreateShiftRequest, DeliveryResult, GatewayError, ListNotificationsResponse, MarkReadResponse,
    NotificationGateway, PushMessage, ReportProblemRequest, ShiftDetailResponse,
    ShiftMutationResponse, add_comment, add_instruction_photo, create_shift, delete_comment,
    get_shift, mark_all_notifications_read, mark_notification_read, report_problem,
};

/// A channel that is always down.
struct UnreachableGateway;

impl NotificationGateway for UnreachableGateway {
    fn push(&self, _message: &PushMessage) -> Result<DeliveryResult, GatewayError> {
        Err(GatewayError::Timeout { millis: 500 })
    }
}

fn comment(text: &str) -> AddCommentRequest {
    AddCommentRequest {
        text: text.to_string(),
    }
}

#[test]
fn test_delivery_failure_does_not_fail_mutation() {
    let mut env: TestEnv = create_test_env();
    let admin: AuthenticatedActor = env.admin;
    let operator: AuthenticatedActor = env.operator;
    let gateway: UnreachableGateway = UnreachableGateway;

    let request: CreateShiftRequest =
        shift_request(env.apartment_id, operator.user_id, "2026-03-10", "11:00");
    let response: ShiftMutationResponse = {
        let mut context: ApiContext<'_> = ApiContext {
            persistence: &mut env.persistence,
            gateway: &gateway,
            clock: &env.clock,
            policy: &env.policy,
        };
        create_shift(&mut context, &request, &admin).unwrap()
    };

    assert!(response.shift.is_some());
    assert_eq!(response.notifications_created, 1);
    // The stored notification is still there for the inbox.
    assert_eq!(env.inbox_types(&operator), vec!["shift_assigned"]);
}

#[test]
fn test_inbox_is_newest_first_with_unread_count() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let owner: AuthenticatedActor = env.owner;
    let operator: AuthenticatedActor = env.operator;

    add_comment(&mut env.context(), shift_id, &comment("Key is under the mat"), &owner).unwrap();

    let inbox: ListNotificationsResponse = env.inbox(&operator);
    assert_eq!(inbox.unread_count, 2);
    let types: Vec<&str> = inbox
        .notifications
        .iter()
        .map(|n| n.notification_type.as_str())
        .collect();
    assert_eq!(types, vec!["comment_added", "shift_assigned"]);
    assert!(inbox.notifications.iter().all(|n| !n.read));
    assert_eq!(inbox.notifications[0].related_shift_id, Some(shift_id));
}

#[test]
fn test_mark_read_only_touches_own_notifications() {
    let mut env: TestEnv = create_test_env();
    env.schedule_default();
    let operator: AuthenticatedActor = env.operator;
    let other_operator: AuthenticatedActor = env.other_operator;

    let notification_id: i64 = env.inbox(&operator).notifications[0]
        .notification_id
        .unwrap();

    let err: ApiError =
        mark_notification_read(&mut env.persistence, &other_operator, notification_id)
            .unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound { .. }), "{err:?}");

    let marked: MarkReadResponse =
        mark_notification_read(&mut env.persistence, &operator, notification_id).unwrap();
    assert_eq!(marked.updated, 1);

    let inbox: ListNotificationsResponse = env.inbox(&operator);
    assert_eq!(inbox.unread_count, 0);
    assert!(inbox.notifications[0].read);
}

#[test]
fn test_mark_all_read() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let owner: AuthenticatedActor = env.owner;
    let operator: AuthenticatedActor = env.operator;

    add_comment(&mut env.context(), shift_id, &comment("Towels in the hall"), &owner).unwrap();

    let marked: MarkReadResponse =
        mark_all_notifications_read(&mut env.persistence, &operator).unwrap();
    assert_eq!(marked.updated, 2);
    assert_eq!(env.inbox(&operator).unread_count, 0);

    let again: MarkReadResponse =
        mark_all_notifications_read(&mut env.persistence, &operator).unwrap();
    assert_eq!(again.updated, 0);
}

#[test]
fn test_operator_comment_goes_to_owner() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let owner: AuthenticatedActor = env.owner;
    let operator: AuthenticatedActor = env.operator;
    let admin: AuthenticatedActor = env.admin;

    let response: ShiftMutationResponse =
        add_comment(&mut env.context(), shift_id, &comment("Done early"), &operator).unwrap();
    assert!(response.attachment_id.is_some());
    assert_eq!(env.inbox_types(&owner), vec!["comment_added"]);

    let detail: ShiftDetailResponse = get_shift(&mut env.context(), shift_id, &admin).unwrap();
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].text, "Done early");
    assert_eq!(detail.comments[0].author_id, operator.user_id);
}

#[test]
fn test_outsiders_cannot_comment() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let other_owner: AuthenticatedActor = env.other_owner;

    let err: ApiError =
        add_comment(&mut env.context(), shift_id, &comment("Hello"), &other_owner).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");

    let owner: AuthenticatedActor = env.owner;
    let err: ApiError =
        add_comment(&mut env.context(), shift_id, &comment("   "), &owner).unwrap_err();
    assert!(
        matches!(err, ApiError::InvalidInput { ref field, .. } if field == "text"),
        "{err:?}"
    );
}

#[test]
fn test_comments_are_deleted_by_author_or_admin() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let owner: AuthenticatedActor = env.owner;
    let operator: AuthenticatedActor = env.operator;
    let admin: AuthenticatedActor = env.admin;

    let from_operator: i64 =
        add_comment(&mut env.context(), shift_id, &comment("Done early"), &operator)
            .unwrap()
            .attachment_id
            .unwrap();
    let from_owner: i64 =
        add_comment(&mut env.context(), shift_id, &comment("Key is under the mat"), &owner)
            .unwrap()
            .attachment_id
            .unwrap();

    let err: ApiError =
        delete_comment(&mut env.context(), shift_id, from_operator, &owner).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");

    delete_comment(&mut env.context(), shift_id, from_operator, &operator).unwrap();
    delete_comment(&mut env.context(), shift_id, from_owner, &admin).unwrap();

    let detail: ShiftDetailResponse = get_shift(&mut env.context(), shift_id, &admin).unwrap();
    assert!(detail.comments.is_empty());

    let err: ApiError =
        delete_comment(&mut env.context(), shift_id, from_operator, &admin).unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound { .. }), "{err:?}");
}

#[test]
fn test_comment_is_only_found_under_its_own_shift() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let second_apartment: i64 = env.second_apartment_id;
    let operator_id: i64 = env.operator.user_id;
    let other_shift: i64 = env
        .schedule(second_apartment, operator_id, SHIFT_DAY, "15:00")
        .shift
        .unwrap()
        .shift_id;
    let admin: AuthenticatedActor = env.admin;

    let comment_id: i64 = add_comment(&mut env.context(), shift_id, &comment("Towels"), &admin)
        .unwrap()
        .attachment_id
        .unwrap();

    let err: ApiError =
        delete_comment(&mut env.context(), other_shift, comment_id, &admin).unwrap_err();
    assert!(
        matches!(
            err,
            ApiError::ResourceNotFound { ref resource_type, .. } if resource_type == "Comment"
        ),
        "{err:?}"
    );
    let detail: ShiftDetailResponse = get_shift(&mut env.context(), shift_id, &admin).unwrap();
    assert_eq!(detail.comments.len(), 1);
}

#[test]
fn test_problem_report_reaches_owner_and_admins() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let owner: AuthenticatedActor = env.owner;
    let admin: AuthenticatedActor = env.admin;
    let operator: AuthenticatedActor = env.operator;

    let request: ReportProblemRequest = ReportProblemRequest {
        kind: String::from("forgotten_item"),
        description: String::from("Phone charger in bedroom"),
        photo_urls: vec![String::from("https://photos.example.com/1.jpg"), String::from(" ")],
    };
    let response: ShiftMutationResponse =
        report_problem(&mut env.context(), shift_id, &request, &operator).unwrap();
    assert_eq!(response.notifications_created, 2);
    assert_eq!(env.inbox_types(&owner), vec!["problem_reported"]);
    assert_eq!(env.inbox_types(&admin), vec!["problem_reported"]);

    let detail: ShiftDetailResponse = get_shift(&mut env.context(), shift_id, &owner).unwrap();
    assert_eq!(detail.problems.len(), 1);
    assert_eq!(detail.problems[0].kind, "forgotten_item");
    assert_eq!(detail.problems[0].photo_urls.len(), 1);

    let err: ApiError =
        report_problem(&mut env.context(), shift_id, &request, &owner).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");
}

#[test]
fn test_unknown_problem_kind_is_rejected() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let operator: AuthenticatedActor = env.operator;

    let request: ReportProblemRequest = ReportProblemRequest {
        kind: String::from("flood"),
        description: String::from("Water everywhere"),
        photo_urls: Vec::new(),
    };
    let err: ApiError =
        report_problem(&mut env.context(), shift_id, &request, &operator).unwrap_err();
    assert!(
        matches!(err, ApiError::InvalidInput { ref field, .. } if field == "kind"),
        "{err:?}"
    );
}

#[test]
fn test_instruction_photo_goes_to_operator() {
    let mut env: TestEnv = create_test_env();
    let shift_id: i64 = env.schedule_default();
    let owner: AuthenticatedActor = env.owner;
    let operator: AuthenticatedActor = env.operator;

    let request: AddInstructionPhotoRequest = AddInstructionPhotoRequest {
        url: String::from("https://photos.example.com/bed.jpg"),
        description: Some(String::from("How the bed should look")),
    };
    add_instruction_photo(&mut env.context(), shift_id, &request, &owner).unwrap();
    assert_eq!(env.inbox_types(&operator)[0], "instruction_photo_added");

    let err: ApiError =
        add_instruction_photo(&mut env.context(), shift_id, &request, &operator).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }), "{err:?}");
}

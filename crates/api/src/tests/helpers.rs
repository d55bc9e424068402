// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use time::OffsetDateTime;
use time::macros::datetime;
use turnover::{FixedClock, ShiftPolicy};
use turnover_domain::Role;
use turnover_persistence::SqlitePersistence;

use crate::{
    ApiContext, AuthenticatedActor, CreateApartmentRequest, CreateShiftRequest, CreateUserRequest,
    ListNotificationsResponse, NotificationInfo, RecordingGateway, ShiftMutationResponse,
    UserInfo, create_apartment, create_shift, create_user, list_notifications,
};

/// Sunday morning, well ahead of the shifts the tests schedule.
pub const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

/// The day most test shifts are scheduled on, at 11:00.
pub const SHIFT_DAY: &str = "2026-03-10";

/// A directory with one user per role, two apartments and a pinned clock.
pub struct TestEnv {
    pub persistence: SqlitePersistence,
    pub gateway: RecordingGateway,
    pub clock: FixedClock,
    pub policy: ShiftPolicy,
    pub admin: AuthenticatedActor,
    pub owner: AuthenticatedActor,
    pub other_owner: AuthenticatedActor,
    pub operator: AuthenticatedActor,
    pub other_operator: AuthenticatedActor,
    pub viewer: AuthenticatedActor,
    pub apartment_id: i64,
    pub second_apartment_id: i64,
}

impl TestEnv {
    pub fn context(&mut self) -> ApiContext<'_> {
        ApiContext {
            persistence: &mut self.persistence,
            gateway: &self.gateway,
            clock: &self.clock,
            policy: &self.policy,
        }
    }

    pub fn set_now(&mut self, now: OffsetDateTime) {
        self.clock = FixedClock::at(now);
    }

    /// Registers another apartment for the main owner.
    pub fn add_apartment(&mut self, name: &str) -> i64 {
        let request: CreateApartmentRequest = CreateApartmentRequest {
            name: name.to_string(),
            owner_id: self.owner.user_id,
        };
        create_apartment(&mut self.persistence, &request, &self.admin)
            .unwrap()
            .apartment_id
    }

    /// Schedules a shift as the admin.
    pub fn schedule(
        &mut self,
        apartment_id: i64,
        operator_id: i64,
        date: &str,
        start: &str,
    ) -> ShiftMutationResponse {
        let request: CreateShiftRequest = shift_request(apartment_id, operator_id, date, start);
        let admin: AuthenticatedActor = self.admin;
        create_shift(&mut self.context(), &request, &admin).unwrap()
    }

    /// Schedules the standard shift: main apartment, main operator, 11:00.
    pub fn schedule_default(&mut self) -> i64 {
        let apartment_id: i64 = self.apartment_id;
        let operator_id: i64 = self.operator.user_id;
        self.schedule(apartment_id, operator_id, SHIFT_DAY, "11:00")
            .shift
            .unwrap()
            .shift_id
    }

    pub fn inbox(&mut self, user: &AuthenticatedActor) -> ListNotificationsResponse {
        list_notifications(&mut self.persistence, user, None).unwrap()
    }

    /// The notification types a user has received, newest first.
    pub fn inbox_types(&mut self, user: &AuthenticatedActor) -> Vec<String> {
        self.inbox(user)
            .notifications
            .into_iter()
            .map(|n: NotificationInfo| n.notification_type)
            .collect()
    }
}

pub fn shift_request(
    apartment_id: i64,
    operator_id: i64,
    date: &str,
    start: &str,
) -> CreateShiftRequest {
    CreateShiftRequest {
        apartment_id,
        operator_id,
        scheduled_date: date.to_string(),
        scheduled_start_time: start.to_string(),
        scheduled_end_time: None,
        guest_count: 2,
        notes: None,
    }
}

fn user_request(role: &str, name: &str, email: &str) -> CreateUserRequest {
    CreateUserRequest {
        role: role.to_string(),
        name: name.to_string(),
        email: email.to_string(),
    }
}

fn register(
    persistence: &mut SqlitePersistence,
    admin: &AuthenticatedActor,
    role: Role,
    name: &str,
    email: &str,
) -> AuthenticatedActor {
    let user: UserInfo = create_user(
        persistence,
        &user_request(role.as_str(), name, email),
        Some(admin),
        NOW,
    )
    .unwrap();
    AuthenticatedActor::new(user.user_id, role)
}

pub fn create_test_env() -> TestEnv {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    let admin_info: UserInfo = create_user(
        &mut persistence,
        &user_request("admin", "Ada Admin", "ada@example.com"),
        None,
        NOW,
    )
    .unwrap();
    let admin: AuthenticatedActor = AuthenticatedActor::new(admin_info.user_id, Role::Admin);

    let owner: AuthenticatedActor = register(
        &mut persistence,
        &admin,
        Role::Owner,
        "Olga Owner",
        "olga@example.com",
    );
    let other_owner: AuthenticatedActor = register(
        &mut persistence,
        &admin,
        Role::Owner,
        "Oscar Other",
        "oscar@example.com",
    );
    let operator: AuthenticatedActor = register(
        &mut persistence,
        &admin,
        Role::Operator,
        "Otto Operator",
        "otto@example.com",
    );
    let other_operator: AuthenticatedActor = register(
        &mut persistence,
        &admin,
        Role::Operator,
        "Bea Busy",
        "bea@example.com",
    );
    let viewer: AuthenticatedActor = register(
        &mut persistence,
        &admin,
        Role::Viewer,
        "Vic Viewer",
        "vic@example.com",
    );

    let apartment_id: i64 = create_apartment(
        &mut persistence,
        &CreateApartmentRequest {
            name: String::from("Seaside 2B"),
            owner_id: owner.user_id,
        },
        &admin,
    )
    .unwrap()
    .apartment_id;
    let second_apartment_id: i64 = create_apartment(
        &mut persistence,
        &CreateApartmentRequest {
            name: String::from("Harbour 7"),
            owner_id: owner.user_id,
        },
        &admin,
    )
    .unwrap()
    .apartment_id;

    TestEnv {
        persistence,
        gateway: RecordingGateway::new(),
        clock: FixedClock::at(NOW),
        policy: ShiftPolicy::default(),
        admin,
        owner,
        other_owner,
        operator,
        other_operator,
        viewer,
        apartment_id,
        second_apartment_id,
    }
}

mod common;

use chrono::{Duration, NaiveTime, Utc};
use optical_storefront_api::{
    dto::appointments::{BookAppointmentRequest, UpdateAppointmentStatusRequest},
    entity::{appointment_slots, appointments, profiles},
    error::AppError,
    models::{AppointmentStatus, AppointmentType},
    services::appointment_service::{book_appointment, update_appointment_status},
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

fn slot(id: Uuid, days_ahead: i64) -> appointment_slots::Model {
    appointment_slots::Model {
        id,
        date: Utc::now().date_naive() + Duration::days(days_ahead),
        start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        is_available: true,
        created_at: Utc::now().into(),
    }
}

fn appointment(slot_id: Uuid, profile_id: Uuid, status: AppointmentStatus) -> appointments::Model {
    let now = Utc::now().into();
    appointments::Model {
        id: Uuid::new_v4(),
        slot_id,
        profile_id,
        appointment_type: AppointmentType::Essayage.as_str().to_string(),
        status: status.as_str().to_string(),
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

fn rows(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

fn request(slot_id: Uuid) -> BookAppointmentRequest {
    BookAppointmentRequest {
        slot_id,
        appointment_type: AppointmentType::Essayage,
        notes: Some("Monture ronde".to_string()),
    }
}

#[tokio::test]
async fn taken_slot_is_refused_without_creating_an_appointment() {
    let slot_id = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[slot(slot_id, 2)]])
        .append_exec_results([rows(0)])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let err = book_appointment(&state, &common::customer(Uuid::new_v4()), request(slot_id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Ce créneau n'est plus disponible"));
    let sql = common::executed_sql(state);
    assert_eq!(common::count_matching(&sql, "UPDATE \"appointment_slots\""), 1);
    assert_eq!(common::count_matching(&sql, "INSERT INTO \"appointments\""), 0);
    assert_eq!(sql.last().map(String::as_str), Some("ROLLBACK"));
}

#[tokio::test]
async fn past_slot_is_refused_before_claiming_it() {
    let slot_id = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[slot(slot_id, -1)]])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let err = book_appointment(&state, &common::customer(Uuid::new_v4()), request(slot_id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Ce créneau est passé"));
    let sql = common::executed_sql(state);
    assert_eq!(common::count_matching(&sql, "UPDATE \"appointment_slots\""), 0);
}

#[tokio::test]
async fn free_slot_is_booked_once() {
    let slot_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[slot(slot_id, 2)]])
        .append_exec_results([rows(1)])
        .append_query_results([[appointment(slot_id, user_id, AppointmentStatus::Confirmee)]])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let resp = book_appointment(&state, &common::customer(user_id), request(slot_id))
        .await
        .unwrap();

    let entry = resp.data.expect("booking");
    assert_eq!(entry.appointment.status, AppointmentStatus::Confirmee);
    assert_eq!(entry.slot.map(|s| s.is_available), Some(false));
    let sql = common::executed_sql(state);
    assert_eq!(common::count_matching(&sql, "INSERT INTO \"appointments\""), 1);
    assert_eq!(sql.last().map(String::as_str), Some("COMMIT"));
}

#[tokio::test]
async fn admin_cancellation_releases_the_slot() {
    let admin_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4();
    let confirmed = appointment(slot_id, Uuid::new_v4(), AppointmentStatus::Confirmee);
    let mut cancelled = confirmed.clone();
    cancelled.status = AppointmentStatus::Annulee.as_str().to_string();
    let admin = profiles::Model {
        role: "admin".to_string(),
        ..common::profile_model(admin_id)
    };

    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[admin]])
        .append_query_results([[confirmed.clone()]])
        .append_exec_results([rows(1)])
        .append_query_results([[cancelled]])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let resp = update_appointment_status(
        &state,
        &common::customer(admin_id),
        confirmed.id,
        UpdateAppointmentStatusRequest {
            status: AppointmentStatus::Annulee,
        },
    )
    .await
    .unwrap();

    assert_eq!(resp.data.map(|a| a.status), Some(AppointmentStatus::Annulee));
    let sql = common::executed_sql(state);
    assert_eq!(common::count_matching(&sql, "UPDATE \"appointment_slots\""), 1);
    assert_eq!(common::count_matching(&sql, "UPDATE \"appointments\""), 1);
}

#[tokio::test]
async fn customers_cannot_change_appointment_status() {
    let user_id = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::profile_model(user_id)]])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let err = update_appointment_status(
        &state,
        &common::customer(user_id),
        Uuid::new_v4(),
        UpdateAppointmentStatusRequest {
            status: AppointmentStatus::Terminee,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Forbidden));
    let sql = common::executed_sql(state);
    assert_eq!(common::count_matching(&sql, "UPDATE"), 0);
}

mod common;

use axum::extract::State;
use optical_storefront_api::routes::health::health_check;
use sea_orm::{DatabaseBackend, MockDatabase};

#[tokio::test]
async fn health_check_returns_ok() {
    let orm = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
}

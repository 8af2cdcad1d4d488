mod common;

use optical_storefront_api::{
    dto::payments::{VerifyPaymentQuery, WebhookAck},
    error::AppError,
    middleware::auth::AuthUser,
    models::OrderStatus,
    services::payment_service::{handle_webhook, verify_return},
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn alma_reports(server: &MockServer, state: &str, order_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/payments/payment_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "payment_abc",
            "state": state,
            "custom_data": { "order_id": order_id.to_string() }
        })))
        .mount(server)
        .await;
}

fn webhook_body() -> Vec<u8> {
    br#"{"id":"payment_abc"}"#.to_vec()
}

#[tokio::test]
async fn in_progress_webhook_moves_pending_order_to_paid() {
    let server = MockServer::start().await;
    let order_id = Uuid::new_v4();
    alma_reports(&server, "in_progress", order_id).await;

    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(
            order_id,
            Uuid::new_v4(),
            OrderStatus::EnAttentePaiement,
        )]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results([[common::history_model(order_id, OrderStatus::Payee)]])
        .into_connection();
    let state = common::test_state(orm, &server.uri());

    let ack = handle_webhook(&state, &webhook_body()).await.unwrap();
    assert_eq!(
        ack,
        WebhookAck {
            received: true,
            applied_status: Some(OrderStatus::Payee),
        }
    );

    let sql = common::executed_sql(state);
    assert_eq!(common::count_matching(&sql, "UPDATE \"orders\""), 1);
    assert_eq!(
        common::count_matching(&sql, "INSERT INTO \"order_status_history\""),
        1
    );
}

#[tokio::test]
async fn redelivered_webhook_is_acknowledged_without_history() {
    let server = MockServer::start().await;
    let order_id = Uuid::new_v4();
    alma_reports(&server, "paid", order_id).await;

    // The guard matches no row: the order already left the pending state.
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(
            order_id,
            Uuid::new_v4(),
            OrderStatus::Payee,
        )]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let state = common::test_state(orm, &server.uri());

    let ack = handle_webhook(&state, &webhook_body()).await.unwrap();
    assert!(ack.received);
    assert_eq!(ack.applied_status, None);

    let sql = common::executed_sql(state);
    assert_eq!(
        common::count_matching(&sql, "INSERT INTO \"order_status_history\""),
        0
    );
}

#[tokio::test]
async fn unhandled_state_is_acknowledged_without_touching_orders() {
    let server = MockServer::start().await;
    let order_id = Uuid::new_v4();
    alma_reports(&server, "not_started", order_id).await;

    let orm = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let state = common::test_state(orm, &server.uri());

    let ack = handle_webhook(&state, &webhook_body()).await.unwrap();
    assert!(ack.received);
    assert_eq!(ack.applied_status, None);
}

#[tokio::test]
async fn webhook_without_payment_id_is_rejected() {
    let orm = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let err = handle_webhook(&state, br#"{}"#).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Missing payment ID"));

    let err = handle_webhook(&state, b"not json").await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn provider_failure_surfaces_as_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payments/payment_abc"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let orm = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let state = common::test_state(orm, &server.uri());

    let err = handle_webhook(&state, &webhook_body()).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));
}

#[tokio::test]
async fn verify_on_paid_order_skips_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let user_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(order_id, user_id, OrderStatus::Payee)]])
        .into_connection();
    let state = common::test_state(orm, &server.uri());
    let user = AuthUser {
        user_id,
        email: None,
    };

    let resp = verify_return(&state, &user, VerifyPaymentQuery { order_id })
        .await
        .unwrap();
    let data = resp.data.expect("verify data");
    assert!(data.confirmed);
    assert_eq!(data.status, OrderStatus::Payee);
    assert_eq!(data.order_number, "VO-2026-0042");
}

#[tokio::test]
async fn verify_reports_pending_when_provider_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payments/payment_abc"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let user_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(
            order_id,
            user_id,
            OrderStatus::EnAttentePaiement,
        )]])
        .into_connection();
    let state = common::test_state(orm, &server.uri());
    let user = AuthUser {
        user_id,
        email: None,
    };

    let resp = verify_return(&state, &user, VerifyPaymentQuery { order_id })
        .await
        .unwrap();
    let data = resp.data.expect("verify data");
    assert!(!data.confirmed);
    assert_eq!(data.status, OrderStatus::EnAttentePaiement);
    assert_eq!(data.message.as_deref(), Some("Paiement en attente de confirmation"));
}

#[tokio::test]
async fn verify_confirms_pending_order_when_alma_reports_payment() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    alma_reports(&server, "in_progress", order_id).await;

    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(
            order_id,
            user_id,
            OrderStatus::EnAttentePaiement,
        )]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results([[common::history_model(order_id, OrderStatus::Payee)]])
        .into_connection();
    let state = common::test_state(orm, &server.uri());

    let resp = verify_return(&state, &common::customer(user_id), VerifyPaymentQuery { order_id })
        .await
        .unwrap();
    let data = resp.data.expect("verify data");
    assert!(data.confirmed);
    assert_eq!(data.status, OrderStatus::Payee);
    assert_eq!(data.message, None);

    let sql = common::executed_sql(state);
    assert_eq!(common::count_matching(&sql, "UPDATE \"orders\""), 1);
    assert_eq!(
        common::count_matching(&sql, "INSERT INTO \"order_status_history\""),
        1
    );
}

#[tokio::test]
async fn verify_after_losing_the_race_reports_the_winner_status() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    alma_reports(&server, "paid", order_id).await;

    // The webhook confirmed the order between our read and the guarded update.
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(
            order_id,
            user_id,
            OrderStatus::EnAttentePaiement,
        )]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .append_query_results([[common::order_model(order_id, user_id, OrderStatus::Payee)]])
        .into_connection();
    let state = common::test_state(orm, &server.uri());

    let resp = verify_return(&state, &common::customer(user_id), VerifyPaymentQuery { order_id })
        .await
        .unwrap();
    let data = resp.data.expect("verify data");
    assert!(data.confirmed);
    assert_eq!(data.status, OrderStatus::Payee);

    let sql = common::executed_sql(state);
    assert_eq!(
        common::count_matching(&sql, "INSERT INTO \"order_status_history\""),
        0
    );
}

#[tokio::test]
async fn verify_keeps_order_pending_while_alma_has_not_started() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    alma_reports(&server, "not_started", order_id).await;

    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(
            order_id,
            user_id,
            OrderStatus::EnAttentePaiement,
        )]])
        .into_connection();
    let state = common::test_state(orm, &server.uri());

    let resp = verify_return(&state, &common::customer(user_id), VerifyPaymentQuery { order_id })
        .await
        .unwrap();
    assert!(!resp.data.expect("verify data").confirmed);
    assert_eq!(
        common::count_matching(&common::executed_sql(state), "UPDATE \"orders\""),
        0
    );
}

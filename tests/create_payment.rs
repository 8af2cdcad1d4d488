mod common;

use optical_storefront_api::{
    dto::payments::CreatePaymentRequest,
    entity::orders,
    error::AppError,
    models::OrderStatus,
    services::payment_service::create_payment,
};
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn alma_must_not_be_called() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn unsupported_installment_count_is_rejected_before_any_lookup() {
    let server = alma_must_not_be_called().await;
    let orm = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let state = common::test_state(orm, &server.uri());
    let user = common::customer(Uuid::new_v4());

    for installments in [0, 5, 6, 10] {
        let err = create_payment(
            &state,
            &user,
            CreatePaymentRequest {
                order_id: Uuid::new_v4(),
                installments,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "{installments} accepted");
    }

    assert!(common::executed_sql(state).is_empty());
}

#[tokio::test]
async fn order_of_another_customer_is_not_found() {
    let server = alma_must_not_be_called().await;
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<orders::Model>::new()])
        .into_connection();
    let state = common::test_state(orm, &server.uri());

    let err = create_payment(
        &state,
        &common::customer(Uuid::new_v4()),
        CreatePaymentRequest {
            order_id: Uuid::new_v4(),
            installments: 3,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::NotFound(msg) if msg == "Commande introuvable"));
    let sql = common::executed_sql(state);
    assert_eq!(sql.len(), 1);
    assert!(sql[0].contains("\"profile_id\" = $"));
}

#[tokio::test]
async fn paid_order_cannot_be_paid_again() {
    let server = alma_must_not_be_called().await;
    let user_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(order_id, user_id, OrderStatus::Payee)]])
        .into_connection();
    let state = common::test_state(orm, &server.uri());

    let err = create_payment(
        &state,
        &common::customer(user_id),
        CreatePaymentRequest {
            order_id,
            installments: 4,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Cette commande a déjà été payée"));
}

#[tokio::test]
async fn provider_failure_leaves_the_order_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
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
        .append_query_results([[common::profile_model(user_id)]])
        .into_connection();
    let state = common::test_state(orm, &server.uri());

    let err = create_payment(
        &state,
        &common::customer(user_id),
        CreatePaymentRequest {
            order_id,
            installments: 3,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
    let sql = common::executed_sql(state);
    assert_eq!(sql.len(), 2);
    assert_eq!(common::count_matching(&sql, "UPDATE \"orders\""), 0);
}

#[tokio::test]
async fn payment_page_is_created_and_recorded_on_the_order() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/payments"))
        .and(body_partial_json(json!({
            "payment": {
                "purchase_amount": 8690,
                "installments_count": 3,
                "custom_data": { "order_id": order_id.to_string() }
            },
            "customer": { "email": "claire@example.fr" },
            "shipping_address": { "country": "FR" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "payment_new",
            "url": "https://checkout.sandbox.getalma.eu/payment_new",
            "state": "not_started"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pending = common::order_model(order_id, user_id, OrderStatus::EnAttentePaiement);
    let mut updated = pending.clone();
    updated.alma_payment_id = Some("payment_new".to_string());
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[pending]])
        .append_query_results([[common::profile_model(user_id)]])
        .append_query_results([[updated]])
        .into_connection();
    let state = common::test_state(orm, &server.uri());

    let resp = create_payment(
        &state,
        &common::customer(user_id),
        CreatePaymentRequest {
            order_id,
            installments: 3,
        },
    )
    .await
    .unwrap();

    let data = resp.data.expect("payment data");
    assert_eq!(data.payment_id, "payment_new");
    assert_eq!(
        data.payment_url,
        "https://checkout.sandbox.getalma.eu/payment_new"
    );
    let sql = common::executed_sql(state);
    assert_eq!(common::count_matching(&sql, "UPDATE \"orders\""), 1);
}

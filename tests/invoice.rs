mod common;

use chrono::Utc;
use optical_storefront_api::{
    entity::{order_items, orders, profiles},
    error::AppError,
    models::OrderStatus,
    services::invoice_service::order_invoice,
};
use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

fn item(order_id: Uuid) -> order_items::Model {
    order_items::Model {
        id: Uuid::new_v4(),
        order_id,
        variant_id: Uuid::new_v4(),
        product_name: "Monture Lyon".to_string(),
        variant_info: Some("Écaille".to_string()),
        quantity: 1,
        unit_price: 6_000,
        lens_type: Some("unifocal".to_string()),
        lens_options_summary: Some("Anti-reflet".to_string()),
        lens_options_price: 2_000,
        created_at: Utc::now().into(),
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[tokio::test]
async fn owner_gets_a_pdf_named_after_the_order() {
    let user_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(order_id, user_id, OrderStatus::Payee)]])
        .append_query_results([[item(order_id)]])
        .append_query_results([[common::profile_model(user_id)]])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let pdf = order_invoice(&state, &common::customer(user_id), order_id)
        .await
        .unwrap();

    assert_eq!(pdf.filename, "facture-VO-2026-0042.pdf");
    assert!(pdf.bytes.starts_with(b"%PDF-1.4"));
    assert!(contains(&pdf.bytes, b"(Claire Martin) Tj"));
    assert!(contains(&pdf.bytes, b"(Monture Lyon \\227 \\311caille) Tj"));
    // Frame plus lens options.
    assert!(contains(&pdf.bytes, b"(80,00 \\200) Tj"));
}

#[tokio::test]
async fn another_customers_order_is_forbidden() {
    let order_id = Uuid::new_v4();
    let caller = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(order_id, Uuid::new_v4(), OrderStatus::Payee)]])
        .append_query_results([[common::profile_model(caller)]])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let err = order_invoice(&state, &common::customer(caller), order_id)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden));
    let sql = common::executed_sql(state);
    assert_eq!(sql.len(), 2);
    assert_eq!(common::count_matching(&sql, "\"order_items\""), 0);
}

#[tokio::test]
async fn admin_may_download_any_invoice() {
    let order_id = Uuid::new_v4();
    let admin_id = Uuid::new_v4();
    let owner_id = Uuid::new_v4();
    let admin = profiles::Model {
        role: "admin".to_string(),
        ..common::profile_model(admin_id)
    };
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[common::order_model(order_id, owner_id, OrderStatus::Expediee)]])
        .append_query_results([[admin]])
        .append_query_results([[item(order_id)]])
        .append_query_results([[common::profile_model(owner_id)]])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let pdf = order_invoice(&state, &common::customer(admin_id), order_id)
        .await
        .unwrap();
    assert!(pdf.bytes.ends_with(b"%%EOF\n"));
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<orders::Model>::new()])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let err = order_invoice(&state, &common::customer(Uuid::new_v4()), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "Commande introuvable"));
}

#![allow(dead_code)]

use chrono::Utc;
use optical_storefront_api::{
    config::{AppConfig, MaintenanceConfig},
    db::OrmConn,
    entity::{order_status_history, orders, profiles},
    middleware::auth::AuthUser,
    models::OrderStatus,
    state::AppState,
};
use std::sync::Arc;
use uuid::Uuid;

pub fn test_config(upstream: &str) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        site_url: "https://shop.test".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_audience: "authenticated".to_string(),
        alma_api_key: "sk_test".to_string(),
        alma_api_url: upstream.to_string(),
        resend_api_key: "re_test".to_string(),
        resend_api_url: upstream.to_string(),
        email_from: "Shop <shop@test.fr>".to_string(),
        shop_email: "shop@test.fr".to_string(),
        turnstile_secret_key: Some("turnstile-secret".to_string()),
        turnstile_verify_url: format!("{upstream}/siteverify"),
        http_timeout_secs: 5,
        maintenance: MaintenanceConfig::default(),
    }
}

pub fn test_state(orm: OrmConn, upstream: &str) -> AppState {
    AppState::new(orm, test_config(upstream)).expect("state")
}

pub fn order_model(id: Uuid, profile_id: Uuid, status: OrderStatus) -> orders::Model {
    let now = Utc::now().into();
    orders::Model {
        id,
        order_number: "VO-2026-0042".to_string(),
        profile_id,
        status: status.as_str().to_string(),
        delivery_method: "domicile".to_string(),
        payment_method: "alma".to_string(),
        subtotal: 8_000,
        shipping_cost: 690,
        total: 8_690,
        alma_payment_id: Some("payment_abc".to_string()),
        shipping_first_name: Some("Claire".to_string()),
        shipping_last_name: Some("Martin".to_string()),
        shipping_street: Some("12 rue de la Paix".to_string()),
        shipping_street_2: None,
        shipping_city: Some("Paris".to_string()),
        shipping_postal_code: Some("75002".to_string()),
        shipping_country: Some("France".to_string()),
        tracking_number: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn history_model(order_id: Uuid, status: OrderStatus) -> order_status_history::Model {
    order_status_history::Model {
        id: Uuid::new_v4(),
        order_id,
        status: status.as_str().to_string(),
        comment: None,
        created_at: Utc::now().into(),
    }
}

pub fn profile_model(id: Uuid) -> profiles::Model {
    let now = Utc::now().into();
    profiles::Model {
        id,
        email: "claire@example.fr".to_string(),
        first_name: Some("Claire".to_string()),
        last_name: Some("Martin".to_string()),
        phone: Some("+33612345678".to_string()),
        role: "customer".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn customer(user_id: Uuid) -> AuthUser {
    AuthUser {
        user_id,
        email: Some("claire@example.fr".to_string()),
    }
}

/// SQL of every statement the mock connection saw, in order.
pub fn executed_sql(state: AppState) -> Vec<String> {
    let orm = Arc::try_unwrap(state.orm)
        .ok()
        .expect("state still shared");
    orm.into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
        .collect()
}

pub fn count_matching(sql: &[String], needle: &str) -> usize {
    sql.iter().filter(|stmt| stmt.contains(needle)).count()
}

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    routing::{get, post},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::payments::{
        CreatePaymentRequest, CreatePaymentResponse, VerifyPaymentQuery, VerifyPaymentResponse,
        WebhookAck, WebhookPayload,
    },
    error::{AppJson, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-payment", post(create_payment))
        .route("/webhook", get(webhook_ping).post(webhook))
        .route("/verify", get(verify_payment))
}

#[derive(Serialize, ToSchema)]
pub struct WebhookPing {
    pub status: String,
}

#[utoipa::path(
    post,
    path = "/api/alma/create-payment",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Alma payment page created", body = ApiResponse<CreatePaymentResponse>),
        (status = 400, description = "Invalid installments or order already paid"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Payment provider unavailable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreatePaymentRequest>,
) -> AppResult<Json<ApiResponse<CreatePaymentResponse>>> {
    let resp = payment_service::create_payment(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/alma/webhook",
    request_body = WebhookPayload,
    responses(
        (status = 200, description = "Notification acknowledged", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Malformed body or missing payment id"),
        (status = 500, description = "Provider lookup or persistence failed; Alma retries"),
    ),
    security(()),
    tag = "Payments"
)]
pub async fn webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let ack = payment_service::handle_webhook(&state, &body).await?;
    Ok(Json(ApiResponse::success("OK", ack, Some(Meta::empty()))))
}

#[utoipa::path(
    get,
    path = "/api/alma/webhook",
    responses((status = 200, description = "Webhook endpoint is reachable", body = ApiResponse<WebhookPing>)),
    security(()),
    tag = "Payments"
)]
pub async fn webhook_ping() -> Json<ApiResponse<WebhookPing>> {
    Json(ApiResponse::success(
        "Alma webhook endpoint",
        WebhookPing {
            status: "ok".to_string(),
        },
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    get,
    path = "/api/alma/verify",
    params(VerifyPaymentQuery),
    responses(
        (status = 200, description = "Payment confirmed, or still pending with confirmed = false", body = ApiResponse<VerifyPaymentResponse>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<VerifyPaymentQuery>,
) -> AppResult<Json<ApiResponse<VerifyPaymentResponse>>> {
    let resp = payment_service::verify_return(&state, &user, query).await?;
    Ok(Json(resp))
}

use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::promotions::{PromotionSummary, ValidatePromotionRequest},
    error::{AppJson, AppResult},
    response::ApiResponse,
    services::promotion_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_promotion))
}

#[utoipa::path(
    post,
    path = "/api/promotions/validate",
    request_body = ValidatePromotionRequest,
    responses(
        (status = 200, description = "Code is usable for this cart", body = ApiResponse<PromotionSummary>),
        (status = 400, description = "Not yet active, expired or below minimum amount"),
        (status = 404, description = "Unknown or inactive code"),
    ),
    security(()),
    tag = "Promotions"
)]
pub async fn validate_promotion(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ValidatePromotionRequest>,
) -> AppResult<Json<ApiResponse<PromotionSummary>>> {
    let resp = promotion_service::validate_code(&state, payload).await?;
    Ok(Json(resp))
}

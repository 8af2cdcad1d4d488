use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::appointments::{
        AppointmentEntry, AppointmentList, BookAppointmentRequest, CreateSlotRequest,
        GenerateSlotsRequest, GeneratedSlots, SlotList, UpdateAppointmentStatusRequest,
        UpdateSlotRequest,
    },
    error::{AppJson, AppResult},
    middleware::auth::AuthUser,
    models::{Appointment, AppointmentSlot},
    response::ApiResponse,
    routes::params::{PageQuery, SlotQuery},
    services::appointment_service,
    state::AppState,
};

pub fn slots_router() -> Router<AppState> {
    Router::new().route("/", get(list_available_slots))
}

pub fn account_router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_my_appointments).post(book_appointment))
        .route("/appointments/{id}/cancel", patch(cancel_my_appointment))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments))
        .route("/appointments/{id}/status", patch(update_appointment_status))
        .route("/appointment-slots", get(list_slots).post(create_slot))
        .route("/appointment-slots/generate", post(generate_day_slots))
        .route(
            "/appointment-slots/{id}",
            patch(update_slot).delete(delete_slot),
        )
}

#[utoipa::path(
    get,
    path = "/api/appointment-slots",
    params(SlotQuery),
    responses(
        (status = 200, description = "Bookable slots from today on", body = ApiResponse<SlotList>),
    ),
    tag = "Appointments"
)]
pub async fn list_available_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> AppResult<Json<ApiResponse<SlotList>>> {
    let resp = appointment_service::list_available_slots(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/account/appointments",
    responses(
        (status = 200, description = "Appointments of the caller", body = ApiResponse<AppointmentList>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn list_my_appointments(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AppointmentList>>> {
    let resp = appointment_service::list_my_appointments(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/account/appointments",
    request_body = BookAppointmentRequest,
    responses(
        (status = 200, description = "Appointment booked", body = ApiResponse<AppointmentEntry>),
        (status = 400, description = "Slot taken or in the past"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown slot"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn book_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<BookAppointmentRequest>,
) -> AppResult<Json<ApiResponse<AppointmentEntry>>> {
    let resp = appointment_service::book_appointment(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/account/appointments/{id}/cancel",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment cancelled, slot released", body = ApiResponse<Appointment>),
        (status = 400, description = "Appointment already cancelled or completed"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn cancel_my_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let resp = appointment_service::cancel_my_appointment(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/appointments",
    params(PageQuery),
    responses(
        (status = 200, description = "All appointments with slot and customer", body = ApiResponse<AppointmentList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<AppointmentList>>> {
    let resp = appointment_service::list_appointments(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/appointments/{id}/status",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Appointment>),
        (status = 400, description = "Slot no longer available"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateAppointmentStatusRequest>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let resp = appointment_service::update_appointment_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/appointment-slots",
    params(SlotQuery),
    responses(
        (status = 200, description = "Slots in the window, booked or not", body = ApiResponse<SlotList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_slots(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SlotQuery>,
) -> AppResult<Json<ApiResponse<SlotList>>> {
    let resp = appointment_service::list_slots(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/appointment-slots",
    request_body = CreateSlotRequest,
    responses(
        (status = 200, description = "Slot created", body = ApiResponse<AppointmentSlot>),
        (status = 400, description = "Invalid times or slot already exists"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_slot(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateSlotRequest>,
) -> AppResult<Json<ApiResponse<AppointmentSlot>>> {
    let resp = appointment_service::create_slot(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/appointment-slots/generate",
    request_body = GenerateSlotsRequest,
    responses(
        (status = 200, description = "Standard slots of the day created", body = ApiResponse<GeneratedSlots>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn generate_day_slots(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<GenerateSlotsRequest>,
) -> AppResult<Json<ApiResponse<GeneratedSlots>>> {
    let resp = appointment_service::generate_day_slots(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/appointment-slots/{id}",
    params(("id" = Uuid, Path, description = "Slot ID")),
    request_body = UpdateSlotRequest,
    responses(
        (status = 200, description = "Slot updated", body = ApiResponse<AppointmentSlot>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_slot(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateSlotRequest>,
) -> AppResult<Json<ApiResponse<AppointmentSlot>>> {
    let resp = appointment_service::update_slot(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/appointment-slots/{id}",
    params(("id" = Uuid, Path, description = "Slot ID")),
    responses(
        (status = 200, description = "Slot deleted"),
        (status = 400, description = "Slot has a confirmed appointment"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_slot(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = appointment_service::delete_slot(&state, &user, id).await?;
    Ok(Json(resp))
}

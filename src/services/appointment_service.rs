//! In-store appointment slots and bookings.
//!
//! A slot is claimed with a conditional update on `is_available`, so two customers racing
//! for the same slot cannot both book it. Cancelling frees the slot again.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, OnConflict};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::appointments::{
        AppointmentEntry, AppointmentList, BookAppointmentRequest, CreateSlotRequest,
        GenerateSlotsRequest, GeneratedSlots, SlotList, UpdateAppointmentStatusRequest,
        UpdateSlotRequest,
    },
    entity::{
        appointment_slots::{
            ActiveModel as SlotActive, Column as SlotCol, Entity as Slots, Model as SlotModel,
        },
        appointments::{
            ActiveModel as AppointmentActive, Column as AppointmentCol, Entity as Appointments,
            Model as AppointmentModel,
        },
        profiles::{Column as ProfileCol, Entity as Profiles},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_admin},
    models::{Appointment, AppointmentSlot, AppointmentStatus, Profile},
    response::{ApiResponse, Meta},
    routes::params::{PageQuery, SlotQuery},
    state::AppState,
};

const OPENING_HOUR: u32 = 9;
const CLOSING_HOUR: u32 = 18;
const LUNCH_HOUR: u32 = 12;

/// Half-hour slots of a working day, lunch hour excluded.
pub fn day_slots() -> Vec<(NaiveTime, NaiveTime)> {
    let mut slots = Vec::new();
    for hour in (OPENING_HOUR..CLOSING_HOUR).filter(|h| *h != LUNCH_HOUR) {
        for minute in [0, 30] {
            let Some(start) = NaiveTime::from_hms_opt(hour, minute, 0) else {
                continue;
            };
            let end = start + chrono::Duration::minutes(30);
            slots.push((start, end));
        }
    }
    slots
}

fn check_slot_times(start: NaiveTime, end: NaiveTime) -> AppResult<()> {
    if end <= start {
        return Err(AppError::bad_request("L'heure de fin doit suivre l'heure de début"));
    }
    Ok(())
}

/// Take a free slot. Returns `false` when it was already taken.
async fn claim_slot<C: ConnectionTrait>(conn: &C, slot_id: Uuid) -> AppResult<bool> {
    let result = Slots::update_many()
        .col_expr(SlotCol::IsAvailable, Expr::value(false))
        .filter(SlotCol::Id.eq(slot_id))
        .filter(SlotCol::IsAvailable.eq(true))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

async fn release_slot<C: ConnectionTrait>(conn: &C, slot_id: Uuid) -> AppResult<()> {
    Slots::update_many()
        .col_expr(SlotCol::IsAvailable, Expr::value(true))
        .filter(SlotCol::Id.eq(slot_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Bookable slots from today on.
pub async fn list_available_slots(
    state: &AppState,
    query: SlotQuery,
) -> AppResult<ApiResponse<SlotList>> {
    let today = Utc::now().date_naive();
    let from = query.from.map_or(today, |d| d.max(today));
    let mut finder = Slots::find()
        .filter(SlotCol::IsAvailable.eq(true))
        .filter(SlotCol::Date.gte(from));
    if let Some(to) = query.to {
        finder = finder.filter(SlotCol::Date.lte(to));
    }
    let items = finder
        .order_by_asc(SlotCol::Date)
        .order_by_asc(SlotCol::StartTime)
        .limit(200)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(AppointmentSlot::from)
        .collect();

    Ok(ApiResponse::success("Créneaux", SlotList { items }, None))
}

pub async fn book_appointment(
    state: &AppState,
    user: &AuthUser,
    payload: BookAppointmentRequest,
) -> AppResult<ApiResponse<AppointmentEntry>> {
    let txn = state.orm.begin().await?;

    let slot = Slots::find_by_id(payload.slot_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Créneau introuvable"))?;
    if slot.date < Utc::now().date_naive() {
        return Err(AppError::bad_request("Ce créneau est passé"));
    }
    if !claim_slot(&txn, slot.id).await? {
        return Err(AppError::bad_request("Ce créneau n'est plus disponible"));
    }

    let appointment = AppointmentActive {
        id: Set(Uuid::new_v4()),
        slot_id: Set(slot.id),
        profile_id: Set(user.user_id),
        appointment_type: Set(payload.appointment_type.as_str().to_string()),
        status: Set(AppointmentStatus::Confirmee.as_str().to_string()),
        notes: Set(payload.notes.filter(|n| !n.trim().is_empty())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(
        appointment_id = %appointment.id,
        slot_id = %slot.id,
        date = %slot.date,
        "appointment booked"
    );

    let mut booked = AppointmentSlot::from(slot);
    booked.is_available = false;
    Ok(ApiResponse::success(
        "Rendez-vous confirmé",
        AppointmentEntry {
            appointment: Appointment::try_from(appointment)?,
            slot: Some(booked),
            customer: None,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_my_appointments(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AppointmentList>> {
    let rows = Appointments::find()
        .filter(AppointmentCol::ProfileId.eq(user.user_id))
        .order_by_desc(AppointmentCol::CreatedAt)
        .find_also_related(Slots)
        .all(&*state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(appointment, slot)| entry(appointment, slot, None))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success("Ok", AppointmentList { items }, None))
}

/// A customer may cancel a confirmed appointment of their own.
pub async fn cancel_my_appointment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Appointment>> {
    let txn = state.orm.begin().await?;
    let appointment = Appointments::find()
        .filter(AppointmentCol::Id.eq(id))
        .filter(AppointmentCol::ProfileId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Rendez-vous introuvable"))?;
    if appointment.status != AppointmentStatus::Confirmee.as_str() {
        return Err(AppError::bad_request("Ce rendez-vous ne peut plus être annulé"));
    }
    let updated = set_status(&txn, appointment, AppointmentStatus::Annulee).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Rendez-vous annulé",
        Appointment::try_from(updated)?,
        Some(Meta::empty()),
    ))
}

/// Write the new status and keep the slot's availability in step with it.
async fn set_status<C: ConnectionTrait>(
    conn: &C,
    appointment: AppointmentModel,
    status: AppointmentStatus,
) -> AppResult<AppointmentModel> {
    let was_cancelled = appointment.status == AppointmentStatus::Annulee.as_str();
    let slot_id = appointment.slot_id;

    match (was_cancelled, status) {
        (false, AppointmentStatus::Annulee) => release_slot(conn, slot_id).await?,
        (true, AppointmentStatus::Confirmee) => {
            if !claim_slot(conn, slot_id).await? {
                return Err(AppError::bad_request("Ce créneau n'est plus disponible"));
            }
        }
        _ => {}
    }

    let mut active: AppointmentActive = appointment.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

fn entry(
    appointment: AppointmentModel,
    slot: Option<SlotModel>,
    customer: Option<Profile>,
) -> AppResult<AppointmentEntry> {
    Ok(AppointmentEntry {
        appointment: Appointment::try_from(appointment)?,
        slot: slot.map(AppointmentSlot::from),
        customer,
    })
}

pub async fn list_appointments(
    state: &AppState,
    user: &AuthUser,
    query: PageQuery,
) -> AppResult<ApiResponse<AppointmentList>> {
    require_admin(&*state.orm, user).await?;
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Appointments::find().order_by_desc(AppointmentCol::CreatedAt);
    let total = finder.clone().count(&*state.orm).await? as i64;
    let rows = finder
        .find_also_related(Slots)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&*state.orm)
        .await?;

    let profile_ids: Vec<Uuid> = rows.iter().map(|(a, _)| a.profile_id).collect();
    let profiles: HashMap<Uuid, Profile> = if profile_ids.is_empty() {
        HashMap::new()
    } else {
        Profiles::find()
            .filter(ProfileCol::Id.is_in(profile_ids))
            .all(&*state.orm)
            .await?
            .into_iter()
            .map(|p| (p.id, Profile::from(p)))
            .collect()
    };

    let items = rows
        .into_iter()
        .map(|(appointment, slot)| {
            let customer = profiles.get(&appointment.profile_id).cloned();
            entry(appointment, slot, customer)
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        AppointmentList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_appointment_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAppointmentStatusRequest,
) -> AppResult<ApiResponse<Appointment>> {
    require_admin(&*state.orm, user).await?;

    let txn = state.orm.begin().await?;
    let appointment = Appointments::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Rendez-vous introuvable"))?;
    let previous = appointment.status.clone();
    let updated = set_status(&txn, appointment, payload.status).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "appointment_status_update",
        Some("appointments"),
        Some(serde_json::json!({
            "appointment_id": id,
            "from": previous,
            "to": payload.status.as_str(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        Appointment::try_from(updated)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_slots(
    state: &AppState,
    user: &AuthUser,
    query: SlotQuery,
) -> AppResult<ApiResponse<SlotList>> {
    require_admin(&*state.orm, user).await?;
    let mut finder = Slots::find();
    if let Some(from) = query.from {
        finder = finder.filter(SlotCol::Date.gte(from));
    }
    if let Some(to) = query.to {
        finder = finder.filter(SlotCol::Date.lte(to));
    }
    let items = finder
        .order_by_asc(SlotCol::Date)
        .order_by_asc(SlotCol::StartTime)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(AppointmentSlot::from)
        .collect();

    Ok(ApiResponse::success("Ok", SlotList { items }, None))
}

pub async fn create_slot(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSlotRequest,
) -> AppResult<ApiResponse<AppointmentSlot>> {
    require_admin(&*state.orm, user).await?;
    check_slot_times(payload.start_time, payload.end_time)?;

    let taken = Slots::find()
        .filter(SlotCol::Date.eq(payload.date))
        .filter(SlotCol::StartTime.eq(payload.start_time))
        .count(&*state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::bad_request("Un créneau existe déjà à cette heure"));
    }

    let slot = SlotActive {
        id: Set(Uuid::new_v4()),
        date: Set(payload.date),
        start_time: Set(payload.start_time),
        end_time: Set(payload.end_time),
        is_available: Set(true),
        created_at: NotSet,
    }
    .insert(&*state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Créneau ajouté",
        AppointmentSlot::from(slot),
        Some(Meta::empty()),
    ))
}

/// Fill a day with the standard half-hour grid. Existing times are kept as they are, so a
/// booked slot is never made available again.
pub async fn generate_day_slots(
    state: &AppState,
    user: &AuthUser,
    payload: GenerateSlotsRequest,
) -> AppResult<ApiResponse<GeneratedSlots>> {
    require_admin(&*state.orm, user).await?;
    let date: NaiveDate = payload.date;

    let rows = day_slots().into_iter().map(|(start, end)| SlotActive {
        id: Set(Uuid::new_v4()),
        date: Set(date),
        start_time: Set(start),
        end_time: Set(end),
        is_available: Set(true),
        created_at: NotSet,
    });
    let created = Slots::insert_many(rows)
        .on_conflict(
            OnConflict::columns([SlotCol::Date, SlotCol::StartTime])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&*state.orm)
        .await?;

    tracing::info!(%date, created, "day slots generated");
    Ok(ApiResponse::success(
        "Créneaux générés",
        GeneratedSlots { date, created },
        Some(Meta::empty()),
    ))
}

pub async fn update_slot(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSlotRequest,
) -> AppResult<ApiResponse<AppointmentSlot>> {
    require_admin(&*state.orm, user).await?;
    let slot = Slots::find_by_id(id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Créneau introuvable"))?;

    let mut active: SlotActive = slot.into();
    active.is_available = Set(payload.is_available);
    let slot = active.update(&*state.orm).await?;

    Ok(ApiResponse::success("Updated", AppointmentSlot::from(slot), Some(Meta::empty())))
}

/// Slots holding a confirmed appointment cannot be deleted; cancel the appointment first.
pub async fn delete_slot(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require_admin(&*state.orm, user).await?;
    let booked = Appointments::find()
        .filter(AppointmentCol::SlotId.eq(id))
        .filter(AppointmentCol::Status.eq(AppointmentStatus::Confirmee.as_str()))
        .count(&*state.orm)
        .await?;
    if booked > 0 {
        return Err(AppError::bad_request("Ce créneau a un rendez-vous confirmé"));
    }

    let result = Slots::delete_by_id(id).exec(&*state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Créneau introuvable"));
    }
    Ok(ApiResponse::success(
        "Créneau supprimé",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    dto::account::{AddressInput, AddressList, UpdateProfileRequest},
    entity::{
        addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses},
        profiles::{ActiveModel as ProfileActive, Entity as Profiles},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, Profile},
    response::{ApiResponse, Meta},
    state::AppState,
};

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let profile = Profiles::find_by_id(user.user_id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Profil introuvable"))?;

    Ok(ApiResponse::success("OK", Profile::from(profile), Some(Meta::empty())))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    let profile = Profiles::find_by_id(user.user_id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Profil introuvable"))?;

    let mut active: ProfileActive = profile.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(trimmed(Some(first_name)));
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(trimmed(Some(last_name)));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(trimmed(Some(phone)));
    }
    active.updated_at = Set(Utc::now().into());
    let profile = active.update(&*state.orm).await?;

    Ok(ApiResponse::success("Profil mis à jour", Profile::from(profile), Some(Meta::empty())))
}

pub async fn list_addresses(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(AddressCol::ProfileId.eq(user.user_id))
        .order_by_desc(AddressCol::IsDefault)
        .order_by_asc(AddressCol::CreatedAt)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    Ok(ApiResponse::success("OK", AddressList { items }, Some(Meta::empty())))
}

pub async fn add_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressInput,
) -> AppResult<ApiResponse<Address>> {
    let required = [
        &payload.first_name,
        &payload.last_name,
        &payload.street,
        &payload.city,
        &payload.postal_code,
    ];
    if required.iter().any(|v| v.trim().is_empty()) {
        return Err(AppError::bad_request("Champs requis manquants"));
    }

    let txn = state.orm.begin().await?;
    let existing = Addresses::find()
        .filter(AddressCol::ProfileId.eq(user.user_id))
        .count(&txn)
        .await?;
    let is_default = payload.is_default || existing == 0;

    if is_default && existing > 0 {
        Addresses::update_many()
            .col_expr(AddressCol::IsDefault, Expr::value(false))
            .filter(AddressCol::ProfileId.eq(user.user_id))
            .exec(&txn)
            .await?;
    }

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        profile_id: Set(user.user_id),
        label: Set(trimmed(payload.label)),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        street: Set(payload.street.trim().to_string()),
        street_2: Set(trimmed(payload.street_2)),
        city: Set(payload.city.trim().to_string()),
        postal_code: Set(payload.postal_code.trim().to_string()),
        country: Set(trimmed(payload.country).unwrap_or_else(|| "France".to_string())),
        is_default: Set(is_default),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Adresse ajoutée", Address::from(address), Some(Meta::empty())))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Addresses::delete_many()
        .filter(AddressCol::Id.eq(id))
        .filter(AddressCol::ProfileId.eq(user.user_id))
        .exec(&*state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Adresse introuvable"));
    }

    Ok(ApiResponse::success(
        "Adresse supprimée",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

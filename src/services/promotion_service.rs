use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::promotions::{
        CreatePromotionRequest, PromotionList, PromotionSummary, UpdatePromotionRequest,
        ValidatePromotionRequest,
    },
    entity::promotions::{
        ActiveModel as PromotionActive, Column as PromotionCol, Entity as Promotions,
        Model as PromotionModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_admin},
    models::{DiscountType, Promotion},
    response::{ApiResponse, Meta},
    routes::params::PageQuery,
    state::AppState,
};

/// Check the time window and minimum amount of an active promotion.
pub fn check_promotion(
    promo: &PromotionModel,
    order_total: i64,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if promo.starts_at.is_some_and(|start| start > now) {
        return Err(AppError::bad_request("Ce code promo n'est pas encore actif"));
    }
    if promo.ends_at.is_some_and(|end| end < now) {
        return Err(AppError::bad_request("Ce code promo a expiré"));
    }
    if let Some(min) = promo.min_order_amount {
        if order_total < min {
            return Err(AppError::bad_request(format!(
                "Montant minimum de commande : {}",
                crate::emails::format_price(min)
            )));
        }
    }
    Ok(())
}

pub async fn validate_code(
    state: &AppState,
    payload: ValidatePromotionRequest,
) -> AppResult<ApiResponse<PromotionSummary>> {
    let code = payload.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::bad_request("Code promo requis"));
    }

    let promo = Promotions::find()
        .filter(PromotionCol::Code.eq(code.as_str()))
        .filter(PromotionCol::IsActive.eq(true))
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Code promo invalide"))?;

    check_promotion(&promo, payload.order_total, Utc::now())?;

    Ok(ApiResponse::success(
        "Code promo valide",
        PromotionSummary {
            code,
            name: promo.name,
            discount_type: promo.discount_type,
            discount_value: promo.discount_value,
        },
        Some(Meta::empty()),
    ))
}

fn validate_discount(discount_type: DiscountType, value: i64) -> AppResult<()> {
    match discount_type {
        DiscountType::Percentage if !(1..=100).contains(&value) => {
            Err(AppError::bad_request("Le pourcentage doit être compris entre 1 et 100"))
        }
        DiscountType::Fixed if value <= 0 => {
            Err(AppError::bad_request("Le montant de la remise doit être positif"))
        }
        _ => Ok(()),
    }
}

pub async fn list_promotions(
    state: &AppState,
    user: &AuthUser,
    query: PageQuery,
) -> AppResult<ApiResponse<PromotionList>> {
    require_admin(&*state.orm, user).await?;
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Promotions::find().order_by_desc(PromotionCol::CreatedAt);
    let total = finder.clone().count(&*state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(Promotion::from)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        PromotionList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_promotion(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    require_admin(&*state.orm, user).await?;

    let code = payload.code.trim().to_uppercase();
    if code.is_empty() || payload.name.trim().is_empty() {
        return Err(AppError::bad_request("Nom et code requis"));
    }
    validate_discount(payload.discount_type, payload.discount_value)?;

    let exists = Promotions::find()
        .filter(PromotionCol::Code.eq(code.as_str()))
        .count(&*state.orm)
        .await?;
    if exists > 0 {
        return Err(AppError::bad_request("Ce code promo existe déjà"));
    }

    let promo = PromotionActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        code: Set(Some(code)),
        discount_type: Set(payload.discount_type.as_str().to_string()),
        discount_value: Set(payload.discount_value),
        is_active: Set(payload.is_active),
        starts_at: Set(payload.starts_at.map(Into::into)),
        ends_at: Set(payload.ends_at.map(Into::into)),
        min_order_amount: Set(payload.min_order_amount),
        created_at: NotSet,
    }
    .insert(&*state.orm)
    .await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "promotion_create",
        Some("promotions"),
        Some(serde_json::json!({ "promotion_id": promo.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Promotion créée",
        Promotion::from(promo),
        Some(Meta::empty()),
    ))
}

pub async fn update_promotion(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    require_admin(&*state.orm, user).await?;

    let promo = Promotions::find_by_id(id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Promotion introuvable"))?;

    if let Some(value) = payload.discount_value {
        let discount_type = promo.discount_type.parse::<DiscountType>()?;
        validate_discount(discount_type, value)?;
    }

    let mut active: PromotionActive = promo.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(value) = payload.discount_value {
        active.discount_value = Set(value);
    }
    if let Some(starts_at) = payload.starts_at {
        active.starts_at = Set(Some(starts_at.into()));
    }
    if let Some(ends_at) = payload.ends_at {
        active.ends_at = Set(Some(ends_at.into()));
    }
    if let Some(min) = payload.min_order_amount {
        active.min_order_amount = Set(Some(min));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    let promo = active.update(&*state.orm).await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "promotion_update",
        Some("promotions"),
        Some(serde_json::json!({ "promotion_id": promo.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Promotion mise à jour",
        Promotion::from(promo),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn promo(
        starts_in_days: Option<i64>,
        ends_in_days: Option<i64>,
        min_order_amount: Option<i64>,
    ) -> PromotionModel {
        let utc = FixedOffset::east_opt(0).unwrap();
        let now = Utc::now();
        PromotionModel {
            id: Uuid::new_v4(),
            name: "Rentrée".into(),
            description: None,
            code: Some("RENTREE10".into()),
            discount_type: "percentage".into(),
            discount_value: 10,
            is_active: true,
            starts_at: starts_in_days.map(|d| (now + Duration::days(d)).with_timezone(&utc)),
            ends_at: ends_in_days.map(|d| (now + Duration::days(d)).with_timezone(&utc)),
            min_order_amount,
            created_at: now.with_timezone(&utc),
        }
    }

    #[test]
    fn open_ended_promotion_is_valid() {
        assert!(check_promotion(&promo(None, None, None), 1_000, Utc::now()).is_ok());
        assert!(check_promotion(&promo(Some(-1), Some(1), None), 1_000, Utc::now()).is_ok());
    }

    #[test]
    fn window_is_enforced() {
        let not_started = check_promotion(&promo(Some(2), None, None), 1_000, Utc::now());
        assert!(matches!(not_started, Err(AppError::BadRequest(m)) if m.contains("pas encore")));
        let expired = check_promotion(&promo(None, Some(-2), None), 1_000, Utc::now());
        assert!(matches!(expired, Err(AppError::BadRequest(m)) if m.contains("expiré")));
    }

    #[test]
    fn minimum_amount_is_enforced() {
        let p = promo(None, None, Some(10_000));
        assert!(check_promotion(&p, 9_999, Utc::now()).is_err());
        assert!(check_promotion(&p, 10_000, Utc::now()).is_ok());
    }

    #[test]
    fn discount_values_are_bounded() {
        assert!(validate_discount(DiscountType::Percentage, 0).is_err());
        assert!(validate_discount(DiscountType::Percentage, 101).is_err());
        assert!(validate_discount(DiscountType::Percentage, 15).is_ok());
        assert!(validate_discount(DiscountType::Fixed, -5).is_err());
        assert!(validate_discount(DiscountType::Fixed, 1_000).is_ok());
    }
}

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        account::CustomerList,
        admin::UpdateOrderStatusRequest,
        orders::{OrderDetail, OrderList},
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        profiles::{Column as ProfileCol, Entity as Profiles},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_admin},
    models::{Order, Profile},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, PageQuery, SortOrder},
    services::order_service::{append_history, load_detail},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    require_admin(&*state.orm, user).await?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&*state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    require_admin(&*state.orm, user).await?;
    let order = Orders::find_by_id(id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Commande introuvable"))?;

    let detail = load_detail(&*state.orm, order).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    require_admin(&*state.orm, user).await?;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Commande introuvable"))?;
    let previous = order.status.clone();

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status.as_str().to_string());
    if let Some(tracking) = payload
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        active.tracking_number = Set(Some(tracking.to_string()));
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    let comment = payload
        .comment
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| format!("Statut mis à jour : {}", payload.status.label()));
    append_history(&txn, order.id, payload.status, Some(&comment)).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        from = %previous,
        to = %payload.status,
        "order status updated"
    );

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "from": previous,
            "to": payload.status.as_str(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order status updated",
        Order::try_from(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
    query: PageQuery,
) -> AppResult<ApiResponse<CustomerList>> {
    require_admin(&*state.orm, user).await?;
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Profiles::find().order_by_desc(ProfileCol::CreatedAt);
    let total = finder.clone().count(&*state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(Profile::from)
        .collect();

    Ok(ApiResponse::success(
        "Customers",
        CustomerList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

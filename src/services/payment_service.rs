//! Alma installment payments: session creation, IPN webhook and return verification.
//!
//! Both confirmation paths funnel into [`apply_payment_transition`], a single
//! conditional update guarded on `en_attente_paiement`, so concurrent or repeated
//! confirmations append at most one history row.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    clients::alma::{
        ALLOWED_INSTALLMENTS, AlmaAddress, CustomData, Customer, MerchantOrder, PaymentRequest,
        PaymentSpec,
    },
    dto::payments::{
        CreatePaymentRequest, CreatePaymentResponse, VerifyPaymentQuery, VerifyPaymentResponse,
        WebhookAck, WebhookPayload,
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        profiles::Entity as Profiles,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentMethod},
    response::{ApiResponse, Meta},
    services::order_service::append_history,
    state::AppState,
};

pub const PENDING_MESSAGE: &str = "Paiement en attente de confirmation";

/// Map an Alma payment state to the order status it implies, if any.
pub fn map_payment_state(state: &str) -> Option<OrderStatus> {
    match state {
        "in_progress" | "paid" => Some(OrderStatus::Payee),
        "refunded" => Some(OrderStatus::Remboursee),
        _ => None,
    }
}

/// Move an order out of `en_attente_paiement` and record it.
///
/// Returns `false` when the order was no longer pending, in which case nothing is written.
pub async fn apply_payment_transition<C>(
    conn: &C,
    order_id: Uuid,
    new_status: OrderStatus,
    comment: &str,
) -> AppResult<bool>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = conn.begin().await?;

    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(new_status.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(OrderCol::Id.eq(order_id))
        .filter(OrderCol::Status.eq(OrderStatus::EnAttentePaiement.as_str()))
        .exec(&txn)
        .await?;

    let applied = result.rows_affected == 1;
    if applied {
        append_history(&txn, order_id, new_status, Some(comment)).await?;
    }
    txn.commit().await?;

    Ok(applied)
}

pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<CreatePaymentResponse>> {
    if !ALLOWED_INSTALLMENTS.contains(&payload.installments) {
        return Err(AppError::bad_request(
            "Nombre d'échéances invalide (1, 2, 3, 4 ou 12)",
        ));
    }

    let order = find_owned_order(state, user, payload.order_id).await?;
    if order.status != OrderStatus::EnAttentePaiement.as_str() {
        return Err(AppError::bad_request("Cette commande a déjà été payée"));
    }

    let profile = Profiles::find_by_id(user.user_id).one(&*state.orm).await?;
    let (first_name, last_name, email, phone) = match profile {
        Some(p) => (
            p.first_name.unwrap_or_default(),
            p.last_name.unwrap_or_default(),
            p.email,
            p.phone,
        ),
        None => (
            String::new(),
            String::new(),
            user.email.clone().unwrap_or_default(),
            None,
        ),
    };

    let site = &state.config.site_url;
    let request = PaymentRequest {
        payment: PaymentSpec {
            purchase_amount: order.total,
            installments_count: payload.installments,
            return_url: format!("{site}/panier/checkout/alma-retour?orderId={}", order.id),
            customer_cancel_url: format!("{site}/panier/checkout?cancelled=true"),
            ipn_callback_url: format!("{site}/api/alma/webhook"),
            locale: "fr".to_string(),
            custom_data: CustomData {
                order_id: Some(order.id.to_string()),
                order_number: Some(order.order_number.clone()),
            },
        },
        customer: Customer {
            first_name,
            last_name,
            email,
            phone,
        },
        order: MerchantOrder {
            merchant_reference: order.order_number.clone(),
        },
        shipping_address: shipping_address(&order),
    };

    let payment = state
        .alma
        .create_payment(&request)
        .await
        .map_err(|err| AppError::Upstream(format!("alma create payment: {err}")))?;

    let payment_url = payment
        .url
        .clone()
        .ok_or_else(|| AppError::Upstream(format!("alma payment {} has no url", payment.id)))?;

    let order_id = order.id;
    let mut active: OrderActive = order.into();
    active.alma_payment_id = Set(Some(payment.id.clone()));
    active.payment_method = Set(PaymentMethod::Alma.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    active.update(&*state.orm).await?;

    tracing::info!(
        order_id = %order_id,
        payment_id = %payment.id,
        installments = payload.installments,
        "alma payment created"
    );

    Ok(ApiResponse::success(
        "Paiement créé",
        CreatePaymentResponse {
            payment_url,
            payment_id: payment.id,
        },
        Some(Meta::empty()),
    ))
}

fn shipping_address(order: &OrderModel) -> Option<AlmaAddress> {
    let street = order.shipping_street.clone().filter(|s| !s.is_empty())?;
    let country = match order.shipping_country.as_deref() {
        None | Some("") | Some("France") => "FR".to_string(),
        Some(other) => other.to_string(),
    };
    Some(AlmaAddress {
        first_name: order.shipping_first_name.clone(),
        last_name: order.shipping_last_name.clone(),
        line1: street,
        line2: order.shipping_street_2.clone().filter(|s| !s.is_empty()),
        postal_code: order.shipping_postal_code.clone(),
        city: order.shipping_city.clone(),
        country,
    })
}

/// Process an Alma IPN. The body only tells us which payment changed; its state is
/// always re-read from Alma.
pub async fn handle_webhook(state: &AppState, body: &[u8]) -> AppResult<WebhookAck> {
    let payload: WebhookPayload = serde_json::from_slice(body)
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let payment_id = payload
        .payment_id()
        .ok_or_else(|| AppError::bad_request("Missing payment ID"))?;

    tracing::info!(payment_id, "alma webhook received");

    let payment = state
        .alma
        .get_payment(payment_id)
        .await
        .map_err(|err| AppError::Upstream(format!("alma get payment {payment_id}: {err}")))?;

    let ignored = WebhookAck {
        received: true,
        applied_status: None,
    };

    let Some(order_id) = payment.order_id().and_then(|id| Uuid::parse_str(id).ok()) else {
        tracing::warn!(payment_id, state = %payment.state, "alma payment carries no usable order_id");
        return Ok(ignored);
    };

    let Some(new_status) = map_payment_state(&payment.state) else {
        if payment.state == "default" {
            tracing::warn!(payment_id, order_id = %order_id, "alma payment in default state");
        } else {
            tracing::info!(payment_id, order_id = %order_id, state = %payment.state, "alma state not handled");
        }
        return Ok(ignored);
    };

    if Orders::find_by_id(order_id).one(&*state.orm).await?.is_none() {
        tracing::warn!(payment_id, order_id = %order_id, "alma webhook for unknown order");
        return Ok(ignored);
    }

    let comment = format!("Paiement Alma confirmé ({}) - ID: {}", payment.state, payment.id);
    let applied = apply_payment_transition(&*state.orm, order_id, new_status, &comment).await?;

    if applied {
        tracing::info!(order_id = %order_id, status = %new_status, "order updated from alma webhook");
        Ok(WebhookAck {
            received: true,
            applied_status: Some(new_status),
        })
    } else {
        tracing::info!(order_id = %order_id, "order no longer pending, webhook skipped");
        Ok(ignored)
    }
}

/// Confirm a payment when the shopper comes back from Alma, without waiting for the IPN.
pub async fn verify_return(
    state: &AppState,
    user: &AuthUser,
    query: VerifyPaymentQuery,
) -> AppResult<ApiResponse<VerifyPaymentResponse>> {
    let order = find_owned_order(state, user, query.order_id).await?;
    let status: OrderStatus = order
        .status
        .parse()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("order {} has unknown status", order.id)))?;

    if status.is_paid() {
        return Ok(confirmed(order.order_number, status));
    }

    if let Some(payment_id) = order.alma_payment_id.as_deref() {
        match state.alma.get_payment(payment_id).await {
            Ok(payment) if map_payment_state(&payment.state) == Some(OrderStatus::Payee) => {
                let comment = format!(
                    "Paiement Alma confirmé (vérifié au retour) - ID: {payment_id}"
                );
                let applied =
                    apply_payment_transition(&*state.orm, order.id, OrderStatus::Payee, &comment)
                        .await?;
                if applied {
                    tracing::info!(order_id = %order.id, "order confirmed on alma return");
                    return Ok(confirmed(order.order_number, OrderStatus::Payee));
                }
                // Lost the race: report whatever the winner wrote.
                let current = Orders::find_by_id(order.id)
                    .one(&*state.orm)
                    .await?
                    .and_then(|o| o.status.parse::<OrderStatus>().ok())
                    .unwrap_or(OrderStatus::Payee);
                if current.is_paid() {
                    return Ok(confirmed(order.order_number, current));
                }
            }
            Ok(payment) => {
                tracing::debug!(order_id = %order.id, state = %payment.state, "alma payment not confirmed yet");
            }
            Err(err) => {
                tracing::warn!(order_id = %order.id, error = %err, "alma verification failed");
            }
        }
    }

    Ok(ApiResponse::success(
        PENDING_MESSAGE,
        VerifyPaymentResponse {
            confirmed: false,
            order_number: order.order_number,
            status,
            message: Some(PENDING_MESSAGE.to_string()),
        },
        Some(Meta::empty()),
    ))
}

fn confirmed(order_number: String, status: OrderStatus) -> ApiResponse<VerifyPaymentResponse> {
    ApiResponse::success(
        "Paiement confirmé",
        VerifyPaymentResponse {
            confirmed: true,
            order_number,
            status,
            message: None,
        },
        Some(Meta::empty()),
    )
}

async fn find_owned_order(state: &AppState, user: &AuthUser, order_id: Uuid) -> AppResult<OrderModel> {
    Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order_id))
                .add(OrderCol::ProfileId.eq(user.user_id)),
        )
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Commande introuvable"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alma_states_map_to_order_statuses() {
        assert_eq!(map_payment_state("in_progress"), Some(OrderStatus::Payee));
        assert_eq!(map_payment_state("paid"), Some(OrderStatus::Payee));
        assert_eq!(map_payment_state("refunded"), Some(OrderStatus::Remboursee));
        assert_eq!(map_payment_state("default"), None);
        assert_eq!(map_payment_state("not_started"), None);
    }
}

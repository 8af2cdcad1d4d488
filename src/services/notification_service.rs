use sea_orm::EntityTrait;

use crate::{
    dto::admin::{NotifyRequest, NotifyResponse},
    emails::{Email, Templates},
    entity::{orders::Entity as Orders, profiles::Entity as Profiles},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_admin},
    models::OrderStatus,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Pick the customer email for a status, if that status warrants one.
pub fn email_for_status(
    templates: &Templates<'_>,
    status: OrderStatus,
    order_number: &str,
    first_name: &str,
    tracking_number: Option<&str>,
) -> Option<Email> {
    match status {
        OrderStatus::Expediee => Some(templates.order_shipped(order_number, first_name, tracking_number)),
        OrderStatus::PreteEnBoutique => Some(templates.order_ready(order_number, first_name)),
        _ => None,
    }
}

pub async fn notify_status(
    state: &AppState,
    user: &AuthUser,
    payload: NotifyRequest,
) -> AppResult<ApiResponse<NotifyResponse>> {
    require_admin(&*state.orm, user).await?;

    let (order, profile) = Orders::find_by_id(payload.order_id)
        .find_also_related(Profiles)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Commande introuvable"))?;

    let not_sent = || {
        ApiResponse::success(
            "Aucun email envoyé",
            NotifyResponse { email_sent: false },
            Some(Meta::empty()),
        )
    };

    let Some(profile) = profile.filter(|p| !p.email.is_empty()) else {
        tracing::info!(order_id = %order.id, "customer has no email, notification skipped");
        return Ok(not_sent());
    };

    let templates = Templates::new(&state.config.site_url);
    let tracking = payload
        .tracking_number
        .as_deref()
        .or(order.tracking_number.as_deref());
    let Some(email) = email_for_status(
        &templates,
        payload.status,
        &order.order_number,
        profile.first_name.as_deref().unwrap_or("Client"),
        tracking,
    ) else {
        return Ok(not_sent());
    };

    state
        .mailer
        .send(&profile.email, &email)
        .await
        .map_err(|err| AppError::Upstream(format!("status email for {}: {err}", order.order_number)))?;

    tracing::info!(order_id = %order.id, status = %payload.status, "status email sent");

    Ok(ApiResponse::success(
        "Email envoyé",
        NotifyResponse { email_sent: true },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_shipping_and_pickup_statuses_send_mail() {
        let templates = Templates::new("https://shop.test");
        for status in OrderStatus::ALL {
            let email = email_for_status(&templates, status, "VO-2026-0001", "Claire", None);
            let expected = matches!(status, OrderStatus::Expediee | OrderStatus::PreteEnBoutique);
            assert_eq!(email.is_some(), expected, "{status}");
        }
    }
}

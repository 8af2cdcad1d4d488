use sea_orm::{EntityTrait, Set};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use uuid::Uuid;

use crate::{
    dto::contact::{Accepted, AppointmentRequest, NewsletterRequest},
    emails::Templates,
    entity::newsletter_subscribers::{
        ActiveModel as SubscriberActive, Column as SubscriberCol, Entity as Subscribers,
    },
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Loose shape check: something@something.tld, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn accepted() -> ApiResponse<Accepted> {
    ApiResponse::success("OK", Accepted { success: true }, Some(Meta::empty()))
}

pub async fn request_appointment(
    state: &AppState,
    payload: AppointmentRequest,
) -> AppResult<ApiResponse<Accepted>> {
    let required = [
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        &payload.phone,
        &payload.reason,
    ];
    if required.iter().any(|v| v.trim().is_empty()) {
        return Err(AppError::bad_request("Champs requis manquants"));
    }
    if !is_valid_email(&payload.email) {
        return Err(AppError::bad_request("Email invalide"));
    }

    let templates = Templates::new(&state.config.site_url);
    let to_customer = templates.appointment_confirmation(&payload);
    let to_shop = templates.appointment_notification(&payload);

    let (customer, shop) = tokio::join!(
        state.mailer.send(&payload.email, &to_customer),
        state.mailer.send(&state.config.shop_email, &to_shop),
    );
    if let Err(err) = customer {
        tracing::warn!(error = %err, "appointment confirmation email failed");
    }
    if let Err(err) = shop {
        tracing::warn!(error = %err, "appointment shop notification failed");
    }

    tracing::info!(reason = %payload.reason, "appointment requested");
    Ok(accepted())
}

pub async fn subscribe_newsletter(
    state: &AppState,
    payload: NewsletterRequest,
    remote_ip: Option<&str>,
) -> AppResult<ApiResponse<Accepted>> {
    let token = payload.turnstile_token.as_deref().unwrap_or_default();
    let human = match state.captcha.verify(token, remote_ip).await {
        Ok(ok) => ok,
        Err(err) => {
            tracing::warn!(error = %err, "captcha verification error");
            false
        }
    };
    if !human {
        return Err(AppError::Forbidden);
    }

    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("Email invalide"));
    }

    let inserted = Subscribers::insert(SubscriberActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(SubscriberCol::Email)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&*state.orm)
    .await?;

    if inserted == 0 {
        tracing::debug!("newsletter subscriber already present");
        return Ok(accepted());
    }

    let welcome = Templates::new(&state.config.site_url).newsletter_welcome();
    if let Err(err) = state.mailer.send(&email, &welcome).await {
        tracing::warn!(error = %err, "newsletter welcome email failed");
    }

    Ok(accepted())
}

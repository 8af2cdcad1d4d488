use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::header,
    http::request::Parts,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use sea_orm::{ConnectionTrait, EntityTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entity::profiles::{Entity as Profiles, Model as ProfileModel},
    error::{AppError, AppResult},
    state::AppState,
};

/// Claims issued by the authentication provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Verify an HS256 bearer token and extract the caller.
pub fn decode_token(secret: &str, audience: &str, token: &str) -> AppResult<AuthUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        AppError::Unauthorized
    })?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        email: decoded.claims.email,
    })
}

/// Load the caller's profile and reject anyone whose role is not `admin`.
pub async fn require_admin<C: ConnectionTrait>(conn: &C, user: &AuthUser) -> AppResult<ProfileModel> {
    let profile = Profiles::find_by_id(user.user_id).one(conn).await?;
    match profile {
        Some(p) if p.role == "admin" => Ok(p),
        _ => {
            tracing::warn!(user_id = %user.user_id, "admin access denied");
            Err(AppError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        decode_token(&state.config.jwt_secret, &state.config.jwt_audience, token)
    }
}

/// Public routes that personalise their answer take `Option<AuthUser>`; a missing or
/// unusable token means an anonymous caller.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(<AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, aud: &str, exp_offset: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + exp_offset;
        let claims = serde_json::json!({
            "sub": sub,
            "email": "client@example.com",
            "aud": aud,
            "exp": exp,
        });
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_user() {
        let id = Uuid::new_v4();
        let user = decode_token(SECRET, "authenticated", &token(&id.to_string(), "authenticated", 3600)).unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.email.as_deref(), Some("client@example.com"));
    }

    #[test]
    fn wrong_audience_or_expired_token_is_unauthorized() {
        let id = Uuid::new_v4().to_string();
        assert!(matches!(
            decode_token(SECRET, "authenticated", &token(&id, "anon", 3600)),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            decode_token(SECRET, "authenticated", &token(&id, "authenticated", -3600)),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            decode_token("other-secret", "authenticated", &token(&id, "authenticated", 3600)),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn non_uuid_subject_is_unauthorized() {
        assert!(matches!(
            decode_token(SECRET, "authenticated", &token("not-a-uuid", "authenticated", 3600)),
            Err(AppError::Unauthorized)
        ));
    }
}

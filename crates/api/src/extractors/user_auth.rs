//! User JWT authentication extractors.
//!
//! Bearer tokens are minted by the external identity service; this module
//! only validates them and resolves the caller's role through the store's
//! identity directory.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use shared::jwt::{extract_user_id, JwtConfig};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::RequestSpan;

/// Authenticated user information from JWT.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: i64,
    /// JWT ID (jti) for log correlation.
    pub jti: String,
}

impl UserAuth {
    /// Validates a raw bearer token.
    pub fn validate(jwt: &JwtConfig, token: &str) -> Result<Self, ApiError> {
        let claims = jwt
            .validate_access_token(token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
        let user_id = extract_user_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;
        Ok(Self {
            user_id,
            jti: claims.jti,
        })
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(header) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;
    header
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(auth.clone());
        }

        let token = bearer_token(parts)?
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        let auth = UserAuth::validate(&state.jwt, token)?;

        if let Some(RequestSpan(span)) = parts.extensions.get::<RequestSpan>() {
            span.record("user_id", auth.user_id);
            span.record("jti", auth.jti.as_str());
        }
        parts.extensions.insert(auth.clone());
        Ok(auth)
    }
}

/// Optional user JWT authentication.
///
/// Anonymous requests pass through as `None`. A token that is present but
/// invalid is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalUserAuth(pub Option<UserAuth>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if bearer_token(parts)?.is_none() {
            return Ok(OptionalUserAuth(None));
        }
        UserAuth::from_request_parts(parts, state)
            .await
            .map(|auth| OptionalUserAuth(Some(auth)))
    }
}

/// Authenticated caller holding an organizer profile.
#[derive(Debug, Clone)]
pub struct OrganizerAuth {
    pub organizer_id: i64,
}

#[async_trait]
impl FromRequestParts<AppState> for OrganizerAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = UserAuth::from_request_parts(parts, state).await?;
        if !state.store.is_organizer(auth.user_id).await? {
            return Err(ApiError::Forbidden("Organizer account required".to_string()));
        }
        Ok(Self {
            organizer_id: auth.user_id,
        })
    }
}

impl OrganizerAuth {
    /// Resolves an event owner and checks it is this organizer.
    pub fn ensure_owner(&self, owner: Option<i64>, entity: &str) -> Result<(), ApiError> {
        match owner {
            None => Err(ApiError::NotFound(format!("{} not found", entity))),
            Some(owner) if owner == self.organizer_id => Ok(()),
            Some(_) => Err(ApiError::Forbidden(format!(
                "{} belongs to another organizer",
                entity
            ))),
        }
    }
}

/// Authenticated caller allowed to book, i.e. not an organizer.
#[derive(Debug, Clone)]
pub struct AttendeeAuth {
    pub user_id: i64,
}

#[async_trait]
impl FromRequestParts<AppState> for AttendeeAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = UserAuth::from_request_parts(parts, state).await?;
        if state.store.is_organizer(auth.user_id).await? {
            return Err(ApiError::OrganizerCannotBook);
        }
        Ok(Self {
            user_id: auth.user_id,
        })
    }
}

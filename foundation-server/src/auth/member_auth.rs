//! Member JWT authentication for dashboard routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::HeaderMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Member, MemberRole, MemberStatus};

use crate::error::ServiceError;
use crate::state::AppState;

/// JWT claims for a member session
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberClaims {
    /// Member internal id
    pub sub: String,
    pub email: String,
    pub role: MemberRole,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated member extracted from the bearer token
#[derive(Debug, Clone)]
pub struct MemberIdentity {
    pub member_id: i64,
    pub email: String,
    pub role: MemberRole,
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a session token for a member
pub fn create_token(member: &Member, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = MemberClaims {
        sub: member.id.to_string(),
        email: member.email.clone(),
        role: member.role(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and verify a session token
pub fn decode_token(token: &str, secret: &str) -> Result<MemberIdentity, AppError> {
    let token_data = jsonwebtoken::decode::<MemberClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::new(ErrorCode::TokenExpired)
            }
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })?;

    let member_id = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::new(ErrorCode::TokenInvalid))?;

    Ok(MemberIdentity {
        member_id,
        email: token_data.claims.email,
        role: token_data.claims.role,
    })
}

/// Identity from an `Authorization: Bearer` header
pub fn identity_from_headers(headers: &HeaderMap, secret: &str) -> Result<MemberIdentity, AppError> {
    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(AppError::not_authenticated)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::new(ErrorCode::TokenInvalid))?;

    decode_token(token, secret)
}

/// Load the member behind a session. A suspension takes effect before the token expires.
pub async fn load_active_member(state: &AppState, member_id: i64) -> Result<Member, AppError> {
    let member = state
        .store
        .find_member_by_id(member_id)
        .await
        .map_err(|e| AppError::from(ServiceError::from(e)))?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
    if member.status() == MemberStatus::Suspended {
        tracing::info!(member_id, "Session rejected: account suspended");
        return Err(AppError::new(ErrorCode::AccountSuspended));
    }
    Ok(member)
}

/// Middleware that verifies the member JWT and stores [`MemberIdentity`] in extensions
pub async fn member_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let identity = identity_from_headers(request.headers(), &state.jwt_secret)
        .map_err(IntoResponse::into_response)?;
    load_active_member(&state, identity.member_id)
        .await
        .map_err(IntoResponse::into_response)?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

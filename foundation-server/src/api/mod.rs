//! HTTP API
//!
//! Public routes: donation processing, registration, OTP and password reset,
//! login. Member routes under `/api/member/*` require a bearer token.

pub mod donation;
pub mod health;
pub mod member;
pub mod otp;
pub mod password;
pub mod register;

use axum::extract::{DefaultBodyLimit, FromRequest, Request};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use http::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use shared::error::AppError;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::member_auth::member_auth_middleware;
use crate::auth::rate_limit::{login_rate_limit, otp_rate_limit, register_rate_limit};
use crate::state::AppState;
use crate::uploads::MAX_PHOTO_SIZE;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// JSON body extractor whose rejection uses the API error shape
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::invalid_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // OTP issuance (rate limited)
    let otp = Router::new()
        .route("/api/send-otp", post(otp::send_otp))
        .route(
            "/api/send-password-reset-otp",
            post(password::send_password_reset_otp),
        )
        .layer(middleware::from_fn_with_state(state.clone(), otp_rate_limit));

    // Registration (rate limited, multipart with photo)
    let registration = Router::new()
        .route("/api/member-register", post(register::member_register))
        .layer(DefaultBodyLimit::max(MAX_PHOTO_SIZE + 64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));

    let login = Router::new()
        .route("/api/member-login", post(member::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    // Code verification and reset (no auth)
    let verification = Router::new()
        .route("/api/verify-otp", post(otp::verify_otp))
        .route(
            "/api/verify-password-reset-otp",
            post(password::verify_password_reset_otp),
        )
        .route("/api/reset-password", post(password::reset_password));

    // Member dashboard (JWT authenticated)
    let member = Router::new()
        .route("/api/member/profile", get(member::profile))
        .route("/api/member/donations", get(member::donations))
        .route("/api/member/referrals", get(member::referrals))
        .route("/api/member/change-password", post(member::change_password))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            member_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/donation-process", post(donation::process_donation))
        .merge(otp)
        .merge(registration)
        .merge(login)
        .merge(verification)
        .merge(member)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .with_state(state)
}

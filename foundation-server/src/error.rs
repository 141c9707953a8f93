//! Unified service-layer error type
//!
//! `ServiceError` bridges store errors (`StoreError`, `sqlx::Error`, `BoxError`)
//! and the API-layer error (`AppError`) so services and handlers can use `?`.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::{StoreError, UniqueField};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a service call.
///
/// `Db` never reaches the client verbatim: it is logged and answered with
/// `InternalError`. `App` carries the member-facing code as is.
#[derive(Debug)]
pub enum ServiceError {
    /// Store, hashing or serialization failure
    Db(BoxError),
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(field) => ServiceError::App(conflict_error(field)),
            StoreError::Missing(what) => ServiceError::App(AppError::not_found(what)),
            StoreError::Database(db) => ServiceError::Db(db.into()),
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Db(e) => write!(f, "database error: {e}"),
            ServiceError::App(e) => write!(f, "{e}"),
        }
    }
}

/// The error a unique-key violation surfaces as
pub fn conflict_error(field: UniqueField) -> AppError {
    match field {
        UniqueField::Email => AppError::new(ErrorCode::EmailAlreadyRegistered),
        UniqueField::Mobile => AppError::new(ErrorCode::MobileAlreadyRegistered),
        UniqueField::MembershipId => AppError::new(ErrorCode::MembershipIdConflict),
        UniqueField::DonationId => {
            AppError::with_message(ErrorCode::AlreadyExists, "Donation id already allocated")
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<argon2::password_hash::Error> for ServiceError {
    fn from(e: argon2::password_hash::Error) -> Self {
        ServiceError::Db(format!("password hashing failed: {e}").into())
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_conflicts_become_member_codes() {
        let err: AppError = ServiceError::from(StoreError::Conflict(UniqueField::Mobile)).into();
        assert_eq!(err.code, ErrorCode::MobileAlreadyRegistered);
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
    }

    #[test]
    fn database_failures_hide_details() {
        let err: AppError = ServiceError::from(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("pool"));
    }
}

//! Unified error system
//!
//! - [`ErrorCode`]: standardized numeric codes
//! - [`ErrorCategory`]: classification by code range
//! - [`AppError`]: error with code, message and extra body fields
//! - [`ErrorBody`]: the JSON shape clients receive
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::EmailAlreadyRegistered)
//!     .with_detail("action", "login")
//!     .with_detail("email", "donor@example.com");
//! assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult, ErrorBody};

//! Member sessions, verification tokens and request throttling

pub mod member_auth;
pub mod rate_limit;
pub mod verification_token;

pub use member_auth::MemberIdentity;
pub use rate_limit::RateLimiter;

//! Business workflows behind the HTTP handlers
//!
//! Each function takes the [`AppState`](crate::state::AppState) and an
//! explicit `now` (epoch millis) so expiry and numbering can be tested
//! without a clock.

pub mod accounts;
pub mod donations;
pub mod ids;
pub mod outbox;
pub mod reconcile;
pub mod referral;
pub mod registration;
pub mod verification;

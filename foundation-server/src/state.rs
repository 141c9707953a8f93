//! Application state

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::RateLimiter;
use crate::config::{Config, MailTransport};
use crate::db::{MemoryStore, PgStore, Store};
use crate::email::{EmailService, LogMailer, Mailer, SesMailer};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Members, donations, codes, sequences and the outbox
    pub store: Arc<dyn Store>,
    /// Transactional email
    pub email: EmailService,
    /// JWT secret for member sessions and verification tokens
    pub jwt_secret: String,
    /// Rate limiter for OTP, registration and login routes
    pub rate_limiter: RateLimiter,
    pub membership_id_prefix: String,
    pub donation_id_prefix: String,
    pub min_donation_amount: i64,
    pub otp_ttl_secs: i64,
    pub upload_dir: PathBuf,
    /// Deliver post-commit email on spawned tasks instead of inline
    pub background_notifications: bool,
}

impl AppState {
    /// Create a new AppState: PostgreSQL when `DATABASE_URL` is set, memory otherwise
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => Arc::new(PgStore::connect(url).await?),
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store (data is not persisted)");
                Arc::new(MemoryStore::new())
            }
        };

        let mailer: Arc<dyn Mailer> = match config.mail_transport {
            MailTransport::Ses => Arc::new(
                SesMailer::from_env(config.mail_from.clone(), config.ses_region.clone()).await,
            ),
            MailTransport::Log => Arc::new(LogMailer),
        };

        Ok(Self::with_parts(config, store, mailer))
    }

    /// Assemble state from an already-built store and mailer
    pub fn with_parts(config: &Config, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            email: EmailService::new(mailer, &config.org_name, &config.public_base_url),
            jwt_secret: config.jwt_secret.clone(),
            rate_limiter: RateLimiter::new(),
            membership_id_prefix: config.membership_id_prefix.clone(),
            donation_id_prefix: config.donation_id_prefix.clone(),
            min_donation_amount: config.min_donation_amount,
            otp_ttl_secs: config.otp_ttl_secs,
            upload_dir: PathBuf::from(&config.upload_dir),
            background_notifications: config.background_notifications,
        }
    }
}

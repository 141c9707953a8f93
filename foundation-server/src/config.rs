//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shortest verification code lifetime accepted from the environment
const MIN_OTP_TTL_SECS: i64 = 60;

/// Which mail transport delivers outgoing email
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransport {
    /// AWS SES (production)
    Ses,
    /// Log recipient and subject only (development)
    Log,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; `None` selects the in-memory store (development only)
    pub database_url: Option<String>,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for member sessions and verification tokens
    pub jwt_secret: String,
    /// Mail transport
    pub mail_transport: MailTransport,
    /// Sender address for all outgoing mail
    pub mail_from: String,
    /// SES region override (env: SES_REGION)
    pub ses_region: Option<String>,
    /// Public site URL used for links inside emails
    pub public_base_url: String,
    /// Organization name used in email copy
    pub org_name: String,
    /// Membership id prefix, e.g. `FDN` → `FDN20260001`
    pub membership_id_prefix: String,
    /// Donation id prefix, e.g. `DON` → `DON2026000001`
    pub donation_id_prefix: String,
    /// Smallest accepted donation, whole currency units
    pub min_donation_amount: i64,
    /// Verification code lifetime
    pub otp_ttl_secs: i64,
    /// Directory for registration photos
    pub upload_dir: String,
    /// Deliver post-commit emails on spawned tasks (false: best-effort inline)
    pub background_notifications: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, BoxError> {
        match std::env::var(name) {
            Ok(v) if !v.is_empty() => v
                .parse()
                .map_err(|_| format!("{name} has an invalid value: {v}").into()),
            _ => Ok(default),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if database_url.is_none() && environment != "development" {
            return Err(format!("DATABASE_URL must be set in {environment} environment").into());
        }

        let mail_transport = match std::env::var("MAIL_TRANSPORT").as_deref() {
            Ok("ses") => MailTransport::Ses,
            Ok("log") => MailTransport::Log,
            Ok(other) => return Err(format!("Unknown MAIL_TRANSPORT: {other}").into()),
            Err(_) if environment == "development" => MailTransport::Log,
            Err(_) => MailTransport::Ses,
        };

        let config = Self {
            database_url,
            http_port: Self::parse_or("HTTP_PORT", 8080)?,
            environment: environment.clone(),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            mail_transport,
            mail_from: std::env::var("SES_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@foundation.example".into()),
            ses_region: std::env::var("SES_REGION").ok().filter(|s| !s.is_empty()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into())
                .trim_end_matches('/')
                .to_string(),
            org_name: std::env::var("ORG_NAME").unwrap_or_else(|_| "The Foundation".into()),
            membership_id_prefix: std::env::var("MEMBERSHIP_ID_PREFIX")
                .unwrap_or_else(|_| "FDN".into()),
            donation_id_prefix: std::env::var("DONATION_ID_PREFIX")
                .unwrap_or_else(|_| "DON".into()),
            min_donation_amount: Self::parse_or("MIN_DONATION_AMOUNT", 100)?,
            otp_ttl_secs: Self::parse_or("OTP_TTL_SECS", 600)?,
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            background_notifications: Self::parse_or("BACKGROUND_NOTIFICATIONS", true)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Range checks on numeric settings
    pub fn validate(&self) -> Result<(), BoxError> {
        if self.min_donation_amount < 1 {
            return Err("MIN_DONATION_AMOUNT must be positive".into());
        }
        if self.otp_ttl_secs < MIN_OTP_TTL_SECS {
            return Err(format!("OTP_TTL_SECS must be at least {MIN_OTP_TTL_SECS}").into());
        }
        Ok(())
    }

    /// Development defaults with the in-memory store and log mailer
    pub fn development() -> Self {
        Self {
            database_url: None,
            http_port: 8080,
            environment: "development".into(),
            jwt_secret: "dev-JWT_SECRET-not-for-production".into(),
            mail_transport: MailTransport::Log,
            mail_from: "noreply@foundation.example".into(),
            ses_region: None,
            public_base_url: "http://localhost:3000".into(),
            org_name: "The Foundation".into(),
            membership_id_prefix: "FDN".into(),
            donation_id_prefix: "DON".into(),
            min_donation_amount: 100,
            otp_ttl_secs: 600,
            upload_dir: "uploads".into(),
            background_notifications: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_are_valid() {
        assert!(Config::development().validate().is_ok());
    }

    #[test]
    fn rejects_short_otp_lifetime() {
        for ttl in [-1, 0, 59] {
            let config = Config {
                otp_ttl_secs: ttl,
                ..Config::development()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("OTP_TTL_SECS"));
        }
        let config = Config {
            otp_ttl_secs: 60,
            ..Config::development()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_minimum_donation() {
        let config = Config {
            min_donation_amount: 0,
            ..Config::development()
        };
        assert!(config.validate().is_err());
    }
}

//! Notification outbox entries

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Thank-you / receipt mail for a recorded donation
    DonationReceipt,
    /// Account-created mail without credentials (fallback when the
    /// welcome mail carrying the generated password could not be sent)
    WelcomeNotice,
}

impl NotificationKind {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "donation_receipt" => Some(Self::DonationReceipt),
            "welcome_notice" => Some(Self::WelcomeNotice),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::DonationReceipt => "donation_receipt",
            Self::WelcomeNotice => "welcome_notice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    /// Gave up after the maximum number of attempts
    Failed,
}

impl NotificationStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub kind: String,
    pub recipient: String,
    /// Template parameters; never contains credentials
    pub payload: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub next_attempt_at: i64,
    pub created_at: i64,
    pub sent_at: Option<i64>,
}

impl Notification {
    pub fn kind(&self) -> Option<NotificationKind> {
        NotificationKind::from_db(&self.kind)
    }

    pub fn status(&self) -> Option<NotificationStatus> {
        NotificationStatus::from_db(&self.status)
    }
}

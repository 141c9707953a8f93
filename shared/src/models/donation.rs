//! Donation Model

use serde::{Deserialize, Serialize};

/// Payment outcome recorded with a donation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationStatus {
    Completed,
    Pending,
    Failed,
}

impl DonationStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Completed" => Some(Self::Completed),
            "Pending" => Some(Self::Pending),
            "Failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Failed => "Failed",
        }
    }
}

/// Donor contact details copied at donation time.
///
/// Later profile edits never touch this copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSnapshot {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: Option<String>,
    pub pan: Option<String>,
    pub aadhar: Option<String>,
}

/// Donation entity (immutable once written)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: i64,
    /// Human-readable id, e.g. `DON2026000042`
    pub donation_id: String,
    pub member_id: i64,
    /// Whole currency units
    pub amount: i64,
    pub purpose: String,
    pub payment_mode: Option<String>,
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub payment_signature: Option<String>,
    pub status: String,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_mobile: String,
    pub donor_address: Option<String>,
    pub donor_pan: Option<String>,
    pub donor_aadhar: Option<String>,
    pub created_at: i64,
}

impl Donation {
    pub fn status(&self) -> Option<DonationStatus> {
        DonationStatus::from_db(&self.status)
    }

    pub fn donor(&self) -> DonorSnapshot {
        DonorSnapshot {
            name: self.donor_name.clone(),
            email: self.donor_email.clone(),
            mobile: self.donor_mobile.clone(),
            address: self.donor_address.clone(),
            pan: self.donor_pan.clone(),
            aadhar: self.donor_aadhar.clone(),
        }
    }
}

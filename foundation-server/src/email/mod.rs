//! Transactional email: templates and the service that sends them
//!
//! Bodies are plain text built with `format!`. Every send logs the recipient
//! and the kind of mail, never the body (it may carry a code or a password).

pub mod transport;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::models::Member;

use crate::util::TemporaryPassword;
pub use transport::{BoxError, LogMailer, Mailer, OutgoingEmail, SesMailer};

/// Outbox payload of a donation receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub donor_name: String,
    pub donation_id: String,
    pub membership_id: String,
    pub amount: i64,
    pub purpose: String,
    pub payment_mode: Option<String>,
    pub transaction_id: Option<String>,
}

/// Outbox payload of an account-created notice (no credentials)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeNoticePayload {
    pub name: String,
    pub membership_id: String,
}

#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    org_name: String,
    public_base_url: String,
}

impl EmailService {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        org_name: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            org_name: org_name.into(),
            public_base_url: public_base_url.into(),
        }
    }

    async fn deliver(&self, email: OutgoingEmail, kind: &'static str) -> Result<(), BoxError> {
        self.mailer.send(&email).await?;
        tracing::info!(to = %email.to, kind, "Email sent");
        Ok(())
    }

    pub async fn send_verification_code(
        &self,
        to: &str,
        name: Option<&str>,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), BoxError> {
        let greeting = name.map_or_else(|| "Hello,".to_string(), |n| format!("Dear {n},"));
        let text = format!(
            "{greeting}\n\n\
             Your verification code for {org} is: {code}\n\
             It is valid for {ttl_minutes} minutes.\n\n\
             If you did not request this, you can ignore this email.",
            org = self.org_name,
        );
        let email = OutgoingEmail {
            to: to.to_string(),
            subject: format!("{} - Email verification code", self.org_name),
            text,
        };
        self.deliver(email, "verification_code").await
    }

    pub async fn send_password_reset_code(
        &self,
        to: &str,
        name: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), BoxError> {
        let text = format!(
            "Dear {name},\n\n\
             Your password reset code is: {code}\n\
             It is valid for {ttl_minutes} minutes.\n\n\
             If you did not ask to reset your password, ignore this email; \
             your password stays unchanged."
        );
        let email = OutgoingEmail {
            to: to.to_string(),
            subject: format!("{} - Password reset code", self.org_name),
            text,
        };
        self.deliver(email, "password_reset_code").await
    }

    /// Welcome mail for a donation-provisioned account; the only place the
    /// generated password ever leaves the process.
    pub async fn send_welcome(
        &self,
        member: &Member,
        password: &TemporaryPassword,
    ) -> Result<(), BoxError> {
        let text = format!(
            "Dear {name},\n\n\
             Thank you for your donation. A member account has been created for you.\n\n\
             Membership ID: {membership_id}\n\
             Login email: {email}\n\
             Temporary password: {password}\n\n\
             You will be asked to choose a new password when you first log in:\n\
             {base}/login",
            name = member.name,
            membership_id = member.membership_id,
            email = member.email,
            password = password.expose(),
            base = self.public_base_url,
        );
        let email = OutgoingEmail {
            to: member.email.clone(),
            subject: format!("Welcome to {}", self.org_name),
            text,
        };
        self.deliver(email, "welcome").await
    }

    pub async fn send_welcome_notice(
        &self,
        to: &str,
        payload: &WelcomeNoticePayload,
    ) -> Result<(), BoxError> {
        let text = format!(
            "Dear {name},\n\n\
             Thank you for your donation. A member account has been created for you \
             with Membership ID {membership_id}.\n\n\
             To sign in, set a password here:\n\
             {base}/forgot-password",
            name = payload.name,
            membership_id = payload.membership_id,
            base = self.public_base_url,
        );
        let email = OutgoingEmail {
            to: to.to_string(),
            subject: format!("Welcome to {}", self.org_name),
            text,
        };
        self.deliver(email, "welcome_notice").await
    }

    pub async fn send_donation_receipt(
        &self,
        to: &str,
        receipt: &ReceiptPayload,
    ) -> Result<(), BoxError> {
        let mut text = format!(
            "Dear {name},\n\n\
             We have received your donation. Thank you for supporting {org}.\n\n\
             Donation ID: {donation_id}\n\
             Membership ID: {membership_id}\n\
             Amount: Rs. {amount}\n\
             Purpose: {purpose}\n",
            name = receipt.donor_name,
            org = self.org_name,
            donation_id = receipt.donation_id,
            membership_id = receipt.membership_id,
            amount = receipt.amount,
            purpose = receipt.purpose,
        );
        if let Some(mode) = &receipt.payment_mode {
            text.push_str(&format!("Payment mode: {mode}\n"));
        }
        if let Some(txn) = &receipt.transaction_id {
            text.push_str(&format!("Transaction ID: {txn}\n"));
        }
        text.push_str(&format!(
            "\nYour receipt is available in your dashboard: {}/dashboard",
            self.public_base_url
        ));

        let email = OutgoingEmail {
            to: to.to_string(),
            subject: format!("{} - Donation receipt {}", self.org_name, receipt.donation_id),
            text,
        };
        self.deliver(email, "donation_receipt").await
    }
}

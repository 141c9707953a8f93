//! Donation processing
//!
//! Order within one request: validate, resolve or create the member, record
//! the donation, then queue notifications. Nothing is written before
//! validation passes, and nothing after the donation insert can fail the
//! request.

use shared::error::{AppError, ErrorCode};
use shared::models::{Donation, DonationStatus, DonorSnapshot, Member};

use crate::auth::member_auth;
use crate::db::{NewDonation, PaymentMeta};
use crate::error::ServiceResult;
use crate::services::reconcile::{self, Resolution};
use crate::services::{ids, outbox};
use crate::state::AppState;
use crate::util::{TemporaryPassword, snowflake_id};

pub const DEFAULT_PURPOSE: &str = "General";

/// A donation as submitted, after field-level validation
#[derive(Debug, Clone)]
pub struct DonationRequest {
    pub donor: DonorSnapshot,
    pub amount: i64,
    pub purpose: String,
    pub payment: PaymentMeta,
    pub status: DonationStatus,
}

#[derive(Debug)]
pub struct DonationOutcome {
    pub donation: Donation,
    pub member: Member,
    pub new_member: bool,
    /// Present only when the member was created by this donation
    pub temporary_password: Option<TemporaryPassword>,
}

/// Amount and payment checks; runs before anything is written
pub fn validate(state: &AppState, req: &DonationRequest) -> Result<(), AppError> {
    if req.amount < state.min_donation_amount {
        return Err(AppError::with_message(
            ErrorCode::AmountBelowMinimum,
            format!("Minimum donation amount is {}", state.min_donation_amount),
        )
        .with_detail("minAmount", state.min_donation_amount));
    }
    if req.status != DonationStatus::Completed {
        return Err(AppError::new(ErrorCode::PaymentNotCompleted)
            .with_detail("paymentStatus", req.status.as_db()));
    }
    Ok(())
}

/// Persist one donation for `member`, snapshotting the submitted donor details
pub async fn record(
    state: &AppState,
    member: &Member,
    req: &DonationRequest,
    now: i64,
) -> ServiceResult<Donation> {
    validate(state, req)?;

    let donation_id =
        ids::next_donation_id(state.store.as_ref(), &state.donation_id_prefix, now).await?;
    let purpose = match req.purpose.trim() {
        "" => DEFAULT_PURPOSE.to_string(),
        p => p.to_string(),
    };

    let donation = state
        .store
        .insert_donation(&NewDonation {
            id: snowflake_id(),
            donation_id,
            member_id: member.id,
            amount: req.amount,
            purpose,
            payment: req.payment.clone(),
            status: req.status,
            donor: req.donor.clone(),
            now,
        })
        .await?;

    tracing::info!(
        donation_id = %donation.donation_id,
        member_id = member.id,
        amount = donation.amount,
        "Donation recorded"
    );
    Ok(donation)
}

/// Full donation workflow.
///
/// `member_id` is the authenticated member for logged-in donations; guests
/// pass `None` and are reconciled by email or mobile.
pub async fn process(
    state: &AppState,
    req: DonationRequest,
    member_id: Option<i64>,
    now: i64,
) -> ServiceResult<DonationOutcome> {
    validate(state, &req)?;

    let resolution = match member_id {
        Some(id) => Resolution::Existing(member_auth::load_active_member(state, id).await?),
        None => reconcile::resolve_or_create_member(state, &req.donor, now).await?,
    };

    let donation = record(state, resolution.member(), &req, now).await?;
    let new_member = resolution.was_created();

    let (member, temporary_password) = match resolution {
        Resolution::Existing(member) => (member, None),
        Resolution::Created { member, password } => {
            outbox::send_welcome_best_effort(state, &member, &password, now).await;
            (member, Some(password))
        }
    };

    if let Err(e) = outbox::queue_receipt(state, &donation, &member, now).await {
        tracing::error!(donation_id = %donation.donation_id, error = ?e, "Failed to queue donation receipt");
    }

    Ok(DonationOutcome {
        new_member,
        donation,
        member,
        temporary_password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::testing::{failing_mail_env, test_env};
    use shared::models::{NotificationKind, NotificationStatus};

    fn request(email: &str, amount: i64) -> DonationRequest {
        DonationRequest {
            donor: DonorSnapshot {
                name: "Ravi".into(),
                email: email.into(),
                mobile: "9876543210".into(),
                address: Some("Pune".into()),
                pan: Some("ABCDE1234F".into()),
                aadhar: None,
            },
            amount,
            purpose: "General".into(),
            payment: PaymentMeta {
                mode: Some("UPI".into()),
                transaction_id: Some("TXN1".into()),
                order_id: None,
                signature: None,
            },
            status: DonationStatus::Completed,
        }
    }

    #[tokio::test]
    async fn below_minimum_writes_nothing() {
        let env = test_env();
        let err = process(&env.state, request("n@x.com", 50), None, 0).await.unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::AmountBelowMinimum);
        assert_eq!(env.store.member_count(), 0);
        assert_eq!(env.store.donation_count(), 0);
    }

    #[tokio::test]
    async fn incomplete_payment_is_rejected() {
        let env = test_env();
        let mut req = request("n@x.com", 500);
        req.status = DonationStatus::Pending;
        let err = process(&env.state, req, None, 0).await.unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::PaymentNotCompleted);
        assert_eq!(env.store.member_count(), 0);
    }

    #[tokio::test]
    async fn repeat_guest_donations_share_one_member() {
        let env = test_env();
        let first = process(&env.state, request("n@x.com", 5000), None, 0).await.unwrap();
        let second = process(&env.state, request("n@x.com", 700), None, 1).await.unwrap();

        assert!(first.new_member);
        assert!(first.temporary_password.is_some());
        assert!(!second.new_member);
        assert!(second.temporary_password.is_none());
        assert_eq!(first.member.id, second.member.id);
        assert_ne!(first.donation.donation_id, second.donation.donation_id);
        assert_eq!(env.store.member_count(), 1);
        assert_eq!(
            env.store.list_donations_by_member(first.member.id).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn new_donor_gets_welcome_and_receipt() {
        let env = test_env();
        let outcome = process(&env.state, request("n@x.com", 5000), None, 0).await.unwrap();
        let password = outcome.temporary_password.unwrap();

        let mails = env.mailer.sent_to("n@x.com");
        assert_eq!(mails.len(), 2);
        assert!(mails[0].text.contains(password.expose()));
        assert!(mails[1].subject.contains(&outcome.donation.donation_id));
    }

    #[tokio::test]
    async fn mail_failure_does_not_fail_donation() {
        let (state, store) = failing_mail_env();
        let outcome = process(&state, request("n@x.com", 5000), None, 0).await.unwrap();
        assert!(outcome.new_member);

        let notice = store.find_notification(1).await.unwrap().unwrap();
        assert_eq!(notice.kind(), Some(NotificationKind::WelcomeNotice));
        let receipt = store.find_notification(2).await.unwrap().unwrap();
        assert_eq!(receipt.kind(), Some(NotificationKind::DonationReceipt));
        assert_eq!(receipt.status(), Some(NotificationStatus::Pending));
    }

    #[tokio::test]
    async fn snapshot_is_independent_of_member_record() {
        let env = test_env();
        let first = process(&env.state, request("n@x.com", 5000), None, 0).await.unwrap();
        let mut req = request("n@x.com", 800);
        req.donor.address = Some("Nashik".into());
        let second = process(&env.state, req, Some(first.member.id), 1).await.unwrap();

        let stored = env
            .store
            .find_donation(&second.donation.donation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.donor_address.as_deref(), Some("Nashik"));
        assert_eq!(stored.member_id, first.member.id);
        assert_eq!(second.member.address.as_deref(), Some("Pune"));
    }

    #[tokio::test]
    async fn empty_purpose_defaults() {
        let env = test_env();
        let mut req = request("n@x.com", 500);
        req.purpose = "  ".into();
        let outcome = process(&env.state, req, None, 0).await.unwrap();
        assert_eq!(outcome.donation.purpose, DEFAULT_PURPOSE);
    }
}

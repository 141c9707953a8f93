//! PostgreSQL store
//!
//! Query functions live in per-table modules and take `&PgPool`;
//! [`PgStore`] wires them into the [`Store`] trait.

mod donations;
mod members;
mod notifications;
mod sequences;
mod verifications;

use async_trait::async_trait;
use shared::models::{
    Donation, Member, Notification, ReferralSummary, VerificationPurpose, VerificationRecord,
};
use sqlx::PgPool;

use super::{
    NewDonation, NewMember, NewNotification, NewVerification, Store, StoreError, StoreResult,
    UniqueField,
};

/// Map a unique violation to the guarded column; anything else passes through.
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    let field = match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => match db.constraint() {
            Some("members_email_key") => Some(UniqueField::Email),
            Some("members_mobile_key") => Some(UniqueField::Mobile),
            Some("members_membership_id_key") => Some(UniqueField::MembershipId),
            Some("donations_donation_id_key") => Some(UniqueField::DonationId),
            _ => None,
        },
        _ => None,
    };
    match field {
        Some(field) => StoreError::Conflict(field),
        None => StoreError::Database(err),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply pending migrations
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database connected and migrations applied");
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_member_by_id(&self, id: i64) -> StoreResult<Option<Member>> {
        Ok(members::find_by_id(&self.pool, id).await?)
    }

    async fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        Ok(members::find_by_email(&self.pool, email).await?)
    }

    async fn find_member_by_contact(
        &self,
        email: &str,
        mobile: &str,
    ) -> StoreResult<Option<Member>> {
        Ok(members::find_by_contact(&self.pool, email, mobile).await?)
    }

    async fn find_member_by_membership_id(
        &self,
        membership_id: &str,
    ) -> StoreResult<Option<Member>> {
        Ok(members::find_by_membership_id(&self.pool, membership_id).await?)
    }

    async fn insert_member(&self, member: &NewMember) -> StoreResult<Member> {
        members::insert(&self.pool, member).await
    }

    async fn mark_member_verified(&self, id: i64, now: i64) -> StoreResult<()> {
        Ok(members::set_verified(&self.pool, id, now).await?)
    }

    async fn update_password(
        &self,
        id: i64,
        hashed_password: &str,
        must_change_password: bool,
        now: i64,
    ) -> StoreResult<()> {
        members::update_password(&self.pool, id, hashed_password, must_change_password, now).await
    }

    async fn list_referrals(&self, referrer_id: i64) -> StoreResult<Vec<ReferralSummary>> {
        Ok(members::list_referrals(&self.pool, referrer_id).await?)
    }

    async fn next_sequence(&self, key: &str) -> StoreResult<i64> {
        Ok(sequences::next(&self.pool, key).await?)
    }

    async fn upsert_verification(&self, v: &NewVerification) -> StoreResult<()> {
        Ok(verifications::upsert(&self.pool, v).await?)
    }

    async fn find_verification(
        &self,
        email: &str,
        purpose: VerificationPurpose,
    ) -> StoreResult<Option<VerificationRecord>> {
        Ok(verifications::find(&self.pool, email, purpose).await?)
    }

    async fn increment_verification_attempts(
        &self,
        email: &str,
        purpose: VerificationPurpose,
        issue_id: i64,
    ) -> StoreResult<()> {
        Ok(verifications::increment_attempts(&self.pool, email, purpose, issue_id).await?)
    }

    async fn consume_verification(
        &self,
        email: &str,
        purpose: VerificationPurpose,
        issue_id: i64,
    ) -> StoreResult<bool> {
        Ok(verifications::consume(&self.pool, email, purpose, issue_id).await?)
    }

    async fn insert_donation(&self, donation: &NewDonation) -> StoreResult<Donation> {
        donations::insert(&self.pool, donation).await
    }

    async fn find_donation(&self, donation_id: &str) -> StoreResult<Option<Donation>> {
        Ok(donations::find(&self.pool, donation_id).await?)
    }

    async fn list_donations_by_member(&self, member_id: i64) -> StoreResult<Vec<Donation>> {
        Ok(donations::list_by_member(&self.pool, member_id).await?)
    }

    async fn enqueue_notification(&self, n: &NewNotification) -> StoreResult<i64> {
        Ok(notifications::enqueue(&self.pool, n).await?)
    }

    async fn find_notification(&self, id: i64) -> StoreResult<Option<Notification>> {
        Ok(notifications::find(&self.pool, id).await?)
    }

    async fn claim_due_notifications(
        &self,
        now: i64,
        lease_until: i64,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        Ok(notifications::claim_due(&self.pool, now, lease_until, limit).await?)
    }

    async fn mark_notification_sent(&self, id: i64, now: i64) -> StoreResult<()> {
        Ok(notifications::mark_sent(&self.pool, id, now).await?)
    }

    async fn mark_notification_failed(
        &self,
        id: i64,
        error: &str,
        retry_at: Option<i64>,
    ) -> StoreResult<()> {
        Ok(notifications::mark_failed(&self.pool, id, error, retry_at).await?)
    }
}

//! Database access layer
//!
//! [`Store`] is the persistence seam: [`PgStore`] in deployments,
//! [`MemoryStore`] in development and tests. Each write is atomic on its own;
//! the only multi-row write (member insert + referrer counter bump) runs in
//! one transaction.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::models::{
    Donation, DonationStatus, DonorSnapshot, Member, MemberStatus, Notification,
    NotificationKind, ReferralSummary, VerificationPurpose, VerificationRecord,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Column guarded by a unique constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Mobile,
    MembershipId,
    DonationId,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0:?}")]
    Conflict(UniqueField),
    #[error("record not found: {0}")]
    Missing(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Referrer resolved before the member insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferrerLink {
    pub id: i64,
    pub membership_id: String,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub id: i64,
    pub membership_id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: Option<String>,
    pub photo_path: Option<String>,
    pub pan: Option<String>,
    pub aadhar: Option<String>,
    pub hashed_password: String,
    pub status: MemberStatus,
    pub must_change_password: bool,
    pub referrer: Option<ReferrerLink>,
    pub now: i64,
}

impl NewMember {
    pub fn verified(&self) -> bool {
        self.status == MemberStatus::Verified
    }
}

#[derive(Debug, Clone)]
pub struct NewVerification {
    pub email: String,
    pub purpose: VerificationPurpose,
    pub issue_id: i64,
    pub code_hash: String,
    pub expires_at: i64,
    pub now: i64,
}

/// Gateway identifiers attached to a donation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentMeta {
    pub mode: Option<String>,
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDonation {
    pub id: i64,
    pub donation_id: String,
    pub member_id: i64,
    pub amount: i64,
    pub purpose: String,
    pub payment: PaymentMeta,
    pub status: DonationStatus,
    pub donor: DonorSnapshot,
    pub now: i64,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub recipient: String,
    pub payload: serde_json::Value,
    /// Earliest time the worker may pick the entry up; leaves the first
    /// attempt to the request that queued it
    pub first_attempt_at: i64,
    pub now: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    // ── Members ──

    async fn find_member_by_id(&self, id: i64) -> StoreResult<Option<Member>>;

    async fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>>;

    /// Member owning `email` or `mobile`; an email match wins over a mobile match.
    async fn find_member_by_contact(
        &self,
        email: &str,
        mobile: &str,
    ) -> StoreResult<Option<Member>>;

    async fn find_member_by_membership_id(
        &self,
        membership_id: &str,
    ) -> StoreResult<Option<Member>>;

    /// Insert a member and, when a referrer is linked, bump its referral
    /// counter in the same transaction.
    async fn insert_member(&self, member: &NewMember) -> StoreResult<Member>;

    async fn mark_member_verified(&self, id: i64, now: i64) -> StoreResult<()>;

    async fn update_password(
        &self,
        id: i64,
        hashed_password: &str,
        must_change_password: bool,
        now: i64,
    ) -> StoreResult<()>;

    async fn list_referrals(&self, referrer_id: i64) -> StoreResult<Vec<ReferralSummary>>;

    // ── Sequences ──

    /// Atomically increment the named counter and return the new value (first call → 1).
    async fn next_sequence(&self, key: &str) -> StoreResult<i64>;

    // ── Verification codes ──

    /// Store a code, replacing any previous code for the same email and purpose.
    async fn upsert_verification(&self, v: &NewVerification) -> StoreResult<()>;

    async fn find_verification(
        &self,
        email: &str,
        purpose: VerificationPurpose,
    ) -> StoreResult<Option<VerificationRecord>>;

    /// Count a wrong guess against issuance `issue_id`; a newer issuance is untouched.
    async fn increment_verification_attempts(
        &self,
        email: &str,
        purpose: VerificationPurpose,
        issue_id: i64,
    ) -> StoreResult<()>;

    /// Delete the code if it is still issuance `issue_id`. Returns whether a row was removed.
    async fn consume_verification(
        &self,
        email: &str,
        purpose: VerificationPurpose,
        issue_id: i64,
    ) -> StoreResult<bool>;

    // ── Donations ──

    async fn insert_donation(&self, donation: &NewDonation) -> StoreResult<Donation>;

    async fn find_donation(&self, donation_id: &str) -> StoreResult<Option<Donation>>;

    /// Newest first
    async fn list_donations_by_member(&self, member_id: i64) -> StoreResult<Vec<Donation>>;

    // ── Notification outbox ──

    async fn enqueue_notification(&self, n: &NewNotification) -> StoreResult<i64>;

    async fn find_notification(&self, id: i64) -> StoreResult<Option<Notification>>;

    /// Claim pending entries whose `next_attempt_at` has passed, oldest first.
    /// Claimed rows move to `lease_until` so no other pass picks them up meanwhile.
    async fn claim_due_notifications(
        &self,
        now: i64,
        lease_until: i64,
        limit: i64,
    ) -> StoreResult<Vec<Notification>>;

    async fn mark_notification_sent(&self, id: i64, now: i64) -> StoreResult<()>;

    /// Record a failed attempt. `retry_at = None` gives up on the entry.
    async fn mark_notification_failed(
        &self,
        id: i64,
        error: &str,
        retry_at: Option<i64>,
    ) -> StoreResult<()>;
}

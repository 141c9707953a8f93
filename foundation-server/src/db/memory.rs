//! In-memory store for development and tests
//!
//! Holds every table behind one mutex, so each trait call is atomic the same
//! way a single SQL statement (or the member-insert transaction) is.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::models::{
    AdminPermissions, Donation, Member, MemberRole, MemberStatus, Notification, NotificationStatus,
    ReferralSummary, VerificationPurpose, VerificationRecord,
};

use super::{
    NewDonation, NewMember, NewNotification, NewVerification, Store, StoreError, StoreResult,
    UniqueField,
};

#[derive(Default)]
struct Tables {
    members: HashMap<i64, Member>,
    donations: Vec<Donation>,
    verifications: HashMap<(String, &'static str), VerificationRecord>,
    sequences: HashMap<String, i64>,
    notifications: Vec<Notification>,
    next_notification_id: i64,
}

impl Tables {
    fn conflict_for(&self, m: &NewMember) -> Option<UniqueField> {
        self.members.values().find_map(|existing| {
            if existing.email == m.email {
                Some(UniqueField::Email)
            } else if existing.mobile == m.mobile {
                Some(UniqueField::Mobile)
            } else if existing.membership_id == m.membership_id {
                Some(UniqueField::MembershipId)
            } else {
                None
            }
        })
    }

    fn insert_member(&mut self, m: &NewMember) -> StoreResult<Member> {
        if let Some(field) = self.conflict_for(m) {
            return Err(StoreError::Conflict(field));
        }
        if let Some(referrer) = &m.referrer {
            let Some(row) = self.members.get_mut(&referrer.id) else {
                return Err(StoreError::Missing("referrer"));
            };
            row.referral_count += 1;
            row.updated_at = m.now;
        }

        let member = Member {
            id: m.id,
            membership_id: m.membership_id.clone(),
            name: m.name.clone(),
            email: m.email.clone(),
            mobile: m.mobile.clone(),
            address: m.address.clone(),
            photo_path: m.photo_path.clone(),
            pan: m.pan.clone(),
            aadhar: m.aadhar.clone(),
            hashed_password: m.hashed_password.clone(),
            verified: m.verified(),
            status: m.status.as_db().to_string(),
            role: MemberRole::Member.as_db().to_string(),
            admin_permissions: AdminPermissions::default(),
            referred_by_id: m.referrer.as_ref().map(|r| r.id),
            referred_by_membership_id: m.referrer.as_ref().map(|r| r.membership_id.clone()),
            referral_count: 0,
            must_change_password: m.must_change_password,
            created_at: m.now,
            updated_at: m.now,
        };
        self.members.insert(member.id, member.clone());
        Ok(member)
    }

    fn notification_mut(&mut self, id: i64) -> StoreResult<&mut Notification> {
        self.notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StoreError::Missing("notification"))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// Inserted right before the next `insert_member`, after any lookups
    #[cfg(test)]
    rival: Mutex<Option<NewMember>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored members
    #[cfg(test)]
    pub fn member_count(&self) -> usize {
        self.tables.lock().members.len()
    }

    #[cfg(test)]
    pub fn set_member_status(&self, id: i64, status: MemberStatus) {
        if let Some(m) = self.tables.lock().members.get_mut(&id) {
            m.status = status.as_db().to_string();
        }
    }

    /// Simulate a concurrent request winning the race to the next member insert
    #[cfg(test)]
    pub fn insert_before_next_member(&self, rival: NewMember) {
        *self.rival.lock() = Some(rival);
    }

    /// Number of stored donations
    #[cfg(test)]
    pub fn donation_count(&self) -> usize {
        self.tables.lock().donations.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_member_by_id(&self, id: i64) -> StoreResult<Option<Member>> {
        Ok(self.tables.lock().members.get(&id).cloned())
    }

    async fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        let tables = self.tables.lock();
        Ok(tables.members.values().find(|m| m.email == email).cloned())
    }

    async fn find_member_by_contact(
        &self,
        email: &str,
        mobile: &str,
    ) -> StoreResult<Option<Member>> {
        let tables = self.tables.lock();
        let by_email = tables.members.values().find(|m| m.email == email);
        Ok(by_email
            .or_else(|| tables.members.values().find(|m| m.mobile == mobile))
            .cloned())
    }

    async fn find_member_by_membership_id(
        &self,
        membership_id: &str,
    ) -> StoreResult<Option<Member>> {
        let tables = self.tables.lock();
        Ok(tables
            .members
            .values()
            .find(|m| m.membership_id == membership_id)
            .cloned())
    }

    async fn insert_member(&self, m: &NewMember) -> StoreResult<Member> {
        let mut tables = self.tables.lock();
        #[cfg(test)]
        {
            if let Some(rival) = self.rival.lock().take() {
                tables.insert_member(&rival)?;
            }
        }
        tables.insert_member(m)
    }

    async fn mark_member_verified(&self, id: i64, now: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(m) = tables.members.get_mut(&id) {
            if m.status == MemberStatus::PendingVerification.as_db() {
                m.verified = true;
                m.status = MemberStatus::Verified.as_db().to_string();
                m.updated_at = now;
            }
        }
        Ok(())
    }

    async fn update_password(
        &self,
        id: i64,
        hashed_password: &str,
        must_change_password: bool,
        now: i64,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let m = tables
            .members
            .get_mut(&id)
            .ok_or(StoreError::Missing("member"))?;
        m.hashed_password = hashed_password.to_string();
        m.must_change_password = must_change_password;
        m.updated_at = now;
        Ok(())
    }

    async fn list_referrals(&self, referrer_id: i64) -> StoreResult<Vec<ReferralSummary>> {
        let tables = self.tables.lock();
        let mut list: Vec<ReferralSummary> = tables
            .members
            .values()
            .filter(|m| m.referred_by_id == Some(referrer_id))
            .map(|m| ReferralSummary {
                id: m.id,
                membership_id: m.membership_id.clone(),
                name: m.name.clone(),
                created_at: m.created_at,
            })
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn next_sequence(&self, key: &str) -> StoreResult<i64> {
        let mut tables = self.tables.lock();
        let value = tables.sequences.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn upsert_verification(&self, v: &NewVerification) -> StoreResult<()> {
        let record = VerificationRecord {
            email: v.email.clone(),
            purpose: v.purpose.as_db().to_string(),
            issue_id: v.issue_id,
            code_hash: v.code_hash.clone(),
            attempts: 0,
            expires_at: v.expires_at,
            created_at: v.now,
        };
        self.tables
            .lock()
            .verifications
            .insert((v.email.clone(), v.purpose.as_db()), record);
        Ok(())
    }

    async fn find_verification(
        &self,
        email: &str,
        purpose: VerificationPurpose,
    ) -> StoreResult<Option<VerificationRecord>> {
        let tables = self.tables.lock();
        Ok(tables
            .verifications
            .get(&(email.to_string(), purpose.as_db()))
            .cloned())
    }

    async fn increment_verification_attempts(
        &self,
        email: &str,
        purpose: VerificationPurpose,
        issue_id: i64,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(v) = tables
            .verifications
            .get_mut(&(email.to_string(), purpose.as_db()))
            .filter(|v| v.issue_id == issue_id)
        {
            v.attempts += 1;
        }
        Ok(())
    }

    async fn consume_verification(
        &self,
        email: &str,
        purpose: VerificationPurpose,
        issue_id: i64,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.lock();
        let key = (email.to_string(), purpose.as_db());
        match tables.verifications.get(&key) {
            Some(v) if v.issue_id == issue_id => {
                tables.verifications.remove(&key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_donation(&self, d: &NewDonation) -> StoreResult<Donation> {
        let mut tables = self.tables.lock();
        if tables
            .donations
            .iter()
            .any(|existing| existing.donation_id == d.donation_id)
        {
            return Err(StoreError::Conflict(UniqueField::DonationId));
        }
        if !tables.members.contains_key(&d.member_id) {
            return Err(StoreError::Missing("member"));
        }
        let donation = Donation {
            id: d.id,
            donation_id: d.donation_id.clone(),
            member_id: d.member_id,
            amount: d.amount,
            purpose: d.purpose.clone(),
            payment_mode: d.payment.mode.clone(),
            transaction_id: d.payment.transaction_id.clone(),
            order_id: d.payment.order_id.clone(),
            payment_signature: d.payment.signature.clone(),
            status: d.status.as_db().to_string(),
            donor_name: d.donor.name.clone(),
            donor_email: d.donor.email.clone(),
            donor_mobile: d.donor.mobile.clone(),
            donor_address: d.donor.address.clone(),
            donor_pan: d.donor.pan.clone(),
            donor_aadhar: d.donor.aadhar.clone(),
            created_at: d.now,
        };
        tables.donations.push(donation.clone());
        Ok(donation)
    }

    async fn find_donation(&self, donation_id: &str) -> StoreResult<Option<Donation>> {
        let tables = self.tables.lock();
        Ok(tables
            .donations
            .iter()
            .find(|d| d.donation_id == donation_id)
            .cloned())
    }

    async fn list_donations_by_member(&self, member_id: i64) -> StoreResult<Vec<Donation>> {
        let tables = self.tables.lock();
        // Reverse insertion order breaks ties between equal timestamps
        let mut list: Vec<Donation> = tables
            .donations
            .iter()
            .rev()
            .filter(|d| d.member_id == member_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn enqueue_notification(&self, n: &NewNotification) -> StoreResult<i64> {
        let mut tables = self.tables.lock();
        tables.next_notification_id += 1;
        let id = tables.next_notification_id;
        tables.notifications.push(Notification {
            id,
            kind: n.kind.as_db().to_string(),
            recipient: n.recipient.clone(),
            payload: n.payload.clone(),
            status: NotificationStatus::Pending.as_db().to_string(),
            attempts: 0,
            last_error: None,
            next_attempt_at: n.first_attempt_at,
            created_at: n.now,
            sent_at: None,
        });
        Ok(id)
    }

    async fn find_notification(&self, id: i64) -> StoreResult<Option<Notification>> {
        let tables = self.tables.lock();
        Ok(tables.notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn claim_due_notifications(
        &self,
        now: i64,
        lease_until: i64,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        let mut tables = self.tables.lock();
        let mut due: Vec<&mut Notification> = tables
            .notifications
            .iter_mut()
            .filter(|n| n.status == NotificationStatus::Pending.as_db() && n.next_attempt_at <= now)
            .collect();
        due.sort_by_key(|n| (n.next_attempt_at, n.id));
        due.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(due
            .into_iter()
            .map(|n| {
                n.next_attempt_at = lease_until;
                n.clone()
            })
            .collect())
    }

    async fn mark_notification_sent(&self, id: i64, now: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let n = tables.notification_mut(id)?;
        n.status = NotificationStatus::Sent.as_db().to_string();
        n.attempts += 1;
        n.sent_at = Some(now);
        n.last_error = None;
        Ok(())
    }

    async fn mark_notification_failed(
        &self,
        id: i64,
        error: &str,
        retry_at: Option<i64>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let n = tables.notification_mut(id)?;
        n.attempts += 1;
        n.last_error = Some(error.to_string());
        match retry_at {
            Some(at) => n.next_attempt_at = at,
            None => n.status = NotificationStatus::Failed.as_db().to_string(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ReferrerLink;
    use shared::models::NotificationKind;

    fn new_member(id: i64, email: &str, mobile: &str, membership_id: &str) -> NewMember {
        NewMember {
            id,
            membership_id: membership_id.into(),
            name: "Test".into(),
            email: email.into(),
            mobile: mobile.into(),
            address: None,
            photo_path: None,
            pan: None,
            aadhar: None,
            hashed_password: "hash".into(),
            status: MemberStatus::PendingVerification,
            must_change_password: false,
            referrer: None,
            now: 1_000,
        }
    }

    #[tokio::test]
    async fn unique_email_and_mobile_are_enforced() {
        let store = MemoryStore::new();
        store
            .insert_member(&new_member(1, "a@x.com", "9000000001", "FDN20260001"))
            .await
            .unwrap();

        let err = store
            .insert_member(&new_member(2, "a@x.com", "9000000002", "FDN20260002"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(UniqueField::Email)));

        let err = store
            .insert_member(&new_member(3, "b@x.com", "9000000001", "FDN20260003"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(UniqueField::Mobile)));
        assert_eq!(store.member_count(), 1);
    }

    #[tokio::test]
    async fn contact_lookup_prefers_email_match() {
        let store = MemoryStore::new();
        store
            .insert_member(&new_member(1, "a@x.com", "9000000001", "FDN20260001"))
            .await
            .unwrap();
        store
            .insert_member(&new_member(2, "b@x.com", "9000000002", "FDN20260002"))
            .await
            .unwrap();

        let found = store
            .find_member_by_contact("b@x.com", "9000000001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, 2);

        let by_mobile = store
            .find_member_by_contact("c@x.com", "9000000001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_mobile.id, 1);
    }

    #[tokio::test]
    async fn referral_insert_bumps_referrer_counter() {
        let store = MemoryStore::new();
        store
            .insert_member(&new_member(1, "a@x.com", "9000000001", "FDN20260001"))
            .await
            .unwrap();
        let mut referred = new_member(2, "b@x.com", "9000000002", "FDN20260002");
        referred.referrer = Some(ReferrerLink {
            id: 1,
            membership_id: "FDN20260001".into(),
        });
        store.insert_member(&referred).await.unwrap();

        let referrer = store.find_member_by_id(1).await.unwrap().unwrap();
        assert_eq!(referrer.referral_count, 1);
        assert_eq!(store.list_referrals(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_referrer_inserts_nothing() {
        let store = MemoryStore::new();
        let mut orphan = new_member(2, "b@x.com", "9000000002", "FDN20260002");
        orphan.referrer = Some(ReferrerLink {
            id: 99,
            membership_id: "FDN20269999".into(),
        });
        let err = store.insert_member(&orphan).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing("referrer")));
        assert_eq!(store.member_count(), 0);
    }

    #[tokio::test]
    async fn sequences_start_at_one_per_key() {
        let store = MemoryStore::new();
        assert_eq!(store.next_sequence("membership:2026").await.unwrap(), 1);
        assert_eq!(store.next_sequence("membership:2026").await.unwrap(), 2);
        assert_eq!(store.next_sequence("membership:2027").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn consume_only_removes_matching_issuance() {
        let store = MemoryStore::new();
        let v = NewVerification {
            email: "a@x.com".into(),
            purpose: VerificationPurpose::Registration,
            issue_id: 7,
            code_hash: "h".into(),
            expires_at: 10,
            now: 0,
        };
        store.upsert_verification(&v).await.unwrap();
        assert!(
            !store
                .consume_verification("a@x.com", VerificationPurpose::Registration, 6)
                .await
                .unwrap()
        );
        assert!(
            store
                .consume_verification("a@x.com", VerificationPurpose::Registration, 7)
                .await
                .unwrap()
        );
        assert!(
            !store
                .consume_verification("a@x.com", VerificationPurpose::Registration, 7)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn failed_notification_without_retry_gives_up() {
        let store = MemoryStore::new();
        let id = store
            .enqueue_notification(&NewNotification {
                kind: NotificationKind::DonationReceipt,
                recipient: "a@x.com".into(),
                payload: serde_json::json!({}),
                first_attempt_at: 100,
                now: 100,
            })
            .await
            .unwrap();
        assert_eq!(store.claim_due_notifications(100, 200, 10).await.unwrap().len(), 1);
        // Leased until 200
        assert!(store.claim_due_notifications(150, 250, 10).await.unwrap().is_empty());

        store
            .mark_notification_failed(id, "smtp down", Some(500))
            .await
            .unwrap();
        assert!(store.claim_due_notifications(499, 600, 10).await.unwrap().is_empty());
        assert_eq!(store.claim_due_notifications(500, 600, 10).await.unwrap().len(), 1);

        store.mark_notification_failed(id, "smtp down", None).await.unwrap();
        let n = store.find_notification(id).await.unwrap().unwrap();
        assert_eq!(n.status(), Some(NotificationStatus::Failed));
        assert_eq!(n.attempts, 2);
        assert!(store.claim_due_notifications(10_000, 10_100, 10).await.unwrap().is_empty());
    }
}

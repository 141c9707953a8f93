//! Guest reconciliation: find the member behind donor contact details or
//! provision one.
//!
//! An email or mobile match counts as the same person. A new account is
//! verified immediately, gets a generated password and must rotate it on
//! first login. The plaintext password is handed back exactly once.

use shared::models::{DonorSnapshot, Member, MemberStatus};

use crate::db::NewMember;
use crate::error::ServiceResult;
use crate::services::ids;
use crate::state::AppState;
use crate::util::{TemporaryPassword, generate_password, hash_password, snowflake_id};

#[derive(Debug)]
pub enum Resolution {
    Existing(Member),
    Created {
        member: Member,
        password: TemporaryPassword,
    },
}

impl Resolution {
    pub fn member(&self) -> &Member {
        match self {
            Resolution::Existing(member) | Resolution::Created { member, .. } => member,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Resolution::Created { .. })
    }
}

pub async fn resolve_or_create_member(
    state: &AppState,
    contact: &DonorSnapshot,
    now: i64,
) -> ServiceResult<Resolution> {
    if let Some(existing) = state
        .store
        .find_member_by_contact(&contact.email, &contact.mobile)
        .await?
    {
        tracing::debug!(member_id = existing.id, "Donor matched existing member");
        return Ok(Resolution::Existing(existing));
    }

    let password = generate_password();
    let hashed_password = hash_password(password.expose())?;
    let membership_id =
        ids::next_membership_id(state.store.as_ref(), &state.membership_id_prefix, now).await?;

    // A concurrent insert for the same person surfaces here as a 409
    let member = state
        .store
        .insert_member(&NewMember {
            id: snowflake_id(),
            membership_id,
            name: contact.name.clone(),
            email: contact.email.clone(),
            mobile: contact.mobile.clone(),
            address: contact.address.clone(),
            photo_path: None,
            pan: contact.pan.clone(),
            aadhar: contact.aadhar.clone(),
            hashed_password,
            status: MemberStatus::Verified,
            must_change_password: true,
            referrer: None,
            now,
        })
        .await?;

    tracing::info!(
        member_id = member.id,
        membership_id = %member.membership_id,
        "Member provisioned from donation"
    );
    Ok(Resolution::Created { member, password })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_env;
    use crate::util::verify_password;

    fn contact(email: &str, mobile: &str) -> DonorSnapshot {
        DonorSnapshot {
            name: "Ravi".into(),
            email: email.into(),
            mobile: mobile.into(),
            address: Some("Pune".into()),
            pan: None,
            aadhar: None,
        }
    }

    #[tokio::test]
    async fn creates_verified_member_with_forced_rotation() {
        let env = test_env();
        let res = resolve_or_create_member(&env.state, &contact("n@x.com", "9876543210"), 0)
            .await
            .unwrap();
        let Resolution::Created { member, password } = res else {
            panic!("expected a new member");
        };
        assert!(member.verified);
        assert_eq!(member.status(), MemberStatus::Verified);
        assert!(member.must_change_password);
        assert!(verify_password(password.expose(), &member.hashed_password));
        assert_ne!(member.hashed_password, password.expose());
    }

    #[tokio::test]
    async fn email_or_mobile_match_reuses_member() {
        let env = test_env();
        let first = resolve_or_create_member(&env.state, &contact("n@x.com", "9876543210"), 0)
            .await
            .unwrap();
        let by_email = resolve_or_create_member(&env.state, &contact("n@x.com", "9123456780"), 1)
            .await
            .unwrap();
        let by_mobile = resolve_or_create_member(&env.state, &contact("other@x.com", "9876543210"), 2)
            .await
            .unwrap();

        assert!(!by_email.was_created());
        assert!(!by_mobile.was_created());
        assert_eq!(by_email.member().id, first.member().id);
        assert_eq!(by_mobile.member().id, first.member().id);
        assert_eq!(env.store.member_count(), 1);
    }

    fn rival(email: &str, mobile: &str) -> NewMember {
        NewMember {
            id: 42,
            membership_id: "FDN19990001".into(),
            name: "Rival".into(),
            email: email.into(),
            mobile: mobile.into(),
            address: None,
            photo_path: None,
            pan: None,
            aadhar: None,
            hashed_password: "h".into(),
            status: MemberStatus::Verified,
            must_change_password: true,
            referrer: None,
            now: 0,
        }
    }

    #[tokio::test]
    async fn lost_insert_race_is_conflict_without_welcome_mail() {
        use crate::db::{PaymentMeta, Store};
        use crate::services::donations::{self, DonationRequest};
        use shared::error::{AppError, ErrorCode};
        use shared::models::DonationStatus;

        let env = test_env();
        let cases = [
            ("n@x.com", rival("n@x.com", "9000000002"), ErrorCode::EmailAlreadyRegistered),
            ("m@x.com", rival("other@x.com", "9876543210"), ErrorCode::MobileAlreadyRegistered),
        ];
        for (i, (email, mut winner, code)) in cases.into_iter().enumerate() {
            winner.id += i as i64;
            winner.membership_id = format!("FDN1999000{}", i + 1);
            let winner_email = winner.email.clone();
            let before = env.store.member_count();
            env.store.insert_before_next_member(winner);

            let req = DonationRequest {
                donor: contact(email, "9876543210"),
                amount: 500,
                purpose: "General".into(),
                payment: PaymentMeta::default(),
                status: DonationStatus::Completed,
            };
            let err = AppError::from(donations::process(&env.state, req, None, 0).await.unwrap_err());
            assert_eq!(err.code, code);
            assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
            assert_eq!(env.store.member_count(), before + 1);
            assert_eq!(env.store.donation_count(), 0);
            assert!(env.mailer.sent().is_empty());
            let winner = env.store.find_member_by_email(&winner_email).await.unwrap().unwrap();
            assert_eq!(winner.name, "Rival");
        }
    }
}

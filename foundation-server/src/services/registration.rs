//! Member self-registration
//!
//! Registration creates a `pending_verification` account; the member becomes
//! `verified` only after confirming an emailed code (see `confirm_email`).
//! An existing account with the same email or mobile is a 409 carrying the
//! next step for the client: `verify_otp` when the submitted email owns a
//! pending account, `login` otherwise.

use shared::error::{AppError, ErrorCode};
use shared::models::{Member, MemberStatus, VerificationPurpose};

use crate::db::NewMember;
use crate::error::ServiceResult;
use crate::services::{ids, referral, verification};
use crate::state::AppState;
use crate::uploads::{self, PhotoUpload};
use crate::util::{hash_password, snowflake_id};
use crate::validation::validate_password_strength;

/// Validated registration form
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: Option<String>,
    pub password: String,
    pub referred_by: Option<String>,
    pub photo: Option<PhotoUpload>,
}

fn existing_account_error(existing: &Member, submitted_email: &str) -> AppError {
    let same_email = existing.email == submitted_email;
    let (code, action) = match existing.status() {
        MemberStatus::PendingVerification if same_email => {
            (ErrorCode::RegistrationPendingVerification, "verify_otp")
        }
        _ if same_email => (ErrorCode::EmailAlreadyRegistered, "login"),
        _ => (ErrorCode::MobileAlreadyRegistered, "login"),
    };
    AppError::new(code)
        .with_detail("action", action)
        .with_detail("email", submitted_email)
}

pub async fn register(state: &AppState, reg: Registration, now: i64) -> ServiceResult<Member> {
    validate_password_strength(&reg.password)?;

    if let Some(existing) = state
        .store
        .find_member_by_contact(&reg.email, &reg.mobile)
        .await?
    {
        return Err(existing_account_error(&existing, &reg.email).into());
    }

    let referrer =
        referral::resolve_referrer(state.store.as_ref(), reg.referred_by.as_deref()).await?;

    if let Some(photo) = &reg.photo {
        photo.validate()?;
    }
    let hashed_password = hash_password(&reg.password)?;
    let membership_id =
        ids::next_membership_id(state.store.as_ref(), &state.membership_id_prefix, now).await?;

    let photo = match &reg.photo {
        Some(photo) => Some(uploads::store_photo(&state.upload_dir, photo).await?),
        None => None,
    };

    let inserted = state
        .store
        .insert_member(&NewMember {
            id: snowflake_id(),
            membership_id,
            name: reg.name,
            email: reg.email,
            mobile: reg.mobile,
            address: reg.address,
            photo_path: photo.as_ref().map(|p| p.path.clone()),
            pan: None,
            aadhar: None,
            hashed_password,
            status: MemberStatus::PendingVerification,
            must_change_password: false,
            referrer,
            now,
        })
        .await;
    let member = match inserted {
        Ok(member) => member,
        Err(e) => {
            if let Some(photo) = &photo {
                uploads::discard_photo(&state.upload_dir, photo).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        member_id = member.id,
        membership_id = %member.membership_id,
        referred_by = member.referred_by_membership_id.as_deref().unwrap_or("-"),
        "Member registered, pending verification"
    );
    Ok(member)
}

/// Verify a registration code and activate the matching pending account.
///
/// Returns the member when one exists for the email.
pub async fn confirm_email(
    state: &AppState,
    email: &str,
    code: &str,
    now: i64,
) -> ServiceResult<Option<Member>> {
    verification::verify(state, email, VerificationPurpose::Registration, code, now).await?;

    let Some(member) = state.store.find_member_by_email(email).await? else {
        return Ok(None);
    };
    if member.status() == MemberStatus::PendingVerification {
        state.store.mark_member_verified(member.id, now).await?;
        tracing::info!(member_id = member.id, "Member email verified");
    }
    Ok(state.store.find_member_by_id(member.id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::testing::test_env;

    fn form(email: &str, mobile: &str, referred_by: Option<&str>) -> Registration {
        Registration {
            name: "Asha".into(),
            email: email.into(),
            mobile: mobile.into(),
            address: Some("Mumbai".into()),
            password: "correct-horse".into(),
            referred_by: referred_by.map(String::from),
            photo: None,
        }
    }

    #[tokio::test]
    async fn new_registration_is_pending() {
        let env = test_env();
        let member = register(&env.state, form("a@x.com", "9876543210", None), 0)
            .await
            .unwrap();
        assert_eq!(member.status(), MemberStatus::PendingVerification);
        assert!(!member.verified);
        assert!(!member.must_change_password);
    }

    #[tokio::test]
    async fn invalid_referrer_blocks_registration() {
        let env = test_env();
        let err = register(&env.state, form("a@x.com", "9876543210", Some("FDN20269999")), 0)
            .await
            .unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::InvalidReferrer);
        assert_eq!(env.store.member_count(), 0);
    }

    #[tokio::test]
    async fn referral_is_linked_and_counted() {
        let env = test_env();
        let referrer = register(&env.state, form("r@x.com", "9000000001", None), 0)
            .await
            .unwrap();
        let member = register(
            &env.state,
            form("a@x.com", "9876543210", Some(&referrer.membership_id)),
            1,
        )
        .await
        .unwrap();
        assert_eq!(member.referred_by_id, Some(referrer.id));
        assert_eq!(member.referred_by_membership_id.as_deref(), Some(referrer.membership_id.as_str()));

        let referrer = env.store.find_member_by_id(referrer.id).await.unwrap().unwrap();
        assert_eq!(referrer.referral_count, 1);
    }

    #[tokio::test]
    async fn duplicate_pending_account_points_to_otp() {
        let env = test_env();
        register(&env.state, form("a@x.com", "9876543210", None), 0)
            .await
            .unwrap();
        let err: AppError = register(&env.state, form("a@x.com", "9123456789", None), 1)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::RegistrationPendingVerification);
        let details = err.details.unwrap();
        assert_eq!(details["action"], "verify_otp");
        assert_eq!(details["email"], "a@x.com");
    }

    #[tokio::test]
    async fn duplicate_verified_account_points_to_login() {
        let env = test_env();
        register(&env.state, form("a@x.com", "9876543210", None), 0)
            .await
            .unwrap();
        let code = verification::store_code(&env.state, "a@x.com", VerificationPurpose::Registration, 0)
            .await
            .unwrap();
        let member = confirm_email(&env.state, "a@x.com", &code, 1).await.unwrap().unwrap();
        assert_eq!(member.status(), MemberStatus::Verified);
        assert!(member.verified);

        let err: AppError = register(&env.state, form("b@x.com", "9876543210", None), 2)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::MobileAlreadyRegistered);
        assert_eq!(err.details.unwrap()["action"], "login");
    }

    #[tokio::test]
    async fn short_password_rejected_before_any_write() {
        let env = test_env();
        let mut f = form("a@x.com", "9876543210", None);
        f.password = "short".into();
        let err = register(&env.state, f, 0).await.unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::PasswordTooShort);
        assert_eq!(env.store.member_count(), 0);
    }

    #[tokio::test]
    async fn mobile_of_pending_account_points_to_login() {
        let env = test_env();
        register(&env.state, form("a@x.com", "9876543210", None), 0)
            .await
            .unwrap();
        let err: AppError = register(&env.state, form("b@x.com", "9876543210", None), 1)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::MobileAlreadyRegistered);
        let details = err.details.unwrap();
        assert_eq!(details["action"], "login");
        assert_eq!(details["email"], "b@x.com");

        // Confirming the unregistered email activates nothing
        let code = verification::store_code(&env.state, "b@x.com", VerificationPurpose::Registration, 2)
            .await
            .unwrap();
        assert!(confirm_email(&env.state, "b@x.com", &code, 3).await.unwrap().is_none());
        let pending = env.store.find_member_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(pending.status(), MemberStatus::PendingVerification);
    }

    #[tokio::test]
    async fn failed_insert_leaves_no_photo_behind() {
        let mut env = test_env();
        let dir = tempfile::tempdir().unwrap();
        env.state.upload_dir = dir.path().to_path_buf();
        env.store.insert_before_next_member(NewMember {
            id: 7,
            membership_id: "FDN19990001".into(),
            name: "Rival".into(),
            email: "a@x.com".into(),
            mobile: "9000000001".into(),
            address: None,
            photo_path: None,
            pan: None,
            aadhar: None,
            hashed_password: "h".into(),
            status: MemberStatus::PendingVerification,
            must_change_password: false,
            referrer: None,
            now: 0,
        });

        let mut f = form("a@x.com", "9876543210", None);
        f.photo = Some(PhotoUpload {
            file_name: Some("me.png".into()),
            content_type: Some("image/png".into()),
            data: b"png-bytes".to_vec(),
        });
        let err: AppError = register(&env.state, f, 0).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::EmailAlreadyRegistered);
        assert_eq!(env.store.member_count(), 1);

        let photos = dir.path().join("photos");
        let leftover = std::fs::read_dir(&photos).map(|d| d.count()).unwrap_or(0);
        assert_eq!(leftover, 0);
    }
}

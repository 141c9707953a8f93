//! Referral bookkeeping
//!
//! A referral code is the referrer's membership id. It is resolved before the
//! member insert; the counter bump then happens inside the insert transaction.

use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::ReferralSummary;

use crate::db::{ReferrerLink, Store};
use crate::error::ServiceResult;

/// Resolve an optional referral code. Blank means no referral; an unknown id
/// is a hard `InvalidReferrer` error.
pub async fn resolve_referrer(
    store: &dyn Store,
    code: Option<&str>,
) -> ServiceResult<Option<ReferrerLink>> {
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let code = code.to_uppercase();

    match store.find_member_by_membership_id(&code).await? {
        Some(referrer) => Ok(Some(ReferrerLink {
            id: referrer.id,
            membership_id: referrer.membership_id,
        })),
        None => {
            tracing::info!(referred_by = %code, "Unknown referrer");
            Err(AppError::with_message(
                ErrorCode::InvalidReferrer,
                format!("Referrer {code} does not exist"),
            )
            .with_detail("referredBy", code)
            .into())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralOverview {
    pub referral_count: i64,
    pub referrals: Vec<ReferralSummary>,
}

/// Counter plus the referred members, newest first
pub async fn overview(
    store: &dyn Store,
    member_id: i64,
    referral_count: i64,
) -> ServiceResult<ReferralOverview> {
    let referrals = store.list_referrals(member_id).await?;
    Ok(ReferralOverview {
        referral_count,
        referrals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, NewMember};
    use shared::models::MemberStatus;

    #[tokio::test]
    async fn blank_code_means_no_referral() {
        let store = MemoryStore::new();
        assert_eq!(resolve_referrer(&store, None).await.unwrap(), None);
        assert_eq!(resolve_referrer(&store, Some("  ")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_code_is_invalid_referrer() {
        let store = MemoryStore::new();
        let err = resolve_referrer(&store, Some("FDN20269999")).await.unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::InvalidReferrer);
    }

    #[tokio::test]
    async fn known_code_resolves_case_insensitively() {
        let store = MemoryStore::new();
        store
            .insert_member(&NewMember {
                id: 5,
                membership_id: "FDN20260001".into(),
                name: "Referrer".into(),
                email: "r@x.com".into(),
                mobile: "9000000001".into(),
                address: None,
                photo_path: None,
                pan: None,
                aadhar: None,
                hashed_password: "h".into(),
                status: MemberStatus::Verified,
                must_change_password: false,
                referrer: None,
                now: 0,
            })
            .await
            .unwrap();
        let link = resolve_referrer(&store, Some(" fdn20260001 ")).await.unwrap().unwrap();
        assert_eq!(link.id, 5);
        assert_eq!(link.membership_id, "FDN20260001");
    }
}

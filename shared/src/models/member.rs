//! Member Model

use serde::{Deserialize, Serialize};

/// Lifecycle status of a member account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Registered through the form, email not verified yet
    PendingVerification,
    /// Email verified (or provisioned by a completed donation)
    Verified,
    /// Disabled by an administrator
    Suspended,
}

impl MemberStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending_verification" => Some(Self::PendingVerification),
            "verified" => Some(Self::Verified),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::PendingVerification => "pending_verification",
            Self::Verified => "verified",
            Self::Suspended => "suspended",
        }
    }

    /// Can this member log in?
    pub fn can_login(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Member,
    Admin,
    SuperAdmin,
}

impl MemberRole {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            "super_admin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

/// Fine-grained admin switches (only meaningful for admin roles)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminPermissions {
    pub manage_members: bool,
    pub manage_donations: bool,
    pub manage_content: bool,
    pub view_reports: bool,
}

/// Member entity as stored
///
/// Not `Serialize`: it carries the password hash. Convert to [`MemberView`]
/// before handing it to a client.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Member {
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
    pub verified: bool,
    pub status: String,
    pub role: String,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub admin_permissions: AdminPermissions,
    /// Internal id of the referring member (display only)
    pub referred_by_id: Option<i64>,
    pub referred_by_membership_id: Option<String>,
    pub referral_count: i64,
    /// Set on accounts whose password was generated for the member
    pub must_change_password: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Member {
    pub fn status(&self) -> MemberStatus {
        MemberStatus::from_db(&self.status).unwrap_or(MemberStatus::PendingVerification)
    }

    pub fn role(&self) -> MemberRole {
        MemberRole::from_db(&self.role).unwrap_or(MemberRole::Member)
    }

    pub fn view(&self) -> MemberView {
        MemberView::from(self)
    }
}

/// Member as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: i64,
    pub membership_id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: Option<String>,
    pub photo_path: Option<String>,
    pub verified: bool,
    pub status: MemberStatus,
    pub role: MemberRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_permissions: Option<AdminPermissions>,
    pub referred_by_membership_id: Option<String>,
    pub referral_count: i64,
    pub must_change_password: bool,
    pub created_at: i64,
}

impl From<&Member> for MemberView {
    fn from(m: &Member) -> Self {
        let role = m.role();
        Self {
            id: m.id,
            membership_id: m.membership_id.clone(),
            name: m.name.clone(),
            email: m.email.clone(),
            mobile: m.mobile.clone(),
            address: m.address.clone(),
            photo_path: m.photo_path.clone(),
            verified: m.verified,
            status: m.status(),
            role,
            admin_permissions: role.is_admin().then(|| m.admin_permissions.clone()),
            referred_by_membership_id: m.referred_by_membership_id.clone(),
            referral_count: m.referral_count,
            must_change_password: m.must_change_password,
            created_at: m.created_at,
        }
    }
}

/// A member credited to a referrer (dashboard listing)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ReferralSummary {
    pub id: i64,
    pub membership_id: String,
    pub name: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Member {
        Member {
            id: 42,
            membership_id: "FDN20260001".into(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            mobile: "9876543210".into(),
            address: None,
            photo_path: None,
            pan: Some("ABCDE1234F".into()),
            aadhar: None,
            hashed_password: "$argon2id$secret".into(),
            verified: true,
            status: "verified".into(),
            role: "member".into(),
            admin_permissions: AdminPermissions::default(),
            referred_by_id: None,
            referred_by_membership_id: None,
            referral_count: 0,
            must_change_password: false,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn status_round_trips_through_db_strings() {
        for s in [
            MemberStatus::PendingVerification,
            MemberStatus::Verified,
            MemberStatus::Suspended,
        ] {
            assert_eq!(MemberStatus::from_db(s.as_db()), Some(s));
        }
        assert_eq!(MemberStatus::from_db("active"), None);
    }

    #[test]
    fn only_verified_members_can_login() {
        assert!(MemberStatus::Verified.can_login());
        assert!(!MemberStatus::PendingVerification.can_login());
        assert!(!MemberStatus::Suspended.can_login());
    }

    #[test]
    fn view_never_contains_password_hash() {
        let json = serde_json::to_string(&sample().view()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"membershipId\":\"FDN20260001\""));
        assert!(!json.contains("adminPermissions"));
    }

    #[test]
    fn admin_view_includes_permissions() {
        let mut m = sample();
        m.role = "admin".into();
        m.admin_permissions.manage_members = true;
        let view = m.view();
        assert_eq!(view.role, MemberRole::Admin);
        assert!(view.admin_permissions.unwrap().manage_members);
    }
}

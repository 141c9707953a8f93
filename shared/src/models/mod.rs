//! Domain models shared between the server and its clients

pub mod donation;
pub mod member;
pub mod notification;
pub mod verification;

pub use donation::{Donation, DonationStatus, DonorSnapshot};
pub use member::{
    AdminPermissions, Member, MemberRole, MemberStatus, MemberView, ReferralSummary,
};
pub use notification::{Notification, NotificationKind, NotificationStatus};
pub use verification::{VerificationPurpose, VerificationRecord};

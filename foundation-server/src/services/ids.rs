//! Human-readable identifiers
//!
//! Both kinds are `PREFIX` + 4-digit year + zero-padded sequence. The
//! sequence comes from an atomic per-year counter, so ids are unique and
//! strictly increasing within a year.

use crate::db::Store;
use crate::error::ServiceResult;
use crate::util::year_of;

pub fn format_membership_id(prefix: &str, year: i32, seq: i64) -> String {
    format!("{prefix}{year}{seq:04}")
}

pub fn format_donation_id(prefix: &str, year: i32, seq: i64) -> String {
    format!("{prefix}{year}{seq:06}")
}

pub async fn next_membership_id(store: &dyn Store, prefix: &str, now: i64) -> ServiceResult<String> {
    let year = year_of(now);
    let seq = store.next_sequence(&format!("membership:{year}")).await?;
    Ok(format_membership_id(prefix, year, seq))
}

pub async fn next_donation_id(store: &dyn Store, prefix: &str, now: i64) -> ServiceResult<String> {
    let year = year_of(now);
    let seq = store.next_sequence(&format!("donation:{year}")).await?;
    Ok(format_donation_id(prefix, year, seq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    // 2026-03-01T00:00:00Z
    const MARCH_2026: i64 = 1_772_323_200_000;

    #[test]
    fn formats_pad_sequences() {
        assert_eq!(format_membership_id("FDN", 2026, 7), "FDN20260007");
        assert_eq!(format_donation_id("DON", 2026, 42), "DON2026000042");
    }

    #[tokio::test]
    async fn sequences_are_per_year_and_kind() {
        let store = MemoryStore::new();
        assert_eq!(next_membership_id(&store, "FDN", MARCH_2026).await.unwrap(), "FDN20260001");
        assert_eq!(next_membership_id(&store, "FDN", MARCH_2026).await.unwrap(), "FDN20260002");
        assert_eq!(next_donation_id(&store, "DON", MARCH_2026).await.unwrap(), "DON2026000001");

        let next_year = MARCH_2026 + 365 * 24 * 3600 * 1000;
        assert_eq!(next_membership_id(&store, "FDN", next_year).await.unwrap(), "FDN20270001");
    }
}

use shared::models::{Member, ReferralSummary};
use sqlx::PgPool;

use super::classify;
use crate::db::{NewMember, StoreError, StoreResult};

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM members WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM members WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_contact(
    pool: &PgPool,
    email: &str,
    mobile: &str,
) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM members WHERE email = $1 OR mobile = $2
         ORDER BY (email = $1) DESC
         LIMIT 1",
    )
    .bind(email)
    .bind(mobile)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_membership_id(
    pool: &PgPool,
    membership_id: &str,
) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM members WHERE membership_id = $1")
        .bind(membership_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &PgPool, m: &NewMember) -> StoreResult<Member> {
    let mut tx = pool.begin().await?;

    let member: Member = sqlx::query_as(
        "INSERT INTO members (
            id, membership_id, name, email, mobile, address, photo_path, pan, aadhar,
            hashed_password, verified, status, referred_by_id, referred_by_membership_id,
            must_change_password, created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
         RETURNING *",
    )
    .bind(m.id)
    .bind(&m.membership_id)
    .bind(&m.name)
    .bind(&m.email)
    .bind(&m.mobile)
    .bind(&m.address)
    .bind(&m.photo_path)
    .bind(&m.pan)
    .bind(&m.aadhar)
    .bind(&m.hashed_password)
    .bind(m.verified())
    .bind(m.status.as_db())
    .bind(m.referrer.as_ref().map(|r| r.id))
    .bind(m.referrer.as_ref().map(|r| r.membership_id.as_str()))
    .bind(m.must_change_password)
    .bind(m.now)
    .fetch_one(&mut *tx)
    .await
    .map_err(classify)?;

    if let Some(referrer) = &m.referrer {
        let bumped = sqlx::query(
            "UPDATE members SET referral_count = referral_count + 1, updated_at = $2 WHERE id = $1",
        )
        .bind(referrer.id)
        .bind(m.now)
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() == 0 {
            return Err(StoreError::Missing("referrer"));
        }
    }

    tx.commit().await?;
    Ok(member)
}

pub async fn set_verified(pool: &PgPool, id: i64, now: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE members SET verified = TRUE, status = 'verified', updated_at = $2
         WHERE id = $1 AND status = 'pending_verification'",
    )
    .bind(id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_password(
    pool: &PgPool,
    id: i64,
    hashed_password: &str,
    must_change_password: bool,
    now: i64,
) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE members SET hashed_password = $2, must_change_password = $3, updated_at = $4
         WHERE id = $1",
    )
    .bind(id)
    .bind(hashed_password)
    .bind(must_change_password)
    .bind(now)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Missing("member"));
    }
    Ok(())
}

pub async fn list_referrals(
    pool: &PgPool,
    referrer_id: i64,
) -> Result<Vec<ReferralSummary>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, membership_id, name, created_at FROM members
         WHERE referred_by_id = $1
         ORDER BY created_at DESC",
    )
    .bind(referrer_id)
    .fetch_all(pool)
    .await
}

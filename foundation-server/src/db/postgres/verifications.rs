use shared::models::{VerificationPurpose, VerificationRecord};
use sqlx::PgPool;

use crate::db::NewVerification;

pub async fn upsert(pool: &PgPool, v: &NewVerification) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO verification_codes (email, purpose, issue_id, code_hash, attempts, expires_at, created_at)
         VALUES ($1, $2, $3, $4, 0, $5, $6)
         ON CONFLICT (email, purpose) DO UPDATE SET
            issue_id = $3, code_hash = $4, attempts = 0, expires_at = $5, created_at = $6",
    )
    .bind(&v.email)
    .bind(v.purpose.as_db())
    .bind(v.issue_id)
    .bind(&v.code_hash)
    .bind(v.expires_at)
    .bind(v.now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(
    pool: &PgPool,
    email: &str,
    purpose: VerificationPurpose,
) -> Result<Option<VerificationRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM verification_codes WHERE email = $1 AND purpose = $2")
        .bind(email)
        .bind(purpose.as_db())
        .fetch_optional(pool)
        .await
}

pub async fn increment_attempts(
    pool: &PgPool,
    email: &str,
    purpose: VerificationPurpose,
    issue_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE verification_codes SET attempts = attempts + 1
         WHERE email = $1 AND purpose = $2 AND issue_id = $3",
    )
    .bind(email)
    .bind(purpose.as_db())
    .bind(issue_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn consume(
    pool: &PgPool,
    email: &str,
    purpose: VerificationPurpose,
    issue_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM verification_codes WHERE email = $1 AND purpose = $2 AND issue_id = $3",
    )
    .bind(email)
    .bind(purpose.as_db())
    .bind(issue_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

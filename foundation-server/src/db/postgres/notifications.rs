use shared::models::Notification;
use sqlx::PgPool;

use crate::db::NewNotification;

pub async fn enqueue(pool: &PgPool, n: &NewNotification) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO notifications (kind, recipient, payload, status, next_attempt_at, created_at)
         VALUES ($1, $2, $3, 'pending', $4, $5)
         RETURNING id",
    )
    .bind(n.kind.as_db())
    .bind(&n.recipient)
    .bind(&n.payload)
    .bind(n.first_attempt_at)
    .bind(n.now)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notifications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Lease due rows in one statement; concurrent workers skip each other's rows
pub async fn claim_due(
    pool: &PgPool,
    now: i64,
    lease_until: i64,
    limit: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    let mut rows: Vec<Notification> = sqlx::query_as(
        "UPDATE notifications SET next_attempt_at = $2
         WHERE id IN (
             SELECT id FROM notifications
             WHERE status = 'pending' AND next_attempt_at <= $1
             ORDER BY next_attempt_at, id
             LIMIT $3
             FOR UPDATE SKIP LOCKED
         )
         RETURNING *",
    )
    .bind(now)
    .bind(lease_until)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.sort_by_key(|n| n.id);
    Ok(rows)
}

pub async fn mark_sent(pool: &PgPool, id: i64, now: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE notifications SET status = 'sent', attempts = attempts + 1, sent_at = $2, last_error = NULL
         WHERE id = $1",
    )
    .bind(id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_failed(
    pool: &PgPool,
    id: i64,
    error: &str,
    retry_at: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE notifications SET
            attempts = attempts + 1,
            last_error = $2,
            status = CASE WHEN $3::BIGINT IS NULL THEN 'failed' ELSE 'pending' END,
            next_attempt_at = COALESCE($3, next_attempt_at)
         WHERE id = $1",
    )
    .bind(id)
    .bind(error)
    .bind(retry_at)
    .execute(pool)
    .await?;
    Ok(())
}

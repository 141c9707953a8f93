use sqlx::PgPool;

/// Increment-and-read in one statement; concurrent callers never share a value.
pub async fn next(pool: &PgPool, key: &str) -> Result<i64, sqlx::Error> {
    let (value,): (i64,) = sqlx::query_as(
        "INSERT INTO sequences (key, value) VALUES ($1, 1)
         ON CONFLICT (key) DO UPDATE SET value = sequences.value + 1
         RETURNING value",
    )
    .bind(key)
    .fetch_one(pool)
    .await?;
    Ok(value)
}

use shared::models::Donation;
use sqlx::PgPool;

use super::classify;
use crate::db::{NewDonation, StoreResult};

pub async fn insert(pool: &PgPool, d: &NewDonation) -> StoreResult<Donation> {
    sqlx::query_as(
        "INSERT INTO donations (
            id, donation_id, member_id, amount, purpose, payment_mode, transaction_id,
            order_id, payment_signature, status, donor_name, donor_email, donor_mobile,
            donor_address, donor_pan, donor_aadhar, created_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
         RETURNING *",
    )
    .bind(d.id)
    .bind(&d.donation_id)
    .bind(d.member_id)
    .bind(d.amount)
    .bind(&d.purpose)
    .bind(&d.payment.mode)
    .bind(&d.payment.transaction_id)
    .bind(&d.payment.order_id)
    .bind(&d.payment.signature)
    .bind(d.status.as_db())
    .bind(&d.donor.name)
    .bind(&d.donor.email)
    .bind(&d.donor.mobile)
    .bind(&d.donor.address)
    .bind(&d.donor.pan)
    .bind(&d.donor.aadhar)
    .bind(d.now)
    .fetch_one(pool)
    .await
    .map_err(classify)
}

pub async fn find(pool: &PgPool, donation_id: &str) -> Result<Option<Donation>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM donations WHERE donation_id = $1")
        .bind(donation_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_member(pool: &PgPool, member_id: i64) -> Result<Vec<Donation>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM donations WHERE member_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(member_id)
        .fetch_all(pool)
        .await
}

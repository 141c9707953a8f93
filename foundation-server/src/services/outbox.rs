//! Post-commit notifications
//!
//! Receipts and welcome notices are written to the outbox after the primary
//! write commits, then delivered right away (on a spawned task, or inline
//! when background delivery is off). Failures are retried by the worker in
//! `main` with exponential backoff, up to [`MAX_ATTEMPTS`]. A delivery
//! failure never fails the request that queued it.
//!
//! New entries become due only after [`BASE_BACKOFF_MS`], leaving the first
//! attempt to the queuing request. The worker leases what it claims for the
//! same span, so an entry is never in two deliveries at once.
//!
//! The welcome mail with a generated password is the exception: it is sent
//! directly and never stored. If it fails, a `welcome_notice` without the
//! secret is queued instead.

use shared::models::{Donation, Member, Notification, NotificationKind, NotificationStatus};

use crate::db::NewNotification;
use crate::email::{ReceiptPayload, WelcomeNoticePayload};
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::util::TemporaryPassword;

pub const MAX_ATTEMPTS: i32 = 5;
pub const BASE_BACKOFF_MS: i64 = 30_000;
const MAX_BACKOFF_MS: i64 = 3_600_000;

/// Delay before the next try, given how many attempts already failed before this one
pub fn backoff_ms(previous_attempts: i32) -> i64 {
    let exp = previous_attempts.clamp(0, 16) as u32;
    BASE_BACKOFF_MS.saturating_mul(1 << exp).min(MAX_BACKOFF_MS)
}

async fn render_and_send(state: &AppState, n: &Notification) -> Result<(), String> {
    match n.kind() {
        Some(NotificationKind::DonationReceipt) => {
            let payload: ReceiptPayload =
                serde_json::from_value(n.payload.clone()).map_err(|e| format!("bad payload: {e}"))?;
            state
                .email
                .send_donation_receipt(&n.recipient, &payload)
                .await
                .map_err(|e| e.to_string())
        }
        Some(NotificationKind::WelcomeNotice) => {
            let payload: WelcomeNoticePayload =
                serde_json::from_value(n.payload.clone()).map_err(|e| format!("bad payload: {e}"))?;
            state
                .email
                .send_welcome_notice(&n.recipient, &payload)
                .await
                .map_err(|e| e.to_string())
        }
        None => Err(format!("unknown notification kind: {}", n.kind)),
    }
}

/// Try one outbox entry and record the outcome. Returns whether it was sent.
pub async fn deliver(state: &AppState, n: &Notification, now: i64) -> ServiceResult<bool> {
    match render_and_send(state, n).await {
        Ok(()) => {
            state.store.mark_notification_sent(n.id, now).await?;
            Ok(true)
        }
        Err(error) => {
            let attempts = n.attempts + 1;
            let retry_at = (attempts < MAX_ATTEMPTS).then(|| now + backoff_ms(n.attempts));
            state
                .store
                .mark_notification_failed(n.id, &error, retry_at)
                .await?;
            if retry_at.is_some() {
                tracing::warn!(notification_id = n.id, kind = %n.kind, attempts, error = %error, "Notification failed, will retry");
            } else {
                tracing::error!(notification_id = n.id, kind = %n.kind, attempts, error = %error, "Notification failed permanently");
            }
            Ok(false)
        }
    }
}

async fn deliver_by_id(state: &AppState, id: i64, now: i64) {
    let result = async {
        match state.store.find_notification(id).await? {
            Some(n) if n.status() == Some(NotificationStatus::Pending) => {
                deliver(state, &n, now).await?;
            }
            Some(n) => {
                tracing::debug!(notification_id = id, status = %n.status, "Notification already handled");
            }
            None => {}
        }
        ServiceResult::Ok(())
    }
    .await;
    if let Err(e) = result {
        tracing::error!(notification_id = id, error = ?e, "Notification delivery errored");
    }
}

fn dispatch(state: &AppState, id: i64, now: i64) -> impl Future<Output = ()> + Send + 'static {
    let state = state.clone();
    async move { deliver_by_id(&state, id, now).await }
}

async fn enqueue(
    state: &AppState,
    kind: NotificationKind,
    recipient: &str,
    payload: serde_json::Value,
    now: i64,
) -> ServiceResult<i64> {
    let id = state
        .store
        .enqueue_notification(&NewNotification {
            kind,
            recipient: recipient.to_string(),
            payload,
            first_attempt_at: now.saturating_add(BASE_BACKOFF_MS),
            now,
        })
        .await?;

    let task = dispatch(state, id, now);
    if state.background_notifications {
        tokio::spawn(task);
    } else {
        task.await;
    }
    Ok(id)
}

pub async fn queue_receipt(
    state: &AppState,
    donation: &Donation,
    member: &Member,
    now: i64,
) -> ServiceResult<i64> {
    let payload = ReceiptPayload {
        donor_name: donation.donor_name.clone(),
        donation_id: donation.donation_id.clone(),
        membership_id: member.membership_id.clone(),
        amount: donation.amount,
        purpose: donation.purpose.clone(),
        payment_mode: donation.payment_mode.clone(),
        transaction_id: donation.transaction_id.clone(),
    };
    let payload = serde_json::to_value(&payload).map_err(|e| ServiceError::Db(e.into()))?;
    enqueue(
        state,
        NotificationKind::DonationReceipt,
        &donation.donor_email,
        payload,
        now,
    )
    .await
}

pub async fn queue_welcome_notice(state: &AppState, member: &Member, now: i64) -> ServiceResult<i64> {
    let payload = WelcomeNoticePayload {
        name: member.name.clone(),
        membership_id: member.membership_id.clone(),
    };
    let payload = serde_json::to_value(&payload).map_err(|e| ServiceError::Db(e.into()))?;
    enqueue(state, NotificationKind::WelcomeNotice, &member.email, payload, now).await
}

async fn send_welcome(state: &AppState, member: &Member, password: &TemporaryPassword, now: i64) {
    if let Err(e) = state.email.send_welcome(member, password).await {
        tracing::warn!(member_id = member.id, error = %e, "Welcome email failed, queueing notice without credentials");
        if let Err(e) = queue_welcome_notice(state, member, now).await {
            tracing::error!(member_id = member.id, error = ?e, "Failed to queue welcome notice");
        }
    }
}

/// Send the credential-bearing welcome mail without blocking the caller on failure
pub async fn send_welcome_best_effort(
    state: &AppState,
    member: &Member,
    password: &TemporaryPassword,
    now: i64,
) {
    if state.background_notifications {
        let state = state.clone();
        let member = member.clone();
        let password = password.clone();
        tokio::spawn(async move { send_welcome(&state, &member, &password, now).await });
    } else {
        send_welcome(state, member, password, now).await;
    }
}

/// Deliver every due entry once. Returns how many were sent.
pub async fn process_due(state: &AppState, now: i64, limit: i64) -> ServiceResult<usize> {
    let due = state
        .store
        .claim_due_notifications(now, now.saturating_add(BASE_BACKOFF_MS), limit)
        .await?;
    let mut sent = 0;
    for n in &due {
        if deliver(state, n, now).await? {
            sent += 1;
        }
    }
    if !due.is_empty() {
        tracing::info!(due = due.len(), sent, "Outbox pass finished");
    }
    Ok(sent)
}

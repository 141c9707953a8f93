//! Test doubles and fixtures

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::Config;
use crate::db::MemoryStore;
use crate::email::{BoxError, Mailer, OutgoingEmail};
use crate::state::AppState;

/// Mailer that keeps every message
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, to: &str) -> Vec<OutgoingEmail> {
        self.sent().into_iter().filter(|m| m.to == to).collect()
    }

    /// The 6-digit code in the newest mail to `to`
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        let mail = self.sent_to(to).pop()?;
        mail.text
            .split(|c: char| !c.is_ascii_digit())
            .find(|w| w.len() == 6)
            .map(String::from)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), BoxError> {
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

/// Mailer that always fails
#[derive(Default)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), BoxError> {
        Err("mail transport unavailable".into())
    }
}

pub fn test_config() -> Config {
    Config {
        jwt_secret: "test-secret".into(),
        org_name: "Seva Foundation".into(),
        public_base_url: "https://seva.example".into(),
        background_notifications: false,
        ..Config::development()
    }
}

/// Fresh memory-backed state; handles let tests inspect the store and mail
pub struct TestEnv {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_env() -> TestEnv {
    env_with(&test_config())
}

/// Like [`test_env`], with post-commit mail on spawned tasks
pub fn background_env() -> TestEnv {
    env_with(&Config {
        background_notifications: true,
        ..test_config()
    })
}

fn env_with(config: &Config) -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::with_parts(config, store.clone(), mailer.clone());
    TestEnv {
        state,
        store,
        mailer,
    }
}

/// State whose mail transport always fails
pub fn failing_mail_env() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_parts(&test_config(), store.clone(), Arc::new(FailingMailer));
    (state, store)
}

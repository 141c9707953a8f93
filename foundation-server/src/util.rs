//! Credential and input helpers

use std::fmt;

use rand::Rng;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;

pub use shared::util::{now_millis, snowflake_id, year_of};

/// Uniformly random 6-digit code, leading zeros kept
pub fn generate_code() -> String {
    let code: u32 = OsRng.gen_range(0..1_000_000);
    format!("{code:06}")
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Trimmed, lower-cased email used as the lookup key everywhere
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

const LETTERS: &[u8] = b"abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*-_+=?";
const GENERATED_PASSWORD_LEN: usize = 12;

/// A password generated for a member who did not choose one.
///
/// `Debug` is redacted; the plaintext is only reachable through [`expose`](Self::expose).
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryPassword(String);

impl TemporaryPassword {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for TemporaryPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemporaryPassword(***)")
    }
}

/// 12 characters from OS randomness with at least one letter, digit and symbol
pub fn generate_password() -> TemporaryPassword {
    let mut rng = OsRng;
    let all: Vec<u8> = [LETTERS, DIGITS, SYMBOLS].concat();

    let mut chars: Vec<u8> = Vec::with_capacity(GENERATED_PASSWORD_LEN);
    for class in [LETTERS, DIGITS, SYMBOLS] {
        chars.push(class[rng.gen_range(0..class.len())]);
    }
    while chars.len() < GENERATED_PASSWORD_LEN {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);

    TemporaryPassword(chars.into_iter().map(char::from).collect())
}

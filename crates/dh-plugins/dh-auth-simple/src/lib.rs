//! # dh-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`. Accounts and sessions live
//! in process memory; the bearer token handed to the client is never stored,
//! only its SHA-256 digest is.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use base64::Engine;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use dh_core::error::{AppError, Result};
use dh_core::models::{AuthSession, Identity};
use dh_core::traits::AuthProvider;

/// The hosted auth service never accepted anything shorter.
const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    hash: String,
    admin: bool,
}

#[derive(Default)]
pub struct SimpleAuthProvider {
    accounts: DashMap<String, Account>,
    /// Keyed by token digest, never by the token itself.
    sessions: DashMap<String, Identity>,
}

impl SimpleAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the administrator credentials at startup; everyone created
    /// through `create_account` is a plain uploader.
    pub fn with_admin(email: &str, password: &str) -> Result<Self> {
        let provider = Self::new();
        let hash = hash_password(password)?;
        provider
            .accounts
            .insert(email.trim().to_lowercase(), Account { hash, admin: true });
        Ok(provider)
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Validation(format!("unusable password: {err}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

fn new_token() -> Result<String> {
    let mut raw = [0u8; 32];
    getrandom::getrandom(&mut raw)
        .map_err(|err| AppError::Store(anyhow::anyhow!("token generation failed: {err}")))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw))
}

fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(AppError::Validation("a valid email address is required".into()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let hash = hash_password(password)?;
        match self.accounts.entry(email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!("account {email} already exists"))),
            Entry::Vacant(slot) => {
                slot.insert(Account { hash, admin: false });
                Ok(Identity { email, admin: false })
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = email.trim().to_lowercase();
        let verified = self
            .accounts
            .get(&email)
            .map(|account| (verify_password(password, &account.hash), account.admin));
        match verified {
            Some((true, admin)) => {
                let token = new_token()?;
                let identity = Identity { email, admin };
                self.sessions.insert(token_digest(&token), identity.clone());
                Ok(AuthSession { token, identity })
            }
            // One message for both unknown account and bad password.
            _ => Err(AppError::Unauthorized("invalid email or password".into())),
        }
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        self.sessions.remove(&token_digest(token));
        Ok(())
    }

    async fn identity(&self, token: &str) -> Result<Option<Identity>> {
        Ok(self.sessions.get(&token_digest(token)).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signup_then_sign_in_round_trips() {
        let auth = SimpleAuthProvider::new();
        auth.create_account("Owner@Example.com", "hunter22").await.unwrap();

        let session = auth.sign_in("owner@example.com", "hunter22").await.unwrap();
        assert_eq!(session.identity.email, "owner@example.com");
        assert!(!session.identity.admin);

        let identity = auth.identity(&session.token).await.unwrap();
        assert_eq!(identity, Some(session.identity));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let auth = SimpleAuthProvider::new();
        auth.create_account("owner@example.com", "hunter22").await.unwrap();

        let err = auth.sign_in("owner@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn sign_out_revokes_the_token() {
        let auth = SimpleAuthProvider::new();
        auth.create_account("owner@example.com", "hunter22").await.unwrap();
        let session = auth.sign_in("owner@example.com", "hunter22").await.unwrap();

        auth.sign_out(&session.token).await.unwrap();
        assert_eq!(auth.identity(&session.token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_accounts_and_short_passwords_are_rejected() {
        let auth = SimpleAuthProvider::new();
        auth.create_account("owner@example.com", "hunter22").await.unwrap();

        let err = auth.create_account("owner@example.com", "hunter23").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = auth.create_account("other@example.com", "short").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn admin_flag_comes_from_bootstrap() {
        let auth = SimpleAuthProvider::with_admin("admin@example.com", "changeme!").unwrap();
        let session = auth.sign_in("admin@example.com", "changeme!").await.unwrap();
        assert!(session.identity.admin);
    }
}

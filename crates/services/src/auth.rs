use std::collections::HashMap;
use std::sync::Mutex;

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::AuthError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

/// Identity capability consumed by the services.
///
/// Quiz taking only reads `current_session`; catalog and analytics use it to
/// gate admin operations.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn current_session(&self) -> Option<AuthSession>;

    /// Receiver that observes every sign-in and sign-out.
    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>>;

    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on an unknown account or a
    /// wrong password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the email is malformed or taken, or the password
    /// is too short.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError::Backend` if the provider cannot end the session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Resolve the current session and insist on admin rights.
///
/// # Errors
///
/// Returns `AuthError::NotSignedIn` without a session and
/// `AuthError::Forbidden` for a non-admin session.
pub fn require_admin(auth: &dyn AuthProvider) -> Result<AuthSession, AuthError> {
    let session = auth.current_session().ok_or(AuthError::NotSignedIn)?;
    if !session.is_admin {
        return Err(AuthError::Forbidden);
    }
    Ok(session)
}

fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}

struct Account {
    user_id: Uuid,
    password_hash: String,
}

/// In-process account store with argon2 password hashes.
pub struct InMemoryAuthProvider {
    admin_email: Option<String>,
    accounts: Mutex<HashMap<String, Account>>,
    session: watch::Sender<Option<AuthSession>>,
}

impl InMemoryAuthProvider {
    /// `admin_email`, when set, marks that account as an administrator.
    #[must_use]
    pub fn new(admin_email: Option<&str>) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            admin_email: admin_email.map(|e| e.trim().to_lowercase()),
            accounts: Mutex::new(HashMap::new()),
            session,
        }
    }

    fn session_for(&self, email: String, user_id: Uuid) -> AuthSession {
        let is_admin = self.admin_email.as_deref() == Some(email.as_str());
        AuthSession {
            user_id,
            email,
            is_admin,
        }
    }

    fn accounts(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Account>>, AuthError> {
        self.accounts
            .lock()
            .map_err(|e| AuthError::Backend(e.to_string()))
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| AuthError::Backend(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Backend(e.to_string()))
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    fn current_session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.session.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user_id = {
            let accounts = self.accounts()?;
            let account = accounts.get(&email).ok_or(AuthError::InvalidCredentials)?;
            if !verify_password(password, &account.password_hash) {
                return Err(AuthError::InvalidCredentials);
            }
            account.user_id
        };

        let session = self.session_for(email, user_id);
        tracing::info!(user_id = %session.user_id, is_admin = session.is_admin, "signed in");
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        let password_hash = hash_password(password)?;
        let user_id = Uuid::new_v4();
        {
            let mut accounts = self.accounts()?;
            if accounts.contains_key(&email) {
                return Err(AuthError::EmailTaken);
            }
            accounts.insert(
                email.clone(),
                Account {
                    user_id,
                    password_hash,
                },
            );
        }

        let session = self.session_for(email, user_id);
        tracing::info!(user_id = %session.user_id, "account created");
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(previous) = self.session.send_replace(None) {
            tracing::info!(user_id = %previous.user_id, "signed out");
        }
        Ok(())
    }
}

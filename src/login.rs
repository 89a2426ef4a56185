use crate::error::AppError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Credential data for login and registration
///
/// Used to receive login and sign-up form data from the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserCredentials {
    /// Username for login/registration
    #[serde(default)]
    pub username: String,

    /// Password in plaintext (only transmitted, never stored)
    #[serde(default)]
    pub password: String,
}

/// Authentication state of one session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated { username: String },
}

/// Session-scoped user store
///
/// Maps usernames to Argon2 hashes of their passwords and tracks whether the
/// owning session has logged in. Nothing here outlives the session.
#[derive(Debug, Default)]
pub struct IdentityStore {
    users: HashMap<String, String>,
    state: AuthState,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user
    ///
    /// # Errors
    /// * `AppError::DuplicateUser` if the username is already taken; the store
    ///   is left untouched
    pub fn register(&mut self, username: &str, password: &str) -> Result<(), AppError> {
        if self.users.contains_key(username) {
            return Err(AppError::DuplicateUser);
        }

        let password_hash = hash_password(password)?;
        self.users.insert(username.to_string(), password_hash);
        Ok(())
    }

    /// Check credentials and log the session in
    ///
    /// Succeeds iff the username is registered and the password matches
    /// exactly. A failed attempt does not change the current state.
    ///
    /// # Errors
    /// * `AppError::InvalidCredentials` for an unknown user or wrong password
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<(), AppError> {
        let Some(stored) = self.users.get(username) else {
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, stored)? {
            return Err(AppError::InvalidCredentials);
        }

        self.state = AuthState::Authenticated {
            username: username.to_string(),
        };
        Ok(())
    }

    /// Return to the anonymous state; registered users are kept
    pub fn logout(&mut self) {
        self.state = AuthState::Anonymous;
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { .. })
    }

    pub fn current_user(&self) -> Option<&str> {
        match &self.state {
            AuthState::Authenticated { username } => Some(username),
            AuthState::Anonymous => None,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

/// Hash a password using Argon2
///
/// # Errors
/// * Returns `AppError::PasswordHash` if hashing fails
fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored hash
///
/// # Returns
/// * `Ok(true)` if the password matches, `Ok(false)` if not
fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| AppError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

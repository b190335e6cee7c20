//! Authentication service.
//!
//! Password login by username or email, registration and the password reset
//! token flow.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use tracing::instrument;

use dealshop_core::{Email, PasswordResetToken, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length, matching the column width.
const MAX_USERNAME_LENGTH: usize = 150;

/// Signup form data.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username is blank or too long.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<User, AuthError> {
        let username = validate_username(&registration.username)?;
        let email = Email::parse(&registration.email)?;
        validate_password(&registration.password)?;

        let password_hash = hash_password(&registration.password)?;

        let new = NewUser {
            username,
            email,
            first_name: registration.first_name.trim().to_owned(),
            last_name: registration.last_name.trim().to_owned(),
        };

        let user = self
            .store
            .create_user(&new, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check a login (username or email) and password.
    ///
    /// The username is tried first; if no account has that username and the
    /// login looks like an email address, the email is tried.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no account matches or the
    /// password is wrong.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, AuthError> {
        let login = login.trim();

        let mut user = self.store.find_user_by_username(login).await?;
        if user.is_none()
            && let Ok(email) = Email::parse(login)
        {
            user = self.store.find_user_by_email(&email).await?;
        }
        let user = user.ok_or(AuthError::InvalidCredentials)?;

        let hash = self
            .store
            .get_password_hash(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user no longer exists.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    /// Issue a reset token for the account registered under `email`.
    ///
    /// Returns `Ok(None)` for unknown addresses so callers can answer the same
    /// way whether or not the account exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the address is malformed.
    #[instrument(skip(self))]
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, PasswordResetToken)>, AuthError> {
        let email = Email::parse(email)?;

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            tracing::info!("password reset requested for unknown email");
            return Ok(None);
        };

        let purged = self
            .store
            .delete_reset_tokens_created_before(Utc::now() - PasswordResetToken::VALIDITY)
            .await?;
        if purged > 0 {
            tracing::debug!(purged, "expired reset tokens deleted");
        }

        let token = self
            .store
            .create_reset_token(user.id, &generate_reset_token())
            .await?;

        tracing::info!(user_id = %user.id, "password reset token issued");
        Ok(Some((user, token)))
    }

    /// Look up a reset token and check it is still inside its window.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token doesn't exist.
    /// Returns `AuthError::ExpiredToken` if it is older than
    /// [`PasswordResetToken::VALIDITY`].
    pub async fn validate_reset_token(&self, token: &str) -> Result<PasswordResetToken, AuthError> {
        let token = self
            .store
            .find_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !token.is_valid(Utc::now()) {
            return Err(AuthError::ExpiredToken);
        }

        Ok(token)
    }

    /// Set a new password using a reset token. All of the user's outstanding
    /// tokens are consumed.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::validate_reset_token`], or
    /// `AuthError::WeakPassword` if the new password is too short.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<UserId, AuthError> {
        let token = self.validate_reset_token(token).await?;
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        self.store
            .set_password_hash(token.user_id, &password_hash)
            .await?;
        let consumed = self.store.delete_reset_tokens(token.user_id).await?;

        tracing::info!(user_id = %token.user_id, consumed, "password reset");
        Ok(token.user_id)
    }
}

fn validate_username(username: &str) -> Result<String, AuthError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("username is required".to_owned()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidUsername(
            "username cannot contain spaces".to_owned(),
        ));
    }
    Ok(username.to_owned())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// A fresh alphanumeric token of [`PasswordResetToken::LENGTH`] characters.
fn generate_reset_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PasswordResetToken::LENGTH)
        .map(char::from)
        .collect()
}

//! Account lifecycle: registration, email verification, login and password
//! reset.
//!
//! Registration is deferred: `register` only mails a signed token holding the
//! requested credentials, and the user row is written by `verify` once the
//! link comes back. Login and reset never keep server-side state either; the
//! tokens they issue expire on their own.

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use super::{
    claims::PendingRegistration,
    jwt::TokenKeys,
    password::{hash_password, verify_password},
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};
use crate::{error::Message, mailer::Mailer, mailer::MailContent, state::AppState};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists")]
    DuplicateAccount,
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
    /// Unknown email and wrong password look the same to the caller.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    AccountNotFound,
    #[error("service temporarily unavailable")]
    CollaboratorUnavailable(#[source] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => AuthError::DuplicateAccount,
            StoreError::Other(e) => AuthError::CollaboratorUnavailable(e),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::Validation(_)
            | AuthError::DuplicateAccount
            | AuthError::InvalidOrExpiredToken
            | AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::AccountNotFound => StatusCode::NOT_FOUND,
            AuthError::CollaboratorUnavailable(e) => {
                error!(error = %format!("{:#}", e), "collaborator failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(Message::new(self.to_string()))).into_response()
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    keys: TokenKeys,
    frontend_origin: String,
}

impl FromRef<AppState> for AccountService {
    fn from_ref(state: &AppState) -> Self {
        AccountService::new(
            state.users.clone(),
            state.mailer.clone(),
            TokenKeys::from_ref(state),
            state.config.frontend_origin.clone(),
        )
    }
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        keys: TokenKeys,
        frontend_origin: String,
    ) -> Self {
        Self {
            users,
            mailer,
            keys,
            frontend_origin,
        }
    }

    /// Mails a verification link for a not-yet-existing account. Nothing is
    /// persisted here.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required".into()));
        }
        if !is_valid_email(email) {
            return Err(AuthError::Validation("Invalid email".into()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".into()));
        }

        if self.users.find_by_email(email).await?.is_some() {
            warn!(%email, "register: email already registered");
            return Err(AuthError::DuplicateAccount);
        }

        let token = self
            .keys
            .issue_registration(PendingRegistration {
                username: username.trim().to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .map_err(AuthError::CollaboratorUnavailable)?;

        let mail = MailContent::verification(&self.frontend_origin, &token);
        self.mailer
            .send_mail(email, &mail.subject, &mail.body)
            .await
            .map_err(AuthError::CollaboratorUnavailable)?;

        info!(%email, "verification mail sent");
        Ok(())
    }

    /// Turns a registration token into a stored user.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<User, AuthError> {
        let pending = self.keys.verify_registration(token).map_err(|e| {
            warn!(error = %e, "verify: token rejected");
            AuthError::InvalidOrExpiredToken
        })?;

        if self.users.find_by_email(&pending.email).await?.is_some() {
            warn!(email = %pending.email, "verify: account already exists");
            return Err(AuthError::DuplicateAccount);
        }

        let password_hash =
            hash_password(&pending.password).map_err(AuthError::CollaboratorUnavailable)?;
        // the unique index is the real guard against a concurrent verify
        let user = self
            .users
            .create(NewUser {
                username: pending.username,
                email: pending.email,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, email = %user.email, "user verified");
        Ok(user)
    }

    /// Returns a session token for matching credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!(%email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let ok = verify_password(password, &user.password_hash)
            .map_err(AuthError::CollaboratorUnavailable)?;
        if !ok {
            warn!(%email, user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .keys
            .issue_session(&user)
            .map_err(AuthError::CollaboratorUnavailable)?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    /// Mails a reset link. Unknown addresses are reported as such.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!(%email, "forgot-password unknown email");
            return Err(AuthError::AccountNotFound);
        };

        let token = self
            .keys
            .issue_reset(&user)
            .map_err(AuthError::CollaboratorUnavailable)?;
        let mail = MailContent::password_reset(&self.frontend_origin, &token);
        self.mailer
            .send_mail(&user.email, &mail.subject, &mail.body)
            .await
            .map_err(AuthError::CollaboratorUnavailable)?;

        info!(user_id = %user.id, "password reset mail sent");
        Ok(())
    }

    /// Replaces the password of the user named by a reset token. Session
    /// tokens issued earlier stay valid until they expire.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let grant = self.keys.verify_reset(token).map_err(|e| {
            warn!(error = %e, "reset-password: token rejected");
            AuthError::InvalidOrExpiredToken
        })?;

        if new_password.is_empty() {
            return Err(AuthError::Validation("Password is required".into()));
        }

        let Some(mut user) = self.users.find_by_id(grant.user_id).await? else {
            warn!(user_id = %grant.user_id, "reset-password: user gone");
            return Err(AuthError::AccountNotFound);
        };

        user.password_hash =
            hash_password(new_password).map_err(AuthError::CollaboratorUnavailable)?;
        self.users.save(&user).await?;

        info!(user_id = %user.id, "password reset");
        Ok(())
    }

    pub async fn find_user(&self, id: uuid::Uuid) -> Result<User, AuthError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }
}

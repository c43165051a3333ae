use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::{Credentials, NewUser, User};
use crate::domain::error::DomainError;
use crate::domain::repo::UsersRepository;
use crate::security::password::{hash_password, verify_password};
use crate::security::TokenService;

/// Account service: registration, login, and the admin check.
///
/// Admin status is derived from the email domain at registration time and
/// stored on the row, so later policy changes do not retroactively demote
/// existing admins.
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UsersRepository>,
    tokens: TokenService,
    admin_email_domain: String,
    min_password_len: usize,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn UsersRepository>,
        tokens: TokenService,
        admin_email_domain: impl Into<String>,
        min_password_len: usize,
    ) -> Self {
        Self {
            repo,
            tokens,
            admin_email_domain: admin_email_domain.into(),
            min_password_len,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new account and issue its first token.
    #[instrument(name = "commerce.service.register", skip(self, new_user), fields(email = %new_user.email))]
    pub async fn register(&self, new_user: NewUser) -> Result<(User, String), DomainError> {
        info!("Registering user");

        let email = new_user.email.trim().to_lowercase();
        self.validate_registration(&email, &new_user)?;

        if self
            .repo
            .email_exists(&email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::email_already_exists(email));
        }

        let password_hash = hash_password(&new_user.password)
            .map_err(|e| DomainError::internal(e.to_string()))?;

        // A blank display name falls back to the email's local part.
        let display_name = match new_user.display_name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };

        let user = User {
            id: Uuid::new_v4(),
            is_admin: email.ends_with(&self.admin_email_domain),
            display_name,
            email,
            created_at: Utc::now(),
        };

        self.repo
            .insert(user.clone(), password_hash)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let token = self
            .tokens
            .issue(user.id)
            .map_err(|e| DomainError::internal(e.to_string()))?;

        info!(user_id = %user.id, "Successfully registered user");
        Ok((user, token))
    }

    /// Authenticate and issue a token.
    #[instrument(name = "commerce.service.login", skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: Credentials) -> Result<(User, String), DomainError> {
        debug!("Logging in");

        let email = credentials.email.trim().to_lowercase();
        let found = self
            .repo
            .find_by_email(&email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        // Unknown email and wrong password are indistinguishable to callers.
        let Some((user, stored_hash)) = found else {
            warn!("Login attempt for unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        if !verify_password(&credentials.password, &stored_hash) {
            warn!(user_id = %user.id, "Password verification failed");
            return Err(DomainError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(user.id)
            .map_err(|e| DomainError::internal(e.to_string()))?;

        info!(user_id = %user.id, "Successfully logged in");
        Ok((user, token))
    }

    /// The user behind a verified token subject.
    #[instrument(name = "commerce.service.current_user", skip(self), fields(user_id = %user_id))]
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(user_id))
    }

    /// Like `current_user`, but rejects non-admins.
    pub async fn require_admin(&self, user_id: Uuid) -> Result<User, DomainError> {
        let user = self.current_user(user_id).await?;
        if !user.is_admin {
            warn!(user_id = %user.id, "Admin access denied");
            return Err(DomainError::Forbidden);
        }
        Ok(user)
    }

    fn validate_registration(&self, email: &str, new_user: &NewUser) -> Result<(), DomainError> {
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("email", "invalid email address"));
        }
        if new_user.password.len() < self.min_password_len {
            return Err(DomainError::validation(
                "password",
                format!(
                    "password must be at least {} characters",
                    self.min_password_len
                ),
            ));
        }
        Ok(())
    }
}

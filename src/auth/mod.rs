//! Orchestration of sign-up, email confirmation, sign-in and sign-out over an
//! [`IdentityProvider`] and a [`UserStore`].
//!
//! Every operation validates its inputs before any remote call, performs its
//! remote calls strictly in sequence, and reports failures as an [`AuthError`]
//! that the HTTP layer renders with [`AuthError::status_code`] and
//! [`AuthError::body`]. Nothing is retried.
//!
//! ## Duplicate emails
//!
//! The profile lookup before sign-up is only a pre-check. The provider rejects a
//! second account for the same username with `UsernameExistsException`, which is
//! the actual guard when two sign-ups race.

mod error;
mod saga;

pub use error::{AuthError, ErrorBody, Operation};
pub use saga::SagaFailure;

use crate::{
    identity::{IdentityProvider, UserAttribute},
    store::{UserProfile, UserStore},
};
use saga::SignUpSaga;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    user_pool_id: Option<String>,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the compensating `AdminDeleteUser` when the profile write fails.
    #[must_use]
    pub fn with_user_pool_id(mut self, user_pool_id: Option<String>) -> Self {
        self.user_pool_id = user_pool_id.filter(|id| !id.is_empty());
        self
    }

    #[must_use]
    pub fn user_pool_id(&self) -> Option<&str> {
        self.user_pool_id.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmEmailInput {
    pub email: Option<String>,
    pub confirmation_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOutInput {
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user_confirmed: bool,
    pub user_sub: String,
    pub user: UserProfile,
}

/// Token bundle of a successful sign-in, passed through from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInTokens {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

/// Returns the value only when it is present and non-empty.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|value| !value.is_empty())
}

pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn UserStore>,
        config: AuthConfig,
    ) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    /// Create the provider account, then the local `PENDING` profile.
    ///
    /// # Errors
    /// `Validation` and `DuplicateUser` before any provider call, `Provider`
    /// when account creation is rejected, and `SignUp` with the saga outcome
    /// when the profile write fails afterwards.
    #[instrument(skip_all)]
    pub async fn sign_up(&self, input: &SignUpInput) -> Result<SignUpOutcome, AuthError> {
        let (Some(email), Some(password), Some(full_name)) = (
            present(input.email.as_ref()),
            present(input.password.as_ref()),
            present(input.full_name.as_ref()),
        ) else {
            return Err(AuthError::Validation(Operation::SignUp));
        };

        if self.store.find_by_email(email).await?.is_some() {
            debug!(email, "profile already exists");
            return Err(AuthError::DuplicateUser);
        }

        let attributes = [
            UserAttribute::new("email", email),
            UserAttribute::new("name", full_name),
        ];
        let created = self.provider.sign_up(email, password, &attributes).await?;

        let saga = SignUpSaga {
            provider: self.provider.as_ref(),
            store: self.store.as_ref(),
            user_pool_id: self.config.user_pool_id(),
            email,
            full_name,
        };
        let (output, user) = saga.run(created).await.map_err(AuthError::SignUp)?;

        Ok(SignUpOutcome {
            user_confirmed: output.user_confirmed,
            user_sub: output.user_sub,
            user,
        })
    }

    /// Confirm the code with the provider, then mark the profile `CONFIRMED`.
    ///
    /// A missing profile row is not an error.
    ///
    /// # Errors
    /// `Validation`, `Provider` for a rejected code, `Store` when the status update fails.
    #[instrument(skip_all)]
    pub async fn confirm_email(&self, input: &ConfirmEmailInput) -> Result<(), AuthError> {
        let (Some(email), Some(code)) = (
            present(input.email.as_ref()),
            present(input.confirmation_code.as_ref()),
        ) else {
            return Err(AuthError::Validation(Operation::ConfirmEmail));
        };

        self.provider.confirm_sign_up(email, code).await?;

        if self.store.set_confirmed_by_email(email).await?.is_none() {
            warn!(email, "email confirmed with provider but no local profile exists");
        }

        Ok(())
    }

    /// # Errors
    /// `Validation`, `Provider` for rejected credentials, `InvalidSignInResponse`
    /// when the provider answers without an access token.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, input: &SignInInput) -> Result<SignInTokens, AuthError> {
        let (Some(email), Some(password)) = (
            present(input.email.as_ref()),
            present(input.password.as_ref()),
        ) else {
            return Err(AuthError::Validation(Operation::SignIn));
        };

        let result = self.provider.initiate_auth(email, password).await?;

        let Some(access_token) = result.access_token.filter(|token| !token.is_empty()) else {
            warn!(email, "provider returned no access token");
            return Err(AuthError::InvalidSignInResponse);
        };

        Ok(SignInTokens {
            access_token,
            id_token: result.id_token,
            refresh_token: result.refresh_token,
            expires_in: result.expires_in,
            token_type: result.token_type,
        })
    }

    /// # Errors
    /// `Validation` or `Provider`.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, input: &SignOutInput) -> Result<(), AuthError> {
        let Some(access_token) = present(input.access_token.as_ref()) else {
            return Err(AuthError::Validation(Operation::SignOut));
        };

        self.provider.global_sign_out(access_token).await?;

        Ok(())
    }
}

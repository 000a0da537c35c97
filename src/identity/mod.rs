//! Identity provider seam: the operations the orchestrator needs from the
//! credential system of record, and the closed set of provider error names
//! that are treated as caller mistakes.

pub mod cognito;

pub use self::cognito::CognitoIdentityProvider;

use crate::aws::{AwsError, UNKNOWN_ERROR};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Provider error categories that are reported as client errors.
///
/// Anything not listed here is `Other` and classified as a server error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    NotAuthorized,
    UsernameExists,
    InvalidPassword,
    CodeMismatch,
    ExpiredCode,
    Other(String),
}

impl ProviderErrorKind {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "NotAuthorizedException" => Self::NotAuthorized,
            "UsernameExistsException" => Self::UsernameExists,
            "InvalidPasswordException" => Self::InvalidPassword,
            "CodeMismatchException" => Self::CodeMismatch,
            "ExpiredCodeException" => Self::ExpiredCode,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::NotAuthorized => "NotAuthorizedException",
            Self::UsernameExists => "UsernameExistsException",
            Self::InvalidPassword => "InvalidPasswordException",
            Self::CodeMismatch => "CodeMismatchException",
            Self::ExpiredCode => "ExpiredCodeException",
            Self::Other(name) => name,
        }
    }

    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::NotAuthorized
            | Self::UsernameExists
            | Self::InvalidPassword
            | Self::CodeMismatch
            | Self::ExpiredCode => true,
            Self::Other(_) => false,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("identity provider error {kind}: {message}")]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
}

impl ProviderError {
    #[must_use]
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &ProviderErrorKind {
        &self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<AwsError> for ProviderError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::Service { name, message, .. } => {
                Self::new(ProviderErrorKind::from_name(&name), message)
            }
            other => Self::new(
                ProviderErrorKind::Other(UNKNOWN_ERROR.to_string()),
                other.to_string(),
            ),
        }
    }
}

/// Attribute attached to a new provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttribute {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl UserAttribute {
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Result of an accepted account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutput {
    pub user_confirmed: bool,
    pub user_sub: String,
}

/// Tokens returned by a password authentication. Every field is optional
/// because the provider may answer with a challenge instead of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationResult {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

/// Credential system of record.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account; `username` doubles as the correlation key to the profile.
    async fn sign_up(
        &self,
        username: &str,
        password: &str,
        attributes: &[UserAttribute],
    ) -> Result<SignUpOutput, ProviderError>;

    /// Verify the out-of-band confirmation code.
    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), ProviderError>;

    /// Username/password authentication flow.
    async fn initiate_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, ProviderError>;

    /// Revoke every token issued to the owner of `access_token`.
    async fn global_sign_out(&self, access_token: &str) -> Result<(), ProviderError>;

    /// Administrative account deletion; only used to undo a sign-up.
    async fn admin_delete_user(&self, user_pool_id: &str, username: &str)
    -> Result<(), ProviderError>;
}

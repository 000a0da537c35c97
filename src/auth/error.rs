//! Failure taxonomy of the four operations and its translation to responses.

use super::saga::SagaFailure;
use crate::{identity::ProviderError, store::StoreError};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// User-facing operation; selects the default failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SignUp,
    ConfirmEmail,
    SignIn,
    SignOut,
}

impl Operation {
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::SignUp => "Sign up failed",
            Self::ConfirmEmail => "Email confirmation failed",
            Self::SignIn => "Sign in failed",
            Self::SignOut => "Sign out failed",
        }
    }

    #[must_use]
    pub const fn required_fields_message(self) -> &'static str {
        match self {
            Self::SignUp => "email, password and fullName are required",
            Self::ConfirmEmail => "email and confirmationCode are required",
            Self::SignIn => "email and password are required",
            Self::SignOut => "accessToken is required",
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Required input missing or empty; detected before any remote call.
    #[error("{}", .0.required_fields_message())]
    Validation(Operation),
    #[error("User with this email already exists")]
    DuplicateUser,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Provider accepted the credentials but returned no access token.
    #[error("Invalid sign in response")]
    InvalidSignInResponse,
    #[error("sign-up failed after account creation: {}", .0.tag())]
    SignUp(SagaFailure),
}

/// JSON error payload. `error` carries the machine-readable tag when there is one.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateUser => StatusCode::CONFLICT,
            Self::Provider(err) if err.kind().is_client_error() => StatusCode::BAD_REQUEST,
            Self::InvalidSignInResponse => StatusCode::UNAUTHORIZED,
            Self::Provider(_) | Self::Store(_) | Self::SignUp(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Response body for a failure of `operation`.
    #[must_use]
    pub fn body(&self, operation: Operation) -> ErrorBody {
        let (message, error) = match self {
            Self::Validation(op) => (op.required_fields_message(), None),
            Self::DuplicateUser => ("User with this email already exists", None),
            Self::InvalidSignInResponse => ("Invalid sign in response", None),
            Self::Provider(err) => (operation.failure_message(), Some(err.name())),
            Self::Store(err) => (operation.failure_message(), Some(err.name())),
            Self::SignUp(failure) => (Operation::SignUp.failure_message(), Some(failure.tag())),
        };

        ErrorBody {
            message: message.to_string(),
            error: error.map(str::to_string),
        }
    }
}

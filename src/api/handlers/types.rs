//! Request/response types for auth endpoints.
//!
//! Request fields are all optional so that absent and empty values reach the
//! orchestrator's validation instead of failing deserialization.

use crate::{
    auth::{
        ConfirmEmailInput, SignInInput, SignInTokens, SignOutInput, SignUpInput, SignUpOutcome,
    },
    store::UserProfile,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const SIGN_UP_SUCCESS: &str = "Sign up successful. Please confirm your email.";
pub const CONFIRM_EMAIL_SUCCESS: &str = "Email confirmed successfully";
pub const SIGN_IN_SUCCESS: &str = "Sign in successful";
pub const SIGN_OUT_SUCCESS: &str = "Sign out successful";

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

impl From<SignUpRequest> for SignUpInput {
    fn from(request: SignUpRequest) -> Self {
        Self {
            email: request.email,
            password: request.password,
            full_name: request.full_name,
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub message: String,
    pub user_confirmed: bool,
    pub user_sub: String,
    pub user: UserProfile,
}

impl From<SignUpOutcome> for SignUpResponse {
    fn from(outcome: SignUpOutcome) -> Self {
        Self {
            message: SIGN_UP_SUCCESS.to_string(),
            user_confirmed: outcome.user_confirmed,
            user_sub: outcome.user_sub,
            user: outcome.user,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmEmailRequest {
    pub email: Option<String>,
    pub confirmation_code: Option<String>,
}

impl From<ConfirmEmailRequest> for ConfirmEmailInput {
    fn from(request: ConfirmEmailRequest) -> Self {
        Self {
            email: request.email,
            confirmation_code: request.confirmation_code,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<SignInRequest> for SignInInput {
    fn from(request: SignInRequest) -> Self {
        Self {
            email: request.email,
            password: request.password,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub message: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl From<SignInTokens> for SignInResponse {
    fn from(tokens: SignInTokens) -> Self {
        Self {
            message: SIGN_IN_SUCCESS.to_string(),
            access_token: tokens.access_token,
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignOutRequest {
    pub access_token: Option<String>,
}

impl From<SignOutRequest> for SignOutInput {
    fn from(request: SignOutRequest) -> Self {
        Self {
            access_token: request.access_token,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

//! # Authbridge (Cognito sign-up bridge with a DynamoDB profile mirror)
//!
//! `authbridge` forwards user-authentication operations to an Amazon Cognito
//! user pool and keeps a minimal profile row per user in a DynamoDB table.
//!
//! ## Operations
//!
//! - **Sign-up:** creates the Cognito account, then the local profile (`PENDING`).
//!   If the profile write fails the freshly created account is deleted again
//!   (when `USER_POOL_ID` is configured) and the outcome is reported with one of
//!   three tags so operators know whether the two systems are consistent.
//! - **Confirm email:** confirms the code with Cognito and flips the profile to
//!   `CONFIRMED`. A missing profile row does not fail the request.
//! - **Sign-in:** `USER_PASSWORD_AUTH` flow, returns the token bundle verbatim.
//! - **Sign-out:** global sign-out for the presented access token.
//!
//! ## Collaborators
//!
//! Cognito and DynamoDB are reached over their JSON HTTP protocols (see [`aws`]).
//! The orchestrator in [`auth`] only sees the [`identity::IdentityProvider`] and
//! [`store::UserStore`] traits.

pub mod api;
pub mod auth;
pub mod aws;
pub mod cli;
pub mod identity;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

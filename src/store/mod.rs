//! Local user profile mirror.
//!
//! The profile row is keyed by a generated `userId` and found by email through
//! a secondary index. Status moves `PENDING` -> `CONFIRMED` once and never back.

pub mod dynamo;

pub use self::dynamo::DynamoUserStore;

use crate::aws::{AwsError, UNKNOWN_ERROR};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;
use utoipa::ToSchema;

const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailedException";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Pending,
    Confirmed,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            other => Err(StoreError::InvalidItem(format!("unknown status {other}"))),
        }
    }
}

/// Persisted profile as returned to callers after creation.
#[derive(ToSchema, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub status: UserStatus,
    #[serde(serialize_with = "serialize_timestamp")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

/// Projection returned by email lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub user_id: String,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
}

/// `2024-01-01T00:00:00.000Z`
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(timestamp))
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("conditional write rejected: {0}")]
    ConditionFailed(String),
    #[error("invalid item: {0}")]
    InvalidItem(String),
    #[error(transparent)]
    Aws(AwsError),
}

impl StoreError {
    /// Name reported to callers in the `error` field.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::MissingField(_) => "InvalidInput",
            Self::ConditionFailed(_) => CONDITIONAL_CHECK_FAILED,
            Self::InvalidItem(_) => UNKNOWN_ERROR,
            Self::Aws(err) => err.name(),
        }
    }
}

impl From<AwsError> for StoreError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::Service { name, message, .. } if name == CONDITIONAL_CHECK_FAILED => {
                Self::ConditionFailed(message)
            }
            other => Self::Aws(other),
        }
    }
}

/// Profile persistence used by the orchestrator.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Secondary-index lookup; only the first match is consulted.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserSummary>, StoreError>;

    /// Guarded insert of a fresh `PENDING` profile under a newly generated id.
    async fn create(&self, user: &NewUser) -> Result<UserProfile, StoreError>;

    /// Mark the profile for `email` as `CONFIRMED`; `None` when no row matches.
    async fn set_confirmed_by_email(&self, email: &str)
    -> Result<Option<UserSummary>, StoreError>;
}

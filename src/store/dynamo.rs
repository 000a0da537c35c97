//! DynamoDB-backed [`UserStore`].
//!
//! Table layout: partition key `userId` (S), plus a global secondary index on
//! `email` that projects at least `status`.

use super::{NewUser, StoreError, UserProfile, UserStatus, UserStore, UserSummary, format_timestamp};
use crate::aws::{Credentials, DYNAMODB, JsonClient, Signing};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{Instrument, debug, info_span, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DynamoUserStore {
    client: JsonClient,
    table: String,
    email_index: String,
}

impl DynamoUserStore {
    /// # Errors
    /// Returns an error if the endpoint is invalid or the HTTP client cannot be built.
    pub fn new(
        region: &str,
        endpoint: Option<&str>,
        credentials: Credentials,
        table: String,
        email_index: String,
    ) -> Result<Self> {
        Ok(Self {
            client: JsonClient::new(DYNAMODB, region, endpoint, Some(credentials))?,
            table,
            email_index,
        })
    }

    async fn call(&self, operation: &'static str, body: &Value) -> Result<Value, StoreError> {
        let span = info_span!(
            "db.query",
            db.system = "dynamodb",
            db.operation = operation,
            db.table = %self.table
        );
        Ok(self
            .client
            .call(operation, body, Signing::Signed)
            .instrument(span)
            .await?)
    }
}

fn string_attribute<'a>(item: &'a Value, name: &str) -> Option<&'a str> {
    item.get(name)
        .and_then(|attribute| attribute.get("S"))
        .and_then(Value::as_str)
}

fn summary_from_item(item: &Value) -> Result<UserSummary, StoreError> {
    let user_id = string_attribute(item, "userId")
        .ok_or_else(|| StoreError::InvalidItem("missing userId".to_string()))?;
    // An unrecognised status still means the row exists.
    let status = string_attribute(item, "status").and_then(|raw| {
        raw.parse::<UserStatus>()
            .map_err(|err| debug!(user_id, error = %err, "ignoring stored status"))
            .ok()
    });

    Ok(UserSummary {
        user_id: user_id.to_string(),
        status,
    })
}

#[async_trait]
impl UserStore for DynamoUserStore {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserSummary>, StoreError> {
        if email.is_empty() {
            return Err(StoreError::MissingField("email"));
        }

        let body = json!({
            "TableName": self.table,
            "IndexName": self.email_index,
            "KeyConditionExpression": "#email = :email",
            "ExpressionAttributeValues": {":email": {"S": email}},
            "ProjectionExpression": "userId, #status",
            "ExpressionAttributeNames": {"#email": "email", "#status": "status"},
            "Limit": 1,
        });

        let response = self.call("Query", &body).await?;
        let Some(item) = response
            .get("Items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
        else {
            return Ok(None);
        };

        summary_from_item(item).map(Some)
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: &NewUser) -> Result<UserProfile, StoreError> {
        if user.email.is_empty() {
            return Err(StoreError::MissingField("email"));
        }
        if user.full_name.is_empty() {
            return Err(StoreError::MissingField("fullName"));
        }

        let profile = UserProfile {
            user_id: Uuid::new_v4().to_string(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            status: UserStatus::Pending,
            created_at: Utc::now(),
        };

        let body = json!({
            "TableName": self.table,
            "Item": {
                "userId": {"S": profile.user_id},
                "email": {"S": profile.email},
                "fullName": {"S": profile.full_name},
                "status": {"S": profile.status.as_str()},
                "createdAt": {"S": format_timestamp(&profile.created_at)},
            },
            "ConditionExpression": "attribute_not_exists(userId)",
        });

        self.call("PutItem", &body).await?;

        debug!(user_id = %profile.user_id, "profile created");

        Ok(profile)
    }

    #[instrument(skip(self))]
    async fn set_confirmed_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserSummary>, StoreError> {
        if email.is_empty() {
            return Err(StoreError::MissingField("email"));
        }

        let Some(existing) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        let body = json!({
            "TableName": self.table,
            "Key": {"userId": {"S": existing.user_id}},
            "UpdateExpression": "SET #status = :confirmed",
            "ExpressionAttributeNames": {"#status": "status"},
            "ExpressionAttributeValues": {":confirmed": {"S": UserStatus::Confirmed.as_str()}},
            "ConditionExpression": "attribute_exists(userId)",
        });

        self.call("UpdateItem", &body).await?;

        Ok(Some(UserSummary {
            user_id: existing.user_id,
            status: Some(UserStatus::Confirmed),
        }))
    }
}

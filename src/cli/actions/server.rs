use crate::{
    api,
    auth::{AuthConfig, AuthService},
    aws::Credentials,
    identity::CognitoIdentityProvider,
    store::DynamoUserStore,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
    pub cognito_endpoint: Option<String>,
    pub dynamodb_endpoint: Option<String>,
    pub client_id: String,
    pub user_pool_id: Option<String>,
    pub users_table: String,
    pub users_email_index: String,
}

/// Build the collaborators and serve the API.
/// # Errors
/// Returns an error if an endpoint is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let credentials = Credentials::new(
        args.access_key_id,
        args.secret_access_key,
        args.session_token,
    );

    let provider = CognitoIdentityProvider::new(
        &args.region,
        args.cognito_endpoint.as_deref(),
        args.client_id,
        Some(credentials.clone()),
    )
    .context("Failed to build Cognito client")?;

    let store = DynamoUserStore::new(
        &args.region,
        args.dynamodb_endpoint.as_deref(),
        credentials,
        args.users_table,
        args.users_email_index,
    )
    .context("Failed to build DynamoDB client")?;

    let auth = AuthService::new(
        Arc::new(provider),
        Arc::new(store),
        AuthConfig::new().with_user_pool_id(args.user_pool_id),
    );

    api::new(args.port, Arc::new(auth)).await
}

fn log_startup_args(args: &Args) {
    let or_default = |value: &Option<String>, default: &str| {
        value.clone().unwrap_or_else(|| default.to_string())
    };
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("region", args.region.clone()),
        ("client_id", args.client_id.clone()),
        (
            "user_pool_id",
            or_default(&args.user_pool_id, "none (rollback disabled)"),
        ),
        ("users_table", args.users_table.clone()),
        ("users_email_index", args.users_email_index.clone()),
        ("cognito_endpoint", or_default(&args.cognito_endpoint, "default")),
        ("dynamodb_endpoint", or_default(&args.dynamodb_endpoint, "default")),
        ("session_token_set", args.session_token.is_some().to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}

use anyhow::bail;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_AWS_REGION: &str = "region";
pub const ARG_AWS_ACCESS_KEY_ID: &str = "aws-access-key-id";
pub const ARG_AWS_SECRET_ACCESS_KEY: &str = "aws-secret-access-key";
pub const ARG_AWS_SESSION_TOKEN: &str = "aws-session-token";
pub const ARG_COGNITO_ENDPOINT: &str = "cognito-endpoint";
pub const ARG_DYNAMODB_ENDPOINT: &str = "dynamodb-endpoint";

#[derive(Debug)]
pub struct Options {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
    pub cognito_endpoint: Option<String>,
    pub dynamodb_endpoint: Option<String>,
}

impl Options {
    /// Parse AWS region, credentials and endpoint overrides.
    ///
    /// # Errors
    /// Returns an error if the region or the static credentials are missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // clap passes "" through when the env var is set but empty
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(region) = get_non_empty(ARG_AWS_REGION) else {
            bail!("missing required argument: --{ARG_AWS_REGION}");
        };
        let Some(access_key_id) = get_non_empty(ARG_AWS_ACCESS_KEY_ID) else {
            bail!("missing required argument: --{ARG_AWS_ACCESS_KEY_ID}");
        };
        let Some(secret_access_key) = get_non_empty(ARG_AWS_SECRET_ACCESS_KEY) else {
            bail!("missing required argument: --{ARG_AWS_SECRET_ACCESS_KEY}");
        };

        Ok(Self {
            region,
            access_key_id,
            secret_access_key: SecretString::from(secret_access_key),
            session_token: get_non_empty(ARG_AWS_SESSION_TOKEN).map(SecretString::from),
            cognito_endpoint: get_non_empty(ARG_COGNITO_ENDPOINT),
            dynamodb_endpoint: get_non_empty(ARG_DYNAMODB_ENDPOINT),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AWS_REGION)
                .long(ARG_AWS_REGION)
                .help("AWS region of the user pool and the users table")
                .env("AWS_REGION"),
        )
        .arg(
            Arg::new(ARG_AWS_ACCESS_KEY_ID)
                .long(ARG_AWS_ACCESS_KEY_ID)
                .help("AWS access key id used to sign DynamoDB and admin Cognito requests")
                .env("AWS_ACCESS_KEY_ID"),
        )
        .arg(
            Arg::new(ARG_AWS_SECRET_ACCESS_KEY)
                .long(ARG_AWS_SECRET_ACCESS_KEY)
                .help("AWS secret access key")
                .env("AWS_SECRET_ACCESS_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_AWS_SESSION_TOKEN)
                .long(ARG_AWS_SESSION_TOKEN)
                .help("AWS session token for temporary credentials")
                .env("AWS_SESSION_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_COGNITO_ENDPOINT)
                .long(ARG_COGNITO_ENDPOINT)
                .help("Cognito Identity Provider endpoint override")
                .long_help(
                    "Cognito Identity Provider endpoint override, e.g. a local emulator.\n\nDefaults to https://cognito-idp.<region>.amazonaws.com/",
                )
                .env("AWS_ENDPOINT_URL_COGNITO_IDENTITY_PROVIDER"),
        )
        .arg(
            Arg::new(ARG_DYNAMODB_ENDPOINT)
                .long(ARG_DYNAMODB_ENDPOINT)
                .help("DynamoDB endpoint override")
                .long_help(
                    "DynamoDB endpoint override, e.g. DynamoDB Local.\n\nDefaults to https://dynamodb.<region>.amazonaws.com/",
                )
                .env("AWS_ENDPOINT_URL_DYNAMODB"),
        )
}

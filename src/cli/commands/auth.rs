use anyhow::bail;
use clap::{Arg, ArgMatches, Command};

pub const ARG_CLIENT_ID: &str = "client-id";
pub const ARG_USER_POOL_ID: &str = "user-pool-id";
pub const ARG_USERS_TABLE: &str = "users-table";
pub const ARG_USERS_EMAIL_INDEX: &str = "users-email-index";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub client_id: String,
    pub user_pool_id: Option<String>,
    pub users_table: String,
    pub users_email_index: String,
}

impl Options {
    /// Parse user pool client and users table arguments.
    ///
    /// # Errors
    /// Returns an error if the client id or the table name is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(client_id) = get_non_empty(ARG_CLIENT_ID) else {
            bail!("missing required argument: --{ARG_CLIENT_ID}");
        };
        let Some(users_table) = get_non_empty(ARG_USERS_TABLE) else {
            bail!("missing required argument: --{ARG_USERS_TABLE}");
        };

        Ok(Self {
            client_id,
            user_pool_id: get_non_empty(ARG_USER_POOL_ID),
            users_table,
            users_email_index: get_non_empty(ARG_USERS_EMAIL_INDEX)
                .unwrap_or_else(|| DEFAULT_EMAIL_INDEX.to_string()),
        })
    }
}

const DEFAULT_EMAIL_INDEX: &str = "EmailIndex";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CLIENT_ID)
                .long(ARG_CLIENT_ID)
                .help("Cognito user pool app client id")
                .env("CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_USER_POOL_ID)
                .long(ARG_USER_POOL_ID)
                .help("Cognito user pool id, enables sign-up rollback")
                .long_help(
                    "Cognito user pool id.\n\nWhen set, a sign-up whose profile write fails deletes the freshly created account again (AdminDeleteUser). When unset the account is left behind and the failure is reported as UserCreatedInCognitoButDbWriteFailed.",
                )
                .env("USER_POOL_ID"),
        )
        .arg(
            Arg::new(ARG_USERS_TABLE)
                .long(ARG_USERS_TABLE)
                .help("DynamoDB table holding user profiles")
                .env("USERS_TABLE"),
        )
        .arg(
            Arg::new(ARG_USERS_EMAIL_INDEX)
                .long(ARG_USERS_EMAIL_INDEX)
                .help("Global secondary index on email")
                .env("USERS_EMAIL_INDEX")
                .default_value(DEFAULT_EMAIL_INDEX),
        )
}

//! Map validated CLI matches to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, auth, aws};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let aws_opts = aws::Options::parse(matches)?;
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        region: aws_opts.region,
        access_key_id: aws_opts.access_key_id,
        secret_access_key: aws_opts.secret_access_key,
        session_token: aws_opts.session_token,
        cognito_endpoint: aws_opts.cognito_endpoint,
        dynamodb_endpoint: aws_opts.dynamodb_endpoint,
        client_id: auth_opts.client_id,
        user_pool_id: auth_opts.user_pool_id,
        users_table: auth_opts.users_table,
        users_email_index: auth_opts.users_email_index,
    }))
}

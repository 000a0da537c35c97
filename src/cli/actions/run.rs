use crate::cli::{
    actions::{Action, server},
    telemetry,
};
use anyhow::Result;

/// Single dispatch point for all CLI actions; flushes traces once the action ends.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    let result = match action {
        Action::Server(args) => server::execute(args).await,
    };

    telemetry::shutdown_tracer();

    result
}

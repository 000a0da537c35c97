use crate::GIT_COMMIT_HASH;

// axum handler for `/`
pub async fn root() -> String {
    let short_hash = GIT_COMMIT_HASH.get(..7).unwrap_or(GIT_COMMIT_HASH);
    format!(
        "{} {} ({short_hash})\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

//! HTTP handlers. Each auth handler parses its body leniently, calls the
//! matching [`AuthService`](crate::auth::AuthService) operation and renders the
//! result; [`AuthError`] never escapes untranslated.

pub mod confirm_email;
pub mod health;
pub mod root;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod types;

use crate::auth::{AuthError, Operation};
use axum::{
    Json,
    body::Bytes,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Render a failed operation as `status` + JSON [`ErrorBody`](crate::auth::ErrorBody).
pub(crate) fn error_response(err: &AuthError, operation: Operation) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "{}", operation.failure_message());
    } else {
        debug!(error = %err, status = status.as_u16(), "request rejected");
    }

    (status, Json(err.body(operation))).into_response()
}

/// Parse a JSON body whatever its `Content-Type`; a missing or malformed body counts as empty.
pub(crate) fn body_or_default<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

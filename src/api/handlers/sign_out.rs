use super::{
    body_or_default, error_response,
    types::{MessageResponse, SIGN_OUT_SUCCESS, SignOutRequest},
};
use crate::auth::{AuthService, ErrorBody, Operation};
use axum::{
    Json,
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/v1/auth/sign-out",
    request_body = SignOutRequest,
    responses (
        (status = 200, description = "All sessions of the token's user revoked", body = MessageResponse),
        (status = 400, description = "Missing or rejected access token", body = ErrorBody),
        (status = 500, description = "Sign out failed", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip(auth, body))]
pub async fn sign_out(
    auth: Extension<Arc<AuthService>>,
    body: Bytes,
) -> Response {
    let request: SignOutRequest = body_or_default(&body);

    match auth.sign_out(&request.into()).await {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new(SIGN_OUT_SUCCESS))).into_response(),
        Err(err) => error_response(&err, Operation::SignOut),
    }
}

use super::{
    body_or_default, error_response,
    types::{SignUpRequest, SignUpResponse},
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
    path = "/v1/auth/sign-up",
    request_body = SignUpRequest,
    responses (
        (status = 200, description = "Account created, profile stored as PENDING", body = SignUpResponse),
        (status = 400, description = "Missing fields or account rejected by the identity provider", body = ErrorBody),
        (status = 409, description = "User with this email already exists", body = ErrorBody),
        (status = 500, description = "Sign-up failed; `error` carries the failure tag", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip(auth, body))]
pub async fn sign_up(
    auth: Extension<Arc<AuthService>>,
    body: Bytes,
) -> Response {
    let request: SignUpRequest = body_or_default(&body);

    match auth.sign_up(&request.into()).await {
        Ok(outcome) => (StatusCode::OK, Json(SignUpResponse::from(outcome))).into_response(),
        Err(err) => error_response(&err, Operation::SignUp),
    }
}

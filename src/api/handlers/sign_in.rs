use super::{
    body_or_default, error_response,
    types::{SignInRequest, SignInResponse},
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
    path = "/v1/auth/sign-in",
    request_body = SignInRequest,
    responses (
        (status = 200, description = "Token bundle from the identity provider", body = SignInResponse),
        (status = 400, description = "Missing fields or credentials rejected", body = ErrorBody),
        (status = 401, description = "Identity provider returned no access token", body = ErrorBody),
        (status = 500, description = "Sign in failed", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip(auth, body))]
pub async fn sign_in(
    auth: Extension<Arc<AuthService>>,
    body: Bytes,
) -> Response {
    let request: SignInRequest = body_or_default(&body);

    match auth.sign_in(&request.into()).await {
        Ok(tokens) => (StatusCode::OK, Json(SignInResponse::from(tokens))).into_response(),
        Err(err) => error_response(&err, Operation::SignIn),
    }
}

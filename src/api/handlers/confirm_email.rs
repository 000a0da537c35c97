use super::{
    body_or_default, error_response,
    types::{CONFIRM_EMAIL_SUCCESS, ConfirmEmailRequest, MessageResponse},
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
    path = "/v1/auth/confirm-email",
    request_body = ConfirmEmailRequest,
    responses (
        (status = 200, description = "Email confirmed, profile marked CONFIRMED", body = MessageResponse),
        (status = 400, description = "Missing fields, wrong or expired code", body = ErrorBody),
        (status = 500, description = "Email confirmation failed", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip(auth, body))]
pub async fn confirm_email(
    auth: Extension<Arc<AuthService>>,
    body: Bytes,
) -> Response {
    let request: ConfirmEmailRequest = body_or_default(&body);

    match auth.confirm_email(&request.into()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new(CONFIRM_EMAIL_SUCCESS)),
        )
            .into_response(),
        Err(err) => error_response(&err, Operation::ConfirmEmail),
    }
}

//! Amazon Cognito user pool client.
//!
//! `SignUp`, `ConfirmSignUp`, `InitiateAuth` and `GlobalSignOut` are public
//! app-client APIs and go out unsigned. `AdminDeleteUser` is IAM-authorised and
//! is the only signed call.

use super::{
    AuthenticationResult, IdentityProvider, ProviderError, ProviderErrorKind, SignUpOutput,
    UserAttribute,
};
use crate::aws::{AwsError, COGNITO_IDP, Credentials, JsonClient, Signing};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

const PASSWORD_AUTH_FLOW: &str = "USER_PASSWORD_AUTH";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpRequest<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    user_attributes: &'a [UserAttribute],
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
struct SignUpResponse {
    user_confirmed: bool,
    user_sub: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ConfirmSignUpRequest<'a> {
    client_id: &'a str,
    username: &'a str,
    confirmation_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    client_id: &'a str,
    auth_flow: &'a str,
    auth_parameters: PasswordParameters<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct PasswordParameters<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<TokenBundle>,
    challenge_name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct TokenBundle {
    access_token: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    token_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GlobalSignOutRequest<'a> {
    access_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AdminDeleteUserRequest<'a> {
    user_pool_id: &'a str,
    username: &'a str,
}

#[derive(Debug, Clone)]
pub struct CognitoIdentityProvider {
    client: JsonClient,
    client_id: String,
}

impl CognitoIdentityProvider {
    /// Build a provider for the app client `client_id`.
    ///
    /// `credentials` are only needed for `AdminDeleteUser`.
    ///
    /// # Errors
    /// Returns an error if the endpoint is invalid or the HTTP client cannot be built.
    pub fn new(
        region: &str,
        endpoint: Option<&str>,
        client_id: String,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        Ok(Self {
            client: JsonClient::new(COGNITO_IDP, region, endpoint, credentials)?,
            client_id,
        })
    }

    async fn call<T: Serialize + Sync>(
        &self,
        operation: &str,
        request: &T,
        signing: Signing,
    ) -> Result<Value, ProviderError> {
        let body = serde_json::to_value(request).map_err(|err| {
            ProviderError::new(
                ProviderErrorKind::Other("SerializationException".to_string()),
                err.to_string(),
            )
        })?;
        Ok(self.client.call(operation, &body, signing).await?)
    }
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, ProviderError> {
    serde_json::from_value(value)
        .map_err(|err| ProviderError::from(AwsError::InvalidResponse(err.to_string())))
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    #[instrument(skip(self, password, attributes))]
    async fn sign_up(
        &self,
        username: &str,
        password: &str,
        attributes: &[UserAttribute],
    ) -> Result<SignUpOutput, ProviderError> {
        let request = SignUpRequest {
            client_id: &self.client_id,
            username,
            password,
            user_attributes: attributes,
        };
        // A 2xx means the account exists; an odd body must not skip the saga.
        let value = self.call("SignUp", &request, Signing::Unsigned).await?;
        let response: SignUpResponse = serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(error = %err, "SignUp accepted with an undecodable body");
            SignUpResponse::default()
        });

        Ok(SignUpOutput {
            user_confirmed: response.user_confirmed,
            user_sub: response.user_sub,
        })
    }

    #[instrument(skip(self, code))]
    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), ProviderError> {
        let request = ConfirmSignUpRequest {
            client_id: &self.client_id,
            username,
            confirmation_code: code,
        };
        self.call("ConfirmSignUp", &request, Signing::Unsigned)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, password))]
    async fn initiate_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, ProviderError> {
        let request = InitiateAuthRequest {
            client_id: &self.client_id,
            auth_flow: PASSWORD_AUTH_FLOW,
            auth_parameters: PasswordParameters { username, password },
        };
        let response: InitiateAuthResponse =
            decode(self.call("InitiateAuth", &request, Signing::Unsigned).await?)?;

        if let Some(challenge) = &response.challenge_name {
            debug!(challenge = %challenge, "InitiateAuth answered with a challenge");
        }

        let tokens = response.authentication_result.unwrap_or_default();
        Ok(AuthenticationResult {
            access_token: tokens.access_token,
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        })
    }

    #[instrument(skip_all)]
    async fn global_sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let request = GlobalSignOutRequest { access_token };
        self.call("GlobalSignOut", &request, Signing::Unsigned)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn admin_delete_user(
        &self,
        user_pool_id: &str,
        username: &str,
    ) -> Result<(), ProviderError> {
        let request = AdminDeleteUserRequest {
            user_pool_id,
            username,
        };
        self.call("AdminDeleteUser", &request, Signing::Signed)
            .await?;
        Ok(())
    }
}

//! Minimal client for the AWS JSON protocols (`awsJson1_0` / `awsJson1_1`).
//!
//! Every operation is a `POST /` with an `X-Amz-Target` header naming the
//! operation and a JSON body. Failures come back as a non-2xx status with a
//! `__type` field naming the error, which is what the rest of the crate
//! classifies on.

pub(crate) mod sigv4;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use reqwest::{Client, header::CONTENT_TYPE};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::{Instrument, debug, info_span};
use url::Url;

/// Error name reported when a failure carries no service error type.
pub const UNKNOWN_ERROR: &str = "UnknownError";

const REQUEST_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum AwsError {
    #[error("{name}: {message}")]
    Service {
        status: u16,
        name: String,
        message: String,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("request signing failed: {0}")]
    Signing(String),
    #[error("missing AWS credentials for signed request")]
    MissingCredentials,
}

impl AwsError {
    /// Service error name (e.g. `NotAuthorizedException`), or [`UNKNOWN_ERROR`].
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Service { name, .. } => name,
            _ => UNKNOWN_ERROR,
        }
    }
}

/// Static AWS credentials used for SigV4.
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<SecretString>,
}

impl Credentials {
    #[must_use]
    pub fn new(
        access_key_id: String,
        secret_access_key: SecretString,
        session_token: Option<SecretString>,
    ) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            session_token,
        }
    }

    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

/// Protocol details of one AWS service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Service {
    /// SigV4 signing name and endpoint prefix.
    pub name: &'static str,
    pub target_prefix: &'static str,
    pub content_type: &'static str,
}

pub const COGNITO_IDP: Service = Service {
    name: "cognito-idp",
    target_prefix: "AWSCognitoIdentityProviderService",
    content_type: "application/x-amz-json-1.1",
};

pub const DYNAMODB: Service = Service {
    name: "dynamodb",
    target_prefix: "DynamoDB_20120810",
    content_type: "application/x-amz-json-1.0",
};

/// Whether a request carries a SigV4 `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signing {
    Unsigned,
    Signed,
}

#[derive(Debug, Clone)]
pub struct JsonClient {
    http: Client,
    endpoint: Url,
    host: String,
    region: String,
    service: Service,
    credentials: Option<Credentials>,
}

impl JsonClient {
    /// Build a client for `service` in `region`.
    ///
    /// `endpoint` overrides the regional default (`https://<service>.<region>.amazonaws.com/`).
    ///
    /// # Errors
    /// Returns an error if the endpoint is not a valid URL with a host or the
    /// HTTP client cannot be built.
    pub fn new(
        service: Service,
        region: &str,
        endpoint: Option<&str>,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let endpoint = match endpoint {
            Some(endpoint) => endpoint.to_string(),
            None => default_endpoint(service, region),
        };
        let endpoint =
            Url::parse(&endpoint).with_context(|| format!("Invalid endpoint URL: {endpoint}"))?;
        let host = host_header(&endpoint)?;

        let http = Client::builder()
            .use_rustls_tls()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .context("Failed to build AWS HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            host,
            region: region.to_string(),
            service,
            credentials,
        })
    }

    /// Invoke `operation` with a JSON `body` and return the decoded response.
    ///
    /// # Errors
    /// Returns [`AwsError::Service`] for non-2xx responses, and transport,
    /// signing or decoding errors otherwise.
    pub async fn call(
        &self,
        operation: &str,
        body: &Value,
        signing: Signing,
    ) -> Result<Value, AwsError> {
        let target = format!("{}.{operation}", self.service.target_prefix);
        let payload = serde_json::to_vec(body)
            .map_err(|err| AwsError::InvalidResponse(format!("unserializable request: {err}")))?;

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, self.service.content_type)
            .header("x-amz-target", &target);

        if signing == Signing::Signed {
            let credentials = self
                .credentials
                .as_ref()
                .ok_or(AwsError::MissingCredentials)?;
            let signed = sigv4::sign(
                credentials,
                &self.region,
                self.service.name,
                &sigv4::SigningRequest {
                    host: &self.host,
                    content_type: self.service.content_type,
                    target: &target,
                    body: &payload,
                },
                Utc::now(),
            )?;
            request = request
                .header("x-amz-date", signed.amz_date)
                .header("authorization", signed.authorization);
            if let Some(token) = signed.security_token {
                request = request.header("x-amz-security-token", token);
            }
        }

        let span = info_span!(
            "aws.request",
            aws.service = self.service.name,
            aws.operation = operation
        );
        let response = request.body(payload).send().instrument(span).await?;

        let status = response.status();
        let error_type_header = response
            .headers()
            .get("x-amzn-errortype")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response.text().await?;

        if !status.is_success() {
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            let name = error_name(
                body.get("__type").and_then(Value::as_str),
                error_type_header.as_deref(),
            );
            let message = body
                .get("message")
                .or_else(|| body.get("Message"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            debug!(
                aws.service = self.service.name,
                operation,
                status = status.as_u16(),
                error = %name,
                "AWS request failed"
            );

            return Err(AwsError::Service {
                status: status.as_u16(),
                name,
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(json!({}));
        }

        serde_json::from_str(&text).map_err(|err| AwsError::InvalidResponse(err.to_string()))
    }
}

fn default_endpoint(service: Service, region: &str) -> String {
    format!("https://{}.{region}.amazonaws.com/", service.name)
}

// Must match what reqwest sends as `Host`: the port is only present when it is
// not the scheme default.
fn host_header(endpoint: &Url) -> Result<String> {
    let host = endpoint
        .host_str()
        .ok_or_else(|| anyhow!("Endpoint URL must include a host: {endpoint}"))?;
    Ok(match endpoint.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Extract the bare error name from `__type` or the `x-amzn-ErrorType` header.
///
/// `com.amazonaws.dynamodb.v20120810#ConditionalCheckFailedException` and
/// `NotAuthorizedException:http://internal.amazon.com/...` both reduce to the
/// trailing exception name.
fn error_name(type_field: Option<&str>, header: Option<&str>) -> String {
    type_field
        .or(header)
        .map(|raw| {
            let raw = raw.rsplit('#').next().unwrap_or(raw);
            raw.split(':').next().unwrap_or(raw).trim()
        })
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_ERROR)
        .to_string()
}

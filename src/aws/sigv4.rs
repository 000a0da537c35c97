//! AWS Signature Version 4 for JSON-protocol `POST /` requests.

use super::{AwsError, Credentials};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Headers produced by signing, to be attached to the outgoing request.
#[derive(Debug, Clone)]
pub(crate) struct SignedHeaders {
    pub(crate) amz_date: String,
    pub(crate) authorization: String,
    pub(crate) security_token: Option<String>,
}

/// Request fields covered by the signature.
pub(crate) struct SigningRequest<'a> {
    pub(crate) host: &'a str,
    pub(crate) content_type: &'a str,
    pub(crate) target: &'a str,
    pub(crate) body: &'a [u8],
}

/// Sign a `POST /` request for `service` in `region`.
///
/// Signed headers are `content-type;host;x-amz-date;x-amz-target`, plus
/// `x-amz-security-token` when the credentials carry a session token.
pub(crate) fn sign(
    credentials: &Credentials,
    region: &str,
    service: &str,
    request: &SigningRequest<'_>,
    now: DateTime<Utc>,
) -> Result<SignedHeaders, AwsError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let security_token = credentials
        .session_token
        .as_ref()
        .map(|token| token.expose_secret().to_string());

    let mut headers: Vec<(&str, &str)> = vec![
        ("content-type", request.content_type),
        ("host", request.host),
        ("x-amz-date", amz_date.as_str()),
        ("x-amz-target", request.target),
    ];
    if let Some(token) = security_token.as_deref() {
        headers.push(("x-amz-security-token", token));
    }
    headers.sort_by(|a, b| a.0.cmp(b.0));

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "POST\n/\n\n{canonical_headers}\n{signed_headers}\n{}",
        hex::encode(Sha256::digest(request.body))
    );

    let scope = format!("{date}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(
        credentials.secret_access_key.expose_secret(),
        &date,
        region,
        service,
    )?;
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id
    );

    Ok(SignedHeaders {
        amz_date,
        authorization,
        security_token,
    })
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>, AwsError> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, AwsError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|err| AwsError::Signing(err.to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

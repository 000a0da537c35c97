//! End-to-end tests over the axum router with Cognito and DynamoDB served by
//! wiremock.

use anyhow::Result;
use authbridge::{
    api,
    auth::{AuthConfig, AuthService},
    aws::Credentials,
    identity::CognitoIdentityProvider,
    store::DynamoUserStore,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::{net::TcpListener, sync::Arc};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method},
};

const COGNITO: &str = "AWSCognitoIdentityProviderService";
const DYNAMODB: &str = "DynamoDB_20120810";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

struct Harness {
    cognito: MockServer,
    dynamo: MockServer,
    app: Router,
}

impl Harness {
    async fn new(user_pool_id: Option<&str>) -> Result<Self> {
        let cognito = MockServer::start().await;
        let dynamo = MockServer::start().await;

        let credentials = Credentials::new(
            "AKIDEXAMPLE".to_string(),
            SecretString::from("secret".to_string()),
            None,
        );
        let provider = CognitoIdentityProvider::new(
            "us-east-1",
            Some(&cognito.uri()),
            "client-id".to_string(),
            Some(credentials.clone()),
        )?;
        let store = DynamoUserStore::new(
            "us-east-1",
            Some(&dynamo.uri()),
            credentials,
            "Users".to_string(),
            "EmailIndex".to_string(),
        )?;
        let auth = AuthService::new(
            Arc::new(provider),
            Arc::new(store),
            AuthConfig::new().with_user_pool_id(user_pool_id.map(str::to_string)),
        );

        Ok(Self {
            cognito,
            dynamo,
            app: api::app(Arc::new(auth)),
        })
    }

    async fn cognito(&self, operation: &str, response: ResponseTemplate, calls: u64) {
        Mock::given(method("POST"))
            .and(header("x-amz-target", format!("{COGNITO}.{operation}").as_str()))
            .respond_with(response)
            .expect(calls)
            .mount(&self.cognito)
            .await;
    }

    async fn dynamo(&self, operation: &str, response: ResponseTemplate, calls: u64) {
        Mock::given(method("POST"))
            .and(header("x-amz-target", format!("{DYNAMODB}.{operation}").as_str()))
            .respond_with(response)
            .expect(calls)
            .mount(&self.dynamo)
            .await;
    }

    async fn post(&self, path: &str, body: Body) -> Result<(StatusCode, Value)> {
        self.post_as(path, Some("application/json"), body).await
    }

    async fn post_as(
        &self,
        path: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> Result<(StatusCode, Value)> {
        let mut request = Request::builder().method("POST").uri(path);
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        let response = self.app.clone().oneshot(request.body(body)?).await?;

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
        self.post(path, Body::from(body.to_string())).await
    }
}

fn ok_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

fn no_items() -> ResponseTemplate {
    ok_json(json!({"Items": [], "Count": 0}))
}

fn one_item(status: &str) -> ResponseTemplate {
    ok_json(json!({
        "Items": [{"userId": {"S": "u-1"}, "status": {"S": status}}],
        "Count": 1
    }))
}

fn sign_up_body() -> Value {
    json!({"email": "a@x.com", "password": "Passw0rd!", "fullName": "Ada"})
}

#[tokio::test]
async fn sign_up_creates_pending_profile() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(Some("us-east-1_pool")).await?;
    harness.dynamo("Query", no_items(), 1).await;
    harness
        .cognito(
            "SignUp",
            ok_json(json!({"UserConfirmed": false, "UserSub": "sub-1"})),
            1,
        )
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "DynamoDB_20120810.PutItem"))
        .and(body_partial_json(json!({
            "TableName": "Users",
            "Item": {
                "email": {"S": "a@x.com"},
                "fullName": {"S": "Ada"},
                "status": {"S": "PENDING"}
            },
            "ConditionExpression": "attribute_not_exists(userId)"
        })))
        .respond_with(ok_json(json!({})))
        .expect(1)
        .mount(&harness.dynamo)
        .await;
    harness.cognito("AdminDeleteUser", ok_json(json!({})), 0).await;

    let (status, body) = harness.post_json("/v1/auth/sign-up", &sign_up_body()).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Sign up successful. Please confirm your email."
    );
    assert_eq!(body["userConfirmed"], false);
    assert_eq!(body["userSub"], "sub-1");
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["fullName"], "Ada");
    assert_eq!(body["user"]["status"], "PENDING");
    assert!(body["user"]["userId"].as_str().is_some_and(|id| !id.is_empty()));

    let created_at = body["user"]["createdAt"].as_str().unwrap_or_default();
    assert_eq!(created_at.len(), "2024-01-01T00:00:00.000Z".len());
    assert!(created_at.ends_with('Z'));
    Ok(())
}

#[tokio::test]
async fn sign_up_duplicate_email_is_conflict() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(Some("us-east-1_pool")).await?;
    harness.dynamo("Query", one_item("CONFIRMED"), 1).await;
    harness.cognito("SignUp", ok_json(json!({})), 0).await;

    let (status, body) = harness.post_json("/v1/auth/sign-up", &sign_up_body()).await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"message": "User with this email already exists"}));
    Ok(())
}

#[tokio::test]
async fn sign_up_existing_row_with_unknown_status_is_conflict() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(Some("us-east-1_pool")).await?;
    harness.dynamo("Query", one_item("DISABLED"), 1).await;
    harness.cognito("SignUp", ok_json(json!({})), 0).await;

    let (status, body) = harness.post_json("/v1/auth/sign-up", &sign_up_body()).await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"message": "User with this email already exists"}));
    Ok(())
}

#[tokio::test]
async fn sign_up_rolls_back_when_profile_write_fails() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(Some("us-east-1_pool")).await?;
    harness.dynamo("Query", no_items(), 1).await;
    harness
        .cognito(
            "SignUp",
            ok_json(json!({"UserConfirmed": false, "UserSub": "sub-1"})),
            1,
        )
        .await;
    harness
        .dynamo(
            "PutItem",
            ResponseTemplate::new(400).set_body_json(json!({
                "__type": "com.amazonaws.dynamodb.v20120810#ProvisionedThroughputExceededException",
                "message": "Rate of requests exceeds the allowed throughput."
            })),
            1,
        )
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSCognitoIdentityProviderService.AdminDeleteUser"))
        .and(body_partial_json(json!({
            "UserPoolId": "us-east-1_pool",
            "Username": "a@x.com"
        })))
        .respond_with(ok_json(json!({})))
        .expect(1)
        .mount(&harness.cognito)
        .await;

    let (status, body) = harness.post_json("/v1/auth/sign-up", &sign_up_body()).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"message": "Sign up failed", "error": "UserRolledBackAfterDbWriteFailure"})
    );
    Ok(())
}

#[tokio::test]
async fn sign_up_accepted_without_user_sub_still_rolls_back() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(Some("us-east-1_pool")).await?;
    harness.dynamo("Query", no_items(), 1).await;
    harness.cognito("SignUp", ok_json(json!({})), 1).await;
    harness
        .dynamo(
            "PutItem",
            ResponseTemplate::new(500).set_body_json(json!({
                "__type": "com.amazonaws.dynamodb.v20120810#InternalServerError",
                "message": "Internal server error"
            })),
            1,
        )
        .await;
    harness.cognito("AdminDeleteUser", ok_json(json!({})), 1).await;

    let (status, body) = harness.post_json("/v1/auth/sign-up", &sign_up_body()).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"message": "Sign up failed", "error": "UserRolledBackAfterDbWriteFailure"})
    );
    Ok(())
}

#[tokio::test]
async fn sign_up_without_pool_reports_orphaned_account() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(None).await?;
    harness.dynamo("Query", no_items(), 1).await;
    harness
        .cognito(
            "SignUp",
            ok_json(json!({"UserConfirmed": false, "UserSub": "sub-1"})),
            1,
        )
        .await;
    harness
        .dynamo(
            "PutItem",
            ResponseTemplate::new(500).set_body_string("internal failure"),
            1,
        )
        .await;
    harness.cognito("AdminDeleteUser", ok_json(json!({})), 0).await;

    let (status, body) = harness.post_json("/v1/auth/sign-up", &sign_up_body()).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "UserCreatedInCognitoButDbWriteFailed");
    Ok(())
}

#[tokio::test]
async fn sign_up_password_policy_rejection() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(Some("us-east-1_pool")).await?;
    harness.dynamo("Query", no_items(), 1).await;
    harness
        .cognito(
            "SignUp",
            ResponseTemplate::new(400).set_body_json(json!({
                "__type": "InvalidPasswordException",
                "message": "Password did not conform with policy"
            })),
            1,
        )
        .await;
    harness.dynamo("PutItem", ok_json(json!({})), 0).await;

    let (status, body) = harness.post_json("/v1/auth/sign-up", &sign_up_body()).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"message": "Sign up failed", "error": "InvalidPasswordException"})
    );
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(None).await?;

    let cases = [
        ("/v1/auth/sign-up", "email, password and fullName are required"),
        ("/v1/auth/confirm-email", "email and confirmationCode are required"),
        ("/v1/auth/sign-in", "email and password are required"),
        ("/v1/auth/sign-out", "accessToken is required"),
    ];

    for (path, message) in cases {
        let (status, body) = harness.post(path, Body::from("{not json")).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body, json!({"message": message}), "{path}");

        let (status, _) = harness.post(path, Body::empty()).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
    }

    let (status, _) = harness
        .post_json("/v1/auth/sign-in", &json!({"email": "a@x.com", "password": ""}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(harness.cognito.received_requests().await.unwrap_or_default().is_empty());
    assert!(harness.dynamo.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}

#[tokio::test]
async fn confirm_email_marks_profile_confirmed() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(None).await?;
    harness.cognito("ConfirmSignUp", ok_json(json!({})), 1).await;
    harness.dynamo("Query", one_item("PENDING"), 1).await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "DynamoDB_20120810.UpdateItem"))
        .and(body_partial_json(json!({
            "Key": {"userId": {"S": "u-1"}},
            "ExpressionAttributeValues": {":confirmed": {"S": "CONFIRMED"}}
        })))
        .respond_with(ok_json(json!({})))
        .expect(1)
        .mount(&harness.dynamo)
        .await;

    let (status, body) = harness
        .post_json(
            "/v1/auth/confirm-email",
            &json!({"email": "a@x.com", "confirmationCode": "123456"}),
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Email confirmed successfully"}));
    Ok(())
}

#[tokio::test]
async fn confirm_email_expired_code() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(None).await?;
    harness
        .cognito(
            "ConfirmSignUp",
            ResponseTemplate::new(400).set_body_json(json!({
                "__type": "ExpiredCodeException",
                "message": "Invalid code provided, please request a code again."
            })),
            1,
        )
        .await;
    harness.dynamo("Query", no_items(), 0).await;

    let (status, body) = harness
        .post_json(
            "/v1/auth/confirm-email",
            &json!({"email": "a@x.com", "confirmationCode": "123456"}),
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"message": "Email confirmation failed", "error": "ExpiredCodeException"})
    );
    Ok(())
}

#[tokio::test]
async fn sign_in_returns_tokens() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(None).await?;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSCognitoIdentityProviderService.InitiateAuth"))
        .and(body_partial_json(json!({
            "ClientId": "client-id",
            "AuthFlow": "USER_PASSWORD_AUTH",
            "AuthParameters": {"USERNAME": "a@x.com", "PASSWORD": "Passw0rd!"}
        })))
        .respond_with(ok_json(json!({
            "AuthenticationResult": {
                "AccessToken": "access",
                "IdToken": "id",
                "RefreshToken": "refresh",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            },
            "ChallengeParameters": {}
        })))
        .expect(1)
        .mount(&harness.cognito)
        .await;

    let (status, body) = harness
        .post_json(
            "/v1/auth/sign-in",
            &json!({"email": "a@x.com", "password": "Passw0rd!"}),
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "Sign in successful",
            "accessToken": "access",
            "idToken": "id",
            "refreshToken": "refresh",
            "expiresIn": 3600,
            "tokenType": "Bearer"
        })
    );
    Ok(())
}

#[tokio::test]
async fn sign_in_challenge_without_tokens_is_unauthorized() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(None).await?;
    harness
        .cognito(
            "InitiateAuth",
            ok_json(json!({"ChallengeName": "NEW_PASSWORD_REQUIRED", "Session": "s"})),
            1,
        )
        .await;

    let (status, body) = harness
        .post_json(
            "/v1/auth/sign-in",
            &json!({"email": "a@x.com", "password": "Passw0rd!"}),
        )
        .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "Invalid sign in response"}));
    Ok(())
}

#[tokio::test]
async fn sign_in_wrong_password() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(None).await?;
    harness
        .cognito(
            "InitiateAuth",
            ResponseTemplate::new(400).set_body_json(json!({
                "__type": "NotAuthorizedException",
                "message": "Incorrect username or password."
            })),
            1,
        )
        .await;

    let (status, body) = harness
        .post_json(
            "/v1/auth/sign-in",
            &json!({"email": "a@x.com", "password": "wrong"}),
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"message": "Sign in failed", "error": "NotAuthorizedException"})
    );
    Ok(())
}

#[tokio::test]
async fn sign_out_revokes_tokens() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(None).await?;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSCognitoIdentityProviderService.GlobalSignOut"))
        .and(body_partial_json(json!({"AccessToken": "access"})))
        .respond_with(ok_json(json!({})))
        .expect(1)
        .mount(&harness.cognito)
        .await;

    let (status, body) = harness
        .post_json("/v1/auth/sign-out", &json!({"accessToken": "access"}))
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Sign out successful"}));
    Ok(())
}

#[tokio::test]
async fn json_body_is_parsed_regardless_of_content_type() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(None).await?;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSCognitoIdentityProviderService.GlobalSignOut"))
        .and(body_partial_json(json!({"AccessToken": "tok"})))
        .respond_with(ok_json(json!({})))
        .expect(2)
        .mount(&harness.cognito)
        .await;

    for content_type in [Some("text/plain"), None] {
        let (status, body) = harness
            .post_as(
                "/v1/auth/sign-out",
                content_type,
                Body::from(r#"{"accessToken":"tok"}"#),
            )
            .await?;

        assert_eq!(status, StatusCode::OK, "content type {content_type:?}");
        assert_eq!(body, json!({"message": "Sign out successful"}));
    }
    Ok(())
}

#[tokio::test]
async fn health_propagates_request_id() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }
    let harness = Harness::new(None).await?;

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("req-123")
    );
    assert!(response.headers().contains_key("x-app"));

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/health")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}

use super::*;
use httpmock::prelude::*;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use serde_json::json;

#[tokio::test]
async fn test_set_password() {
    let server = MockServer::start();
    let client = ClientBuilder::new(Client::new()).build();
    let auth = FirebaseAuth::new_with_client(client, server.url("/v1/projects/test-project"));

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/projects/test-project/accounts:update")
            .header("content-type", "application/json")
            .json_body(json!({
                "localId": "u1",
                "password": "abc123"
            }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "localId": "u1",
                "email": "u1@example.com"
            }));
    });

    auth.set_password("u1", "abc123").await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_set_password_api_error() {
    let server = MockServer::start();
    let client = ClientBuilder::new(Client::new()).build();
    let auth = FirebaseAuth::new_with_client(client, server.url("/v1/projects/test-project"));

    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/projects/test-project/accounts:update");
        then.status(400)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {
                    "code": 400,
                    "message": "USER_NOT_FOUND",
                    "status": "INVALID_ARGUMENT"
                }
            }));
    });

    let err = auth.set_password("missing", "abc123").await.unwrap_err();
    match err {
        AuthError::ApiError(msg) => assert!(msg.contains("USER_NOT_FOUND")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_verify_token_rejects_garbage() {
    let verifier = IdTokenVerifier::new("test-project".to_string());

    // Fails at header decode, before any key fetch.
    let err = verifier.verify_token("not-a-jwt").await.unwrap_err();
    assert!(matches!(err, TokenVerificationError::JwtError(_)));
}

use super::*;
use crate::messaging::models::Notification;
use httpmock::prelude::*;
use reqwest_middleware::ClientBuilder;
use serde_json::json;

fn messaging_for(server: &MockServer) -> FirebaseMessaging {
    let client = ClientBuilder::new(reqwest::Client::new()).build();
    FirebaseMessaging::new_with_client(
        client,
        server.url("/v1/projects/test-project/messages:send"),
    )
}

#[tokio::test]
async fn test_send_message() {
    let server = MockServer::start();
    let messaging = messaging_for(&server);

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/projects/test-project/messages:send")
            .json_body(json!({
                "validate_only": false,
                "message": {
                    "token": "T1",
                    "notification": {"title": "Ana", "body": "hello"}
                }
            }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "name": "projects/test-project/messages/12345"
            }));
    });

    let message = Message {
        token: Some("T1".to_string()),
        notification: Some(Notification {
            title: Some("Ana".to_string()),
            body: Some("hello".to_string()),
        }),
        ..Default::default()
    };

    let name = messaging.send(&message).await.unwrap();
    assert_eq!(name, "projects/test-project/messages/12345");

    mock.assert();
}

#[tokio::test]
async fn test_send_unregistered_token_is_classified() {
    let server = MockServer::start();
    let messaging = messaging_for(&server);

    server.mock(|when, then| {
        when.method(POST).path("/v1/projects/test-project/messages:send");
        then.status(404)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {
                    "code": 404,
                    "message": "Requested entity was not found.",
                    "status": "NOT_FOUND",
                    "details": [{
                        "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                        "errorCode": "UNREGISTERED"
                    }]
                }
            }));
    });

    let message = Message {
        token: Some("stale".to_string()),
        ..Default::default()
    };

    let err = messaging.send(&message).await.unwrap_err();
    assert!(err.is_token_invalid());
}

#[tokio::test]
async fn test_send_other_failure_is_not_token_invalid() {
    let server = MockServer::start();
    let messaging = messaging_for(&server);

    server.mock(|when, then| {
        when.method(POST).path("/v1/projects/test-project/messages:send");
        then.status(500)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {"code": 500, "message": "Internal error", "status": "INTERNAL"}
            }));
    });

    let message = Message {
        token: Some("T1".to_string()),
        ..Default::default()
    };

    let err = messaging.send(&message).await.unwrap_err();
    assert!(!err.is_token_invalid());
    assert!(matches!(err, MessagingError::ApiError(_)));
}

#[tokio::test]
async fn test_send_requires_token_target() {
    let server = MockServer::start();
    let messaging = messaging_for(&server);

    let err = messaging.send(&Message::default()).await.unwrap_err();
    assert!(matches!(err, MessagingError::ApiError(_)));
}

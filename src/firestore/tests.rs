use super::*;
use httpmock::prelude::*;
use reqwest_middleware::ClientBuilder;
use serde::Deserialize;
use serde_json::json;

const DOCS_ROOT: &str = "/v1/projects/test-project/databases/(default)/documents";

fn firestore_for(server: &MockServer) -> FirebaseFirestore {
    let client = ClientBuilder::new(reqwest::Client::new()).build();
    FirebaseFirestore::new_with_client(client, server.url(DOCS_ROOT))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct TestUser {
    is_admin: Option<bool>,
    fcm_token: Option<String>,
    display_name: Option<String>,
}

#[tokio::test]
async fn test_get_document_decodes_typed_fields() {
    let server = MockServer::start();
    let firestore = firestore_for(&server);

    let mock = server.mock(|when, then| {
        when.method(GET).path(format!("{DOCS_ROOT}/users/u1"));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "name": "projects/test-project/databases/(default)/documents/users/u1",
                "fields": {
                    "isAdmin": {"booleanValue": true},
                    "displayName": {"stringValue": "Ana"}
                },
                "createTime": "2024-01-01T00:00:00Z",
                "updateTime": "2024-01-02T00:00:00Z"
            }));
    });

    let user: Option<TestUser> = firestore.collection("users").doc("u1").get().await.unwrap();
    let user = user.unwrap();
    assert_eq!(user.is_admin, Some(true));
    assert_eq!(user.display_name.as_deref(), Some("Ana"));
    assert_eq!(user.fcm_token, None);

    mock.assert();
}

#[tokio::test]
async fn test_get_missing_document_is_none() {
    let server = MockServer::start();
    let firestore = firestore_for(&server);

    server.mock(|when, then| {
        when.method(GET).path(format!("{DOCS_ROOT}/chats/gone"));
        then.status(404)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {"code": 404, "message": "Document not found", "status": "NOT_FOUND"}
            }));
    });

    let chat: Option<TestUser> = firestore.doc("chats/gone").get().await.unwrap();
    assert!(chat.is_none());
}

#[tokio::test]
async fn test_delete_field_sends_masked_empty_update() {
    let server = MockServer::start();
    let firestore = firestore_for(&server);

    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path(format!("{DOCS_ROOT}/users/c"))
            .query_param("updateMask.fieldPaths", "fcmToken")
            .json_body(json!({"fields": {}}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "name": "projects/test-project/databases/(default)/documents/users/c",
                "fields": {}
            }));
    });

    firestore
        .collection("users")
        .doc("c")
        .delete_field("fcmToken")
        .await
        .unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_update_with_server_timestamps_commits_transform() {
    let server = MockServer::start();
    let firestore = firestore_for(&server);

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(format!("{DOCS_ROOT}:commit"))
            .json_body(json!({
                "writes": [{
                    "update": {
                        "name": "projects/test-project/databases/(default)/documents/users/u1",
                        "fields": {
                            "isPasswordChangeNeeded": {"booleanValue": true},
                            "passwordChangedBy": {"stringValue": "admin-1"}
                        }
                    },
                    "updateMask": {"fieldPaths": ["isPasswordChangeNeeded", "passwordChangedBy"]},
                    "updateTransforms": [{
                        "fieldPath": "passwordChangedAt",
                        "setToServerValue": "REQUEST_TIME"
                    }],
                    "currentDocument": {"exists": true}
                }]
            }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"writeResults": [{}], "commitTime": "2024-01-01T00:00:00Z"}));
    });

    firestore
        .collection("users")
        .doc("u1")
        .update_with_server_timestamps(
            &json!({"isPasswordChangeNeeded": true, "passwordChangedBy": "admin-1"}),
            &["passwordChangedAt"],
        )
        .await
        .unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_update_error_surfaces_api_error() {
    let server = MockServer::start();
    let firestore = firestore_for(&server);

    server.mock(|when, then| {
        when.method(PATCH).path(format!("{DOCS_ROOT}/users/u1"));
        then.status(403)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {"code": 403, "message": "Missing or insufficient permissions", "status": "PERMISSION_DENIED"}
            }));
    });

    let err = firestore
        .doc("users/u1")
        .update(&json!({"displayName": "x"}), vec!["displayName".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, FirestoreError::ApiError(_)));
}

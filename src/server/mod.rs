//! HTTP surface.
//!
//! Thin transport adapters: each route resolves the caller identity for its
//! surface and hands off to the shared gate and operation in [`crate::admin`],
//! or to the notification pipeline in [`crate::notifications`]. Status and
//! payload shapes follow the app's existing clients.


use crate::admin::{require_admin, reset_password, CallerSurface, ResetError, ResetRequest};
use crate::auth::{FirebaseAuth, IdTokenVerifier};
use crate::documents::MessageDoc;
use crate::firestore::FirebaseFirestore;
use crate::messaging::FirebaseMessaging;
use crate::notifications::{handle_message_created, MessageCreated};
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

const RESET_SUCCESS_MESSAGE: &str = "Password changed successfully";

/// Service clients shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub auth: FirebaseAuth,
    pub firestore: FirebaseFirestore,
    pub messaging: FirebaseMessaging,
    pub verifier: Arc<IdTokenVerifier>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route(
            "/adminResetPasswordHttp",
            post(admin_reset_password_http).options(preflight),
        )
        .route(
            "/adminResetPassword",
            post(admin_reset_password_callable).options(preflight),
        )
        .route("/events/messages", post(message_created_event))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

// POST /adminResetPasswordHttp — explicit bearer-token verification.
async fn admin_reset_password_http(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ResetRequest>,
) -> Response {
    match http_reset(&state, &headers, &body).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"success": true, "message": RESET_SUCCESS_MESSAGE})),
        )
            .into_response(),
        Err(e) => http_error_response(e),
    }
}

async fn http_reset(
    state: &AppState,
    headers: &HeaderMap,
    body: &ResetRequest,
) -> Result<(), ResetError> {
    let token =
        bearer_token(headers).ok_or_else(|| ResetError::Unauthenticated("No token".to_string()))?;

    let claims = state
        .verifier
        .verify_token(token)
        .await
        .map_err(|e| ResetError::Unauthenticated(format!("Invalid token: {}", e)))?;
    info!(uid = %claims.sub, "reset caller verified");

    let admin_uid = require_admin(&state.firestore, &claims.sub, CallerSurface::Http).await?;
    reset_password(&state.auth, &state.firestore, &admin_uid, body).await
}

fn http_error_response(error: ResetError) -> Response {
    let status = match &error {
        ResetError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        ResetError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ResetError::NotFound(_) => StatusCode::NOT_FOUND,
        ResetError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ResetError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": error.to_string()}))).into_response()
}

// Firebase callable protocol: {"data": ...} in, {"result": ...} or
// {"error": {"status", "message"}} out.
#[derive(Debug, Default, Deserialize)]
struct CallableRequest {
    #[serde(default)]
    data: Option<ResetRequest>,
}

async fn admin_reset_password_callable(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CallableRequest>,
) -> Response {
    match callable_reset(&state, &headers, body).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"result": {"success": true, "message": RESET_SUCCESS_MESSAGE}})),
        )
            .into_response(),
        Err(e) => callable_error_response(e),
    }
}

async fn callable_reset(
    state: &AppState,
    headers: &HeaderMap,
    body: CallableRequest,
) -> Result<(), ResetError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ResetError::Unauthenticated("You must be signed in".to_string()))?;

    let claims = state
        .verifier
        .verify_token(token)
        .await
        .map_err(|_| ResetError::Unauthenticated("You must be signed in".to_string()))?;

    let admin_uid = require_admin(&state.firestore, &claims.sub, CallerSurface::Callable).await?;

    let request = body.data.unwrap_or_default();
    reset_password(&state.auth, &state.firestore, &admin_uid, &request).await
}

fn callable_error_response(error: ResetError) -> Response {
    let (status, code) = match &error {
        ResetError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
        ResetError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
        ResetError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ResetError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
        ResetError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    };
    (
        status,
        Json(json!({"error": {"status": code, "message": error.to_string()}})),
    )
        .into_response()
}

// POST /events/messages — document-creation event adapter. The pipeline owns
// its failures, so the dispatcher always gets 204.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageCreatedBody {
    chat_id: String,
    message_id: String,
    #[serde(default)]
    message: MessageDoc,
}

async fn message_created_event(
    State(state): State<AppState>,
    Json(body): Json<MessageCreatedBody>,
) -> StatusCode {
    let event = MessageCreated {
        chat_id: body.chat_id,
        message_id: body.message_id,
        message: body.message,
    };
    handle_message_created(&state.firestore, &state.messaging, event).await;
    StatusCode::NO_CONTENT
}

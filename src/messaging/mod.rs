pub mod models;

#[cfg(test)]
mod tests;

use crate::core::middleware::AuthMiddleware;
use crate::core::GoogleErrorResponse;
use crate::messaging::models::{Message, SendResponseInternal};
use reqwest::{header, Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Token is no longer registered: {0}")]
    Unregistered(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl MessagingError {
    /// True for the error class that permits pruning the target token.
    pub fn is_token_invalid(&self) -> bool {
        matches!(self, MessagingError::Unregistered(_))
    }
}

/// FCM v1 client, reduced to single-token sends.
#[derive(Clone)]
pub struct FirebaseMessaging {
    client: ClientWithMiddleware,
    send_url: String,
}

// Wrapper for the request body required by the FCM v1 API
#[derive(Serialize)]
struct SendRequest<'a> {
    validate_only: bool,
    message: &'a Message,
}

impl FirebaseMessaging {
    pub fn new(middleware: AuthMiddleware) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .with(middleware.clone())
            .build();

        let project_id = middleware.key.project_id.clone().unwrap_or_default();
        let send_url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            project_id
        );

        Self { client, send_url }
    }

    /// Creates a client against a custom send URL (useful for testing).
    pub fn new_with_client(client: ClientWithMiddleware, send_url: String) -> Self {
        Self { client, send_url }
    }

    /// Sends the message, returning the server-assigned message name.
    ///
    /// A failure reported by FCM as an unregistered or invalid target token
    /// comes back as `MessagingError::Unregistered`; all other failures keep
    /// their own class and must not be treated as token-prunable.
    pub async fn send(&self, message: &Message) -> Result<String, MessagingError> {
        if message.token.as_deref().unwrap_or_default().is_empty() {
            return Err(MessagingError::ApiError(
                "Message must target a registration token.".to_string(),
            ));
        }

        let request = SendRequest {
            validate_only: false,
            message,
        };

        let response = self
            .client
            .post(&self.send_url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if let Some(reason) = classify_unregistered(status, &text) {
                return Err(MessagingError::Unregistered(reason));
            }
            return Err(MessagingError::ApiError(format!(
                "FCM send failed {}: {}",
                status, text
            )));
        }

        let result: SendResponseInternal = response.json().await?;
        Ok(result.name)
    }
}

// FCM reports a dead token as HTTP 404 with status NOT_FOUND and an
// UNREGISTERED error-code detail. Anything else (quota, payload, transient)
// stays unclassified.
fn classify_unregistered(status: StatusCode, body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<GoogleErrorResponse>(body) {
        let api_status = parsed.error.status.as_deref().unwrap_or_default();
        let detail_unregistered = parsed
            .error
            .details
            .iter()
            .flatten()
            .any(|d| d.get("errorCode").and_then(|v| v.as_str()) == Some("UNREGISTERED"));

        if detail_unregistered || api_status == "NOT_FOUND" || api_status == "UNREGISTERED" {
            return Some(parsed.display_message());
        }
        return None;
    }

    if status == StatusCode::NOT_FOUND {
        return Some(format!("FCM send failed {}: {}", status, body));
    }

    None
}

pub mod keys;
pub mod models;
pub mod verifier;

#[cfg(test)]
mod tests;

use crate::auth::models::{UpdateAccountRequest, UpdateAccountResponse};
use crate::core::middleware::AuthMiddleware;
use crate::core::parse_error_response;
use reqwest::{header, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use thiserror::Error;

pub use verifier::{IdTokenClaims, IdTokenVerifier, TokenVerificationError};

// Base URL for the Identity Toolkit API
const IDENTITY_TOOLKIT_V1_API: &str = "https://identitytoolkit.googleapis.com/v1/projects";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Identity Toolkit client, reduced to the account mutation the reset needs.
#[derive(Clone)]
pub struct FirebaseAuth {
    client: ClientWithMiddleware,
    base_url: String,
}

impl FirebaseAuth {
    pub fn new(middleware: AuthMiddleware) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .with(middleware.clone())
            .build();

        let project_id = middleware.key.project_id.clone().unwrap_or_default();
        let base_url = format!("{}/{}", IDENTITY_TOOLKIT_V1_API, project_id);

        Self { client, base_url }
    }

    /// Creates a client against a custom base URL (useful for testing).
    pub fn new_with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Overwrites the stored password for `uid`.
    pub async fn set_password(&self, uid: &str, new_password: &str) -> Result<(), AuthError> {
        let url = format!("{}/accounts:update", self.base_url);

        let request = UpdateAccountRequest {
            local_id: uid.to_string(),
            password: Some(new_password.to_string()),
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::ApiError(
                parse_error_response(response, "Update account failed").await,
            ));
        }

        let _ack: UpdateAccountResponse = response.json().await?;
        Ok(())
    }
}

//! Cloud Firestore access.
//!
//! A thin typed layer over the Firestore v1 REST API: document reads decode
//! into plain structs (absent documents are `Ok(None)`), and writes cover the
//! three mutations the handlers perform — masked updates, single-field
//! deletes, and commits with a server-assigned timestamp.

pub mod models;
pub mod reference;

#[cfg(test)]
mod tests;

use crate::core::middleware::AuthMiddleware;
use reference::{CollectionReference, DocumentReference};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use thiserror::Error;

const FIRESTORE_V1_API: &str =
    "https://firestore.googleapis.com/v1/projects/{project_id}/databases/(default)/documents";

/// Errors that can occur during Firestore operations.
#[derive(Error, Debug)]
pub enum FirestoreError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// Errors returned by the Firestore API.
    #[error("API error: {0}")]
    ApiError(String),
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Client for interacting with Cloud Firestore.
#[derive(Clone)]
pub struct FirebaseFirestore {
    client: ClientWithMiddleware,
    base_url: String,
}

impl FirebaseFirestore {
    pub fn new(middleware: AuthMiddleware) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .with(middleware.clone())
            .build();

        let project_id = middleware.key.project_id.clone().unwrap_or_default();
        let base_url = FIRESTORE_V1_API.replace("{project_id}", &project_id);

        Self { client, base_url }
    }

    /// Creates a client against a custom documents root URL (useful for testing).
    pub fn new_with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Gets a `CollectionReference` for the collection at the given id.
    pub fn collection(&'_ self, collection_id: &str) -> CollectionReference<'_> {
        CollectionReference {
            client: &self.client,
            root_url: self.base_url.clone(),
            collection_id: collection_id.to_string(),
        }
    }

    /// Gets a `DocumentReference` for the slash-separated document path.
    pub fn doc(&self, document_path: &str) -> DocumentReference<'_> {
        DocumentReference {
            client: &self.client,
            root_url: self.base_url.clone(),
            path: document_path.to_string(),
        }
    }
}

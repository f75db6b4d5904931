pub mod admin;
pub mod auth;
pub mod config;
pub mod core;
pub mod documents;
pub mod firestore;
pub mod messaging;
pub mod notifications;
pub mod server;

use crate::auth::{FirebaseAuth, IdTokenVerifier};
use crate::core::middleware::AuthMiddleware;
use crate::firestore::FirebaseFirestore;
use crate::messaging::FirebaseMessaging;
use yup_oauth2::ServiceAccountKey;

/// Handle to the Firebase project backing the app.
///
/// Constructed once at startup from a service account key. Each accessor hands
/// out an independent service client; handlers receive the clients as explicit
/// dependencies so tests can substitute ones pointing at a mock server.
pub struct FirebaseApp {
    key: ServiceAccountKey,
}

impl FirebaseApp {
    pub fn new(service_account_key: ServiceAccountKey) -> Self {
        Self {
            key: service_account_key,
        }
    }

    pub fn project_id(&self) -> &str {
        self.key.project_id.as_deref().unwrap_or_default()
    }

    pub fn auth(&self) -> FirebaseAuth {
        FirebaseAuth::new(AuthMiddleware::new(self.key.clone()))
    }

    pub fn firestore(&self) -> FirebaseFirestore {
        FirebaseFirestore::new(AuthMiddleware::new(self.key.clone()))
    }

    pub fn messaging(&self) -> FirebaseMessaging {
        FirebaseMessaging::new(AuthMiddleware::new(self.key.clone()))
    }

    pub fn id_token_verifier(&self) -> IdTokenVerifier {
        IdTokenVerifier::new(self.project_id().to_string())
    }
}

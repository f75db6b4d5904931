use crate::auth::keys::{KeyFetchError, PublicKeyManager};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenVerificationError {
    #[error("Key fetch error: {0}")]
    KeyFetchError(#[from] KeyFetchError),
    #[error("JWT validation error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Claims carried by a verified Firebase ID token.
///
/// `sub` is the caller's uid and is the only claim the handlers act on.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub auth_time: usize,
    #[serde(flatten)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

/// Verifies caller-supplied ID tokens against the project.
pub struct IdTokenVerifier {
    project_id: String,
    key_manager: PublicKeyManager,
}

impl IdTokenVerifier {
    pub fn new(project_id: String) -> Self {
        Self {
            project_id,
            key_manager: PublicKeyManager::new(),
        }
    }

    pub fn new_with_key_manager(project_id: String, key_manager: PublicKeyManager) -> Self {
        Self {
            project_id,
            key_manager,
        }
    }

    pub async fn verify_token(&self, token: &str) -> Result<IdTokenClaims, TokenVerificationError> {
        let header = decode_header(token)?;
        let kid = header
            .kid
            .ok_or_else(|| TokenVerificationError::InvalidToken("Missing kid in header".to_string()))?;

        let public_key_pem = self.key_manager.get_key(&kid).await?;
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);

        let token_data = decode::<IdTokenClaims>(token, &key, &validation)?;
        let claims = token_data.claims;

        if claims.sub.is_empty() {
            return Err(TokenVerificationError::InvalidToken(
                "Subject (sub) claim must not be empty".to_string(),
            ));
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default() as usize;
        // exp/iat are checked by jsonwebtoken; auth_time only needs a skew guard.
        if claims.auth_time > now + 300 {
            return Err(TokenVerificationError::InvalidToken(
                "Auth time is in the future".to_string(),
            ));
        }

        Ok(claims)
    }
}

use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

const GOOGLE_PUBLIC_KEYS_URL: &str =
    "https://www.googleapis.com/robot/v1/metadata/x509/securetoken@system.gserviceaccount.com";

#[derive(Error, Debug)]
pub enum KeyFetchError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Failed to parse keys")]
    ParseError,
}

#[derive(Clone)]
struct CachedKeys {
    keys: HashMap<String, String>,
    expires_at: Instant,
}

/// Fetches and caches the Google public keys used to verify ID tokens.
///
/// Keys are cached for the duration advertised by the endpoint's
/// `Cache-Control: max-age` header.
pub struct PublicKeyManager {
    client: Client,
    keys_url: String,
    cache: Arc<RwLock<Option<CachedKeys>>>,
}

impl PublicKeyManager {
    pub fn new() -> Self {
        Self::new_with_url(GOOGLE_PUBLIC_KEYS_URL.to_string())
    }

    /// Creates a manager fetching from a custom URL (useful for testing).
    pub fn new_with_url(keys_url: String) -> Self {
        Self {
            client: Client::new(),
            keys_url,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn get_key(&self, kid: &str) -> Result<String, KeyFetchError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = &*cache {
                if Instant::now() < cached.expires_at {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        self.refresh_keys().await?;

        let cache = self.cache.read().await;
        match &*cache {
            Some(cached) => cached.keys.get(kid).cloned().ok_or(KeyFetchError::ParseError),
            None => Err(KeyFetchError::ParseError),
        }
    }

    async fn refresh_keys(&self) -> Result<(), KeyFetchError> {
        let response = self.client.get(&self.keys_url).send().await?;

        let max_age = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| {
                s.split(',').find_map(|part| {
                    part.trim()
                        .strip_prefix("max-age=")
                        .and_then(|v| v.parse::<u64>().ok())
                })
            })
            .unwrap_or(3600);

        let keys_json: HashMap<String, String> = response.json().await?;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeys {
            keys: keys_json,
            expires_at: Instant::now() + Duration::from_secs(max_age),
        });

        Ok(())
    }
}

impl Default for PublicKeyManager {
    fn default() -> Self {
        Self::new()
    }
}

use http::Extensions;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next};
use tokio::sync::OnceCell;
use yup_oauth2::authenticator::Authenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

// The type returned by ServiceAccountAuthenticator::builder(...).build().await.
type AuthType = Authenticator<HttpsConnector<HttpConnector>>;

/// Attaches a service-account OAuth2 bearer token to every outgoing request.
///
/// The authenticator is built lazily on first use and shared by clones, so a
/// single token cache backs all clients derived from the same key.
pub struct AuthMiddleware {
    pub key: ServiceAccountKey,
    authenticator: OnceCell<AuthType>,
}

impl AuthMiddleware {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            authenticator: OnceCell::new(),
        }
    }

    async fn get_token(&self) -> Result<String, anyhow::Error> {
        let auth = self
            .authenticator
            .get_or_try_init(|| async {
                ServiceAccountAuthenticator::builder(self.key.clone())
                    .build()
                    .await
                    .map_err(|e| std::io::Error::other(e))
            })
            .await?;

        let scopes = &[
            "https://www.googleapis.com/auth/cloud-platform",
            "https://www.googleapis.com/auth/firebase",
        ];

        let token = auth.token(scopes).await?;

        Ok(token
            .token()
            .ok_or_else(|| anyhow::anyhow!("No token found"))?
            .to_string())
    }
}

impl Clone for AuthMiddleware {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            authenticator: self.authenticator.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let token = self.get_token().await.map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("Failed to get auth token: {}", e))
        })?;

        let value = header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("Invalid token header: {}", e))
        })?;
        req.headers_mut().insert(header::AUTHORIZATION, value);

        next.run(req, extensions).await
    }
}

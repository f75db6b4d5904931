use std::sync::Arc;

use chat_functions::config::Config;
use chat_functions::server::{router, AppState};
use chat_functions::FirebaseApp;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let key = yup_oauth2::read_service_account_key(&config.credentials_path).await?;
    let app = FirebaseApp::new(key);
    info!(project_id = %app.project_id(), "service clients initialized");

    let state = AppState {
        auth: app.auth(),
        firestore: app.firestore(),
        messaging: app.messaging(),
        verifier: Arc::new(app.id_token_verifier()),
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

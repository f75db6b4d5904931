//! Process configuration, read once at startup from the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("GOOGLE_APPLICATION_CREDENTIALS is not set")]
    MissingCredentials,
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the service account key JSON.
    pub credentials_path: PathBuf,
    pub listen_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let credentials_path = std::env::var("GOOGLE_APPLICATION_CREDENTIALS")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::MissingCredentials)?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            credentials_path,
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        })
    }
}

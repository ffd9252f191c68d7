use std::{env, net::SocketAddr, path::PathBuf};

use thiserror::Error;

use crate::registry::{BackendRegistry, RegistryError};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_BIND_PORT: u16 = 3100;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub backends_file: Option<PathBuf>,
    pub public_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = non_empty_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_port = non_empty_var("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_BIND_PORT);
        let backends_file = non_empty_var("BRIDGE_BACKENDS_FILE").map(PathBuf::from);
        let public_url = non_empty_var("BRIDGE_PUBLIC_URL")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://{bind_addr}:{bind_port}"));

        let config = Self {
            bind_addr,
            bind_port,
            backends_file,
            public_url,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }

    /// Builds the backend registry from `BRIDGE_BACKENDS_FILE`, or the default set.
    pub fn load_registry(&self) -> Result<BackendRegistry, ConfigError> {
        let home = env::var_os("HOME").map(PathBuf::from);
        let registry = match &self.backends_file {
            Some(path) => BackendRegistry::from_file(path, home.as_deref())?,
            None => BackendRegistry::with_defaults(home.as_deref()),
        };
        Ok(registry)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

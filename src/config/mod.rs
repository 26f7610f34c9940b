use std::env;
use std::net::SocketAddr;
use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::with_security_headers;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown STORE_BACKEND '{0}', expected 'postgres' or 'memory'")]
    UnknownBackend(String),

    #[error("DATABASE_URL must be set for the postgres store")]
    MissingDatabaseUrl,

    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Where records live. Chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub bind_addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    /// `RUST_ENV=production`; turns on HSTS.
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "DATABASE_MAX_CONNECTIONS",
                    value,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let backend = lookup("STORE_BACKEND").map(|b| b.trim().to_lowercase());
        let store = match (backend.as_deref(), database_url) {
            (Some("memory"), _) | (None, None) => StoreBackend::Memory,
            (Some("postgres") | None, Some(database_url)) => StoreBackend::Postgres {
                database_url,
                max_connections,
            },
            (Some("postgres"), None) => return Err(ConfigError::MissingDatabaseUrl),
            (Some(other), _) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let bind_value = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_value
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                name: "BIND_ADDR",
                value: bind_value.clone(),
            })?;

        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let production = lookup("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        Ok(Self {
            store,
            bind_addr,
            allowed_origins,
            production,
        })
    }
}

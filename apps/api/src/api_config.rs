use std::collections::BTreeSet;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use custodia_core::AppError;
use tracing_subscriber::EnvFilter;

/// Persistence backend selected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Postgres { database_url: String },
    Memory,
}

/// How request identities are derived from trusted proxy headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub subject_header: String,
    pub superuser_subjects: BTreeSet<String>,
    pub staff_subjects: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub storage: StorageConfig,
    pub api_host: String,
    pub api_port: u16,
    pub identity: IdentityConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_owned())
            .as_str()
        {
            "postgres" => StorageConfig::Postgres {
                database_url: required_non_empty_env("DATABASE_URL")?,
            },
            "memory" => StorageConfig::Memory,
            other => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        if migrate_only && storage == StorageConfig::Memory {
            return Err(AppError::Validation(
                "the migrate command requires STORAGE_BACKEND=postgres".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let subject_header =
            env::var("AUTH_SUBJECT_HEADER").unwrap_or_else(|_| "x-remote-user".to_owned());
        if subject_header.trim().is_empty() {
            return Err(AppError::Validation(
                "AUTH_SUBJECT_HEADER must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            migrate_only,
            storage,
            api_host,
            api_port,
            identity: IdentityConfig {
                subject_header: subject_header.trim().to_ascii_lowercase(),
                superuser_subjects: parse_subject_list(
                    env::var("SUPERUSER_SUBJECTS").unwrap_or_default().as_str(),
                ),
                staff_subjects: parse_subject_list(
                    env::var("STAFF_SUBJECTS").unwrap_or_default().as_str(),
                ),
            },
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_subject_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

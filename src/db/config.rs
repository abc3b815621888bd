use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(10);

        let acquire_timeout = std::env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));

        Self {
            url,
            max_connections,
            acquire_timeout,
        }
    }

    pub fn memory() -> Self {
        Self {
            url: None,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    pub fn backend(&self) -> Result<Backend, DbConfigError> {
        let Some(url) = self.url.as_deref() else {
            return Ok(Backend::Memory);
        };
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Backend::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else {
            Err(DbConfigError::UnsupportedScheme(
                url.split(':').next().unwrap_or_default().to_string(),
            ))
        }
    }
}

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("unsupported DATABASE_URL scheme: {0}")]
    UnsupportedScheme(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: Option<&str>) -> DbConfig {
        DbConfig {
            url: url.map(str::to_string),
            ..DbConfig::memory()
        }
    }

    #[test]
    fn test_backend_from_url() {
        assert_eq!(with_url(None).backend().unwrap(), Backend::Memory);
        assert_eq!(
            with_url(Some("postgres://u@localhost/db")).backend().unwrap(),
            Backend::Postgres
        );
        assert_eq!(
            with_url(Some("sqlite::memory:")).backend().unwrap(),
            Backend::Sqlite
        );
        assert!(with_url(Some("mysql://x")).backend().is_err());
    }
}

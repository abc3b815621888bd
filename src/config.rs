use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::db::config::DbConfig;
use crate::logging::DEFAULT_LOG_FILTER;

const DEFAULT_SPEECH_LANGUAGE: &str = "de-DE";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub db: DbConfig,
    pub jwt_secret: Option<String>,
    pub local_mode: bool,
    pub speech_language: String,
    pub words_seed_path: Option<PathBuf>,
    pub session_idle_timeout: Duration,
    pub session_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        let jwt_secret = non_empty_var("JWT_SECRET");
        let local_mode = env_flag("LOCAL_MODE");
        let speech_language =
            non_empty_var("SPEECH_LANGUAGE").unwrap_or_else(|| DEFAULT_SPEECH_LANGUAGE.to_string());
        let words_seed_path = non_empty_var("WORDS_SEED_PATH").map(PathBuf::from);

        let session_idle_timeout = Duration::from_secs(secs_var("SESSION_IDLE_TIMEOUT_SECS", 3600));
        let session_sweep_interval = Duration::from_secs(secs_var("SESSION_SWEEP_INTERVAL_SECS", 300));

        Self {
            host,
            port,
            log_level,
            db: DbConfig::from_env(),
            jwt_secret,
            local_mode,
            speech_language,
            words_seed_path,
            session_idle_timeout,
            session_sweep_interval,
        }
    }

    /// In-process configuration for tests and embedding: memory store, local user.
    pub fn local() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            log_level: DEFAULT_LOG_FILTER.to_string(),
            db: DbConfig::memory(),
            jwt_secret: None,
            local_mode: true,
            speech_language: DEFAULT_SPEECH_LANGUAGE.to_string(),
            words_seed_path: None,
            session_idle_timeout: Duration::from_secs(3600),
            session_sweep_interval: Duration::from_secs(300),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

fn secs_var(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}

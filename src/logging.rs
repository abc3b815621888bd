use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives used when `RUST_LOG` is unset or unparsable. Request spans from
/// tower-http stay at info; sqlx statement logging is only surfaced when slow.
pub const DEFAULT_LOG_FILTER: &str = "wortschatz_backend=info,tower_http=info,sqlx=warn";

const LOG_FILE_PREFIX: &str = "wortschatz.log";
const DEFAULT_LOG_DIR: &str = "./logs";

/// Keeps the non-blocking file writer alive; drop it last.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn build_filter(directives: &str) -> EnvFilter {
    if directives.trim().is_empty() {
        return EnvFilter::new(DEFAULT_LOG_FILTER);
    }
    EnvFilter::try_new(directives).unwrap_or_else(|err| {
        eprintln!("invalid log filter {directives:?} ({err}), using {DEFAULT_LOG_FILTER}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    })
}

/// Daily-rolling file logs are opt-in through `ENABLE_FILE_LOGS`, written to
/// `LOG_DIR` (default `./logs`).
fn file_log_dir(enabled: Option<&str>, dir: Option<&str>) -> Option<PathBuf> {
    match enabled.map(str::trim) {
        Some("true") | Some("1") => {}
        _ => return None,
    }
    let dir = dir.map(str::trim).filter(|d| !d.is_empty()).unwrap_or(DEFAULT_LOG_DIR);
    Some(PathBuf::from(dir))
}

pub fn init_tracing(log_filter: &str) -> Option<FileLogGuard> {
    let enabled = std::env::var("ENABLE_FILE_LOGS").ok();
    let dir = std::env::var("LOG_DIR").ok();
    let log_dir = file_log_dir(enabled.as_deref(), dir.as_deref()).and_then(|dir| {
        match std::fs::create_dir_all(&dir) {
            Ok(()) => Some(dir),
            Err(err) => {
                eprintln!("failed to create log directory {}: {err}", dir.display());
                None
            }
        }
    });

    let (file_layer, guard) = match &log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(FileLogGuard { _guard: guard }))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_filter(log_filter))
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    if let Some(dir) = log_dir {
        tracing::info!(log_dir = %dir.display(), "file logging enabled");
    }
    guard
}

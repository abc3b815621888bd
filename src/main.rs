use std::sync::Arc;

use wortschatz_backend::config::Config;
use wortschatz_backend::db::Store;
use wortschatz_backend::logging::init_tracing;
use wortschatz_backend::seed::seed_corpus;
use wortschatz_backend::services::speech::TracingSpeaker;
use wortschatz_backend::state::AppState;
use wortschatz_backend::workers::WorkerManager;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let store = match Store::connect(&config.db).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize store");
            std::process::exit(1);
        }
    };

    if let Some(path) = config.words_seed_path.as_deref() {
        if let Err(err) = seed_corpus(&store, path).await {
            tracing::error!(error = %err, "corpus seeding failed");
        }
    }

    let state = AppState::new(config.clone(), store, Arc::new(TracingSpeaker));

    let workers = WorkerManager::new();
    workers
        .start_session_sweeper(
            state.study().sessions(),
            config.session_idle_timeout,
            config.session_sweep_interval,
        )
        .await;

    let app = wortschatz_backend::create_app(state);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "bind listener failed");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, local_mode = config.local_mode, "wortschatz backend listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped, stopping workers");
    workers.stop().await;
    tracing::info!("graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

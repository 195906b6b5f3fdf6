//! crudscope server binary.
//!
//! - Config: `CRUDSCOPE_CONFIG` (default `crudscope.yaml`), defaults if absent
//! - Items: /items, /items/:id
//! - Ops: /healthz, /metrics

use crudscope_server::{app_state::AppState, config, obs, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    obs::init_tracing();

    let path = std::env::var("CRUDSCOPE_CONFIG").unwrap_or_else(|_| "crudscope.yaml".into());
    let cfg = config::load_or_default(&path)?;
    let listen = cfg.server.listen_addr()?;

    let state = AppState::new(cfg);
    let app = router::build_router(state);

    tracing::info!(%listen, "crudscope-server starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("crudscope-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("signal received, starting graceful shutdown");
}

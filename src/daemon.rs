use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::fetch::HotlistClient;
use crate::registry::PlatformRegistry;
use crate::store::HotlistStore;
use crate::{poller, server};

pub async fn run(config: Config) -> Result<()> {
    let registry = PlatformRegistry::new();
    let store = HotlistStore::new();
    let client = HotlistClient::from_config(&config, registry.clone()).context("building hot list client")?;
    let interval = config.poll.interval()?;

    let cancel = CancellationToken::new();
    let (refresh_tx, refresh_rx) = poller::refresh_channel();

    let poller_handle = tokio::spawn(poller::polling_loop(
        client,
        store.clone(),
        interval,
        refresh_rx,
        cancel.clone(),
    ));

    let app_state = server::AppState {
        store,
        registry,
        refresh: refresh_tx,
    };

    let router = server::build_router(app_state);
    let listener = tokio::net::TcpListener::bind(&config.hotboard.listen)
        .await
        .with_context(|| format!("binding to {}", config.hotboard.listen))?;

    info!(listen = %config.hotboard.listen, source = %config.source.url, "HTTP server listening");

    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                server_cancel.cancelled().await;
            })
            .await
    });

    wait_for_shutdown().await?;
    info!("shutdown signal received");

    cancel.cancel();

    let shutdown_timeout = std::time::Duration::from_secs(10);
    let _ = tokio::time::timeout(shutdown_timeout, async {
        let _ = poller_handle.await;
        let _ = server_handle.await;
    })
    .await;

    info!("shutdown complete");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("registering SIGTERM handler")?;
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }

    Ok(())
}

use pricemonitor_server::{api::app_router, build_runner, build_state, config::Config, init_tracing};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config).await?;
    let (runner, tasks) = build_runner(&config, &state)?;

    let shutdown = CancellationToken::new();

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, stopping");
                ctrl_c.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    if let Some(addr) = config.listen_addr {
        let router = app_router(state.clone(), &config);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        let stop = shutdown.clone();
        tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await;
            if let Err(e) = served {
                tracing::error!("HTTP server failed: {}", e);
            }
        });
    }

    let report = runner.run(tasks, shutdown.clone()).await;
    // A bounded run ends before Ctrl-C; stop the facade too.
    shutdown.cancel();

    for task in &report.tasks {
        tracing::info!(
            "{} via {}: {} polls, {} stored, {} provider failures, {} storage failures",
            task.symbol,
            task.provider,
            task.polls,
            task.stored,
            task.provider_failures,
            task.storage_failures
        );
    }
    Ok(())
}

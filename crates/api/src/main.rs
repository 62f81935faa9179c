use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bindery_observability::init();

    let config = bindery_api::app::AppConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let app = bindery_api::app::build_app(config);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

mod api;
mod middleware;

use std::sync::Arc;

use tact_core::AppConfig;
use tact_funnel::LeadSubmitter;
use tact_meta::{BeaconTransport, ConversionsClient, PixelEmitter, PixelSink, ServerSink};
use tact_store::RestStore;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = tact_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let state = build_state(&config)?;
    if !state.conversions.is_configured() {
        tracing::warn!("META_PIXEL_ID or META_ACCESS_TOKEN unset; server-side conversions disabled");
    }

    let submitter = Arc::clone(&state.submitter);
    let app = build_app(state, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(env = %config.env, addr = %config.bind_addr, "tact-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    submitter.flush().await;
    tracing::info!("pending conversion reports flushed");
    Ok(())
}

fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = Arc::new(RestStore::new(&config.store)?);
    let conversions = Arc::new(ConversionsClient::new(&config.meta)?);

    let pixel = Arc::new(PixelEmitter::new(
        config.meta.pixel_id.clone(),
        Arc::new(BeaconTransport::new()?),
    ));
    pixel.load();

    let submitter = LeadSubmitter::new(store.clone())
        .with_sink(Arc::new(PixelSink::new(pixel)))
        .with_sink(Arc::new(ServerSink::new(Arc::clone(&conversions))));
    tracing::debug!(sinks = ?submitter.sink_names(), "lead submitter ready");

    Ok(AppState {
        submitter: Arc::new(submitter),
        conversions,
        reference: store,
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

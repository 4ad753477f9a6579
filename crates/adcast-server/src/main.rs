mod api;
mod middleware;
mod registry;

use std::sync::Arc;

use adcast_model::ArtifactStore;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
    registry::ModelRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(adcast_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pipeline = adcast_core::load_pipeline_config(&config.pipeline_path)?;
    let store = ArtifactStore::new(&config.artifact_dir);
    let bundle = store.load_bundle(&pipeline.targets).map_err(|e| {
        tracing::error!(error = %e, dir = %config.artifact_dir.display(), "cannot load models");
        e
    })?;

    let features = bundle.schema().len();
    let state = AppState::new(ModelRegistry::new(bundle), store, pipeline.targets);
    let targets = state.targets.join(",");
    let auth = AuthState::new(
        &config.api_keys,
        matches!(config.env, adcast_core::Environment::Development),
    )?;
    let rate_limit = RateLimitState::per_minute(config.rate_limit_per_minute);
    let app = build_app(state, auth, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        features,
        targets = %targets,
        "prediction server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use telemed_core::CoreConfig;
use telemed_core::config::{export_prefix_from_env_value, seed_sample_data_from_env_value};

/// Main entry point for the Telemed mock API
///
/// Serves the REST API, Swagger UI and OpenAPI document on one address.
///
/// # Environment Variables
/// - `TELEMED_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `TELEMED_SEED_SAMPLE_DATA`: start with the sample dataset (default: true)
/// - `TELEMED_EXPORT_PREFIX`: export file name prefix (default: "telemed")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration values are invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("telemed=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("telemed_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("TELEMED_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::new(
        export_prefix_from_env_value(std::env::var("TELEMED_EXPORT_PREFIX").ok()),
        seed_sample_data_from_env_value(std::env::var("TELEMED_SEED_SAMPLE_DATA").ok())?,
    )?);

    tracing::info!("++ Starting Telemed REST on {}", rest_addr);
    tracing::info!(
        seed_sample_data = cfg.seed_sample_data(),
        export_prefix = cfg.export_prefix(),
        "configuration resolved"
    );

    let app = router(AppState::new(cfg));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("-- Shutting down Telemed REST");
        })
        .await?;

    Ok(())
}

use prompt_refinery::config::Config;
use prompt_refinery::{app_router, services, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    init_logging(&config)?;

    let refiner = services::build_refiner(&config);
    let store = services::build_store(&config.store).await?;

    let shared_state = Arc::new(AppState::new(refiner, store));
    let app = app_router(shared_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// Production-grade logging configuration
fn init_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = config.log_filter.clone().unwrap_or_else(|| {
        if cfg!(debug_assertions) {
            "debug,prompt_refinery=trace,sqlx=info,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,prompt_refinery=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_new(&log_level)?;

    let fmt_layer = if config.json_logs {
        // JSON logging for production (easier for log aggregation)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    tracing::info!("PromptRefinery starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Build mode: {}", if cfg!(debug_assertions) { "development" } else { "production" });
    tracing::info!(
        "Configuration - Groq: {}, Chat store: {}",
        if config.groq.is_some() { "✅" } else { "❌" },
        config.store.name()
    );

    Ok(())
}

use chat_log_proxy::{audit::init_log_dir, build_app, AppConfig, AppState};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    info!("Loading application configuration");
    let config = AppConfig::new().unwrap_or_else(|e| {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    });
    debug!(
        "Configuration loaded: host={}, port={}, upstream={}, log_dir={}",
        config.host,
        config.port,
        config.upstream_base_url,
        config.log_dir.display()
    );

    if let Err(e) = init_log_dir(&config.log_dir) {
        error!("Failed to create log directory {}: {}", config.log_dir.display(), e);
        std::process::exit(1);
    }

    let addr = format!("{}:{}", config.host, config.port);
    let upstream = config.upstream_base_url.clone();
    let state = AppState::new(config).unwrap_or_else(|e| {
        error!("Failed to create upstream HTTP client: {}", e);
        std::process::exit(1);
    });
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        error!("Failed to bind {}: {}", addr, e);
        std::process::exit(1);
    });

    info!("Chat log proxy listening on {}, forwarding to {}", addr, upstream);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            error!("Server error: {}", e);
            std::process::exit(1);
        });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler")
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            debug!("CTRL+C signal received");
        },
        _ = terminate => {
            debug!("Terminate signal received");
        },
    }
    info!("Shutdown signal received, starting graceful shutdown");
}

use std::sync::Arc;

use auth::Authenticator;
use identity_service::config::Config;
use identity_service::domain::user::ports::UserServicePort;
use identity_service::domain::user::service::UserService;
use identity_service::inbound::http::cookies::CookieSettings;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::media::CloudinaryUploader;
use identity_service::outbound::repositories::InMemoryUserRepository;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        in_memory_store = config.database.is_in_memory(),
        cloud_name = %config.media.cloud_name,
        temp_dir = %config.media.temp_dir.display(),
        secure_cookies = config.cookies.secure,
        "Configuration loaded"
    );

    let authenticator = Arc::new(Authenticator::new(config.jwt.token_issuer_config())?);
    let media_uploader = Arc::new(CloudinaryUploader::new(&config.media));

    let user_service: Arc<dyn UserServicePort> = if config.database.is_in_memory() {
        tracing::warn!(database = "memory", "Using in-memory credential store");
        Arc::new(UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            media_uploader,
            Arc::clone(&authenticator),
        ))
    } else {
        let pg_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.database.url)
            .await?;
        tracing::info!(
            max_connections = 5,
            database = "postgresql",
            "Database connection pool created"
        );

        sqlx::migrate!("./migrations").run(&pg_pool).await?;
        tracing::info!(database = "postgresql", "Database migrations completed");

        Arc::new(UserService::new(
            Arc::new(PostgresUserRepository::new(pg_pool)),
            media_uploader,
            Arc::clone(&authenticator),
        ))
    };

    tokio::fs::create_dir_all(&config.media.temp_dir).await?;

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        user_service,
        authenticator,
        CookieSettings::new(config.cookies.secure),
        config.media.temp_dir.clone(),
    );

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

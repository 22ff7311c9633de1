use market_server::{AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    market_server::logging::init();

    let config = Config::from_env()?;
    tracing::info!(
        port = config.http_port,
        environment = %config.environment,
        "Market server starting"
    );

    let state = AppState::initialize(&config).await?;
    let app = market_server::api::build_app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}

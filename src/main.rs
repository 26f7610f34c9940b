use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ticket_desk::config::Config;
use ticket_desk::routes::create_routes;
use ticket_desk::state::AppState;
use ticket_desk::store;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let store = store::connect(&config.store)
        .await
        .expect("Failed to initialise record store");

    let app = create_routes(AppState::new(store), &config);

    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}

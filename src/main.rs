use std::sync::Arc;

use dotenvy::dotenv;
use log::info;
use tower_http::cors::{Any, CorsLayer};

use deskserver::config::AppConfig;
use deskserver::llm::OpenAIClient;
use deskserver::shared::state::AppState;
use deskserver::storage::create_store;
use deskserver::{tickets, web};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env()?;
    let store = create_store(&config.storage).await?;
    let llm = Arc::new(OpenAIClient::new(&config.llm));
    let state = Arc::new(AppState::new(config.clone(), store, llm));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = axum::Router::new()
        .merge(tickets::configure_tickets_routes())
        .merge(tickets::ui::configure_ui_routes())
        .merge(web::stream_handlers::routes())
        .layer(cors)
        .with_state(state);

    info!(
        "Starting HTTP server on {}:{}",
        config.server.host, config.server.port
    );
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

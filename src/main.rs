use std::{error::Error, sync::Arc};

use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront::{
    app,
    config::Config,
    entities::{connect, seed_demo_data, setup_schema},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;

    let db = connect(&config.database_url).await?;
    setup_schema(&db).await?;
    if config.seed_demo_data {
        seed_demo_data(&db).await?;
    }

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    let app = app(AppState::new(Arc::new(db), config));
    axum::serve(listener, app).await?;

    Ok(())
}

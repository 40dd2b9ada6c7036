use rivers_marine::{Dictionary, MemorySite, SiteContent};
use rivers_marine_wp::WordPressClient;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod routes;

use routes::{AppState, router};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .init();

    // Fixtures win over the live CMS when both are configured
    let source: Arc<dyn SiteContent> = match std::env::var("RIVERS_FIXTURES") {
        Ok(path) => {
            info!("Serving content from fixtures at {}", path);
            Arc::new(MemorySite::from_file(Path::new(&path))?)
        }
        Err(_) => {
            let client = WordPressClient::from_env()
                .map_err(|e| format!("Failed to initialize content source: {}", e))?;
            info!("Serving content from {}", client.base_url());
            Arc::new(client)
        }
    };

    let state = AppState {
        source,
        dictionary: Arc::new(Dictionary::embedded()?),
    };

    info!("Starting Rivers Marine web server");

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = std::env::var("RIVERS_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

use std::net::SocketAddr;

use swarmdeck_api::{api, infrastructure};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Get database URL
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        tracing::warn!("DATABASE_URL not set, using default");
        "sqlite://swarmdeck.db".to_string()
    });

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = infrastructure::db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    infrastructure::db::init_schema(&pool)
        .await
        .expect("Failed to initialize schema");

    tracing::info!("Database connected successfully");

    // Build router
    let app = api::router(pool);

    // Start server
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}

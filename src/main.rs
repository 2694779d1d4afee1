use std::sync::Arc;

use dotenvy::dotenv;

use calculadora::{
    config::AppConfig,
    create_router,
    database::{create_database_pool, run_migrations},
    repository::PgStore,
    AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let db = create_database_pool(&config.database_url).await
        .expect("Failed to connect to database");
    run_migrations(&db).await
        .expect("Failed to apply database migrations");

    let state = AppState::new(Arc::new(PgStore::new(db)), config.auth.clone());
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    log::info!("Calculadora server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await
        .expect("Server error");
}

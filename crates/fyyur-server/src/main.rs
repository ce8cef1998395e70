use fyyur_db::AppState;
use fyyur_server::config::ServerConfig;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Database connection
    let db_config = fyyur_db::DatabaseConfig::from_env();
    tracing::info!("connecting to database...");
    let db = fyyur_db::connect(&db_config)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("running database migrations...");
    fyyur_migration::Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");
    tracing::info!("migrations complete");

    let config = ServerConfig::from_env();
    let state = Arc::new(AppState { db });
    let app = fyyur_server::app(state, &config);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    tracing::info!(%addr, "server started");

    axum::serve(listener, app).await.expect("server error");
}

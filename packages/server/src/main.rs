use std::str::FromStr;
use std::sync::Arc;

use tracing::{Level, info};

use records_server::config::AppConfig;
use records_server::database::init_db;
use records_server::identity::DbIdentityProvider;
use records_server::seed::bootstrap_hod;
use records_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let level = Level::from_str(&config.log.level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    if config.auth.jwt_secret.len() < 32 {
        anyhow::bail!("auth.jwt_secret must be at least 32 bytes");
    }

    let db = init_db(&config.database.url).await?;
    info!("Connected to database");

    let identities = Arc::new(DbIdentityProvider::new(
        db.clone(),
        config.auth.session_ttl_hours,
    ));
    bootstrap_hod(&db, identities.as_ref(), &config.bootstrap)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed bootstrap HOD: {e:?}"))?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config: Arc::new(config),
        identities,
    };
    let app = records_server::build_router(state);

    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

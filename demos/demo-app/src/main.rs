use demo_app::{build_router, build_state, db};
use resq::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    resq::init_tracing();

    let yaml = std::fs::read_to_string("application.yaml").unwrap_or_default();
    let config = CompilerConfig::from_yaml_section(&yaml, "app.query")?.with_env_overrides()?;
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());

    let pool = db::connect(&database_url).await?;
    db::seed(&pool).await?;

    let app = build_router(build_state(pool, config));
    let addr = std::env::var("APP_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "demo-app listening");
    axum::serve(listener, app).await?;
    Ok(())
}

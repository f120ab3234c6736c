use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use resq::prelude::*;

pub mod db;
pub mod handlers;
pub mod models;
pub mod rules;
pub mod state;

use state::AppState;

pub fn build_state(pool: sqlx::SqlitePool, config: CompilerConfig) -> AppState {
    AppState {
        pool,
        users: Arc::new(rules::user_compiler(config)),
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/users",
            get(handlers::list_users).post(handlers::list_users),
        )
        .layer(resq::layers::default_trace())
        .layer(resq::layers::catch_panic_layer())
        .with_state(state)
}

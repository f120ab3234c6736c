use std::sync::Arc;

use resq::prelude::*;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub users: Arc<QueryCompiler<QueryBuilder>>,
}

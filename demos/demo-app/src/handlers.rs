use axum::extract::State;
use resq::prelude::*;
use resq::resq_data::{Dialect, IdentifierPolicy};
use sqlx::Sqlite;

use crate::models::{User, USER_COLUMNS};
use crate::state::AppState;

/// `GET /users`, or `POST /users` with the query in the body.
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(params): QueryParams,
) -> Result<ResourceResponse<User>, ResourceError> {
    if let Some(method) = params.method_override() {
        if method != "GET" {
            return Err(ResourceError::BadRequest(format!(
                "unsupported method override: {method}"
            )));
        }
    }

    let target = QueryBuilder::new_with_dialect("users", Dialect::Sqlite)
        .identifier_policy(IdentifierPolicy::Quote);
    let compiled = state.users.compile(target, &params);

    let page = resq::resq_data_sqlx::fetch::<Sqlite, User>(
        &state.pool,
        &compiled.target,
        USER_COLUMNS,
        compiled.page.as_ref(),
    )
    .await?;

    tracing::info!(
        count = page.data.len(),
        filters = ?compiled.applied.applied_filters,
        "listed users"
    );
    Ok(ResourceResponse::from_page(page, compiled.applied))
}

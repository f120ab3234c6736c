use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub state: String,
    pub role: String,
    pub created_at: String,
}

/// Columns selected for [`User`].
pub const USER_COLUMNS: &[&str] = &["id", "name", "email", "state", "role", "created_at"];

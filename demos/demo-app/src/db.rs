use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    state TEXT NOT NULL,
    role TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

const SEED: &[(&str, &str, &str, &str, &str)] = &[
    ("Alice", "alice@example.com", "active", "admin", "2024-01-05"),
    ("Bob", "bob@example.com", "active", "editor", "2024-01-12"),
    ("Carol", "carol@corp.test", "inactive", "viewer", "2024-02-01"),
    ("Dave", "dave@example.com", "active", "viewer", "2024-02-14"),
    ("Eve", "eve@corp.test", "archived", "admin", "2024-03-03"),
    ("Frank", "frank@example.com", "active", "editor", "2024-03-21"),
    ("Grace", "grace@corp.test", "active", "viewer", "2024-04-02"),
    ("Heidi", "heidi@example.com", "inactive", "editor", "2024-04-18"),
    ("Ivan", "ivan@example.com", "active", "viewer", "2024-05-07"),
    ("Judy", "judy@corp.test", "archived", "viewer", "2024-05-30"),
    ("Mallory", "mallory@example.com", "active", "admin", "2024-06-11"),
    ("Niaj", "niaj@example.com", "active", "viewer", "2024-06-29"),
];

/// Open the pool and create the schema.
///
/// An in-memory database lives as long as its connection, so it gets exactly
/// one that is never recycled.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    let pool = options.connect(url).await?;
    sqlx::query(SCHEMA).execute(&pool).await?;
    Ok(pool)
}

/// Insert the demo rows if the table is empty.
pub async fn seed(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }
    for (name, email, state, role, created_at) in SEED {
        sqlx::query(
            "INSERT INTO users (name, email, state, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(state)
        .bind(role)
        .bind(created_at)
        .execute(pool)
        .await?;
    }
    tracing::info!(rows = SEED.len(), "seeded users");
    Ok(())
}

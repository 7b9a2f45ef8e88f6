use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};

// Create the database file if needed, then connect and create the tables
pub async fn connect(url: &str, max_connections: u32) -> Result<Pool<Sqlite>, sqlx::Error> {
    if !Sqlite::database_exists(url).await.unwrap_or(false) {
        tracing::info!(url, "creating database");
        Sqlite::create_database(url).await?;
    } else {
        tracing::debug!(url, "database already exists");
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;
    tracing::info!("connection to the database is successful");

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        token TEXT,
        created_at TEXT NOT NULL
    );"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        body TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        user_id INTEGER NOT NULL REFERENCES users(id)
    );"#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_user ON todos (user_id);")
        .execute(pool)
        .await?;

    tracing::debug!("users and todos tables ready");
    Ok(())
}

// A single connection keeps every query on the same in-memory database
#[cfg(test)]
pub(crate) async fn memory() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}

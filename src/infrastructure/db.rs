use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Full schema, one statement per entry. `init_schema` replays these on
/// startup; every statement is idempotent.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS epics (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS features (
        id TEXT PRIMARY KEY,
        epic_id TEXT NOT NULL REFERENCES epics(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        feature_id TEXT NOT NULL REFERENCES features(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT,
        target_role TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        complexity TEXT NOT NULL,
        branch_name TEXT,
        status TEXT NOT NULL,
        locked_by TEXT,
        locked_at TEXT,
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS agents (
        agent_id TEXT PRIMARY KEY,
        role TEXT NOT NULL,
        skill_level TEXT NOT NULL,
        status TEXT NOT NULL,
        current_task_id TEXT,
        connection_type TEXT NOT NULL,
        last_activity TEXT NOT NULL,
        registered_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS changelog (
        id TEXT PRIMARY KEY,
        task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        old_status TEXT,
        new_status TEXT NOT NULL,
        changed_by TEXT NOT NULL,
        notes TEXT,
        changed_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        project_id TEXT REFERENCES projects(id) ON DELETE CASCADE,
        doc_type TEXT NOT NULL,
        author_id TEXT NOT NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        expires_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS mentions (
        id TEXT PRIMARY KEY,
        mentioned_agent_id TEXT NOT NULL,
        source_type TEXT NOT NULL,
        source_id TEXT NOT NULL,
        created_by TEXT NOT NULL,
        is_read INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        UNIQUE (source_type, source_id, mentioned_agent_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_routing
        ON tasks (status, target_role, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_updated ON tasks (updated_at)",
    "CREATE INDEX IF NOT EXISTS idx_changelog_task ON changelog (task_id)",
    "CREATE INDEX IF NOT EXISTS idx_mentions_agent
        ON mentions (mentioned_agent_id, created_at)",
];

/// Opens the connection pool for the given SQLite URL
///
/// Foreign keys are enabled per connection (cascade deletes depend on
/// them) and a busy timeout keeps concurrent writers queueing instead of
/// failing fast.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Creates all tables and indexes if they do not exist yet
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Pool over a private in-memory database with the schema applied.
/// A single connection keeps the in-memory database alive and shared.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

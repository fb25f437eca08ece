use sqlx::SqlitePool;
use anyhow::Result;

/// Run database migrations / 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            email TEXT,
            enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 收藏记录表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS figures (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            manufacturer TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL,
            scale TEXT NOT NULL DEFAULT '',
            link TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            box_number TEXT NOT NULL DEFAULT '',
            image TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_figures_user_id ON figures(user_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)")
        .execute(pool)
        .await?;

    tracing::debug!("Database migrations completed");
    Ok(())
}

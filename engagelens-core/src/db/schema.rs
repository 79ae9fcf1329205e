//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: profiles and content
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id               TEXT PRIMARY KEY,
        username         TEXT NOT NULL UNIQUE,
        full_name        TEXT,
        biography        TEXT,
        follower_count   INTEGER NOT NULL DEFAULT 0,
        following_count  INTEGER NOT NULL DEFAULT 0,
        media_count      INTEGER NOT NULL DEFAULT 0,
        is_verified      INTEGER NOT NULL DEFAULT 0,
        updated_at       DATETIME
    );

    CREATE TABLE IF NOT EXISTS content (
        id               TEXT PRIMARY KEY,
        owner_id         TEXT NOT NULL REFERENCES profiles(id),
        media_type       TEXT NOT NULL DEFAULT 'post',
        -- RFC 3339 UTC, fixed millisecond width so text order is time order
        posted_at        DATETIME,
        like_count       INTEGER NOT NULL DEFAULT 0,
        comment_count    INTEGER NOT NULL DEFAULT 0,
        share_count      INTEGER NOT NULL DEFAULT 0,
        save_count       INTEGER NOT NULL DEFAULT 0,
        view_count       INTEGER NOT NULL DEFAULT 0,
        caption          TEXT NOT NULL DEFAULT '',
        permalink        TEXT,
        ingested_at      DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_content_owner_posted ON content(owner_id, posted_at);
    "#,
    // Version 2: window scans across all accounts
    r#"
    CREATE INDEX IF NOT EXISTS idx_content_posted ON content(posted_at);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

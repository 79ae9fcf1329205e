//! Database repository layer
//!
//! Provides upsert and query operations for profiles and content.

use crate::error::{Error, Result};
use crate::source::{ContentQuery, RecordSource};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Format a timestamp the way it is stored: RFC 3339, UTC, millisecond width.
///
/// The fixed width keeps lexical order identical to chronological order, so
/// range filters can compare the text column directly.
fn to_db_time(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn from_db_time(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Counts written by a batch import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub profiles: usize,
    pub content: usize,
}

/// Database handle (single connection behind a mutex)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::DataUnavailable("database connection lock poisoned".to_string()))
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Profile operations
    // ============================================

    /// Insert or update a profile
    pub fn upsert_profile(&self, profile: &ProfileRecord) -> Result<()> {
        let conn = self.lock()?;
        Self::upsert_profile_on(&conn, profile)
    }

    fn upsert_profile_on(conn: &Connection, profile: &ProfileRecord) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO profiles (id, username, full_name, biography, follower_count,
                                  following_count, media_count, is_verified, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                full_name = excluded.full_name,
                biography = excluded.biography,
                follower_count = excluded.follower_count,
                following_count = excluded.following_count,
                media_count = excluded.media_count,
                is_verified = excluded.is_verified,
                updated_at = excluded.updated_at
            "#,
            params![
                profile.id,
                profile.username,
                profile.full_name,
                profile.biography,
                to_db_count(profile.follower_count),
                to_db_count(profile.following_count),
                to_db_count(profile.media_count),
                profile.is_verified,
                profile.updated_at.map(to_db_time),
            ],
        )?;
        Ok(())
    }

    /// Get a profile by username
    pub fn get_profile_by_username(&self, username: &str) -> Result<Option<ProfileRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT * FROM profiles WHERE username = ?",
            [username],
            Self::row_to_profile,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List all profiles ordered by username
    pub fn list_profiles(&self) -> Result<Vec<ProfileRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT * FROM profiles ORDER BY username")?;
        let profiles = stmt
            .query_map([], Self::row_to_profile)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(profiles)
    }

    fn row_to_profile(row: &Row) -> rusqlite::Result<ProfileRecord> {
        Ok(ProfileRecord {
            id: row.get("id")?,
            username: row.get("username")?,
            full_name: row.get("full_name")?,
            biography: row.get("biography")?,
            follower_count: from_db_count(row.get("follower_count")?),
            following_count: from_db_count(row.get("following_count")?),
            media_count: from_db_count(row.get("media_count")?),
            is_verified: row.get("is_verified")?,
            updated_at: from_db_time(row.get("updated_at")?),
        })
    }

    // ============================================
    // Content operations
    // ============================================

    /// Insert or update a content record
    pub fn upsert_content(&self, record: &ContentRecord) -> Result<()> {
        let conn = self.lock()?;
        Self::upsert_content_on(&conn, record, Utc::now())
    }

    fn upsert_content_on(
        conn: &Connection,
        record: &ContentRecord,
        ingested_at: DateTime<Utc>,
    ) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO content (id, owner_id, media_type, posted_at, like_count, comment_count,
                                 share_count, save_count, view_count, caption, permalink,
                                 ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(id) DO UPDATE SET
                owner_id = excluded.owner_id,
                media_type = excluded.media_type,
                posted_at = excluded.posted_at,
                like_count = excluded.like_count,
                comment_count = excluded.comment_count,
                share_count = excluded.share_count,
                save_count = excluded.save_count,
                view_count = excluded.view_count,
                caption = excluded.caption,
                permalink = excluded.permalink,
                ingested_at = excluded.ingested_at
            "#,
            params![
                record.id,
                record.owner_id,
                record.media_type.as_str(),
                record.timestamp.map(to_db_time),
                to_db_count(record.like_count),
                to_db_count(record.comment_count),
                to_db_count(record.share_count),
                to_db_count(record.save_count),
                to_db_count(record.view_count),
                record.caption,
                record.permalink,
                to_db_time(ingested_at),
            ],
        )?;
        Ok(())
    }

    /// Upsert a whole import document in one transaction.
    ///
    /// Profiles are written first so content foreign keys resolve.
    pub fn import(&self, doc: &ImportDocument) -> Result<ImportSummary> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let ingested_at = Utc::now();

        for profile in &doc.profiles {
            Self::upsert_profile_on(&tx, profile)?;
        }
        for record in &doc.content {
            Self::upsert_content_on(&tx, record, ingested_at)?;
        }
        tx.commit()?;

        tracing::info!(
            profiles = doc.profiles.len(),
            content = doc.content.len(),
            "Imported records"
        );

        Ok(ImportSummary {
            profiles: doc.profiles.len(),
            content: doc.content.len(),
        })
    }

    /// Count stored content records
    pub fn count_content(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM content", [], |r| r.get(0))?;
        Ok(count)
    }

    fn row_to_content(row: &Row) -> rusqlite::Result<ContentRecord> {
        let media_type: String = row.get("media_type")?;
        Ok(ContentRecord {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            media_type: MediaType::from_label(&media_type),
            timestamp: from_db_time(row.get("posted_at")?),
            like_count: from_db_count(row.get("like_count")?),
            comment_count: from_db_count(row.get("comment_count")?),
            share_count: from_db_count(row.get("share_count")?),
            save_count: from_db_count(row.get("save_count")?),
            view_count: from_db_count(row.get("view_count")?),
            caption: row.get("caption")?,
            permalink: row.get("permalink")?,
        })
    }
}

impl RecordSource for Database {
    fn fetch_profiles(&self, username: Option<&str>) -> Result<Vec<ProfileRecord>> {
        match username {
            Some(username) => Ok(self.get_profile_by_username(username)?.into_iter().collect()),
            None => self.list_profiles(),
        }
    }

    fn fetch_content(&self, query: &ContentQuery) -> Result<Vec<ContentRecord>> {
        if matches!(&query.owner_ids, Some(owners) if owners.is_empty()) {
            return Ok(Vec::new());
        }

        let mut sql = String::from("SELECT * FROM content WHERE ");
        let mut args: Vec<String> = Vec::new();

        if let Some(owners) = &query.owner_ids {
            let placeholders = vec!["?"; owners.len()].join(", ");
            sql.push_str(&format!("owner_id IN ({}) AND ", placeholders));
            args.extend(owners.iter().cloned());
        }

        sql.push_str("((posted_at >= ? AND posted_at <= ?)");
        args.push(to_db_time(query.since));
        args.push(to_db_time(query.until));
        if query.include_untimestamped {
            sql.push_str(" OR posted_at IS NULL");
        }
        sql.push_str(") ORDER BY posted_at IS NULL, posted_at, id");
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(args.iter()), Self::row_to_content)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tracing::debug!(
            returned = records.len(),
            include_untimestamped = query.include_untimestamped,
            "Fetched content"
        );

        Ok(records)
    }
}

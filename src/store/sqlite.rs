use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_optional_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.map(|s| parse_datetime(&s))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at, deleted_at";
const SEGMENT_COLUMNS: &str = "id, slug, created_at, updated_at, deleted_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_optional_datetime(row.get(4)?),
        deleted_at: parse_optional_datetime(row.get(5)?),
    })
}

fn segment_from_row(row: &Row<'_>) -> rusqlite::Result<Segment> {
    Ok(Segment {
        id: row.get(0)?,
        slug: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
        updated_at: parse_optional_datetime(row.get(3)?),
        deleted_at: parse_optional_datetime(row.get(4)?),
    })
}

fn query_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND deleted_at IS NULL"),
        params![id],
        user_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn query_segment(conn: &Connection, id: i64) -> Result<Option<Segment>> {
    conn.query_row(
        &format!("SELECT {SEGMENT_COLUMNS} FROM segments WHERE id = ?1 AND deleted_at IS NULL"),
        params![id],
        segment_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn membership_exists(conn: &Connection, user_id: i64, segment_id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM user_segment
             WHERE user_id = ?1 AND segment_id = ?2 AND deleted_at IS NULL
         )",
        params![user_id, segment_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Inserts an active membership row unless one already exists or either side
/// is no longer active. Returns whether a row was written.
fn insert_membership(conn: &Connection, user_id: i64, segment_id: i64, now: &str) -> Result<bool> {
    let result = conn.execute(
        "INSERT INTO user_segment (user_id, segment_id, created_at)
         SELECT ?1, ?2, ?3
         WHERE EXISTS(SELECT 1 FROM users WHERE id = ?1 AND deleted_at IS NULL)
           AND EXISTS(SELECT 1 FROM segments WHERE id = ?2 AND deleted_at IS NULL)",
        params![user_id, segment_id, now],
    );

    match result {
        Ok(rows) => Ok(rows > 0),
        // A concurrent writer got there first; the membership is active either way.
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(Error::from(e)),
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY id"
        ))?;

        let rows = stmt.query_map([], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        query_user(&self.conn(), id)
    }

    fn create_user(&self, name: &str, email: &str) -> Result<User> {
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO users (name, email, created_at) VALUES (?1, ?2, ?3)",
            params![name, email, format_datetime(&Utc::now())],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::Conflict(format!("Email already in use: {email}")));
            }
            Err(e) => return Err(Error::from(e)),
        }

        query_user(&conn, conn.last_insert_rowid())?.ok_or(Error::NotFound)
    }

    fn update_user(&self, id: i64, name: &str, email: &str) -> Result<User> {
        let conn = self.conn();
        let result = conn.execute(
            "UPDATE users SET name = ?1, email = ?2, updated_at = ?3
             WHERE id = ?4 AND deleted_at IS NULL",
            params![name, email, format_datetime(&Utc::now()), id],
        );

        let rows = match result {
            Ok(rows) => rows,
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::Conflict(format!("Email already in use: {email}")));
            }
            Err(e) => return Err(Error::from(e)),
        };

        if rows == 0 {
            return Err(Error::NotFound);
        }
        query_user(&conn, id)?.ok_or(Error::NotFound)
    }

    fn soft_delete_user(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = format_datetime(&Utc::now());

        let rows = tx.execute(
            "UPDATE users SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id],
        )?;

        if rows > 0 {
            tx.execute(
                "UPDATE user_segment SET deleted_at = ?1 WHERE user_id = ?2 AND deleted_at IS NULL",
                params![now, id],
            )?;
        }

        tx.commit()?;
        Ok(rows > 0)
    }

    // Segment operations

    fn list_segments(&self) -> Result<Vec<Segment>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SEGMENT_COLUMNS} FROM segments WHERE deleted_at IS NULL ORDER BY id"
        ))?;

        let rows = stmt.query_map([], segment_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_segment(&self, id: i64) -> Result<Option<Segment>> {
        query_segment(&self.conn(), id)
    }

    fn get_segment_by_slug(&self, slug: &str) -> Result<Option<Segment>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {SEGMENT_COLUMNS} FROM segments WHERE slug = ?1 AND deleted_at IS NULL"
            ),
            params![slug],
            segment_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn create_segment(&self, slug: &str) -> Result<Segment> {
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO segments (slug, created_at) VALUES (?1, ?2)",
            params![slug, format_datetime(&Utc::now())],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::Conflict(format!("Segment already exists: {slug}")));
            }
            Err(e) => return Err(Error::from(e)),
        }

        query_segment(&conn, conn.last_insert_rowid())?.ok_or(Error::NotFound)
    }

    fn update_segment(&self, id: i64, slug: &str) -> Result<Segment> {
        let conn = self.conn();
        let result = conn.execute(
            "UPDATE segments SET slug = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
            params![slug, format_datetime(&Utc::now()), id],
        );

        let rows = match result {
            Ok(rows) => rows,
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::Conflict(format!("Segment already exists: {slug}")));
            }
            Err(e) => return Err(Error::from(e)),
        };

        if rows == 0 {
            return Err(Error::NotFound);
        }
        query_segment(&conn, id)?.ok_or(Error::NotFound)
    }

    fn soft_delete_segment(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = format_datetime(&Utc::now());

        let rows = tx.execute(
            "UPDATE segments SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id],
        )?;

        if rows > 0 {
            tx.execute(
                "UPDATE user_segment SET deleted_at = ?1 WHERE segment_id = ?2 AND deleted_at IS NULL",
                params![now, id],
            )?;
        }

        tx.commit()?;
        Ok(rows > 0)
    }

    // Membership operations

    fn add_memberships(&self, user_id: i64, segment_ids: &[i64]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = format_datetime(&Utc::now());
        let mut inserted = 0;

        for &segment_id in segment_ids {
            if membership_exists(&tx, user_id, segment_id)? {
                continue;
            }
            if insert_membership(&tx, user_id, segment_id, &now)? {
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn remove_memberships(&self, user_id: i64, segment_ids: &[i64]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = format_datetime(&Utc::now());
        let mut removed = 0;

        for &segment_id in segment_ids {
            removed += tx.execute(
                "UPDATE user_segment SET deleted_at = ?1
                 WHERE user_id = ?2 AND segment_id = ?3 AND deleted_at IS NULL",
                params![now, user_id, segment_id],
            )?;
        }

        tx.commit()?;
        Ok(removed)
    }

    fn list_user_segments(&self, user_id: i64) -> Result<Vec<Segment>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT s.id, s.slug, s.created_at, s.updated_at, s.deleted_at
             FROM segments s
             JOIN user_segment us ON us.segment_id = s.id
             WHERE us.user_id = ?1 AND us.deleted_at IS NULL AND s.deleted_at IS NULL
             ORDER BY s.id",
        )?;

        let rows = stmt.query_map(params![user_id], segment_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_membership_history(&self, user_id: i64) -> Result<Vec<Membership>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, segment_id, created_at, deleted_at
             FROM user_segment WHERE user_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Membership {
                id: row.get(0)?,
                user_id: row.get(1)?,
                segment_id: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
                deleted_at: parse_optional_datetime(row.get(4)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

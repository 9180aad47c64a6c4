//! Resume persistence contract and SQLite implementation.
//!
//! # Responsibility
//! - Store content and style documents side by side, scoped by owner.
//! - Keep SQL details behind the `ResumeStore` trait.
//!
//! # Invariants
//! - The composed view is never persisted; it is recomputed on read.
//! - Every query filters by `owner_id`; a foreign owner's row is
//!   indistinguishable from a missing row.
//! - Read paths reject malformed persisted JSON instead of masking it.

use crate::db::DbError;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const RESUME_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    name,
    slug,
    tags,
    is_public,
    is_locked,
    content,
    styles,
    created_at,
    updated_at
FROM resumes";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "resume not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted resume data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One persisted resume: record fields plus content and styles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub is_locked: bool,
    pub content: Value,
    pub styles: Value,
    /// Epoch milliseconds, assigned by the store.
    pub created_at: i64,
    /// Epoch milliseconds, assigned by the store.
    pub updated_at: i64,
}

/// Persistence collaborator for resumes.
pub trait ResumeStore {
    fn create(&self, record: &ResumeRecord) -> RepoResult<()>;
    fn load(&self, id: Uuid, owner_id: &str) -> RepoResult<Option<ResumeRecord>>;
    /// Overwrites record fields, content, styles and lock flag of an existing row.
    fn store(&self, record: &ResumeRecord) -> RepoResult<()>;
    fn list(&self, owner_id: &str) -> RepoResult<Vec<ResumeRecord>>;
    fn delete(&self, id: Uuid, owner_id: &str) -> RepoResult<()>;

    /// Runs one load -> compute -> store unit.
    ///
    /// Implementations with transactions commit only when `work` succeeds.
    fn atomically<T, E>(&self, work: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        Self: Sized,
        E: From<RepoError>,
    {
        work(self)
    }
}

/// SQLite-backed resume store.
pub struct SqliteResumeStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteResumeStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

fn to_json(value: &impl Serialize, column: &str) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode resumes.{column}: {err}")))
}

impl ResumeStore for SqliteResumeStore<'_> {
    fn create(&self, record: &ResumeRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO resumes (
                id,
                owner_id,
                name,
                slug,
                tags,
                is_public,
                is_locked,
                content,
                styles,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                      (strftime('%s', 'now') * 1000), (strftime('%s', 'now') * 1000));",
            params![
                record.id.to_string(),
                record.owner_id.as_str(),
                record.name.as_str(),
                record.slug.as_str(),
                to_json(&record.tags, "tags")?,
                record.is_public,
                record.is_locked,
                to_json(&record.content, "content")?,
                to_json(&record.styles, "styles")?,
            ],
        )?;
        Ok(())
    }

    fn load(&self, id: Uuid, owner_id: &str) -> RepoResult<Option<ResumeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RESUME_SELECT_SQL}
             WHERE id = ?1 AND owner_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), owner_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_resume_row(row)?)),
            None => Ok(None),
        }
    }

    fn store(&self, record: &ResumeRecord) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE resumes
             SET
                name = ?1,
                slug = ?2,
                tags = ?3,
                is_public = ?4,
                is_locked = ?5,
                content = ?6,
                styles = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?8 AND owner_id = ?9;",
            params![
                record.name.as_str(),
                record.slug.as_str(),
                to_json(&record.tags, "tags")?,
                record.is_public,
                record.is_locked,
                to_json(&record.content, "content")?,
                to_json(&record.styles, "styles")?,
                record.id.to_string(),
                record.owner_id.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(record.id));
        }
        Ok(())
    }

    fn list(&self, owner_id: &str) -> RepoResult<Vec<ResumeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RESUME_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY updated_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([owner_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_resume_row(row)?);
        }
        Ok(records)
    }

    fn delete(&self, id: Uuid, owner_id: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM resumes WHERE id = ?1 AND owner_id = ?2;",
            params![id.to_string(), owner_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn atomically<T, E>(&self, work: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        Self: Sized,
        E: From<RepoError>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|err| E::from(RepoError::from(err)))?;
        let output = work(self)?;
        tx.commit().map_err(|err| E::from(RepoError::from(err)))?;
        Ok(output)
    }
}

fn parse_json_column(row: &Row<'_>, column: &str) -> RepoResult<Value> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw)
        .map_err(|err| RepoError::InvalidData(format!("invalid JSON in resumes.{column}: {err}")))
}

fn parse_flag(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid {column} value `{other}` in resumes.{column}"
        ))),
    }
}

fn parse_resume_row(row: &Row<'_>) -> RepoResult<ResumeRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in resumes.id")))?;

    let tags = match parse_json_column(row, "tags")? {
        Value::Array(tags) => tags
            .into_iter()
            .map(|tag| match tag {
                Value::String(tag) => Ok(tag),
                other => Err(RepoError::InvalidData(format!(
                    "invalid tag `{other}` in resumes.tags"
                ))),
            })
            .collect::<RepoResult<Vec<_>>>()?,
        other => {
            return Err(RepoError::InvalidData(format!(
                "expected array in resumes.tags, got `{other}`"
            )))
        }
    };

    Ok(ResumeRecord {
        id,
        owner_id: row.get("owner_id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
        tags,
        is_public: parse_flag(row, "is_public")?,
        is_locked: parse_flag(row, "is_locked")?,
        content: parse_json_column(row, "content")?,
        styles: parse_json_column(row, "styles")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

//! SQLite-backed store implementation.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_sqlite::rusqlite::OptionalExtension;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;

use super::NewUser;
use super::SessionStore;
use super::SessionUpdate;
use super::UserRecord;
use super::UserStore;
use super::now;
use crate::error::StoreError;
use crate::model::Session;
use crate::model::SessionDraft;
use crate::model::SessionId;
use crate::model::SessionStatus;
use crate::model::User;
use crate::model::UserId;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        json_file_url TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        revision INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id, updated_at);
    CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status, created_at);
";

const SESSION_COLUMNS: &str =
    "id, user_id, title, tags, json_file_url, status, created_at, updated_at";

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at, password_hash";

/// A persistent store backed by SQLite.
///
/// File databases use WAL journal mode. Timestamps are stored as
/// milliseconds since the epoch and tags as a JSON array.
///
/// # Example
///
/// ```ignore
/// use wellspace_lib::store::SqliteStore;
///
/// let store = SqliteStore::open("wellspace.db").await?;
///
/// // In-memory database (for testing)
/// let store = SqliteStore::open_in_memory().await?;
/// ```
pub struct SqliteStore {
    client: Client,
}

impl SqliteStore {
    /// Opens the database at `path`, creating file and tables if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    /// Opens an in-memory database. Data is lost when the store is dropped.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    async fn init_schema(client: &Client) -> Result<(), StoreError> {
        client.conn(|conn| conn.execute_batch(SCHEMA)).await?;
        Ok(())
    }

    async fn query_sessions(
        &self,
        sql: String,
        param: Option<String>,
    ) -> Result<Vec<Session>, StoreError> {
        let rows = self
            .client
            .conn(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = match param {
                    Some(param) => stmt
                        .query_map([param], SessionRow::from_row)?
                        .collect::<Result<Vec<_>, _>>()?,
                    None => stmt
                        .query_map([], SessionRow::from_row)?
                        .collect::<Result<Vec<_>, _>>()?,
                };
                Ok(rows)
            })
            .await?;

        rows.into_iter().map(SessionRow::into_session).collect()
    }
}

// =============================================================================
// Row decoding
// =============================================================================

struct SessionRow {
    id: String,
    user_id: String,
    title: String,
    tags: String,
    json_file_url: String,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl SessionRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            tags: row.get(3)?,
            json_file_url: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_session(self) -> Result<Session, StoreError> {
        Ok(Session {
            id: self.id.parse().map_err(|_| corrupt("session id", &self.id))?,
            user_id: self
                .user_id
                .parse()
                .map_err(|_| corrupt("user id", &self.user_id))?,
            tags: serde_json::from_str(&self.tags).map_err(|_| corrupt("tags", &self.tags))?,
            status: self
                .status
                .parse()
                .map_err(|_| corrupt("status", &self.status))?,
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
            title: self.title,
            json_file_url: self.json_file_url,
        })
    }
}

struct UserRow {
    id: String,
    name: String,
    email: String,
    created_at: i64,
    updated_at: i64,
    password_hash: String,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
            password_hash: row.get(5)?,
        })
    }

    fn into_record(self) -> Result<UserRecord, StoreError> {
        Ok(UserRecord {
            user: User {
                id: self.id.parse().map_err(|_| corrupt("user id", &self.id))?,
                name: self.name,
                email: self.email,
                created_at: from_millis(self.created_at)?,
                updated_at: from_millis(self.updated_at)?,
            },
            password_hash: self.password_hash,
        })
    }
}

enum UpdateOutcome {
    Missing,
    Forbidden,
    Updated(SessionRow),
}

fn corrupt(what: &str, value: &str) -> StoreError {
    StoreError::Corrupt(format!("invalid {what}: {value:?}"))
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| corrupt("timestamp", &millis.to_string()))
}

fn encode_tags(tags: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(tags).map_err(|err| StoreError::Corrupt(err.to_string()))
}

// =============================================================================
// Trait impls
// =============================================================================

#[async_trait]
impl UserStore for SqliteStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let created = now();
        let record = User {
            id: UserId::new(),
            name: user.name,
            email: user.email,
            created_at: created,
            updated_at: created,
        };

        let params = (
            record.id.to_string(),
            record.name.clone(),
            record.email.clone(),
            user.password_hash,
            created.timestamp_millis(),
        );
        let inserted = self
            .client
            .conn(move |conn| {
                let (id, name, email, hash, at) = params;
                conn.execute(
                    "INSERT OR IGNORE INTO users (id, name, email, password_hash, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    rusqlite::params![id, name, email, hash, at],
                )
            })
            .await?;

        if inserted == 0 {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }
        log::debug!("Created user {}", record.id);
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let email = email.to_string();
        let row = self
            .client
            .conn(move |conn| {
                conn.query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                    [email],
                    UserRow::from_row,
                )
                .optional()
            })
            .await?;

        row.map(UserRow::into_record).transpose()
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let id = id.to_string();
        let row = self
            .client
            .conn(move |conn| {
                conn.query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    [id],
                    UserRow::from_row,
                )
                .optional()
            })
            .await?;

        Ok(row
            .map(UserRow::into_record)
            .transpose()?
            .map(|record| record.user))
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn create_session(
        &self,
        owner: UserId,
        draft: SessionDraft,
        status: SessionStatus,
    ) -> Result<Session, StoreError> {
        let created = now();
        let session = Session {
            id: SessionId::new(),
            user_id: owner,
            title: draft.title,
            tags: draft.tags,
            json_file_url: draft.json_file_url,
            status,
            created_at: created,
            updated_at: created,
        };

        let params = (
            session.id.to_string(),
            owner.to_string(),
            session.title.clone(),
            encode_tags(&session.tags)?,
            session.json_file_url.clone(),
            status.as_str(),
            created.timestamp_millis(),
        );
        self.client
            .conn(move |conn| {
                let (id, user_id, title, tags, url, status, at) = params;
                conn.execute(
                    "INSERT INTO sessions
                        (id, user_id, title, tags, json_file_url, status, created_at, updated_at, revision)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7,
                        (SELECT COALESCE(MAX(revision), 0) + 1 FROM sessions))",
                    rusqlite::params![id, user_id, title, tags, url, status, at],
                )
            })
            .await?;

        log::debug!("Created session {} for {owner}", session.id);
        Ok(session)
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        let id = id.to_string();
        let row = self
            .client
            .conn(move |conn| {
                conn.query_row(
                    &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                    [id],
                    SessionRow::from_row,
                )
                .optional()
            })
            .await?;

        row.map(SessionRow::into_session).transpose()
    }

    async fn update_session(
        &self,
        id: SessionId,
        owner: UserId,
        update: SessionUpdate,
    ) -> Result<Session, StoreError> {
        let tags = update.tags.as_deref().map(encode_tags).transpose()?;
        let params = (
            id.to_string(),
            owner.to_string(),
            update.title,
            tags,
            update.json_file_url,
            update.status.map(SessionStatus::as_str),
            now().timestamp_millis(),
        );

        let outcome = self
            .client
            .conn(move |conn| {
                let (id, owner, title, tags, url, status, at) = params;
                let stored_owner: Option<String> = conn
                    .query_row("SELECT user_id FROM sessions WHERE id = ?1", [&id], |row| {
                        row.get(0)
                    })
                    .optional()?;
                match stored_owner {
                    None => return Ok(UpdateOutcome::Missing),
                    Some(stored) if stored != owner => return Ok(UpdateOutcome::Forbidden),
                    Some(_) => {}
                }

                conn.execute(
                    "UPDATE sessions SET
                        title = COALESCE(?2, title),
                        tags = COALESCE(?3, tags),
                        json_file_url = COALESCE(?4, json_file_url),
                        status = COALESCE(?5, status),
                        updated_at = ?6,
                        revision = (SELECT COALESCE(MAX(revision), 0) + 1 FROM sessions)
                     WHERE id = ?1",
                    rusqlite::params![id, title, tags, url, status, at],
                )?;
                conn.query_row(
                    &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                    [&id],
                    SessionRow::from_row,
                )
                .map(UpdateOutcome::Updated)
            })
            .await?;

        match outcome {
            UpdateOutcome::Missing => Err(StoreError::session_not_found()),
            UpdateOutcome::Forbidden => {
                log::warn!("User {owner} tried to modify session {id}");
                Err(StoreError::session_forbidden())
            }
            UpdateOutcome::Updated(row) => row.into_session(),
        }
    }

    async fn find_sessions_by_owner(&self, owner: UserId) -> Result<Vec<Session>, StoreError> {
        self.query_sessions(
            format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = ?1
                 ORDER BY updated_at DESC, revision DESC"
            ),
            Some(owner.to_string()),
        )
        .await
    }

    async fn find_published_sessions(&self) -> Result<Vec<Session>, StoreError> {
        self.query_sessions(
            format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE status = 'published'
                 ORDER BY created_at DESC, rowid DESC"
            ),
            None,
        )
        .await
    }
}

//! Persistence for users and sessions
//!
//! Provides the `UserStore` and `SessionStore` traits with a SQLite
//! implementation for the server and an in-memory one for tests and
//! ephemeral runs. Both enforce owner checks on update.

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;

use crate::error::StoreError;
use crate::model::Session;
use crate::model::SessionDraft;
use crate::model::SessionId;
use crate::model::SessionStatus;
use crate::model::User;
use crate::model::UserId;

/// A user to be created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    /// Already normalized by the caller.
    pub email: String,
    pub password_hash: String,
}

/// A stored user together with the password hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Fields to change on an existing session. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub json_file_url: Option<String>,
    pub status: Option<SessionStatus>,
}

impl SessionUpdate {
    /// Replaces every editable field with the draft's.
    pub fn from_draft(draft: SessionDraft) -> Self {
        Self {
            title: Some(draft.title),
            tags: Some(draft.tags),
            json_file_url: Some(draft.json_file_url),
            status: None,
        }
    }

    /// Sets the status, builder style.
    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn apply(self, session: &mut Session, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            session.title = title;
        }
        if let Some(tags) = self.tags {
            session.tags = tags;
        }
        if let Some(url) = self.json_file_url {
            session.json_file_url = url;
        }
        if let Some(status) = self.status {
            session.status = status;
        }
        session.updated_at = now;
    }
}

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user. A taken email is a [`StoreError::Conflict`].
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Looks a user up by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Looks a user up by id.
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
}

/// Session persistence.
///
/// `update_session` checks ownership before touching anything: an unknown id
/// is [`StoreError::NotFound`], another owner's record is
/// [`StoreError::Forbidden`], and neither case writes.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a session owned by `owner`.
    async fn create_session(
        &self,
        owner: UserId,
        draft: SessionDraft,
        status: SessionStatus,
    ) -> Result<Session, StoreError>;

    /// Looks a session up by id, regardless of owner.
    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, StoreError>;

    /// Applies `update` to a session owned by `owner`.
    async fn update_session(
        &self,
        id: SessionId,
        owner: UserId,
        update: SessionUpdate,
    ) -> Result<Session, StoreError>;

    /// Sessions of `owner`, most recently updated first.
    async fn find_sessions_by_owner(&self, owner: UserId) -> Result<Vec<Session>, StoreError>;

    /// Published sessions, newest first.
    async fn find_published_sessions(&self) -> Result<Vec<Session>, StoreError>;
}

/// Current time at millisecond precision, the resolution both stores keep.
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_millis_opt(now.timestamp_millis())
        .single()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_leaves_unset_fields() {
        let created = now();
        let mut session = Session {
            id: SessionId::new(),
            user_id: UserId::new(),
            title: "Morning stretch".into(),
            tags: vec!["yoga".into()],
            json_file_url: String::new(),
            status: SessionStatus::Draft,
            created_at: created,
            updated_at: created,
        };
        let later = created + chrono::Duration::seconds(5);
        SessionUpdate {
            title: Some("Evening stretch".into()),
            ..Default::default()
        }
        .apply(&mut session, later);

        assert_eq!(session.title, "Evening stretch");
        assert_eq!(session.tags, vec!["yoga".to_string()]);
        assert_eq!(session.status, SessionStatus::Draft);
        assert_eq!(session.updated_at, later);
        assert_eq!(session.created_at, created);
    }

    #[test]
    fn test_now_is_millisecond_precision() {
        assert_eq!(now().timestamp_subsec_nanos() % 1_000_000, 0);
    }
}

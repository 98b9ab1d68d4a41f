//! In-memory store using DashMap

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

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

#[derive(Debug, Clone)]
struct StoredSession {
    session: Session,
    created_seq: u64,
    updated_seq: u64,
}

/// A store backed by concurrent hash maps.
///
/// Thread-safe and fast, but everything is lost when the process exits.
///
/// # Example
///
/// ```
/// use wellspace_lib::store::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: DashMap<UserId, UserRecord>,
    emails: DashMap<String, UserId>,
    sessions: DashMap<SessionId, StoredSession>,
    next_seq: AtomicU64,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no users or sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.sessions.is_empty()
    }

    fn sorted_by<K: Ord>(
        &self,
        filter: impl Fn(&Session) -> bool,
        key: impl Fn(&StoredSession) -> K,
    ) -> Vec<Session> {
        let mut matches: Vec<StoredSession> = self
            .sessions
            .iter()
            .filter(|entry| filter(&entry.session))
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by(|a, b| key(b).cmp(&key(a)));
        matches.into_iter().map(|stored| stored.session).collect()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let id = UserId::new();
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::Conflict("Email already registered".to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let created = now();
        let record = UserRecord {
            user: User {
                id,
                name: user.name,
                email: user.email,
                created_at: created,
                updated_at: created,
            },
            password_hash: user.password_hash,
        };
        let created_user = record.user.clone();
        self.users.insert(id, record);
        log::debug!("Created user {id}");
        Ok(created_user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.user.clone()))
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
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
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.sessions.insert(
            session.id,
            StoredSession {
                session: session.clone(),
                created_seq: seq,
                updated_seq: seq,
            },
        );
        log::debug!("Created session {} for {owner}", session.id);
        Ok(session)
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.get(&id).map(|entry| entry.session.clone()))
    }

    async fn update_session(
        &self,
        id: SessionId,
        owner: UserId,
        update: SessionUpdate,
    ) -> Result<Session, StoreError> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or_else(StoreError::session_not_found)?;
        if !entry.session.is_owned_by(owner) {
            log::warn!("User {owner} tried to modify session {id}");
            return Err(StoreError::session_forbidden());
        }
        update.apply(&mut entry.session, now());
        entry.updated_seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        Ok(entry.session.clone())
    }

    async fn find_sessions_by_owner(&self, owner: UserId) -> Result<Vec<Session>, StoreError> {
        Ok(self.sorted_by(
            |session| session.is_owned_by(owner),
            |stored| (stored.session.updated_at, stored.updated_seq),
        ))
    }

    async fn find_published_sessions(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.sorted_by(
            |session| session.status == SessionStatus::Published,
            |stored| (stored.session.created_at, stored.created_seq),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> SessionDraft {
        SessionDraft {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        store.create_user(new_user("ada@example.com")).await.unwrap();
        let err = store.create_user(new_user("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_user() {
        let store = InMemoryStore::new();
        let user = store.create_user(new_user("ada@example.com")).await.unwrap();

        let record = store.find_user_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(record.user, user);
        assert_eq!(record.password_hash, "hash");
        assert_eq!(store.find_user_by_id(user.id).await.unwrap(), Some(user));
        assert!(store.find_user_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_by_other_owner_is_forbidden() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let session = store
            .create_session(owner, draft("Breathwork"), SessionStatus::Draft)
            .await
            .unwrap();

        let update = SessionUpdate {
            title: Some("Hijacked".into()),
            ..Default::default()
        };
        let err = store
            .update_session(session.id, UserId::new(), update.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden { .. }));
        let stored = store.find_session(session.id).await.unwrap().unwrap();
        assert_eq!(stored, session);

        let err = store
            .update_session(SessionId::new(), owner, update)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_listing_order() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let first = store
            .create_session(owner, draft("First"), SessionStatus::Published)
            .await
            .unwrap();
        let second = store
            .create_session(owner, draft("Second"), SessionStatus::Published)
            .await
            .unwrap();
        store
            .create_session(UserId::new(), draft("Private"), SessionStatus::Draft)
            .await
            .unwrap();

        let published = store.find_published_sessions().await.unwrap();
        let titles: Vec<_> = published.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Second", "First"]);

        store
            .update_session(first.id, owner, SessionUpdate::default())
            .await
            .unwrap();
        let mine = store.find_sessions_by_owner(owner).await.unwrap();
        let ids: Vec<_> = mine.iter().map(|s| s.id).collect();
        assert_eq!(ids, [first.id, second.id]);
    }
}

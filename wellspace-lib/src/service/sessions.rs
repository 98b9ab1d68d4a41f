//! Session operations
//!
//! Explicit writes (`create`, `update`, `save_draft`, `publish`) are strict:
//! input is sanitized and checked against the shared session schema before
//! anything is stored. `auto_save` is lenient and stores whatever partial
//! state the editor sends, only cleaning it.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Error;
use crate::model::Session;
use crate::model::SessionDraft;
use crate::model::SessionId;
use crate::model::SessionInput;
use crate::model::SessionStatus;
use crate::model::UserId;
use crate::response::AutoSavePayload;
use crate::store::SessionStore;
use crate::store::SessionUpdate;
use crate::validation::clean_tags;
use crate::validation::sanitize_form_data;
use crate::validation::sanitize_input;
use crate::validation::schemas;
use crate::validation::server_validation_failure;
use crate::validation::validate_form;

/// Session reads and writes on behalf of an authenticated user.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Creates a session. Status defaults to draft.
    pub async fn create(&self, owner: UserId, input: SessionInput) -> Result<Session, Error> {
        let (status, status_error) = split_status(&input);
        let draft = strict_draft(&input.merge_into(&SessionDraft::default()), status_error)?;
        let session = self
            .store
            .create_session(owner, draft, status.unwrap_or_default())
            .await?;
        Ok(session)
    }

    /// Updates the fields present in `input`.
    ///
    /// The merged record must pass the session schema as a whole.
    pub async fn update(
        &self,
        owner: UserId,
        id: SessionId,
        input: SessionInput,
    ) -> Result<Session, Error> {
        let existing = self.owned(owner, id).await?;
        let (status, status_error) = split_status(&input);
        let draft = strict_draft(&input.merge_into(&existing.draft()), status_error)?;

        let mut update = SessionUpdate::from_draft(draft);
        update.status = status;
        Ok(self.store.update_session(id, owner, update).await?)
    }

    /// Stores an in-progress draft without schema checks.
    ///
    /// A blank title keeps the stored one, blank tags are dropped, the URL is
    /// stored as typed and the status never changes.
    pub async fn auto_save(
        &self,
        owner: UserId,
        id: SessionId,
        input: SessionInput,
    ) -> Result<AutoSavePayload, Error> {
        let update = SessionUpdate {
            title: input
                .title
                .map(|title| sanitize_input(&title))
                .filter(|title| !title.is_empty()),
            tags: input.tags.map(|tags| {
                let tags: Vec<String> = tags.iter().map(|tag| sanitize_input(tag)).collect();
                clean_tags(&tags)
            }),
            json_file_url: input.json_file_url.map(|url| url.trim().to_string()),
            status: None,
        };

        let session = self.store.update_session(id, owner, update).await?;
        log::debug!("Auto-saved session {id}");
        Ok(AutoSavePayload {
            session,
            last_saved: Utc::now(),
        })
    }

    /// Creates a draft, or resets an owned session to draft when `_id` is set.
    pub async fn save_draft(&self, owner: UserId, input: SessionInput) -> Result<Session, Error> {
        let input = SessionInput {
            status: None,
            ..input
        };
        match input.parsed_id()? {
            Some(id) => {
                let existing = self.owned(owner, id).await?;
                let draft = strict_draft(&input.merge_into(&existing.draft()), None)?;
                let update = SessionUpdate::from_draft(draft).with_status(SessionStatus::Draft);
                Ok(self.store.update_session(id, owner, update).await?)
            }
            None => self.create(owner, input).await,
        }
    }

    /// Publishes an owned session. The stored content must pass the schema.
    pub async fn publish(&self, owner: UserId, id: SessionId) -> Result<Session, Error> {
        let existing = self.owned(owner, id).await?;
        strict_draft(&existing.draft(), None)?;

        let update = SessionUpdate::default().with_status(SessionStatus::Published);
        let session = self.store.update_session(id, owner, update).await?;
        log::info!("Published session {id}");
        Ok(session)
    }

    /// Every published session, newest first.
    pub async fn list_published(&self) -> Result<Vec<Session>, Error> {
        Ok(self.store.find_published_sessions().await?)
    }

    /// The caller's sessions, most recently updated first.
    pub async fn list_mine(&self, owner: UserId) -> Result<Vec<Session>, Error> {
        Ok(self.store.find_sessions_by_owner(owner).await?)
    }

    /// One of the caller's sessions. Other users' sessions read as missing.
    pub async fn get_mine(&self, owner: UserId, id: SessionId) -> Result<Session, Error> {
        match self.store.find_session(id).await? {
            Some(session) if session.is_owned_by(owner) => Ok(session),
            _ => Err(Error::NotFound("Session not found".to_string())),
        }
    }

    async fn owned(&self, owner: UserId, id: SessionId) -> Result<Session, Error> {
        let session = self
            .store
            .find_session(id)
            .await?
            .ok_or_else(|| Error::NotFound("Session not found".to_string()))?;
        if !session.is_owned_by(owner) {
            log::warn!("User {owner} tried to modify session {id}");
            return Err(Error::Authorization(
                "You do not have permission to modify this session".to_string(),
            ));
        }
        Ok(session)
    }
}

fn split_status(input: &SessionInput) -> (Option<SessionStatus>, Option<String>) {
    match input.parsed_status() {
        Ok(status) => (status, None),
        Err(err) => (None, Some(err.to_string())),
    }
}

/// Sanitizes `draft` and checks it against the session schema.
fn strict_draft(draft: &SessionDraft, status_error: Option<String>) -> Result<SessionDraft, Error> {
    let form = sanitize_form_data(&draft.to_form_data());
    let mut errors = validate_form(&form, &schemas::session()).errors;
    if let Some(message) = status_error {
        errors.insert("status", message);
    }
    if !errors.is_empty() {
        log::debug!("Rejected session input: {errors:?}");
        return Err(server_validation_failure(errors));
    }

    let mut clean = SessionDraft::from_form_data(&form);
    clean.tags = clean_tags(&clean.tags);
    Ok(clean)
}

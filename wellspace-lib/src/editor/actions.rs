//! Persistence collaborators of the editor

use async_trait::async_trait;

use crate::autosave::AutoSaveTarget;
use crate::client::ApiClient;
use crate::error::Error;
use crate::model::Session;
use crate::model::SessionDraft;
use crate::model::SessionId;
use crate::model::SessionInput;
use crate::model::SessionStatus;

/// Performs an explicit save or publish.
#[async_trait]
pub trait SessionActions: Send + Sync {
    /// Stores `draft` with `status`, creating the session when `id` is `None`.
    async fn save(
        &self,
        id: Option<SessionId>,
        draft: SessionDraft,
        status: SessionStatus,
    ) -> Result<Session, Error>;
}

/// [`SessionActions`] over the HTTP API: `POST /api/sessions` for new
/// sessions, `PUT /api/sessions/{id}` otherwise.
#[derive(Debug, Clone)]
pub struct ApiSessionActions {
    client: ApiClient,
}

impl ApiSessionActions {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionActions for ApiSessionActions {
    async fn save(
        &self,
        id: Option<SessionId>,
        draft: SessionDraft,
        status: SessionStatus,
    ) -> Result<Session, Error> {
        let input = SessionInput::from_draft(&draft).with_status(status);
        match id {
            Some(id) => self.client.update_session(id, &input).await,
            None => self.client.create_session(&input).await,
        }
    }
}

/// Auto-save target posting to `/api/sessions/{id}/auto-save`.
#[derive(Debug, Clone)]
pub struct ApiAutoSaveTarget {
    client: ApiClient,
    id: SessionId,
}

impl ApiAutoSaveTarget {
    pub fn new(client: ApiClient, id: SessionId) -> Self {
        Self { client, id }
    }
}

#[async_trait]
impl AutoSaveTarget<SessionDraft> for ApiAutoSaveTarget {
    async fn persist(&self, data: SessionDraft) -> Result<(), Error> {
        self.client.auto_save(self.id, &data).await.map(|_| ())
    }
}

//! The session editor

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;

use chrono::DateTime;
use chrono::Utc;
use tokio::sync::watch;

use super::ApiAutoSaveTarget;
use super::ApiSessionActions;
use super::SessionActions;
use crate::autosave::AutoSaveConfig;
use crate::autosave::AutoSaveCoordinator;
use crate::autosave::AutoSaveStatus;
use crate::autosave::AutoSaveTarget;
use crate::client::ApiClient;
use crate::client::Missing;
use crate::client::Set;
use crate::error::EditorError;
use crate::error::Error;
use crate::form::FormController;
use crate::form::FormOptions;
use crate::model::Session;
use crate::model::SessionDraft;
use crate::model::SessionId;
use crate::model::SessionStatus;
use crate::notice::Notice;
use crate::notice::Notifier;
use crate::validation::FieldValue;
use crate::validation::parse_tags;
use crate::validation::sanitize_form_data;
use crate::validation::schemas;

/// Page visibility, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Editor for one session, new or existing.
///
/// Every accepted edit goes through the form controller and, for a session
/// that already exists, is forwarded to the auto-save coordinator. A new
/// session is not auto-saved until its first explicit save creates the
/// record; from then on edits are auto-saved if the editor knows how to
/// reach it (see [`SessionEditorBuilder::autosave_target`]).
///
/// Explicit saves sanitize the values, then validate the whole form. On
/// failure every field is marked touched and nothing is sent.
pub struct SessionEditor {
    session_id: Mutex<Option<SessionId>>,
    form: FormController,
    tags_input: Mutex<String>,
    autosave: OnceLock<AutoSaveCoordinator<SessionDraft>>,
    autosave_config: AutoSaveConfig,
    // Cleared on close so a late save cannot attach a coordinator.
    target_for: Mutex<Option<TargetFactory>>,
    actions: Arc<dyn SessionActions>,
    notifier: Option<Arc<dyn Notifier>>,
}

/// Builds the auto-save target for a session once its id is known.
pub type TargetFactory = Arc<dyn Fn(SessionId) -> Arc<dyn AutoSaveTarget<SessionDraft>> + Send + Sync>;

impl std::fmt::Debug for SessionEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEditor")
            .field("session_id", &self.session_id())
            .field("autosave", &self.autosave_status())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SessionEditor {
    /// Creates a new builder.
    pub fn builder() -> SessionEditorBuilder<Missing> {
        SessionEditorBuilder::new()
    }

    /// The session being edited, once it exists.
    pub fn session_id(&self) -> Option<SessionId> {
        *lock(&self.session_id)
    }

    /// The underlying form.
    pub fn form(&self) -> &FormController {
        &self.form
    }

    /// Current values as a draft.
    pub fn draft(&self) -> SessionDraft {
        SessionDraft::from_form_data(&self.form.values())
    }

    /// The raw tag text as typed.
    pub fn tags_input(&self) -> String {
        lock(&self.tags_input).clone()
    }

    /// Auto-save status; `Idle` for new sessions.
    pub fn autosave_status(&self) -> AutoSaveStatus {
        self.autosave
            .get()
            .map_or(AutoSaveStatus::Idle, AutoSaveCoordinator::status)
    }

    /// Status receiver, once auto-save is attached.
    pub fn subscribe_autosave(&self) -> Option<watch::Receiver<AutoSaveStatus>> {
        self.autosave.get().map(AutoSaveCoordinator::subscribe)
    }

    /// When auto-save last succeeded.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.autosave.get().and_then(AutoSaveCoordinator::last_saved)
    }

    /// Loads a stored session into the form, discarding edits.
    pub fn hydrate(&self, session: &Session) {
        self.form.reset_form(Some(session.draft().to_form_data()));
        *lock(&self.tags_input) = session.tags.join(", ");
    }

    // =========================================================================
    // Edits
    // =========================================================================

    pub fn change_title(&self, title: &str) {
        self.change_field(schemas::TITLE, title);
    }

    pub fn change_reference_url(&self, url: &str) {
        self.change_field(schemas::JSON_FILE_URL, url);
    }

    /// Keeps the raw text and stores the parsed tag list.
    pub fn change_tags(&self, raw: &str) {
        *lock(&self.tags_input) = raw.to_string();
        self.change_field(schemas::TAGS, parse_tags(raw));
    }

    /// Applies an edit to any field and schedules an auto-save.
    pub fn change_field(&self, field: &str, value: impl Into<FieldValue>) {
        self.form.handle_field_change(field, value);
        if let Some(autosave) = self.autosave.get() {
            autosave.save(self.draft());
        }
    }

    pub fn blur(&self, field: &str) {
        self.form.handle_field_blur(field);
    }

    // =========================================================================
    // Explicit actions
    // =========================================================================

    /// Validates and saves as a draft.
    pub async fn save_draft(&self) -> Result<Session, EditorError> {
        self.submit(SessionStatus::Draft).await
    }

    /// Validates and publishes.
    pub async fn publish(&self) -> Result<Session, EditorError> {
        self.submit(SessionStatus::Published).await
    }

    async fn submit(&self, status: SessionStatus) -> Result<Session, EditorError> {
        let action = match status {
            SessionStatus::Draft => "saving",
            SessionStatus::Published => "publishing",
        };

        // Checked and sent exactly as the server will see them.
        let values = sanitize_form_data(&self.form.values());
        self.form.set_form_data(values.clone());

        let result = self.form.validate_form();
        if !result.is_valid {
            self.form.mark_all_touched();
            self.notify(Notice::error(format!("Please fix the errors before {action}")));
            return Err(EditorError::Invalid {
                action,
                errors: result.errors,
            });
        }

        let id = self.session_id();
        let request = self.actions.save(id, SessionDraft::from_form_data(&values), status);
        let outcome = match self.autosave.get() {
            Some(autosave) => autosave.exclusive(request).await,
            None => request.await,
        };

        match outcome {
            Ok(session) => {
                let message = match (status, id.is_some()) {
                    (SessionStatus::Draft, true) => "Draft updated successfully",
                    (SessionStatus::Draft, false) => "Draft saved successfully",
                    (SessionStatus::Published, true) => "Session updated and published",
                    (SessionStatus::Published, false) => "Session published successfully",
                };
                *lock(&self.session_id) = Some(session.id);
                self.attach_autosave(session.id);
                self.notify(Notice::success(message));
                Ok(session)
            }
            Err(err) => {
                log::warn!("Explicit {action} failed: {err}");
                if let Some(errors) = err.field_errors().filter(|errors| !errors.is_empty()) {
                    self.form.set_errors(errors.clone());
                    self.form.mark_all_touched();
                }
                Err(err.into())
            }
        }
    }

    // =========================================================================
    // Page lifecycle
    // =========================================================================

    /// Saves immediately when the page is hidden.
    pub async fn on_visibility_change(&self, visibility: Visibility) {
        if visibility == Visibility::Hidden {
            let _ = self.flush().await;
        }
    }

    /// Flushes the current draft before the page unloads.
    ///
    /// Returns `true` when the page should warn the user because the
    /// changes could not be stored.
    pub async fn before_unload(&self) -> bool {
        self.flush().await.is_err()
    }

    async fn flush(&self) -> Result<(), Error> {
        let Some(autosave) = self.autosave.get() else {
            return Ok(());
        };
        autosave
            .manual_save(self.draft())
            .await
            .map(|_| ())
            .inspect_err(|err| log::warn!("Immediate save failed: {err}"))
    }

    /// Stops auto-save and pending validation. Nothing fires afterwards.
    pub fn close(&self) {
        lock(&self.target_for).take();
        if let Some(autosave) = self.autosave.get() {
            autosave.teardown();
        }
        self.form.dispose();
    }

    /// Starts auto-saving to `id` if no coordinator runs yet.
    fn attach_autosave(&self, id: SessionId) {
        if self.autosave.get().is_some() {
            return;
        }
        let Some(factory) = lock(&self.target_for).clone() else {
            return;
        };
        let coordinator = coordinator(self.autosave_config.clone(), factory(id), self.notifier.as_ref());
        if self.autosave.set(coordinator).is_ok() {
            log::debug!("Auto-save attached to session {id}");
        }
    }

    fn notify(&self, notice: Notice) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(notice);
        }
    }
}

impl Drop for SessionEditor {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`SessionEditor`].
///
/// The persistence collaborator is required, either directly through
/// [`actions`](SessionEditorBuilder::actions) or from an [`ApiClient`].
///
/// # Example
///
/// ```ignore
/// // New session
/// let editor = SessionEditor::builder().client(&client).build();
///
/// // Existing session, fetched and hydrated
/// let editor = SessionEditor::builder()
///     .client(&client)
///     .notifier(toasts)
///     .open(&client, id)
///     .await?;
/// ```
pub struct SessionEditorBuilder<A> {
    actions: A,
    existing: Option<(SessionId, Arc<dyn AutoSaveTarget<SessionDraft>>)>,
    target_for: Option<TargetFactory>,
    autosave_config: AutoSaveConfig,
    form_options: FormOptions,
    notifier: Option<Arc<dyn Notifier>>,
}

impl SessionEditorBuilder<Missing> {
    pub fn new() -> Self {
        Self {
            actions: Missing,
            existing: None,
            target_for: None,
            autosave_config: AutoSaveConfig::default(),
            form_options: FormOptions::session(),
            notifier: None,
        }
    }

    /// Sets the explicit save collaborator.
    pub fn actions(
        self,
        actions: Arc<dyn SessionActions>,
    ) -> SessionEditorBuilder<Set<Arc<dyn SessionActions>>> {
        SessionEditorBuilder {
            actions: Set(actions),
            existing: self.existing,
            target_for: self.target_for,
            autosave_config: self.autosave_config,
            form_options: self.form_options,
            notifier: self.notifier,
        }
    }

    /// Uses the HTTP API for explicit saves and, once the session exists,
    /// for auto-save.
    pub fn client(self, client: &ApiClient) -> SessionEditorBuilder<Set<Arc<dyn SessionActions>>> {
        let api = client.clone();
        self.autosave_target(move |id| {
            Arc::new(ApiAutoSaveTarget::new(api.clone(), id)) as Arc<dyn AutoSaveTarget<SessionDraft>>
        })
            .actions(Arc::new(ApiSessionActions::new(client.clone())))
    }
}

impl Default for SessionEditorBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> SessionEditorBuilder<A> {
    /// Edits an existing session, auto-saving to `target`.
    pub fn existing(mut self, id: SessionId, target: Arc<dyn AutoSaveTarget<SessionDraft>>) -> Self {
        self.existing = Some((id, target));
        self
    }

    /// Where a new session auto-saves after its first explicit save.
    pub fn autosave_target<F>(mut self, factory: F) -> Self
    where
        F: Fn(SessionId) -> Arc<dyn AutoSaveTarget<SessionDraft>> + Send + Sync + 'static,
    {
        self.target_for = Some(Arc::new(factory));
        self
    }

    pub fn autosave_config(mut self, config: AutoSaveConfig) -> Self {
        self.autosave_config = config;
        self
    }

    pub fn form_options(mut self, options: FormOptions) -> Self {
        self.form_options = options;
        self
    }

    /// Receives success and failure notices.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

impl SessionEditorBuilder<Set<Arc<dyn SessionActions>>> {
    /// Builds the editor with empty values.
    pub fn build(self) -> SessionEditor {
        let autosave = OnceLock::new();
        let session_id = self.existing.map(|(id, target)| {
            let _ = autosave.set(coordinator(
                self.autosave_config.clone(),
                target,
                self.notifier.as_ref(),
            ));
            id
        });

        SessionEditor {
            session_id: Mutex::new(session_id),
            form: FormController::with_initial(
                schemas::session(),
                SessionDraft::default().to_form_data(),
                self.form_options,
            ),
            tags_input: Mutex::new(String::new()),
            autosave,
            autosave_config: self.autosave_config,
            target_for: Mutex::new(self.target_for),
            actions: self.actions.0,
            notifier: self.notifier,
        }
    }

    /// Fetches one of the caller's sessions and opens it for editing.
    ///
    /// The fetch retries like every read; auto-save goes to the API.
    pub async fn open(self, client: &ApiClient, id: SessionId) -> Result<SessionEditor, Error> {
        let session = client.my_session(id).await?;
        let editor = self
            .existing(id, Arc::new(ApiAutoSaveTarget::new(client.clone(), id)))
            .build();
        editor.hydrate(&session);
        Ok(editor)
    }
}

fn coordinator(
    config: AutoSaveConfig,
    target: Arc<dyn AutoSaveTarget<SessionDraft>>,
    notifier: Option<&Arc<dyn Notifier>>,
) -> AutoSaveCoordinator<SessionDraft> {
    match notifier {
        Some(notifier) => AutoSaveCoordinator::with_notifier(config, target, Arc::clone(notifier)),
        None => AutoSaveCoordinator::new(config, target),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::model::UserId;
    use crate::notice::NoticeLevel;
    use crate::notice::NoticeLog;
    use crate::validation::FieldErrors;

    #[derive(Default)]
    struct FakeActions {
        calls: Mutex<Vec<(Option<SessionId>, SessionDraft, SessionStatus)>>,
        reject: Option<FieldErrors>,
    }

    #[async_trait]
    impl SessionActions for FakeActions {
        async fn save(
            &self,
            id: Option<SessionId>,
            draft: SessionDraft,
            status: SessionStatus,
        ) -> Result<Session, Error> {
            self.calls.lock().unwrap().push((id, draft.clone(), status));
            if let Some(errors) = &self.reject {
                return Err(Error::from_field_errors(errors.clone()));
            }
            let now = Utc::now();
            Ok(Session {
                id: id.unwrap_or_default(),
                user_id: UserId::new(),
                title: draft.title,
                tags: draft.tags,
                json_file_url: draft.json_file_url,
                status,
                created_at: now,
                updated_at: now,
            })
        }
    }

    #[derive(Default)]
    struct FakeTarget {
        saved: Mutex<Vec<(Instant, SessionDraft)>>,
    }

    #[async_trait]
    impl AutoSaveTarget<SessionDraft> for FakeTarget {
        async fn persist(&self, data: SessionDraft) -> Result<(), Error> {
            self.saved.lock().unwrap().push((Instant::now(), data));
            Ok(())
        }
    }

    fn stored(title: &str, tags: &[&str]) -> Session {
        let now = Utc::now();
        Session {
            id: SessionId::new(),
            user_id: UserId::new(),
            title: title.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            json_file_url: String::new(),
            status: SessionStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    fn existing_editor(
        session: &Session,
        actions: Arc<FakeActions>,
        target: Arc<FakeTarget>,
        log: &NoticeLog,
    ) -> SessionEditor {
        let editor = SessionEditor::builder()
            .actions(actions)
            .existing(session.id, target)
            .notifier(Arc::new(log.clone()))
            .build();
        editor.hydrate(session);
        editor
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_submit_sends_nothing() {
        let actions = Arc::new(FakeActions::default());
        let log = NoticeLog::new();
        let editor = SessionEditor::builder()
            .actions(actions.clone())
            .notifier(Arc::new(log.clone()))
            .build();

        editor.change_title("ab");
        let err = editor.publish().await.unwrap_err();

        assert!(matches!(err, EditorError::Invalid { action: "publishing", .. }));
        assert_eq!(err.to_string(), "Please fix the errors before publishing");
        assert!(actions.calls.lock().unwrap().is_empty());
        assert!(editor.form().is_touched("tags"));
        assert!(editor.form().snapshot().visible_errors().contains("title"));
        assert_eq!(log.drain(), vec![Notice::error("Please fix the errors before publishing")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_session_save_then_update() {
        let actions = Arc::new(FakeActions::default());
        let log = NoticeLog::new();
        let editor = SessionEditor::builder()
            .actions(actions.clone())
            .notifier(Arc::new(log.clone()))
            .build();

        editor.change_title("Evening wind-down");
        editor.change_tags("sleep, calm");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(editor.autosave_status(), AutoSaveStatus::Idle);

        let first = editor.save_draft().await.unwrap();
        assert_eq!(editor.session_id(), Some(first.id));
        editor.publish().await.unwrap();

        let calls = actions.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, None);
        assert_eq!(calls[0].1.tags, vec!["sleep".to_string(), "calm".to_string()]);
        assert_eq!(calls[0].2, SessionStatus::Draft);
        assert_eq!(calls[1].0, Some(first.id));
        assert_eq!(calls[1].2, SessionStatus::Published);

        let messages: Vec<_> = log.drain().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, ["Draft saved successfully", "Session updated and published"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_are_auto_saved_after_quiet_period() {
        let session = stored("Box breathing", &["calm"]);
        let target = Arc::new(FakeTarget::default());
        let log = NoticeLog::new();
        let editor = existing_editor(&session, Arc::new(FakeActions::default()), target.clone(), &log);
        assert_eq!(editor.tags_input(), "calm");

        let start = Instant::now();
        editor.change_title("Box breathing I");
        tokio::time::sleep(Duration::from_millis(100)).await;
        editor.change_title("Box breathing II");
        tokio::time::sleep(Duration::from_secs(6)).await;

        let saved = target.saved.lock().unwrap().clone();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].1.title, "Box breathing II");
        assert_eq!(saved[0].1.tags, vec!["calm".to_string()]);
        assert!(saved[0].0 - start >= Duration::from_millis(5100));
        assert_eq!(editor.autosave_status(), AutoSaveStatus::Saved);
        assert!(editor.last_saved().is_some());
        assert_eq!(log.drain()[0].level, NoticeLevel::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_save_cancels_pending_auto_save() {
        let session = stored("Box breathing", &[]);
        let target = Arc::new(FakeTarget::default());
        let actions = Arc::new(FakeActions::default());
        let editor = existing_editor(&session, actions.clone(), target.clone(), &NoticeLog::new());

        editor.change_title("Box breathing 2");
        editor.save_draft().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(target.saved.lock().unwrap().is_empty());
        assert_eq!(actions.calls.lock().unwrap()[0].0, Some(session.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_page_saves_immediately() {
        let session = stored("Box breathing", &[]);
        let target = Arc::new(FakeTarget::default());
        let editor = existing_editor(&session, Arc::new(FakeActions::default()), target.clone(), &NoticeLog::new());

        editor.change_reference_url("https://cdn.example.com/a.json");
        editor.on_visibility_change(Visibility::Hidden).await;
        assert_eq!(target.saved.lock().unwrap().len(), 1);
        assert!(!editor.before_unload().await);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let saved = target.saved.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].1.json_file_url, "https://cdn.example.com/a.json");
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_editor_never_saves() {
        let session = stored("Box breathing", &[]);
        let target = Arc::new(FakeTarget::default());
        let editor = existing_editor(&session, Arc::new(FakeActions::default()), target.clone(), &NoticeLog::new());

        editor.change_title("Changed");
        editor.close();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(target.saved.lock().unwrap().is_empty());
        assert_eq!(editor.autosave_status(), AutoSaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_field_errors_reach_the_form() {
        let mut errors = FieldErrors::new();
        errors.insert("json_file_url", "Please provide a valid URL");
        let actions = Arc::new(FakeActions {
            reject: Some(errors),
            ..Default::default()
        });
        let log = NoticeLog::new();
        let editor = SessionEditor::builder()
            .actions(actions)
            .notifier(Arc::new(log.clone()))
            .build();

        editor.change_title("Body scan");
        let err = editor.save_draft().await.unwrap_err();

        assert!(matches!(err, EditorError::Request(_)));
        assert_eq!(
            editor.form().error("json_file_url").as_deref(),
            Some("Please provide a valid URL")
        );
        assert!(log.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_checks_sanitized_values() {
        let actions = Arc::new(FakeActions::default());
        let editor = SessionEditor::builder().actions(actions.clone()).build();

        editor.change_title("Calm <flow>");
        editor.change_tags("<calm>, deep   focus");
        editor.save_draft().await.unwrap();

        editor.change_title(&format!("Breath{}work", " ".repeat(100)));
        editor.save_draft().await.unwrap();

        let calls = actions.calls.lock().unwrap().clone();
        assert_eq!(calls[0].1.title, "Calm flow");
        assert_eq!(calls[0].1.tags, vec!["calm".to_string(), "deep focus".to_string()]);
        assert_eq!(calls[1].1.title, "Breath work");
        assert_eq!(editor.form().value("title"), FieldValue::Text("Breath work".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_save_attaches_auto_save() {
        let target = Arc::new(FakeTarget::default());
        let targeted = Arc::new(Mutex::new(Vec::new()));
        let editor = SessionEditor::builder()
            .autosave_target({
                let target = target.clone();
                let targeted = targeted.clone();
                move |id| {
                    targeted.lock().unwrap().push(id);
                    target.clone() as Arc<dyn AutoSaveTarget<SessionDraft>>
                }
            })
            .actions(Arc::new(FakeActions::default()))
            .build();

        editor.change_title("Evening wind-down");
        assert!(editor.subscribe_autosave().is_none());
        let created = editor.save_draft().await.unwrap();

        editor.change_title("Evening wind-down II");
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(*targeted.lock().unwrap(), vec![created.id]);
        let saved = target.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].1.title, "Evening wind-down II");
        assert!(editor.last_saved().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_new_editor_does_not_attach_auto_save() {
        let editor = SessionEditor::builder()
            .autosave_target(|_| Arc::new(FakeTarget::default()) as Arc<dyn AutoSaveTarget<SessionDraft>>)
            .actions(Arc::new(FakeActions::default()))
            .build();

        editor.change_title("Evening wind-down");
        editor.close();
        editor.save_draft().await.unwrap();
        assert!(editor.subscribe_autosave().is_none());
    }

    #[test]
    fn test_change_tags_keeps_raw_text() {
        let editor = SessionEditor::builder()
            .actions(Arc::new(FakeActions::default()))
            .build();
        editor.change_tags("yoga, meditation,  yoga ,");
        assert_eq!(editor.tags_input(), "yoga, meditation,  yoga ,");
        assert_eq!(
            editor.draft().tags,
            vec!["yoga".to_string(), "meditation".to_string(), "yoga".to_string()]
        );
    }
}

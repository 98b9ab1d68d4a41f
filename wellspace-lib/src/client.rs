//! HTTP client for the Wellspace API

use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use reqwest::Client;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;
use crate::model::LoginInput;
use crate::model::RegisterInput;
use crate::model::Session;
use crate::model::SessionDraft;
use crate::model::SessionId;
use crate::model::SessionInput;
use crate::model::User;
use crate::response::ApiResponse;
use crate::response::AuthPayload;
use crate::response::AutoSavePayload;
use crate::response::MessagePayload;
use crate::response::SessionPayload;
use crate::response::SessionsPayload;
use crate::response::UserPayload;
use crate::retry::RetryConfig;
use crate::retry::with_retry;

/// Client for the Wellspace HTTP API.
///
/// Cheap to clone; clones share the bearer token slot. Read requests retry
/// network and server failures per the configured [`RetryConfig`], writes
/// are sent exactly once.
///
/// # Example
///
/// ```ignore
/// use wellspace_lib::ApiClient;
///
/// let client = ApiClient::builder()
///     .base_url("http://127.0.0.1:3000")
///     .timeout(Duration::from_secs(10))
///     .build();
///
/// client.login(&LoginInput { email, password }).await?;
/// let sessions = client.my_sessions().await?;
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    base_url: String,
    http_client: Client,
    token: RwLock<Option<String>>,
    timeout: Option<Duration>,
    retry: RetryConfig,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("authenticated", &self.token().is_some())
            .finish()
    }
}

impl ApiClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> ApiClientBuilder<Missing> {
        ApiClientBuilder::new()
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns the current bearer token, if signed in.
    pub fn token(&self) -> Option<String> {
        match self.inner.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replaces the bearer token.
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = match self.inner.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = token;
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Registers a new account and keeps the issued token.
    pub async fn register(&self, input: &RegisterInput) -> Result<User, Error> {
        let payload: AuthPayload = self.post("/api/auth/register", input).await?;
        self.set_token(Some(payload.token));
        Ok(payload.user)
    }

    /// Signs in and keeps the issued token.
    pub async fn login(&self, input: &LoginInput) -> Result<User, Error> {
        let payload: AuthPayload = self.post("/api/auth/login", input).await?;
        self.set_token(Some(payload.token));
        Ok(payload.user)
    }

    /// Signs out. The local token is dropped even if the request fails.
    pub async fn logout(&self) -> Result<(), Error> {
        let result: Result<MessagePayload, Error> =
            self.send(Method::POST, "/api/auth/logout", None).await;
        self.set_token(None);
        result.map(|_| ())
    }

    /// Returns the signed-in user.
    pub async fn me(&self) -> Result<User, Error> {
        let payload: UserPayload = self.get("/api/auth/me").await?;
        Ok(payload.user)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Lists every published session.
    pub async fn published_sessions(&self) -> Result<Vec<Session>, Error> {
        let payload: SessionsPayload = self.get("/api/sessions").await?;
        Ok(payload.sessions)
    }

    /// Lists the caller's sessions, drafts included.
    pub async fn my_sessions(&self) -> Result<Vec<Session>, Error> {
        let payload: SessionsPayload = self.get("/api/my-sessions").await?;
        Ok(payload.sessions)
    }

    /// Fetches one of the caller's sessions.
    pub async fn my_session(&self, id: SessionId) -> Result<Session, Error> {
        let payload: SessionPayload = self.get(&format!("/api/my-sessions/{id}")).await?;
        Ok(payload.session)
    }

    /// Creates a session with strict validation.
    pub async fn create_session(&self, input: &SessionInput) -> Result<Session, Error> {
        let payload: SessionPayload = self.post("/api/sessions", input).await?;
        Ok(payload.session)
    }

    /// Updates a session with strict validation.
    pub async fn update_session(
        &self,
        id: SessionId,
        input: &SessionInput,
    ) -> Result<Session, Error> {
        let body = to_body(input)?;
        let payload: SessionPayload = self
            .send(Method::PUT, &format!("/api/sessions/{id}"), Some(body))
            .await?;
        Ok(payload.session)
    }

    /// Stores an in-progress draft without strict validation.
    pub async fn auto_save(
        &self,
        id: SessionId,
        draft: &SessionDraft,
    ) -> Result<AutoSavePayload, Error> {
        self.post(&format!("/api/sessions/{id}/auto-save"), draft)
            .await
    }

    /// Creates or updates a draft. An `_id` in the input selects update.
    pub async fn save_draft(&self, input: &SessionInput) -> Result<Session, Error> {
        let payload: SessionPayload = self.post("/api/my-sessions/save-draft", input).await?;
        Ok(payload.session)
    }

    /// Publishes one of the caller's sessions.
    pub async fn publish(&self, id: SessionId) -> Result<Session, Error> {
        let input = SessionInput::default().with_id(id);
        let payload: SessionPayload = self.post("/api/my-sessions/publish", &input).await?;
        Ok(payload.session)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        with_retry(&self.inner.retry, || self.send(Method::GET, path, None)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let body = to_body(body)?;
        self.send(Method::POST, path, Some(body)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, Error> {
        let url = format!("{}{}", self.inner.base_url.trim_end_matches('/'), path);
        log::debug!("{method} {url}");

        let mut request = self.inner.http_client.request(method, &url);
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "message": text }))
        };
        ApiResponse::<T>::decode(body, status)
    }
}

fn to_body<B: Serialize>(body: &B) -> Result<Value, Error> {
    serde_json::to_value(body).map_err(|err| Error::validation(format!("Invalid request body: {err}")))
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(pub(crate) T);

/// Builder for constructing an [`ApiClient`].
///
/// `base_url` is required; [`build`](ApiClientBuilder::build) only exists once
/// it has been set.
pub struct ApiClientBuilder<Url> {
    url: Url,
    token: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry: RetryConfig,
    http_client: Option<Client>,
}

impl ApiClientBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            token: None,
            timeout: None,
            connect_timeout: None,
            retry: RetryConfig::default(),
            http_client: None,
        }
    }

    /// Sets the server URL, e.g. `http://127.0.0.1:3000`.
    pub fn base_url(self, url: impl Into<String>) -> ApiClientBuilder<Set<String>> {
        ApiClientBuilder {
            url: Set(url.into()),
            token: self.token,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            retry: self.retry,
            http_client: self.http_client,
        }
    }
}

impl Default for ApiClientBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> ApiClientBuilder<U> {
    /// Starts with an existing bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout. Ignored when a custom client is given.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy for read requests.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl ApiClientBuilder<Set<String>> {
    /// Builds the [`ApiClient`].
    pub fn build(self) -> ApiClient {
        let http_client = self.http_client.unwrap_or_else(|| {
            let mut builder = Client::builder();
            if let Some(timeout) = self.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            builder.build().unwrap_or_else(|err| {
                log::warn!("Falling back to default HTTP client: {err}");
                Client::new()
            })
        });

        ApiClient {
            inner: Arc::new(ApiClientInner {
                base_url: self.url.0,
                http_client,
                token: RwLock::new(self.token),
                timeout: self.timeout,
                retry: self.retry,
            }),
        }
    }
}

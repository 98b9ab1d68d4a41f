//! `/api/sessions/*`

use hyper::Request;
use hyper::body::Incoming;
use wellspace_lib::Error;
use wellspace_lib::model::SessionInput;
use wellspace_lib::response::SessionPayload;
use wellspace_lib::response::SessionsPayload;

use super::parse_session_id;
use super::require_user;
use crate::AppState;
use crate::http::Reply;
use crate::http::read_json;

/// `GET /api/sessions`: every published session.
pub async fn list_published(state: &AppState, req: Request<Incoming>) -> Result<Reply, Error> {
    require_user(state, &req)?;
    let sessions = state.sessions.list_published().await?;
    Ok(Reply::ok(SessionsPayload { sessions }))
}

/// `POST /api/sessions`
pub async fn create(state: &AppState, req: Request<Incoming>) -> Result<Reply, Error> {
    let user = require_user(state, &req)?;
    let input: SessionInput = read_json(req, state.config.body_limit).await?;
    let session = state.sessions.create(user, input).await?;
    Ok(Reply::created(SessionPayload { session }))
}

/// `PUT /api/sessions/{id}`
pub async fn update(state: &AppState, req: Request<Incoming>, id: &str) -> Result<Reply, Error> {
    let user = require_user(state, &req)?;
    let id = parse_session_id(id)?;
    let input: SessionInput = read_json(req, state.config.body_limit).await?;
    let session = state.sessions.update(user, id, input).await?;
    Ok(Reply::ok(SessionPayload { session }))
}

/// `POST /api/sessions/{id}/auto-save`
pub async fn auto_save(state: &AppState, req: Request<Incoming>, id: &str) -> Result<Reply, Error> {
    let user = require_user(state, &req)?;
    let id = parse_session_id(id)?;
    let input: SessionInput = read_json(req, state.config.body_limit).await?;
    let payload = state.sessions.auto_save(user, id, input).await?;
    Ok(Reply::ok(payload))
}

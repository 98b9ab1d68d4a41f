//! `/api/my-sessions/*`

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

pub async fn list(state: &AppState, req: Request<Incoming>) -> Result<Reply, Error> {
    let user = require_user(state, &req)?;
    let sessions = state.sessions.list_mine(user).await?;
    Ok(Reply::ok(SessionsPayload { sessions }))
}

pub async fn get(state: &AppState, req: Request<Incoming>, id: &str) -> Result<Reply, Error> {
    let user = require_user(state, &req)?;
    let session = state.sessions.get_mine(user, parse_session_id(id)?).await?;
    Ok(Reply::ok(SessionPayload { session }))
}

/// `POST /api/my-sessions/save-draft`: creates, or updates when `_id` is set.
pub async fn save_draft(state: &AppState, req: Request<Incoming>) -> Result<Reply, Error> {
    let user = require_user(state, &req)?;
    let input: SessionInput = read_json(req, state.config.body_limit).await?;
    let session = state.sessions.save_draft(user, input).await?;
    Ok(Reply::ok(SessionPayload { session }))
}

/// `POST /api/my-sessions/publish` with `{"_id": ...}`.
pub async fn publish(state: &AppState, req: Request<Incoming>) -> Result<Reply, Error> {
    let user = require_user(state, &req)?;
    let input: SessionInput = read_json(req, state.config.body_limit).await?;
    let id = input
        .parsed_id()?
        .ok_or_else(|| Error::invalid_field("_id", "Session ID is required"))?;
    let session = state.sessions.publish(user, id).await?;
    Ok(Reply::ok(SessionPayload { session }))
}

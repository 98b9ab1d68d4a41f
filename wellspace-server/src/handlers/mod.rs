//! Route handlers
//!
//! Each handler authenticates when required, decodes the body, calls one
//! service operation and wraps the result. Failures bubble up as
//! [`wellspace_lib::Error`] and are rendered by the router.

pub mod auth;
pub mod my_sessions;
pub mod sessions;

use hyper::Request;
use hyper::header;
use wellspace_lib::Error;
use wellspace_lib::model::SessionId;
use wellspace_lib::model::UserId;

use crate::AppState;
use crate::http::header_str;

/// The authenticated caller, from the bearer token or the token cookie.
pub(crate) fn require_user<B>(state: &AppState, req: &Request<B>) -> Result<UserId, Error> {
    state
        .auth
        .authenticate(
            header_str(req, header::AUTHORIZATION),
            header_str(req, header::COOKIE),
        )
        .ok_or_else(|| Error::Authentication("Unauthorized".to_string()))
}

pub(crate) fn parse_session_id(raw: &str) -> Result<SessionId, Error> {
    raw.parse()
}

//! `/api/auth/*`

use hyper::Request;
use hyper::body::Incoming;
use wellspace_lib::Error;
use wellspace_lib::auth::clear_token_cookie;
use wellspace_lib::auth::token_cookie;
use wellspace_lib::model::LoginInput;
use wellspace_lib::model::RegisterInput;
use wellspace_lib::response::MessagePayload;
use wellspace_lib::response::UserPayload;

use super::require_user;
use crate::AppState;
use crate::http::Reply;
use crate::http::read_json;

/// `POST /api/auth/register`
pub async fn register(state: &AppState, req: Request<Incoming>) -> Result<Reply, Error> {
    let input: RegisterInput = read_json(req, state.config.body_limit).await?;
    let payload = state.auth.register(input).await?;
    let cookie = token_cookie(&payload.token, state.config.token_ttl, state.config.secure_cookies);
    Ok(Reply::created(payload).with_cookie(cookie))
}

/// `POST /api/auth/login`
pub async fn login(state: &AppState, req: Request<Incoming>) -> Result<Reply, Error> {
    let input: LoginInput = read_json(req, state.config.body_limit).await?;
    let payload = state.auth.login(input).await?;
    let cookie = token_cookie(&payload.token, state.config.token_ttl, state.config.secure_cookies);
    Ok(Reply::ok(payload).with_cookie(cookie))
}

/// `POST /api/auth/logout`. Always succeeds.
pub async fn logout(state: &AppState, _req: Request<Incoming>) -> Result<Reply, Error> {
    Ok(Reply::ok(MessagePayload::new("Logged out successfully"))
        .with_cookie(clear_token_cookie(state.config.secure_cookies)))
}

/// `GET /api/auth/me`
pub async fn me(state: &AppState, req: Request<Incoming>) -> Result<Reply, Error> {
    let user_id = require_user(state, &req)?;
    let user = state.auth.me(user_id).await?;
    Ok(Reply::ok(UserPayload { user }))
}

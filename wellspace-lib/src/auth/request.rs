//! Request token extraction and the session cookie

use std::time::Duration;

use super::TokenSigner;
use crate::model::UserId;

/// Name of the cookie carrying the token.
pub const TOKEN_COOKIE: &str = "token";

/// Pulls the token out of request headers.
///
/// `Authorization: Bearer <token>` wins over the `token` cookie.
pub fn token_from_headers(authorization: Option<&str>, cookie: Option<&str>) -> Option<String> {
    let bearer = authorization
        .and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    cookie?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Resolves the authenticated user of a request, if any.
pub fn verify_request_token(
    signer: &TokenSigner,
    authorization: Option<&str>,
    cookie: Option<&str>,
) -> Option<UserId> {
    let token = token_from_headers(authorization, cookie)?;
    match signer.verify(&token).and_then(|claims| claims.user_id()) {
        Ok(user) => Some(user),
        Err(err) => {
            log::debug!("Rejected request token: {err}");
            None
        }
    }
}

/// `Set-Cookie` value that stores `token` for `ttl`.
pub fn token_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{TOKEN_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        ttl.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the token cookie.
pub fn clear_token_cookie(secure: bool) -> String {
    token_cookie("", Duration::ZERO, secure)
}

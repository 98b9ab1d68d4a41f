//! Route table

use hyper::Method;
use hyper::Request;
use hyper::Response;
use hyper::body::Incoming;
use wellspace_lib::Error;

use crate::AppState;
use crate::handlers::auth;
use crate::handlers::my_sessions;
use crate::handlers::sessions;
use crate::http::Body;
use crate::http::Reply;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route<'a> {
    Register,
    Login,
    Logout,
    Me,
    Sessions,
    Session(&'a str),
    AutoSave(&'a str),
    MySessions,
    MySession(&'a str),
    SaveDraft,
    Publish,
}

impl<'a> Route<'a> {
    fn resolve(path: &'a str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let route = match segments.as_slice() {
            ["api", "auth", "register"] => Self::Register,
            ["api", "auth", "login"] => Self::Login,
            ["api", "auth", "logout"] => Self::Logout,
            ["api", "auth", "me"] => Self::Me,
            ["api", "sessions"] => Self::Sessions,
            ["api", "sessions", id] if !id.is_empty() => Self::Session(*id),
            ["api", "sessions", id, "auto-save"] => Self::AutoSave(*id),
            ["api", "my-sessions"] => Self::MySessions,
            ["api", "my-sessions", "save-draft"] => Self::SaveDraft,
            ["api", "my-sessions", "publish"] => Self::Publish,
            ["api", "my-sessions", id] if !id.is_empty() => Self::MySession(*id),
            _ => return None,
        };
        Some(route)
    }
}

/// Dispatches one request and renders the reply.
pub async fn handle(state: &AppState, req: Request<Incoming>) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let reply = match Route::resolve(&path) {
        Some(route) => dispatch(state, &method, route, req).await,
        None => Reply::from(Err::<Reply, _>(Error::NotFound("Not found".to_string()))),
    };

    log::debug!("{method} {path} -> {}", reply.status().as_u16());
    reply.into_response()
}

async fn dispatch(state: &AppState, method: &Method, route: Route<'_>, req: Request<Incoming>) -> Reply {
    let result = match (method, route) {
        (&Method::POST, Route::Register) => auth::register(state, req).await,
        (&Method::POST, Route::Login) => auth::login(state, req).await,
        (&Method::POST, Route::Logout) => auth::logout(state, req).await,
        (&Method::GET, Route::Me) => auth::me(state, req).await,
        (&Method::GET, Route::Sessions) => sessions::list_published(state, req).await,
        (&Method::POST, Route::Sessions) => sessions::create(state, req).await,
        (&Method::PUT, Route::Session(id)) => sessions::update(state, req, id).await,
        (&Method::POST, Route::AutoSave(id)) => sessions::auto_save(state, req, id).await,
        (&Method::GET, Route::MySessions) => my_sessions::list(state, req).await,
        (&Method::GET, Route::MySession(id)) => my_sessions::get(state, req, id).await,
        (&Method::POST, Route::SaveDraft) => my_sessions::save_draft(state, req).await,
        (&Method::POST, Route::Publish) => my_sessions::publish(state, req).await,
        _ => return Reply::method_not_allowed(),
    };
    result.into()
}

//! Request and response plumbing shared by the handlers

use http_body_util::BodyExt;
use http_body_util::Full;
use http_body_util::LengthLimitError;
use http_body_util::Limited;
use hyper::Request;
use hyper::Response;
use hyper::StatusCode;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::header;
use hyper::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wellspace_lib::ApiResponse;
use wellspace_lib::Error;
use wellspace_lib::ErrorKind;
use wellspace_lib::response::ApiFailure;

pub type Body = Full<Bytes>;

const INVALID_BODY: &str = "Invalid request body";
const BODY_TOO_LARGE: &str = "Request body too large";

// =============================================================================
// Requests
// =============================================================================

/// Reads a JSON body of at most `limit` bytes.
pub async fn read_json<T: DeserializeOwned>(req: Request<Incoming>, limit: usize) -> Result<T, Error> {
    let bytes = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(Error::validation(BODY_TOO_LARGE));
        }
        Err(err) => {
            log::debug!("Failed to read request body: {err}");
            return Err(Error::validation(INVALID_BODY));
        }
    };
    parse_json(&bytes)
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(bytes).map_err(|err| {
        log::debug!("Malformed JSON body: {err}");
        Error::validation(INVALID_BODY)
    })
}

/// A header value as text, if present and readable.
pub fn header_str<'a, B>(req: &'a Request<B>, name: header::HeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

// =============================================================================
// Responses
// =============================================================================

/// A handler's answer before it becomes an HTTP response.
#[derive(Debug)]
pub struct Reply {
    status: StatusCode,
    body: Value,
    cookie: Option<String>,
}

impl Reply {
    /// `200` with `payload` flattened into a success body.
    pub fn ok<T: Serialize>(payload: T) -> Self {
        Self {
            status: StatusCode::OK,
            body: ApiResponse::Ok(payload).to_json(),
            cookie: None,
        }
    }

    /// `201` with `payload`.
    pub fn created<T: Serialize>(payload: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(payload)
        }
    }

    /// The failure shape for `err`, with its status code.
    pub fn failure(err: &Error) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            body: ApiResponse::<()>::Err(ApiFailure::from(err)).to_json(),
            cookie: None,
        }
    }

    /// `405` in the failure shape.
    pub fn method_not_allowed() -> Self {
        let err = Error::validation("Method not allowed");
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            ..Self::failure(&err)
        }
    }

    /// Adds a `Set-Cookie` header.
    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn into_response(self) -> Response<Body> {
        let bytes = serde_json::to_vec(&self.body).unwrap_or_default();
        let mut response = Response::new(Full::new(Bytes::from(bytes)));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(cookie) = self.cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.insert(header::SET_COOKIE, value);
                }
                Err(err) => log::error!("Dropping unencodable cookie: {err}"),
            }
        }
        response
    }
}

impl From<Result<Reply, Error>> for Reply {
    fn from(result: Result<Reply, Error>) -> Self {
        match result {
            Ok(reply) => reply,
            Err(err) => {
                if err.kind() == ErrorKind::Server {
                    log::error!("Request failed: {err}");
                } else {
                    log::debug!("Request rejected ({:?}): {err}", err.kind());
                }
                Self::failure(&err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wellspace_lib::response::MessagePayload;

    use super::*;

    #[test]
    fn test_parse_json_rejects_garbage() {
        let err = parse_json::<Value>(b"{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), INVALID_BODY);
    }

    #[test]
    fn test_failure_shape_and_status() {
        let reply = Reply::failure(&Error::invalid_field("title", "Title is required"));
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            reply.body,
            json!({
                "success": false,
                "kind": "validation",
                "code": "VALIDATION_ERROR",
                "message": "Title is required",
                "errors": {"title": "Title is required"},
            })
        );
    }

    #[test]
    fn test_method_not_allowed() {
        let reply = Reply::method_not_allowed();
        assert_eq!(reply.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(reply.body["success"], json!(false));
        assert_eq!(reply.body["message"], json!("Method not allowed"));
    }

    #[test]
    fn test_response_carries_cookie() {
        let response = Reply::created(MessagePayload::new("hi"))
            .with_cookie("token=abc; HttpOnly".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::SET_COOKIE], "token=abc; HttpOnly");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}

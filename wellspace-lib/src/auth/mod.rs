//! Authentication
//!
//! Signed bearer tokens, password hashing, and extraction of the token from
//! an incoming request.

mod password;
mod request;
mod token;

pub use password::PasswordHasher;
pub use request::TOKEN_COOKIE;
pub use request::clear_token_cookie;
pub use request::token_cookie;
pub use request::token_from_headers;
pub use request::verify_request_token;
pub use token::Claims;
pub use token::DEFAULT_TOKEN_TTL;
pub use token::TokenSigner;

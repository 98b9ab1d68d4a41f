//! Built-in schemas shared by the editor, the API client and the server.
//!
//! Each schema is built once per process and handed out as an `Arc`, so the
//! browser-side controller and the route handlers evaluate the very same rules.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;

use super::FieldRule;
use super::FieldValue;
use super::FormData;
use super::ValidationSchema;

pub const TITLE: &str = "title";
pub const TAGS: &str = "tags";
pub const JSON_FILE_URL: &str = "json_file_url";
pub const NAME: &str = "name";
pub const EMAIL: &str = "email";
pub const PASSWORD: &str = "password";
pub const CONFIRM_PASSWORD: &str = "confirmPassword";

/// Most tags a session may carry.
pub const MAX_TAGS: usize = 10;
/// Longest allowed tag, in characters.
pub const MAX_TAG_LEN: usize = 30;
/// Longest allowed reference URL.
pub const MAX_URL_LEN: usize = 2048;

static TITLE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s\-_.,!?()]+$").expect("valid title regex"));
static TAG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s\-_]+$").expect("valid tag regex"));
static NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("valid name regex"));

static LOGIN: LazyLock<Arc<ValidationSchema>> = LazyLock::new(|| Arc::new(build_login()));
static REGISTER: LazyLock<Arc<ValidationSchema>> = LazyLock::new(|| Arc::new(build_register()));
static SESSION: LazyLock<Arc<ValidationSchema>> = LazyLock::new(|| Arc::new(build_session()));

/// Schema for the login form: `email`, `password`.
pub fn login() -> Arc<ValidationSchema> {
    Arc::clone(&LOGIN)
}

/// Schema for the registration form: `name`, `email`, `password`, `confirmPassword`.
pub fn register() -> Arc<ValidationSchema> {
    Arc::clone(&REGISTER)
}

/// Schema for the session editor: `title`, `tags`, `json_file_url`.
pub fn session() -> Arc<ValidationSchema> {
    Arc::clone(&SESSION)
}

fn text(value: &FieldValue) -> &str {
    value.as_text().unwrap_or("")
}

fn check_email(value: &FieldValue, max_len: Option<usize>) -> Option<String> {
    let email = text(value).trim();
    if email.is_empty() {
        return Some("Email is required".into());
    }
    if !email_address::EmailAddress::is_valid(email) {
        return Some("Please enter a valid email address".into());
    }
    if let Some(max) = max_len
        && email.chars().count() > max
    {
        return Some("Email address is too long".into());
    }
    None
}

fn build_login() -> ValidationSchema {
    ValidationSchema::new()
        .field(
            EMAIL,
            FieldRule::new().required().custom(|value, _| check_email(value, None)),
        )
        .field(
            PASSWORD,
            FieldRule::new().required().min_length(6).custom(|value, _| {
                let password = text(value);
                if password.is_empty() {
                    Some("Password is required".into())
                } else if password.chars().count() < 6 {
                    Some("Password must be at least 6 characters".into())
                } else {
                    None
                }
            }),
        )
}

fn build_register() -> ValidationSchema {
    ValidationSchema::new()
        .field(
            NAME,
            FieldRule::new().required().min_length(2).max_length(50).custom(|value, _| {
                let name = text(value).trim();
                let len = name.chars().count();
                if name.is_empty() {
                    Some("Name is required".into())
                } else if len < 2 {
                    Some("Name must be at least 2 characters".into())
                } else if len > 50 {
                    Some("Name must be less than 50 characters".into())
                } else if !NAME_CHARS.is_match(name) {
                    Some("Name can only contain letters, spaces, hyphens, and apostrophes".into())
                } else {
                    None
                }
            }),
        )
        .field(
            EMAIL,
            FieldRule::new().required().custom(|value, _| check_email(value, Some(254))),
        )
        .field(
            PASSWORD,
            FieldRule::new().required().min_length(6).custom(|value, _| {
                let password = text(value);
                let len = password.chars().count();
                let strong = password.chars().any(|c| c.is_ascii_lowercase())
                    && password.chars().any(|c| c.is_ascii_uppercase())
                    && password.chars().any(|c| c.is_ascii_digit());
                if password.is_empty() {
                    Some("Password is required".into())
                } else if len < 6 {
                    Some("Password must be at least 6 characters".into())
                } else if len > 128 {
                    Some("Password is too long".into())
                } else if !strong {
                    Some(
                        "Password must contain at least one uppercase letter, one lowercase letter, and one number"
                            .into(),
                    )
                } else {
                    None
                }
            }),
        )
        .field(
            CONFIRM_PASSWORD,
            FieldRule::new().required().custom(|value, form: &FormData| {
                let confirm = text(value);
                if confirm.is_empty() {
                    Some("Please confirm your password".into())
                } else if form.text(PASSWORD) != Some(confirm) {
                    Some("Passwords do not match".into())
                } else {
                    None
                }
            }),
        )
}

fn build_session() -> ValidationSchema {
    ValidationSchema::new()
        .field(
            TITLE,
            FieldRule::new().required().min_length(3).max_length(100).custom(|value, _| {
                let title = text(value).trim();
                let len = title.chars().count();
                if title.is_empty() {
                    Some("Title is required".into())
                } else if len < 3 {
                    Some("Title must be at least 3 characters long".into())
                } else if len > 100 {
                    Some("Title must be less than 100 characters".into())
                } else if !TITLE_CHARS.is_match(title) {
                    Some("Title contains invalid characters".into())
                } else {
                    None
                }
            }),
        )
        .field(TAGS, FieldRule::new().custom(|value, _| check_tags(value)))
        .field(JSON_FILE_URL, FieldRule::new().custom(|value, _| check_url(value)))
}

// A text value is not a tag list; it validates as no tags.
fn check_tags(value: &FieldValue) -> Option<String> {
    let tags = value.as_list().unwrap_or_default();
    if tags.len() > MAX_TAGS {
        return Some(format!("Maximum {MAX_TAGS} tags allowed"));
    }
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if tag.chars().count() > MAX_TAG_LEN {
            return Some(format!("Each tag must be less than {MAX_TAG_LEN} characters"));
        }
        if !TAG_CHARS.is_match(tag) {
            return Some(
                "Tags can only contain letters, numbers, spaces, hyphens, and underscores".into(),
            );
        }
    }
    None
}

fn check_url(value: &FieldValue) -> Option<String> {
    let raw = text(value).trim();
    if raw.is_empty() {
        return None;
    }
    let Ok(url) = url::Url::parse(raw) else {
        return Some("Please provide a valid URL".into());
    };
    if !matches!(url.scheme(), "http" | "https") {
        return Some("URL must start with http:// or https://".into());
    }
    if raw.len() > MAX_URL_LEN {
        return Some("URL is too long".into());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_form;

    fn session_form(title: &str, tags: &[&str], url: &str) -> FormData {
        FormData::new()
            .with(TITLE, title)
            .with(TAGS, tags.iter().map(|t| t.to_string()).collect::<Vec<_>>())
            .with(JSON_FILE_URL, url)
    }

    #[test]
    fn test_session_schema_accepts_valid_draft() {
        let form = session_form("Morning Breath (10 min)", &["yoga", "calm_mind"], "https://cdn.example.com/a.json");
        let result = validate_form(&form, &session());
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_session_title_messages() {
        let schema = session();
        let errors = |title: &str| validate_form(&session_form(title, &[], ""), &schema).errors;

        assert_eq!(errors("  ").get(TITLE), Some("Title is required"));
        assert_eq!(errors("ab").get(TITLE), Some("Title must be at least 3 characters long"));
        assert_eq!(errors(&"a".repeat(101)).get(TITLE), Some("Title must be less than 100 characters"));
        assert_eq!(errors("Yoga <3").get(TITLE), Some("Title contains invalid characters"));
    }

    #[test]
    fn test_missing_title_is_required() {
        let result = validate_form(&FormData::new(), &session());
        assert_eq!(result.errors.get(TITLE), Some("Title is required"));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_session_tag_rules() {
        let schema = session();
        let eleven: Vec<&str> = (0..11).map(|_| "x").collect();
        let result = validate_form(&session_form("Valid title", &eleven, ""), &schema);
        assert_eq!(result.errors.get(TAGS), Some("Maximum 10 tags allowed"));

        let long = "t".repeat(31);
        let result = validate_form(&session_form("Valid title", &[&long], ""), &schema);
        assert_eq!(result.errors.get(TAGS), Some("Each tag must be less than 30 characters"));

        let result = validate_form(&session_form("Valid title", &["ok", "no#"], ""), &schema);
        assert!(result.errors.get(TAGS).is_some());

        let result = validate_form(&session_form("Valid title", &["ok", "  "], ""), &schema);
        assert!(result.is_valid);
    }

    #[test]
    fn test_session_url_rules() {
        let schema = session();
        let url_error = |url: &str| {
            validate_form(&session_form("Valid title", &[], url), &schema)
                .errors
                .get(JSON_FILE_URL)
                .map(str::to_string)
        };

        assert_eq!(url_error(""), None);
        assert_eq!(url_error("not a url").as_deref(), Some("Please provide a valid URL"));
        assert_eq!(
            url_error("ftp://example.com/a.json").as_deref(),
            Some("URL must start with http:// or https://")
        );
        let long = format!("https://example.com/{}", "a".repeat(2048));
        assert_eq!(url_error(&long).as_deref(), Some("URL is too long"));
    }

    #[test]
    fn test_login_schema() {
        let schema = login();
        let form = FormData::new().with(EMAIL, "nope").with(PASSWORD, "12345");
        let result = validate_form(&form, &schema);
        assert_eq!(result.errors.get(EMAIL), Some("Please enter a valid email address"));
        assert_eq!(result.errors.get(PASSWORD), Some("Password must be at least 6 characters"));

        let form = FormData::new().with(EMAIL, "a@example.com").with(PASSWORD, "secret");
        assert!(validate_form(&form, &schema).is_valid);
    }

    #[test]
    fn test_register_schema() {
        let schema = register();
        let form = FormData::new()
            .with(NAME, "Ada O'Neil-Smith")
            .with(EMAIL, "ada@example.com")
            .with(PASSWORD, "Secret1")
            .with(CONFIRM_PASSWORD, "Secret1");
        assert!(validate_form(&form, &schema).is_valid);

        let form = FormData::new()
            .with(NAME, "A1")
            .with(EMAIL, "ada@example.com")
            .with(PASSWORD, "secret1")
            .with(CONFIRM_PASSWORD, "secret2");
        let result = validate_form(&form, &schema);
        assert_eq!(
            result.errors.get(NAME),
            Some("Name can only contain letters, spaces, hyphens, and apostrophes")
        );
        assert_eq!(
            result.errors.get(PASSWORD),
            Some("Password must contain at least one uppercase letter, one lowercase letter, and one number")
        );
        assert_eq!(result.errors.get(CONFIRM_PASSWORD), Some("Passwords do not match"));
    }

    #[test]
    fn test_schemas_are_shared() {
        assert!(Arc::ptr_eq(&session(), &session()));
    }
}

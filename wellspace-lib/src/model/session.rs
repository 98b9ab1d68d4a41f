//! Session records

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::UserId;
use crate::error::Error;
use crate::validation::FormData;
use crate::validation::schemas;

/// Unique identifier of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::validation("Invalid session ID"))
    }
}

/// Visibility of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Visible only to its owner.
    #[default]
    Draft,
    /// Visible to every signed-in user.
    Published,
}

impl SessionStatus {
    /// Lowercase name used on the wire and in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(Error::invalid_field(
                "status",
                "Status must be either 'draft' or 'published'",
            )),
        }
    }
}

/// A stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id", alias = "id")]
    pub id: SessionId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub json_file_url: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Returns `true` if `user` owns this session.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == user
    }

    /// The editable part of this session.
    pub fn draft(&self) -> SessionDraft {
        SessionDraft {
            title: self.title.clone(),
            tags: self.tags.clone(),
            json_file_url: self.json_file_url.clone(),
        }
    }
}

/// The editable fields of a session, as the editor holds them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub json_file_url: String,
}

impl SessionDraft {
    /// Converts to form values for the session schema.
    pub fn to_form_data(&self) -> FormData {
        FormData::new()
            .with(schemas::TITLE, self.title.as_str())
            .with(schemas::TAGS, self.tags.clone())
            .with(schemas::JSON_FILE_URL, self.json_file_url.as_str())
    }

    /// Reads a draft back from form values. Missing fields become empty.
    pub fn from_form_data(form: &FormData) -> Self {
        Self {
            title: form.text(schemas::TITLE).unwrap_or_default().to_string(),
            tags: form
                .get(schemas::TAGS)
                .as_list()
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            json_file_url: form.text(schemas::JSON_FILE_URL).unwrap_or_default().to_string(),
        }
    }
}

/// Partial session payload accepted by the write routes.
///
/// Every field is optional; `status` stays a raw string so an unknown value
/// is reported as a field error rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInput {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SessionInput {
    /// A full payload built from a draft.
    pub fn from_draft(draft: &SessionDraft) -> Self {
        Self {
            id: None,
            title: Some(draft.title.clone()),
            tags: Some(draft.tags.clone()),
            json_file_url: Some(draft.json_file_url.clone()),
            status: None,
        }
    }

    /// Sets the status, builder style.
    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status.as_str().to_string());
        self
    }

    /// Sets the target id, builder style.
    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Parses the status if one was sent.
    pub fn parsed_status(&self) -> Result<Option<SessionStatus>, Error> {
        self.status.as_deref().map(str::parse::<SessionStatus>).transpose()
    }

    /// Parses the target id if one was sent. Empty strings count as absent.
    pub fn parsed_id(&self) -> Result<Option<SessionId>, Error> {
        match self.id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }

    /// Overlays the provided fields on `base`.
    pub fn merge_into(&self, base: &SessionDraft) -> SessionDraft {
        SessionDraft {
            title: self.title.clone().unwrap_or_else(|| base.title.clone()),
            tags: self.tags.clone().unwrap_or_else(|| base.tags.clone()),
            json_file_url: self
                .json_file_url
                .clone()
                .unwrap_or_else(|| base.json_file_url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("draft".parse::<SessionStatus>().unwrap(), SessionStatus::Draft);
        assert_eq!("published".parse::<SessionStatus>().unwrap(), SessionStatus::Published);
        let err = "archived".parse::<SessionStatus>().unwrap_err();
        assert_eq!(
            err.field_errors().and_then(|e| e.get("status")),
            Some("Status must be either 'draft' or 'published'")
        );
    }

    #[test]
    fn test_invalid_session_id() {
        let err = "not-a-uuid".parse::<SessionId>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid session ID");
    }

    #[test]
    fn test_draft_form_round_trip() {
        let draft = SessionDraft {
            title: "Evening wind-down".into(),
            tags: vec!["sleep".into()],
            json_file_url: String::new(),
        };
        assert_eq!(SessionDraft::from_form_data(&draft.to_form_data()), draft);
    }

    #[test]
    fn test_merge_keeps_unsent_fields() {
        let base = SessionDraft {
            title: "Base".into(),
            tags: vec!["a".into()],
            json_file_url: "https://x.test/a.json".into(),
        };
        let input = SessionInput {
            title: Some("New".into()),
            ..Default::default()
        };
        let merged = input.merge_into(&base);
        assert_eq!(merged.title, "New");
        assert_eq!(merged.tags, base.tags);
        assert_eq!(merged.json_file_url, base.json_file_url);
    }

    #[test]
    fn test_input_accepts_underscore_id() {
        let id = SessionId::new();
        let json = format!(r#"{{"_id": "{id}", "title": "x"}}"#);
        let input: SessionInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input.parsed_id().unwrap(), Some(id));

        let input: SessionInput = serde_json::from_str(r#"{"_id": ""}"#).unwrap();
        assert_eq!(input.parsed_id().unwrap(), None);
    }
}

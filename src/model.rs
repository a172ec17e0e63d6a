//! Guestbook and project-board records, and the rules that turn a JSON
//! payload into something the store will accept.
//!
//! Every string field is trimmed and then capped in characters before it is
//! validated, so what the store persists is exactly what was checked.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const NAME_MAX: usize = 100;
pub const TEXT_MAX: usize = 2000;
pub const TITLE_MAX: usize = 150;
pub const USERNAME_MAX: usize = 100;
pub const FULLNAME_MAX: usize = 150;
pub const REPO_URL_MAX: usize = 500;

pub const DEFAULT_NAME: &str = "Guest";
pub const GITHUB_PREFIX: &str = "https://github.com/";

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]{1,39}$").expect("static pattern"));

/// A guestbook entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub text: String,
    pub created_at: String,
}

/// A submitted project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub username: String,
    pub fullname: String,
    pub repo_url: String,
    pub created_at: String,
}

/// First rule a payload broke. The message is sent to the client verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("text is required")]
    TextRequired,
    #[error("all fields are required")]
    MissingFields,
    #[error("invalid GitHub username")]
    InvalidUsername,
    #[error("repository link must point to GitHub")]
    NotGithub,
    #[error("link format: https://github.com/owner/repo")]
    RepoPath,
}

/// Decodes a JSON object body. Anything else (bad UTF-8, bad JSON, an array)
/// reads as an empty object.
pub fn parse_object(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// String field, trimmed and capped. Missing and non-string values read as "".
fn field(payload: &Map<String, Value>, key: &str, max: usize) -> String {
    let raw = payload.get(key).and_then(Value::as_str).unwrap_or_default();
    raw.trim().chars().take(max).collect()
}

/// Name and text for a new or edited message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub name: String,
    pub text: String,
}

impl MessageDraft {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut name = field(payload, "name", NAME_MAX);
        if name.is_empty() {
            name = DEFAULT_NAME.to_owned();
        }
        let text = field(payload, "text", TEXT_MAX);
        if text.is_empty() {
            return Err(ValidationError::TextRequired);
        }
        Ok(Self { name, text })
    }
}

/// All four fields of a new project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub title: String,
    pub username: String,
    pub fullname: String,
    pub repo_url: String,
}

impl ProjectDraft {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, ValidationError> {
        let draft = Self {
            title: field(payload, "title", TITLE_MAX),
            username: field(payload, "username", USERNAME_MAX),
            fullname: field(payload, "fullname", FULLNAME_MAX),
            repo_url: field(payload, "repo_url", REPO_URL_MAX),
        };
        if draft.title.is_empty()
            || draft.username.is_empty()
            || draft.fullname.is_empty()
            || draft.repo_url.is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        if !USERNAME.is_match(&draft.username) {
            return Err(ValidationError::InvalidUsername);
        }
        check_repo_url(&draft.repo_url)?;
        Ok(draft)
    }
}

/// The editable fields of a project. The username is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEdit {
    pub title: String,
    pub fullname: String,
    pub repo_url: String,
}

impl ProjectEdit {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, ValidationError> {
        let edit = Self {
            title: field(payload, "title", TITLE_MAX),
            fullname: field(payload, "fullname", FULLNAME_MAX),
            repo_url: field(payload, "repo_url", REPO_URL_MAX),
        };
        if edit.title.is_empty() || edit.fullname.is_empty() || edit.repo_url.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        check_repo_url(&edit.repo_url)?;
        Ok(edit)
    }
}

/// `https://github.com/<owner>/<repo>[/...]` with non-empty owner and repo.
fn check_repo_url(url: &str) -> Result<(), ValidationError> {
    let tail = url.strip_prefix(GITHUB_PREFIX).ok_or(ValidationError::NotGithub)?;
    let mut parts = tail.split('/');
    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => Ok(()),
        _ => Err(ValidationError::RepoPath),
    }
}

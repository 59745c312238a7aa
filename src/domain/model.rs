use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named group of snippets, in the shape the application consumes.
///
/// Identity is the backend-generated id: the gist id on GitHub, the shared
/// snippet title on GitLab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    pub description: String,
    pub files: HashMap<String, Snippet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: String,
    /// GitLab-only: the snippet project the gist lives in.
    pub project_id: Option<u64>,
    pub html_url: String,
}

/// One file within a gist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    /// Backend snippet id. GitHub gist files have no per-file id.
    pub id: Option<u64>,
    pub filename: String,
    /// Missing in listing responses; filled by the get-one operation.
    pub content: Option<String>,
    pub language: String,
}

/// The authenticated user, plus the resolved snippet project on GitLab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub project_id: Option<u64>,
}

/// Result of the GitHub OAuth web-flow code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

/// Requested per-file state for an edit, keyed by filename.
///
/// `Some(content)` creates or updates the file, `None` deletes it.
pub type FileChanges = HashMap<String, Option<String>>;

/// Files for a create operation: filename to content.
pub type NewFiles = HashMap<String, String>;

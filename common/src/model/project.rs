use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's code project as stored in the document store.
///
/// The `id` is assigned by the document store on first insert and never
/// changes afterwards. A `user_id` of `None` marks a project that came from a
/// template import or was created anonymously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<ProjectFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions_id: Option<String>,
}

impl Project {
    /// A blank, not yet stored project owned by `user_id`.
    pub fn new(name: impl Into<String>, user_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            user_id,
            created_at: now,
            last_modified: now,
            files: Vec::new(),
            instructions_id: None,
        }
    }

    /// Marks the project as modified now. Call on every content-changing write.
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

/// One entry of a project's file tree.
///
/// Paths use forward slashes and usually start with the owning project's id
/// segment, e.g. `/{project_id}/src/Main.java`. Binary files carry Base64 in
/// `content`; directories carry no meaningful content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_binary: bool,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ProjectFile>,
}

impl ProjectFile {
    pub fn text(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            is_binary: false,
            is_directory: false,
            children: Vec::new(),
        }
    }

    pub fn binary(path: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            is_binary: true,
            ..Self::text(path, base64)
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            is_directory: true,
            ..Self::text(path, String::new())
        }
    }
}

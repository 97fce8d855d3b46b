use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Audit row tying a document-store project to the user (and optionally the
/// course) it was created for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: i64,
    pub mongo_id: String,
    pub user_id: Option<String>,
    pub course_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProjectRecord {
    pub mongo_id: String,
    pub user_id: Option<String>,
    pub course_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

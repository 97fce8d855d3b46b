use crate::model::project::Project;
use serde::{Deserialize, Serialize};

/// Payload for `POST /api/projects/import`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ImportDirectoryRequest {
    pub root_path: String,
    pub user_id: Option<String>,
}

/// Payload for `POST /api/projects/from-template`.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateFromTemplateRequest {
    pub template_id: i64,
    pub user_id: String,
    pub custom_name: Option<String>,
    pub course_id: Option<i64>,
}

/// Payload for `POST /api/projects/save`.
///
/// `acting_user_id` is the identity resolved by the web layer; `None` means
/// an anonymous save.
#[derive(Debug, Deserialize, Serialize)]
pub struct SaveProjectRequest {
    pub project: Project,
    pub acting_user_id: Option<String>,
}

/// Payload for `POST /api/templates/promote`.
#[derive(Debug, Deserialize, Serialize)]
pub struct PromoteProjectRequest {
    pub project_id: String,
    pub course_id: i64,
}

/// Payload for `POST /api/templates/promote-new`.
#[derive(Debug, Deserialize, Serialize)]
pub struct PromoteNewProjectRequest {
    pub project: Project,
    pub course_id: i64,
}

/// Payload for `POST /api/templates/universal`.
#[derive(Debug, Deserialize, Serialize)]
pub struct UniversalTemplateRequest {
    pub project_id: String,
    pub description: String,
    pub instructions_project_id: Option<String>,
}

/// Payload for `POST /api/templates/import`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ImportTemplateRequest {
    pub template_dir: String,
    pub description: String,
}

/// Payload for `POST /api/courses`.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateCourseRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Query string for `GET /api/projects/records/{user_id}`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ProjectRecordsQuery {
    pub course_id: Option<i64>,
}

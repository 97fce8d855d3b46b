use serde::{Deserialize, Serialize};

/// Relational metadata for a promoted project.
///
/// `mongo_id` is the identifier of the source document in the template
/// collection. Nothing in the relational schema enforces that the document
/// exists; the promotion protocol keeps the two in step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i64,
    pub mongo_id: String,
    pub name: String,
    pub description: String,
    pub is_universal: Option<bool>,
    pub allow_anonymous_access: Option<bool>,
    pub instructions_id: Option<String>,
}

impl Template {
    pub fn is_universal(&self) -> bool {
        self.is_universal.unwrap_or(false)
    }
}

/// A template row that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTemplate {
    pub mongo_id: String,
    pub name: String,
    pub description: String,
    pub is_universal: Option<bool>,
    pub allow_anonymous_access: Option<bool>,
    pub instructions_id: Option<String>,
}

/// Links a course to one of its templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseTemplate {
    pub course_id: i64,
    pub template_id: i64,
}

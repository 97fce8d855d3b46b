//! Instantiates a new project from a template's frozen source.

use crate::error::LifecycleError;
use crate::store::documents::{Collection, DocumentStore};
use common::model::project::{Project, ProjectFile};
use common::model::template::Template;
use log::info;

/// Moves a path from `old_id` to `new_id`.
///
/// Every `/`-separated segment equal to `old_id` is replaced. Only when no
/// segment matches exactly is the first substring occurrence replaced.
pub fn rewrite_path(path: &str, old_id: &str, new_id: &str) -> String {
    if old_id.is_empty() || old_id == new_id {
        return path.to_string();
    }

    let mut matched = false;
    let rewritten = path
        .split('/')
        .map(|segment| {
            if segment == old_id {
                matched = true;
                new_id
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    if matched {
        rewritten
    } else if path.contains(old_id) {
        path.replacen(old_id, new_id, 1)
    } else {
        path.to_string()
    }
}

fn copy_file(file: &ProjectFile, old_id: &str, new_id: &str) -> ProjectFile {
    ProjectFile {
        path: rewrite_path(&file.path, old_id, new_id),
        content: file.content.clone(),
        is_binary: file.is_binary,
        is_directory: file.is_directory,
        children: file
            .children
            .iter()
            .map(|child| copy_file(child, old_id, new_id))
            .collect(),
    }
}

/// Creates a project for `owner` holding a copy of the template's files.
///
/// The project is named `custom_name` when given and non-blank, otherwise
/// `"{template name} (Copy)"`, and inherits the template's instructions.
pub async fn create_project_from_template(
    store: &DocumentStore,
    template: &Template,
    owner: &str,
    custom_name: Option<&str>,
) -> Result<Project, LifecycleError> {
    let source = store
        .find_by_id(Collection::TemplateProjects, &template.mongo_id, None)
        .await?
        .ok_or_else(|| LifecycleError::TemplateProjectNotFound(template.mongo_id.clone()))?;

    let name = match custom_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{} (Copy)", template.name),
    };

    let mut project = Project::new(name, Some(owner.to_string()));
    project.instructions_id = template.instructions_id.clone();
    store.insert_one(Collection::Projects, &mut project, None).await?;
    let new_id = project.id.clone().ok_or(LifecycleError::MissingId)?;

    let old_id = source.id.as_deref().unwrap_or(&template.mongo_id);
    project.files = source
        .files
        .iter()
        .map(|file| copy_file(file, old_id, &new_id))
        .collect();
    project.touch();

    if !store
        .replace_one(Collection::Projects, &new_id, &project, None)
        .await?
    {
        return Err(LifecycleError::ProjectNotFound(new_id));
    }

    info!(
        "Created project {} for {} from template {} ({})",
        new_id, owner, template.id, template.mongo_id
    );
    Ok(project)
}

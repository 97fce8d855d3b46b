//! Save, delete and lookup of working projects.

use crate::error::LifecycleError;
use crate::store::documents::{Collection, DocumentStore};
use crate::store::relational::RelationalStore;
use common::model::course::{NewProjectRecord, ProjectRecord};
use common::model::project::Project;
use log::info;
use std::collections::HashSet;

pub async fn get_project(store: &DocumentStore, id: &str) -> Result<Project, LifecycleError> {
    store
        .find_by_id(Collection::Projects, id, None)
        .await?
        .ok_or_else(|| LifecycleError::ProjectNotFound(id.to_string()))
}

pub async fn list_owned_projects(
    store: &DocumentStore,
    owner: &str,
) -> Result<Vec<Project>, LifecycleError> {
    Ok(store.find_by_owner(Collection::Projects, owner).await?)
}

/// Replaces the file list of a stored project and bumps its modification
/// time. Name, owner and creation time are never taken from `update`.
///
/// An owned project can only be saved by its owner; an anonymous project
/// only anonymously.
pub async fn save_project(
    store: &DocumentStore,
    update: &Project,
    acting_user: Option<&str>,
) -> Result<Project, LifecycleError> {
    let id = update.id.clone().ok_or(LifecycleError::MissingId)?;
    let mut project = get_project(store, &id).await?;

    let allowed = match acting_user {
        Some(user) => project.user_id.as_deref() == Some(user),
        None => project.is_anonymous(),
    };
    if !allowed {
        return Err(LifecycleError::Forbidden(id));
    }

    project.files = update.files.clone();
    project.touch();
    if !store
        .replace_one(Collection::Projects, &id, &project, None)
        .await?
    {
        return Err(LifecycleError::ProjectNotFound(id));
    }

    Ok(project)
}

/// Deletes an owned project together with its project records.
pub async fn delete_project(
    documents: &DocumentStore,
    relational: &RelationalStore,
    id: &str,
    owner: &str,
) -> Result<(), LifecycleError> {
    let project = get_project(documents, id).await?;
    if project.user_id.as_deref() != Some(owner) {
        return Err(LifecycleError::Forbidden(id.to_string()));
    }

    if !documents.delete_one(Collection::Projects, id, None).await? {
        return Err(LifecycleError::ProjectNotFound(id.to_string()));
    }
    let removed = relational
        .delete_project_records(id, Some(owner), None)
        .await?;

    info!("Deleted project {} of {} ({} records)", id, owner, removed);
    Ok(())
}

/// The working projects of `owner` that were created from `template_id`.
pub async fn list_projects_from_template(
    documents: &DocumentStore,
    relational: &RelationalStore,
    template_id: i64,
    owner: &str,
) -> Result<Vec<Project>, LifecycleError> {
    if relational.find_template(template_id).await?.is_none() {
        return Err(LifecycleError::TemplateNotFound(template_id));
    }

    let created: HashSet<String> = relational
        .list_template_project_ids(template_id)
        .await?
        .into_iter()
        .collect();
    Ok(documents
        .find_by_owner(Collection::Projects, owner)
        .await?
        .into_iter()
        .filter(|p| p.id.as_ref().is_some_and(|id| created.contains(id)))
        .collect())
}

/// Writes the audit row for a freshly created project.
pub async fn record_project_creation(
    relational: &RelationalStore,
    project: &Project,
    course_id: Option<i64>,
) -> Result<ProjectRecord, LifecycleError> {
    let mongo_id = project.id.clone().ok_or(LifecycleError::MissingId)?;
    Ok(relational
        .insert_project_record(
            &NewProjectRecord {
                mongo_id,
                user_id: project.user_id.clone(),
                course_id,
                created_at: project.created_at,
            },
            None,
        )
        .await?)
}

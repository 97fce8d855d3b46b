//! Universal templates: usable by every course, never linked to one.

use crate::error::{LifecycleError, PromotionError};
use crate::lifecycle::directory::create_named_project_from_directory;
use crate::promotion::protocol::{self, CourseLink, PromotionPlan};
use crate::store::documents::Collection;
use crate::store::relational::RelationalStore;
use crate::store::Stores;
use chrono::Utc;
use common::model::instructions::{Instructions, InstructionsKind};
use common::model::project::Project;
use common::model::template::Template;
use log::info;
use std::path::Path;
use uuid::Uuid;

/// Promotes `project` to a universal template.
///
/// A project without an id is stored first. When `instructions` is given it
/// is stored as well if needed and registered as a document-backed
/// instructions resource referenced by the new template.
pub async fn create_universal_template(
    stores: &Stores,
    project: &Project,
    description: &str,
    instructions: Option<&Project>,
) -> Result<Template, PromotionError> {
    let project_id = match &project.id {
        Some(id) => id.clone(),
        None => {
            let mut fresh = project.clone();
            stores
                .documents
                .insert_one(Collection::Projects, &mut fresh, None)
                .await?;
            fresh.id.ok_or(LifecycleError::MissingId)?
        }
    };

    let instructions_id = match instructions {
        Some(source) => Some(register_instructions(stores, source).await?),
        None => None,
    };

    let plan = PromotionPlan {
        course: CourseLink::Universal,
        record: false,
        description: Some(description.to_string()),
        instructions_id,
    };
    protocol::promote(stores, &project_id, &plan).await
}

async fn register_instructions(stores: &Stores, source: &Project) -> Result<String, PromotionError> {
    let location = match &source.id {
        Some(id) => id.clone(),
        None => {
            let mut fresh = source.clone();
            stores
                .documents
                .insert_one(Collection::TemplateProjects, &mut fresh, None)
                .await?;
            fresh.id.ok_or(LifecycleError::MissingId)?
        }
    };

    let instructions = Instructions {
        id: Uuid::new_v4().simple().to_string(),
        kind: InstructionsKind::Document,
        location,
        description: Some(format!("Instructions for {}", source.name)),
        created_at: Utc::now(),
    };
    stores.relational.insert_instructions(&instructions, None).await?;
    Ok(instructions.id)
}

pub async fn list_universal_templates(
    relational: &RelationalStore,
) -> Result<Vec<Template>, PromotionError> {
    Ok(relational.list_universal_templates().await?)
}

/// Imports a template directory laid out as `files/` plus an optional
/// `instructions/` tree. The template is named after the directory, minus a
/// leading `Template` marker.
pub async fn import_template_directory(
    stores: &Stores,
    dir: &Path,
    description: &str,
) -> Result<Template, PromotionError> {
    let files = dir.join("files");
    if !files.is_dir() {
        return Err(LifecycleError::DirectoryNotFound(files).into());
    }

    let name = template_name(dir);
    let project =
        create_named_project_from_directory(&stores.documents, &files, None, name.clone()).await?;

    let instructions_dir = dir.join("instructions");
    let instructions = if instructions_dir.is_dir() {
        Some(
            create_named_project_from_directory(
                &stores.documents,
                &instructions_dir,
                None,
                format!("{name} Instructions"),
            )
            .await?,
        )
    } else {
        None
    };

    let template =
        create_universal_template(stores, &project, description, instructions.as_ref()).await?;
    info!(
        "Imported universal template {} ({}) from {}",
        template.id,
        template.name,
        dir.display()
    );
    Ok(template)
}

fn template_name(dir: &Path) -> String {
    let raw = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stripped = raw
        .strip_prefix("Template")
        .map(|rest| rest.trim_start_matches(['_', '-', ' ']))
        .unwrap_or(&raw);
    if stripped.is_empty() {
        raw.clone()
    } else {
        stripped.to_string()
    }
}

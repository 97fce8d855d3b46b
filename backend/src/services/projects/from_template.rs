//! # Project From Template Service
//!
//! Backend logic for the `POST /api/projects/from-template` endpoint.
//!
//! ## Workflow
//!
//! 1.  **HTTP Request**: `process` receives a `CreateFromTemplateRequest` with the
//!     template id, the new owner and optionally a custom name and a course.
//!
//! 2.  **Template Lookup**: the template row is read from the relational store. An
//!     unknown id answers `404 Not Found`.
//!
//! 3.  **Instantiation**: the template's frozen source is copied out of the template
//!     collection into a new working project, every path moved onto the new id.
//!
//! 4.  **Bookkeeping**: a project record (owner, course, creation time) and a
//!     template/project link are written, so the template can later list the
//!     projects made from it.
//!
//! 5.  **HTTP Response**: the new `Project` as JSON.

use crate::error::LifecycleError;
use crate::lifecycle;
use crate::lifecycle::manage::record_project_creation;
use crate::services::lifecycle_failure;
use crate::store::Stores;
use actix_web::{web, HttpResponse, Responder};
use common::model::project::Project;
use common::requests::CreateFromTemplateRequest;

/// Actix web handler for `POST /api/projects/from-template`.
///
/// # Arguments
/// * `stores` - Both stores, shared application state.
/// * `payload` - The `CreateFromTemplateRequest` JSON body.
///
/// # Returns
/// - `200 OK` with the created `Project` as JSON.
/// - `404 Not Found` if the template or its frozen source is missing.
/// - `503 Service Unavailable` if a store fails.
pub(crate) async fn process(
    stores: web::Data<Stores>,
    payload: web::Json<CreateFromTemplateRequest>,
) -> impl Responder {
    match create_from_template(&stores, payload.into_inner()).await {
        Ok(project) => HttpResponse::Ok().json(project),
        Err(e) => lifecycle_failure(e),
    }
}

async fn create_from_template(
    stores: &Stores,
    request: CreateFromTemplateRequest,
) -> Result<Project, LifecycleError> {
    let template = stores
        .relational
        .find_template(request.template_id)
        .await?
        .ok_or(LifecycleError::TemplateNotFound(request.template_id))?;

    let project = lifecycle::create_project_from_template(
        &stores.documents,
        &template,
        &request.user_id,
        request.custom_name.as_deref(),
    )
    .await?;
    record_project_creation(&stores.relational, &project, request.course_id).await?;
    let project_id = project.id.as_deref().ok_or(LifecycleError::MissingId)?;
    stores
        .relational
        .insert_template_project(template.id, project_id, None)
        .await?;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promotion;
    use crate::store::capability::ClusterTopology;
    use crate::store::documents::Collection;
    use crate::store::testing::temp_stores;

    #[tokio::test]
    async fn instantiates_and_records() {
        let (_dir, stores) = temp_stores(ClusterTopology::ReplicaSet).await;
        let course = stores.relational.insert_course("C", "", None).await.unwrap();
        let mut source = Project::new("Maze", Some("instructor".to_string()));
        stores
            .documents
            .insert_one(Collection::Projects, &mut source, None)
            .await
            .unwrap();
        let template = promotion::promote_project_to_template(
            &stores,
            source.id.as_deref().unwrap(),
            course.id,
        )
        .await
        .unwrap();

        let project = create_from_template(
            &stores,
            CreateFromTemplateRequest {
                template_id: template.id,
                user_id: "student".to_string(),
                custom_name: None,
                course_id: Some(course.id),
            },
        )
        .await
        .unwrap();
        assert_eq!(project.name, "Maze (Copy)");

        let records = stores
            .relational
            .list_project_records("student", Some(course.id))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(Some(&records[0].mongo_id), project.id.as_ref());

        let made_from = stores
            .relational
            .list_template_project_ids(template.id)
            .await
            .unwrap();
        assert_eq!(made_from, vec![project.id.clone().unwrap()]);
    }

    #[tokio::test]
    async fn unknown_template_is_not_found() {
        let (_dir, stores) = temp_stores(ClusterTopology::Single).await;
        let err = create_from_template(
            &stores,
            CreateFromTemplateRequest {
                template_id: 99,
                user_id: "student".to_string(),
                custom_name: None,
                course_id: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LifecycleError::TemplateNotFound(99)));
    }
}

//! # Project Retrieval Service
//!
//! Lookup, listing and deletion of working projects, plus the project record
//! query. Deleting a project also removes the records written for it.

use crate::lifecycle::manage::{delete_project, get_project, list_owned_projects};
use crate::services::{lifecycle_failure, store_failure};
use crate::store::Stores;
use actix_web::{web, HttpResponse, Responder};
use common::requests::ProjectRecordsQuery;

/// Actix web handler for `GET /api/projects/{id}`.
///
/// # Arguments
/// * `id` - The project's document id, from the URL path.
///
/// # Returns
/// - `200 OK` with the `Project` as JSON.
/// - `404 Not Found` if no working project has that id.
/// - `503 Service Unavailable` if the document store fails.
pub(crate) async fn process(stores: web::Data<Stores>, id: web::Path<String>) -> impl Responder {
    match get_project(&stores.documents, &id).await {
        Ok(project) => HttpResponse::Ok().json(project),
        Err(e) => lifecycle_failure(e),
    }
}

/// `GET /api/projects/owner/{user_id}`
pub(crate) async fn list_by_owner(
    stores: web::Data<Stores>,
    user_id: web::Path<String>,
) -> impl Responder {
    match list_owned_projects(&stores.documents, &user_id).await {
        Ok(projects) => HttpResponse::Ok().json(projects),
        Err(e) => lifecycle_failure(e),
    }
}

/// `GET /api/projects/records/{user_id}`
pub(crate) async fn list_records(
    stores: web::Data<Stores>,
    user_id: web::Path<String>,
    query: web::Query<ProjectRecordsQuery>,
) -> impl Responder {
    match stores
        .relational
        .list_project_records(&user_id, query.course_id)
        .await
    {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => store_failure(e),
    }
}

/// `DELETE /api/projects/{id}/{user_id}`
pub(crate) async fn remove(
    stores: web::Data<Stores>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (id, user_id) = path.into_inner();
    match delete_project(&stores.documents, &stores.relational, &id, &user_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => lifecycle_failure(e),
    }
}

//! # Project Save Service
//!
//! Backend logic for `POST /api/projects/save`. Only the file list of the stored
//! project is replaced and its modification time bumped; name, owner and
//! creation time stay as stored. An owned project is saved by its owner only,
//! an anonymous project only anonymously.

use crate::lifecycle::manage::save_project;
use crate::services::lifecycle_failure;
use crate::store::Stores;
use actix_web::{web, HttpResponse, Responder};
use common::requests::SaveProjectRequest;

/// Actix web handler for `POST /api/projects/save`.
///
/// # Arguments
/// * `stores` - Both stores, shared application state.
/// * `payload` - `SaveProjectRequest` with the project and the acting user.
///
/// # Returns
/// - `200 OK` with the saved `Project` as JSON.
/// - `403 Forbidden` if the acting user does not own the project.
/// - `404 Not Found` if the project does not exist.
/// - `503 Service Unavailable` if the document store fails.
pub(crate) async fn process(
    stores: web::Data<Stores>,
    payload: web::Json<SaveProjectRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    match save_project(
        &stores.documents,
        &request.project,
        request.acting_user_id.as_deref(),
    )
    .await
    {
        Ok(project) => HttpResponse::Ok().json(project),
        Err(e) => lifecycle_failure(e),
    }
}

//! # Directory Import Service
//!
//! Backend logic for `POST /api/projects/import`: a directory on the server
//! becomes a new working project. Every file and directory under the root is
//! flattened into one entry, text stored as-is and binary content as Base64.
//! A failed walk removes the half-built project again.

use crate::lifecycle;
use crate::services::lifecycle_failure;
use crate::store::Stores;
use actix_web::{web, HttpResponse, Responder};
use common::requests::ImportDirectoryRequest;
use std::path::Path;

/// Actix web handler for `POST /api/projects/import`.
///
/// # Arguments
/// * `stores` - Both stores, shared application state.
/// * `payload` - `ImportDirectoryRequest` with the root path and an optional owner.
///
/// # Returns
/// - `200 OK` with the imported `Project` as JSON.
/// - `404 Not Found` if the root directory does not exist.
/// - `503 Service Unavailable` on I/O or store failures.
pub(crate) async fn process(
    stores: web::Data<Stores>,
    payload: web::Json<ImportDirectoryRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    match lifecycle::create_project_from_directory(
        &stores.documents,
        Path::new(&request.root_path),
        request.user_id,
    )
    .await
    {
        Ok(project) => HttpResponse::Ok().json(project),
        Err(e) => lifecycle_failure(e),
    }
}

//! # Universal Template Endpoints
//!
//! Universal templates belong to no course. They are promoted from an
//! existing project, optionally with a second project as instructions, or
//! built from a `files/` + `instructions/` directory on the server.

use crate::error::PromotionError;
use crate::lifecycle::manage::get_project;
use crate::promotion;
use crate::services::promotion_failure;
use crate::store::Stores;
use actix_web::{web, HttpResponse, Responder};
use common::model::template::Template;
use common::requests::{ImportTemplateRequest, UniversalTemplateRequest};
use std::path::Path;

/// `POST /api/templates/universal`
///
/// # Arguments
/// * `payload` - the project to promote, a description and an optional
///   instructions project id.
///
/// # Returns
/// - `200 OK` with the new universal `Template`.
/// - `404 Not Found` if the project or the instructions project is missing.
/// - `503 Service Unavailable` on a store failure.
pub(crate) async fn process(
    stores: web::Data<Stores>,
    payload: web::Json<UniversalTemplateRequest>,
) -> impl Responder {
    match create_universal(&stores, payload.into_inner()).await {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => promotion_failure(e),
    }
}

async fn create_universal(
    stores: &Stores,
    request: UniversalTemplateRequest,
) -> Result<Template, PromotionError> {
    let project = get_project(&stores.documents, &request.project_id).await?;
    let instructions = match &request.instructions_project_id {
        Some(id) => Some(get_project(&stores.documents, id).await?),
        None => None,
    };
    promotion::create_universal_template(
        stores,
        &project,
        &request.description,
        instructions.as_ref(),
    )
    .await
}

/// `GET /api/templates/universal`
pub(crate) async fn list(stores: web::Data<Stores>) -> impl Responder {
    match promotion::list_universal_templates(&stores.relational).await {
        Ok(templates) => HttpResponse::Ok().json(templates),
        Err(e) => promotion_failure(e),
    }
}

/// `POST /api/templates/import`
///
/// Returns `404 Not Found` when the directory or its `files/` subdirectory
/// does not exist.
pub(crate) async fn import(
    stores: web::Data<Stores>,
    payload: web::Json<ImportTemplateRequest>,
) -> impl Responder {
    match promotion::import_template_directory(
        &stores,
        Path::new(&payload.template_dir),
        &payload.description,
    )
    .await
    {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => promotion_failure(e),
    }
}

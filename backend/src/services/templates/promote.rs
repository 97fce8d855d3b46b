//! # Template Promotion Service
//!
//! Backend logic for `POST /api/templates/promote` and
//! `POST /api/templates/promote-new`.
//!
//! ## Workflow
//!
//! 1.  **HTTP Request**: the handler receives the project (by id, or whole for
//!     `promote-new`) and the target course id.
//!
//! 2.  **Promotion**: the project is moved from the working collection into the
//!     template collection, a template row is written and linked to the course.
//!     `promote-new` first stores the project and also writes a project record.
//!
//! 3.  **Consistency**: on a replicated document store the whole move runs in one
//!     transaction per store and any failure undoes both. On a single node each
//!     step commits by itself and a late failure leaves the earlier steps applied.
//!
//! 4.  **HTTP Response**: the created `Template` row as JSON, `404 Not Found` for a
//!     missing project or course, `503 Service Unavailable` for store failures.

use crate::promotion;
use crate::services::promotion_failure;
use crate::store::Stores;
use actix_web::{web, HttpResponse, Responder};
use common::requests::{PromoteNewProjectRequest, PromoteProjectRequest};

/// Actix web handler for `POST /api/templates/promote`.
///
/// # Arguments
/// * `stores` - Both stores, shared application state.
/// * `payload` - `PromoteProjectRequest` with the project id and course id.
///
/// # Returns
/// - `200 OK` with the new `Template` as JSON.
/// - `404 Not Found` if the project or the course does not exist.
/// - `503 Service Unavailable` if a store fails.
pub(crate) async fn process(
    stores: web::Data<Stores>,
    payload: web::Json<PromoteProjectRequest>,
) -> impl Responder {
    match promotion::promote_project_to_template(&stores, &payload.project_id, payload.course_id)
        .await
    {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => promotion_failure(e),
    }
}

/// Actix web handler for `POST /api/templates/promote-new`.
///
/// The project is stored before promotion starts; if promotion then fails it
/// stays in the working collection.
pub(crate) async fn process_new(
    stores: web::Data<Stores>,
    payload: web::Json<PromoteNewProjectRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    match promotion::promote_new_project_to_template(&stores, request.project, request.course_id)
        .await
    {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => promotion_failure(e),
    }
}

//! # Template Retrieval Service
//!
//! Serves template rows from the relational store. The frozen project source
//! stays in the template collection and is only read when a project is
//! instantiated from it.

use crate::lifecycle::manage::list_projects_from_template;
use crate::services::{lifecycle_failure, store_failure};
use crate::store::Stores;
use actix_web::{web, HttpResponse, Responder};

/// `GET /api/templates/{template_id}`
///
/// # Returns
/// - `200 OK` with the `Template` row as JSON.
/// - `404 Not Found` if no template has that id.
/// - `503 Service Unavailable` if the relational store fails.
pub(crate) async fn process(
    stores: web::Data<Stores>,
    template_id: web::Path<i64>,
) -> impl Responder {
    let template_id = template_id.into_inner();
    match stores.relational.find_template(template_id).await {
        Ok(Some(template)) => HttpResponse::Ok().json(template),
        Ok(None) => HttpResponse::NotFound().body(format!("template {} not found", template_id)),
        Err(e) => store_failure(e),
    }
}

/// `GET /api/templates/course/{course_id}`
pub(crate) async fn by_course(
    stores: web::Data<Stores>,
    course_id: web::Path<i64>,
) -> impl Responder {
    match stores.relational.list_course_templates(course_id.into_inner()).await {
        Ok(templates) => HttpResponse::Ok().json(templates),
        Err(e) => store_failure(e),
    }
}

/// `GET /api/templates/instructions/{instructions_id}`
pub(crate) async fn instructions(
    stores: web::Data<Stores>,
    instructions_id: web::Path<String>,
) -> impl Responder {
    match stores.relational.find_instructions(&instructions_id).await {
        Ok(Some(instructions)) => HttpResponse::Ok().json(instructions),
        Ok(None) => HttpResponse::NotFound()
            .body(format!("instructions {} not found", instructions_id.as_str())),
        Err(e) => store_failure(e),
    }
}

/// `GET /api/templates/{template_id}/projects/{user_id}`
///
/// The working projects of one user that were created from the template.
pub(crate) async fn projects_of_user(
    stores: web::Data<Stores>,
    path: web::Path<(i64, String)>,
) -> impl Responder {
    let (template_id, user_id) = path.into_inner();
    match list_projects_from_template(&stores.documents, &stores.relational, template_id, &user_id)
        .await
    {
        Ok(projects) => HttpResponse::Ok().json(projects),
        Err(e) => lifecycle_failure(e),
    }
}

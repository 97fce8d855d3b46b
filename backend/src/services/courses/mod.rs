//! # Course Service Module
//!
//! Minimal course management so templates have something to be linked to.

use crate::services::store_failure;
use crate::store::Stores;
use actix_web::web::{get, post, scope};
use actix_web::{web, HttpResponse, Responder, Scope};
use common::requests::CreateCourseRequest;

const API_PATH: &str = "/api/courses";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create))
        .route("/{course_id}", get().to(process))
}

async fn create(
    stores: web::Data<Stores>,
    payload: web::Json<CreateCourseRequest>,
) -> impl Responder {
    match stores
        .relational
        .insert_course(&payload.name, &payload.description, None)
        .await
    {
        Ok(course) => HttpResponse::Created().json(course),
        Err(e) => store_failure(e),
    }
}

async fn process(stores: web::Data<Stores>, course_id: web::Path<i64>) -> impl Responder {
    let course_id = course_id.into_inner();
    match stores.relational.find_course(course_id, None).await {
        Ok(Some(course)) => HttpResponse::Ok().json(course),
        Ok(None) => HttpResponse::NotFound().body(format!("course {} not found", course_id)),
        Err(e) => store_failure(e),
    }
}

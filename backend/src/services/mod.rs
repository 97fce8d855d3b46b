//! # HTTP Services
//!
//! Thin actix-web adapters over the lifecycle and promotion operations. Each
//! handler is a `process` function that runs one operation and maps its
//! result to a response:
//!
//! - `404 Not Found` for a missing project, template, course or directory.
//! - `403 Forbidden` for an ownership mismatch.
//! - `503 Service Unavailable` for anything the stores report.

pub mod courses;
pub mod projects;
pub mod templates;

use crate::error::{LifecycleError, PromotionError, StoreError};
use actix_web::HttpResponse;
use log::error;

pub(crate) fn store_failure(e: StoreError) -> HttpResponse {
    error!("store failure: {}", e);
    HttpResponse::ServiceUnavailable().body(e.to_string())
}

pub(crate) fn lifecycle_failure(e: LifecycleError) -> HttpResponse {
    match e {
        LifecycleError::DirectoryNotFound(_)
        | LifecycleError::TemplateNotFound(_)
        | LifecycleError::TemplateProjectNotFound(_)
        | LifecycleError::ProjectNotFound(_) => HttpResponse::NotFound().body(e.to_string()),
        LifecycleError::Forbidden(_) => HttpResponse::Forbidden().body(e.to_string()),
        LifecycleError::MissingId => HttpResponse::BadRequest().body(e.to_string()),
        LifecycleError::Store(e) => store_failure(e),
        LifecycleError::Io(_) | LifecycleError::Walk(_) => {
            error!("import failure: {}", e);
            HttpResponse::ServiceUnavailable().body(e.to_string())
        }
    }
}

pub(crate) fn promotion_failure(e: PromotionError) -> HttpResponse {
    match e {
        PromotionError::ProjectNotFound(_) | PromotionError::CourseNotFound(_) => {
            HttpResponse::NotFound().body(e.to_string())
        }
        PromotionError::Lifecycle(e) => lifecycle_failure(e),
        PromotionError::Store(e) => store_failure(e),
    }
}

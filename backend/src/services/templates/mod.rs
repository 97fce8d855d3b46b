//! # Template Service Module
//!
//! Routes under `/api/templates`. Promotion entry points move a project into
//! the template collection; the read routes serve template rows.
//!
//! ## Sub-modules:
//! - `promote`: course promotion of an existing or a brand-new project.
//! - `universal`: universal templates, created from a project or imported
//!   from a directory, and their listing.
//! - `get`: template by id and templates of a course.

mod get;
mod promote;
mod universal;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`POST /promote`**: moves an existing project into a course template.
/// *   **`POST /promote-new`**: stores a new project, records it and promotes
///     it into a course template.
/// *   **`POST /universal`**: promotes an existing project to a universal
///     template, optionally with an instructions project.
/// *   **`POST /import`**: builds a universal template from a
///     `files/` + `instructions/` directory on the server.
/// *   **`GET /universal`**: every universal template.
/// *   **`GET /course/{course_id}`**: templates linked to a course.
/// *   **`GET /instructions/{instructions_id}`**: an instructions resource.
/// *   **`GET /{template_id}/projects/{user_id}`**: the user's projects
///     created from the template.
/// *   **`GET /{template_id}`**: one template row.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/promote", post().to(promote::process))
        .route("/promote-new", post().to(promote::process_new))
        .route("/universal", post().to(universal::process))
        .route("/universal", get().to(universal::list))
        .route("/import", post().to(universal::import))
        .route("/course/{course_id}", get().to(get::by_course))
        .route("/instructions/{instructions_id}", get().to(get::instructions))
        .route("/{template_id}/projects/{user_id}", get().to(get::projects_of_user))
        .route("/{template_id}", get().to(get::process))
}

//! # Project Service Module
//!
//! Routes under `/api/projects`: directory import, instantiation from a
//! template, save, lookup, listing, deletion and the project record query.

mod from_template;
mod get;
mod import;
mod save;

use actix_web::web::{delete, get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/projects";

/// Configures the `/api/projects` scope.
///
/// *   **`POST /import`**: builds a project from a server-side directory.
/// *   **`POST /from-template`**: copies a template into a new owned project
///     and records its creation.
/// *   **`POST /save`**: replaces the files of an existing project.
/// *   **`GET /owner/{user_id}`**: every project of one owner.
/// *   **`GET /records/{user_id}`**: project records of one user, optionally
///     narrowed with `?course_id=`.
/// *   **`GET /{id}`** and **`DELETE /{id}/{user_id}`**.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/import", post().to(import::process))
        .route("/from-template", post().to(from_template::process))
        .route("/save", post().to(save::process))
        .route("/owner/{user_id}", get().to(get::list_by_owner))
        .route("/records/{user_id}", get().to(get::list_records))
        .route("/{id}", get().to(get::process))
        .route("/{id}/{user_id}", delete().to(get::remove))
}

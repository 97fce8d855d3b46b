//! # Template Promotion
//!
//! Turns working projects into templates across both stores. Three entry
//! points share one step sequence (see `protocol`):
//!
//! - `promote_project_to_template`: existing project, linked to a course.
//! - `promote_new_project_to_template`: stores the project first and writes a
//!   project record for it.
//! - `create_universal_template`: no course link, flagged universal, with
//!   optional instructions.
//!
//! `import_template_directory` builds a universal template straight from a
//! `files/` + `instructions/` directory layout.

pub mod course;
mod protocol;
pub mod universal;

pub use course::{promote_new_project_to_template, promote_project_to_template};
pub use universal::{create_universal_template, import_template_directory, list_universal_templates};

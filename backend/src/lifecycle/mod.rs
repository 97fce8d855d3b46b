//! # Project Lifecycle
//!
//! Materializes and maintains projects in the working collection:
//!
//! - `directory`: builds a project from a directory tree, classifying each
//!   file as text or binary.
//! - `from_template`: copies a template's frozen source into a new project,
//!   moving every path onto the new project id.
//! - `manage`: save, delete, lookup and project records.
//!
//! Every write goes through the document store without a session.

pub mod directory;
pub mod from_template;
pub mod manage;

pub use directory::create_project_from_directory;
pub use from_template::create_project_from_template;

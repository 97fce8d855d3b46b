//! Error types for the store adapters, the project lifecycle and the
//! promotion protocol.
//!
//! Store adapters never retry. They surface a `StoreError` and leave rollback
//! decisions to the caller that owns the transaction scope.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("document {id} already exists in collection {collection}")]
    DuplicateKey { collection: String, id: String },

    #[error("unknown cluster topology '{0}'")]
    UnknownTopology(String),

    #[error("connection lock poisoned")]
    Poisoned,

    #[error("session already finished")]
    SessionFinished,

    #[error("blocking store task failed: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("the directory '{}' does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("template {0} not found")]
    TemplateNotFound(i64),

    #[error("template project {0} not found in the template collection")]
    TemplateProjectNotFound(String),

    #[error("project {0} not found")]
    ProjectNotFound(String),

    #[error("not allowed to modify project {0}")]
    Forbidden(String),

    #[error("project has no identifier")]
    MissingId,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum PromotionError {
    #[error("project {0} not found in the working collection")]
    ProjectNotFound(String),

    #[error("course {0} not found")]
    CourseNotFound(i64),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

//! Builds a project from a directory tree on disk.
//!
//! The project is inserted blank first so the store hands out its id, then
//! every file and directory under the root becomes one flat `ProjectFile`
//! with the path `/{project_id}/{relative_path}`, and the populated project
//! replaces the blank one.

use crate::error::LifecycleError;
use crate::store::documents::{Collection, DocumentStore};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common::model::project::{Project, ProjectFile};
use log::{info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How many leading bytes are inspected for a zero byte.
const SNIFF_LEN: usize = 8000;

/// Extensions that are always treated as text, whatever their bytes.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "html", "htm", "css", "js", "mjs", "ts", "json", "xml", "svg", "csv", "yml",
    "yaml", "toml", "ini", "properties", "java", "py", "c", "h", "cpp", "hpp", "cs", "rs", "go",
    "kt", "gradle", "sh", "bat", "sql", "gitignore",
];

pub fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            TEXT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// A file is binary unless its extension is a known text one or its first
/// `SNIFF_LEN` bytes contain no zero byte.
pub fn is_binary(path: &Path, bytes: &[u8]) -> bool {
    if has_text_extension(path) {
        return false;
    }
    bytes.iter().take(SNIFF_LEN).any(|b| *b == 0)
}

/// Encodes one file's bytes. Text that is not valid UTF-8 falls back to
/// Base64 so no bytes are lost.
pub fn encode_file(project_path: String, source: &Path, bytes: Vec<u8>) -> ProjectFile {
    if is_binary(source, &bytes) {
        return ProjectFile::binary(project_path, BASE64.encode(bytes));
    }
    match String::from_utf8(bytes) {
        Ok(text) => ProjectFile::text(project_path, text),
        Err(e) => ProjectFile::binary(project_path, BASE64.encode(e.into_bytes())),
    }
}

enum Entry {
    Directory { relative: String },
    File { relative: String, source: PathBuf },
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Flattens the tree under `root` into project files owned by `project_id`.
///
/// Symlinks are followed, so a linked directory is imported like a real one.
/// A link cycle or a dangling link fails the walk.
pub fn build_project_files(root: &Path, project_id: &str) -> Result<Vec<ProjectFile>, LifecycleError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = relative_path(root, entry.path());
        if entry.file_type().is_dir() {
            entries.push(Entry::Directory { relative });
        } else {
            entries.push(Entry::File {
                relative,
                source: entry.into_path(),
            });
        }
    }

    entries
        .into_par_iter()
        .map(|entry| -> Result<ProjectFile, LifecycleError> {
            match entry {
                Entry::Directory { relative } => {
                    Ok(ProjectFile::directory(format!("/{project_id}/{relative}")))
                }
                Entry::File { relative, source } => {
                    let bytes = fs::read(&source)?;
                    Ok(encode_file(format!("/{project_id}/{relative}"), &source, bytes))
                }
            }
        })
        .collect()
}

/// Creates a project named after the root directory.
pub async fn create_project_from_directory(
    store: &DocumentStore,
    root: &Path,
    owner: Option<String>,
) -> Result<Project, LifecycleError> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    create_named_project_from_directory(store, root, owner, name).await
}

pub(crate) async fn create_named_project_from_directory(
    store: &DocumentStore,
    root: &Path,
    owner: Option<String>,
    name: String,
) -> Result<Project, LifecycleError> {
    if !root.is_dir() {
        return Err(LifecycleError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut project = Project::new(name, owner);
    store.insert_one(Collection::Projects, &mut project, None).await?;
    let project_id = project.id.clone().ok_or(LifecycleError::MissingId)?;

    let walk_root = root.to_path_buf();
    let walk_id = project_id.clone();
    let built = tokio::task::spawn_blocking(move || build_project_files(&walk_root, &walk_id))
        .await
        .map_err(|e| LifecycleError::Io(std::io::Error::other(e)))
        .and_then(|files| files);
    project.files = match built {
        Ok(files) => files,
        Err(e) => {
            warn!(
                "Import of {} failed, removing blank project {}: {}",
                root.display(),
                project_id,
                e
            );
            store.delete_one(Collection::Projects, &project_id, None).await?;
            return Err(e);
        }
    };
    project.touch();

    if !store
        .replace_one(Collection::Projects, &project_id, &project, None)
        .await?
    {
        return Err(LifecycleError::ProjectNotFound(project_id));
    }

    info!(
        "Created project {} from {} with {} entries",
        project_id,
        root.display(),
        project.files.len()
    );
    Ok(project)
}

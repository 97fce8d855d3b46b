//! Document store holding project file trees.
//!
//! Projects are stored whole, as JSON documents, in one of two logical
//! collections: the working collection of editable projects and the
//! template collection of frozen template sources. Every operation takes an
//! optional `DocumentSession`; `None` commits on its own.

use crate::error::StoreError;
use crate::store::capability::ClusterTopology;
use crate::store::session::{is_duplicate_key, open_connection, run_blocking, Handle, Session};
use common::model::project::Project;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS deployment (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    topology TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    owner TEXT,
    body TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);
CREATE INDEX IF NOT EXISTS documents_owner ON documents (collection, owner);
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Active, editable projects.
    Projects,
    /// Frozen template sources.
    TemplateProjects,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Projects => "Projects",
            Self::TemplateProjects => "TemplateProjects",
        }
    }
}

/// A multi-document transaction on the document store.
pub struct DocumentSession(Session);

impl DocumentSession {
    pub async fn commit(self) -> Result<(), StoreError> {
        self.0.commit().await
    }

    pub async fn abort(self) -> Result<(), StoreError> {
        self.0.abort().await
    }

    pub(crate) fn into_session(self) -> Session {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    /// Opens (creating if needed) the store at `path` and records the
    /// topology it reports to the capability detector.
    pub async fn open(
        path: impl Into<PathBuf>,
        topology: ClusterTopology,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let init_path = path.clone();
        run_blocking(move || {
            let conn = open_connection(&init_path)?;
            conn.execute_batch(SCHEMA_SQL)?;
            conn.execute(
                "INSERT INTO deployment (id, topology) VALUES (1, ?1)
                 ON CONFLICT(id) DO UPDATE SET topology = excluded.topology",
                params![topology.as_str()],
            )?;
            Ok(())
        })
        .await?;

        Ok(Self { path })
    }

    fn handle(&self, session: Option<&DocumentSession>) -> Handle {
        match session {
            Some(session) => session.0.handle(),
            None => Handle::Fresh(self.path.clone()),
        }
    }

    /// The topology this deployment reports. A store with no recorded
    /// topology is treated as a single node.
    pub async fn topology(&self) -> Result<ClusterTopology, StoreError> {
        let raw: Option<String> = self
            .handle(None)
            .run(|conn| {
                Ok(conn
                    .query_row("SELECT topology FROM deployment WHERE id = 1", [], |row| {
                        row.get(0)
                    })
                    .optional()?)
            })
            .await?;

        match raw {
            None => Ok(ClusterTopology::Single),
            Some(raw) => ClusterTopology::parse(&raw).ok_or(StoreError::UnknownTopology(raw)),
        }
    }

    pub async fn start_session(&self) -> Result<DocumentSession, StoreError> {
        Ok(DocumentSession(Session::begin(self.path.clone()).await?))
    }

    pub async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
        session: Option<&DocumentSession>,
    ) -> Result<Option<Project>, StoreError> {
        let id = id.to_string();
        self.handle(session)
            .run(move |conn| {
                let body: Option<String> = conn
                    .query_row(
                        "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                        params![collection.as_str(), id],
                        |row| row.get(0),
                    )
                    .optional()?;
                body.map(|body| decode(id, &body)).transpose()
            })
            .await
    }

    /// Inserts `project`, assigning a fresh identifier when it has none.
    ///
    /// A project that already carries an identifier keeps it, which is how a
    /// document moves between collections under the same id.
    pub async fn insert_one(
        &self,
        collection: Collection,
        project: &mut Project,
        session: Option<&DocumentSession>,
    ) -> Result<(), StoreError> {
        let id = project
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let mut document = project.clone();
        document.id = Some(id.clone());
        let body = serde_json::to_string(&document)?;
        let owner = document.user_id.clone();
        let insert_id = id.clone();

        self.handle(session)
            .run(move |conn| insert(conn, collection, &insert_id, owner.as_deref(), &body))
            .await?;

        project.id = Some(id);
        Ok(())
    }

    /// Replaces the document stored under `id`. Returns `false` when no such
    /// document exists. The stored id always stays `id`.
    pub async fn replace_one(
        &self,
        collection: Collection,
        id: &str,
        project: &Project,
        session: Option<&DocumentSession>,
    ) -> Result<bool, StoreError> {
        let mut document = project.clone();
        document.id = Some(id.to_string());
        let body = serde_json::to_string(&document)?;
        let owner = document.user_id.clone();
        let id = id.to_string();

        self.handle(session)
            .run(move |conn| {
                let changed = conn.execute(
                    "UPDATE documents SET owner = ?3, body = ?4 WHERE collection = ?1 AND id = ?2",
                    params![collection.as_str(), id, owner, body],
                )?;
                Ok(changed > 0)
            })
            .await
    }

    /// Deletes the document stored under `id`. Returns `false` when no such
    /// document exists.
    pub async fn delete_one(
        &self,
        collection: Collection,
        id: &str,
        session: Option<&DocumentSession>,
    ) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.handle(session)
            .run(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection.as_str(), id],
                )?;
                Ok(deleted > 0)
            })
            .await
    }

    pub async fn find_by_owner(
        &self,
        collection: Collection,
        owner: &str,
    ) -> Result<Vec<Project>, StoreError> {
        let owner = owner.to_string();
        self.handle(None)
            .run(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, body FROM documents WHERE collection = ?1 AND owner = ?2 ORDER BY rowid",
                )?;
                let rows = stmt
                    .query_map(params![collection.as_str(), owner], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                rows.into_iter()
                    .map(|(id, body)| decode(id, &body))
                    .collect()
            })
            .await
    }

    #[cfg(test)]
    pub async fn count(
        &self,
        collection: Collection,
        session: Option<&DocumentSession>,
    ) -> Result<u64, StoreError> {
        self.handle(session)
            .run(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                    params![collection.as_str()],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
    }
}

fn insert(
    conn: &Connection,
    collection: Collection,
    id: &str,
    owner: Option<&str>,
    body: &str,
) -> Result<(), StoreError> {
    match conn.execute(
        "INSERT INTO documents (collection, id, owner, body) VALUES (?1, ?2, ?3, ?4)",
        params![collection.as_str(), id, owner, body],
    ) {
        Ok(_) => Ok(()),
        Err(e) if is_duplicate_key(&e) => Err(StoreError::DuplicateKey {
            collection: collection.as_str().to_string(),
            id: id.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn decode(id: String, body: &str) -> Result<Project, StoreError> {
    let mut project: Project = serde_json::from_str(body)?;
    project.id = Some(id);
    Ok(project)
}

//! Relational store for template metadata, course links, project records and
//! instructions.
//!
//! Writes are not retried here. When a `RelationalTransaction` is passed the
//! write joins it; otherwise it commits immediately.

use crate::error::StoreError;
use crate::store::session::{is_duplicate_key, open_connection, run_blocking, Handle, Session};
use common::model::course::{Course, NewProjectRecord, ProjectRecord};
use common::model::instructions::{Instructions, InstructionsKind};
use common::model::template::{CourseTemplate, NewTemplate, Template};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS courses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS instructions (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    location TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    mongo_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    is_universal INTEGER,
    allow_anonymous_access INTEGER,
    instructions_id TEXT REFERENCES instructions(id) ON DELETE SET NULL
);
CREATE TABLE IF NOT EXISTS course_templates (
    course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    template_id INTEGER NOT NULL REFERENCES templates(id) ON DELETE CASCADE,
    PRIMARY KEY (course_id, template_id)
);
CREATE TABLE IF NOT EXISTS template_projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    template_id INTEGER NOT NULL REFERENCES templates(id) ON DELETE CASCADE,
    project_mongo_id TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS template_projects_template ON template_projects (template_id);
CREATE TABLE IF NOT EXISTS project_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    mongo_id TEXT NOT NULL,
    user_id TEXT,
    course_id INTEGER,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS project_records_user ON project_records (user_id, course_id);
"#;

const TEMPLATE_COLUMNS: &str =
    "t.id, t.mongo_id, t.name, t.description, t.is_universal, t.allow_anonymous_access, t.instructions_id";

/// A transaction on the relational store.
pub struct RelationalTransaction(Session);

impl RelationalTransaction {
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
pub struct RelationalStore {
    path: PathBuf,
}

impl RelationalStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let init_path = path.clone();
        run_blocking(move || {
            let conn = open_connection(&init_path)?;
            conn.execute_batch(SCHEMA_SQL)?;
            Ok(())
        })
        .await?;

        Ok(Self { path })
    }

    fn handle(&self, tx: Option<&RelationalTransaction>) -> Handle {
        match tx {
            Some(tx) => tx.0.handle(),
            None => Handle::Fresh(self.path.clone()),
        }
    }

    pub async fn begin(&self) -> Result<RelationalTransaction, StoreError> {
        Ok(RelationalTransaction(Session::begin(self.path.clone()).await?))
    }

    // ─────────────────────────────────────────────────────────────────────
    // courses
    // ─────────────────────────────────────────────────────────────────────

    pub async fn insert_course(
        &self,
        name: &str,
        description: &str,
        tx: Option<&RelationalTransaction>,
    ) -> Result<Course, StoreError> {
        let name = name.to_string();
        let description = description.to_string();
        self.handle(tx)
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO courses (name, description) VALUES (?1, ?2)",
                    params![name, description],
                )?;
                Ok(Course {
                    id: conn.last_insert_rowid(),
                    name,
                    description,
                })
            })
            .await
    }

    pub async fn find_course(
        &self,
        id: i64,
        tx: Option<&RelationalTransaction>,
    ) -> Result<Option<Course>, StoreError> {
        self.handle(tx)
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT id, name, description FROM courses WHERE id = ?1",
                        params![id],
                        |row| {
                            Ok(Course {
                                id: row.get(0)?,
                                name: row.get(1)?,
                                description: row.get(2)?,
                            })
                        },
                    )
                    .optional()?)
            })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // templates
    // ─────────────────────────────────────────────────────────────────────

    /// Inserts a template row. A second row for the same document id is
    /// rejected as a duplicate.
    pub async fn insert_template(
        &self,
        template: &NewTemplate,
        tx: Option<&RelationalTransaction>,
    ) -> Result<Template, StoreError> {
        let template = template.clone();
        self.handle(tx)
            .run(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO templates
                        (mongo_id, name, description, is_universal, allow_anonymous_access, instructions_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        template.mongo_id,
                        template.name,
                        template.description,
                        template.is_universal,
                        template.allow_anonymous_access,
                        template.instructions_id
                    ],
                );
                match inserted {
                    Ok(_) => {}
                    Err(e) if is_duplicate_key(&e) => {
                        return Err(StoreError::DuplicateKey {
                            collection: "templates".to_string(),
                            id: template.mongo_id,
                        });
                    }
                    Err(e) => return Err(e.into()),
                }

                Ok(Template {
                    id: conn.last_insert_rowid(),
                    mongo_id: template.mongo_id,
                    name: template.name,
                    description: template.description,
                    is_universal: template.is_universal,
                    allow_anonymous_access: template.allow_anonymous_access,
                    instructions_id: template.instructions_id,
                })
            })
            .await
    }

    pub async fn find_template(&self, id: i64) -> Result<Option<Template>, StoreError> {
        self.handle(None)
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {TEMPLATE_COLUMNS} FROM templates t WHERE t.id = ?1"),
                        params![id],
                        template_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    #[cfg(test)]
    pub async fn find_template_by_mongo_id(
        &self,
        mongo_id: &str,
    ) -> Result<Option<Template>, StoreError> {
        let mongo_id = mongo_id.to_string();
        self.handle(None)
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {TEMPLATE_COLUMNS} FROM templates t WHERE t.mongo_id = ?1"),
                        params![mongo_id],
                        template_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    pub async fn list_universal_templates(&self) -> Result<Vec<Template>, StoreError> {
        self.handle(None)
            .run(|conn| {
                query_templates(
                    conn,
                    &format!(
                        "SELECT {TEMPLATE_COLUMNS} FROM templates t WHERE t.is_universal = 1 ORDER BY t.id"
                    ),
                    params![],
                )
            })
            .await
    }

    pub async fn list_course_templates(&self, course_id: i64) -> Result<Vec<Template>, StoreError> {
        self.handle(None)
            .run(move |conn| {
                query_templates(
                    conn,
                    &format!(
                        "SELECT {TEMPLATE_COLUMNS} FROM templates t
                         JOIN course_templates ct ON ct.template_id = t.id
                         WHERE ct.course_id = ?1 ORDER BY t.id"
                    ),
                    params![course_id],
                )
            })
            .await
    }

    /// Deletes a template row; its course links go with it.
    pub async fn delete_template(
        &self,
        id: i64,
        tx: Option<&RelationalTransaction>,
    ) -> Result<bool, StoreError> {
        self.handle(tx)
            .run(move |conn| Ok(conn.execute("DELETE FROM templates WHERE id = ?1", params![id])? > 0))
            .await
    }

    /// Removes a committed template row and the project records of its
    /// document in one blocking call. Used to undo a promotion whose document
    /// side failed to commit.
    pub(crate) fn undo_template_blocking(&self, template_id: i64, mongo_id: &str) -> Result<(), StoreError> {
        let conn = open_connection(&self.path)?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM templates WHERE id = ?1", params![template_id])?;
        tx.execute("DELETE FROM project_records WHERE mongo_id = ?1", params![mongo_id])?;
        tx.commit()?;
        Ok(())
    }

    pub async fn insert_course_template(
        &self,
        link: CourseTemplate,
        tx: Option<&RelationalTransaction>,
    ) -> Result<(), StoreError> {
        self.handle(tx)
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO course_templates (course_id, template_id) VALUES (?1, ?2)",
                    params![link.course_id, link.template_id],
                )?;
                Ok(())
            })
            .await
    }

    /// Remembers that the working project `project_mongo_id` was created
    /// from `template_id`.
    pub async fn insert_template_project(
        &self,
        template_id: i64,
        project_mongo_id: &str,
        tx: Option<&RelationalTransaction>,
    ) -> Result<(), StoreError> {
        let project_mongo_id = project_mongo_id.to_string();
        self.handle(tx)
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO template_projects (template_id, project_mongo_id) VALUES (?1, ?2)",
                    params![template_id, project_mongo_id],
                )?;
                Ok(())
            })
            .await
    }

    /// Document ids of every project created from `template_id`, oldest first.
    pub async fn list_template_project_ids(&self, template_id: i64) -> Result<Vec<String>, StoreError> {
        self.handle(None)
            .run(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT project_mongo_id FROM template_projects WHERE template_id = ?1 ORDER BY id",
                )?;
                let ids = stmt
                    .query_map(params![template_id], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(ids)
            })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // project records
    // ─────────────────────────────────────────────────────────────────────

    pub async fn insert_project_record(
        &self,
        record: &NewProjectRecord,
        tx: Option<&RelationalTransaction>,
    ) -> Result<ProjectRecord, StoreError> {
        let record = record.clone();
        self.handle(tx)
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO project_records (mongo_id, user_id, course_id, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![record.mongo_id, record.user_id, record.course_id, record.created_at],
                )?;
                Ok(ProjectRecord {
                    id: conn.last_insert_rowid(),
                    mongo_id: record.mongo_id,
                    user_id: record.user_id,
                    course_id: record.course_id,
                    created_at: record.created_at,
                })
            })
            .await
    }

    /// Records created by `user_id`, optionally narrowed to one course.
    pub async fn list_project_records(
        &self,
        user_id: &str,
        course_id: Option<i64>,
    ) -> Result<Vec<ProjectRecord>, StoreError> {
        let user_id = user_id.to_string();
        self.handle(None)
            .run(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, mongo_id, user_id, course_id, created_at FROM project_records
                     WHERE user_id = ?1 AND (?2 IS NULL OR course_id = ?2)
                     ORDER BY id",
                )?;
                let records = stmt
                    .query_map(params![user_id, course_id], |row| {
                        Ok(ProjectRecord {
                            id: row.get(0)?,
                            mongo_id: row.get(1)?,
                            user_id: row.get(2)?,
                            course_id: row.get(3)?,
                            created_at: row.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
    }

    /// Deletes the records of a document. With `user_id` only that user's
    /// records go; without it every record of the document does.
    pub async fn delete_project_records(
        &self,
        mongo_id: &str,
        user_id: Option<&str>,
        tx: Option<&RelationalTransaction>,
    ) -> Result<usize, StoreError> {
        let mongo_id = mongo_id.to_string();
        let user_id = user_id.map(str::to_string);
        self.handle(tx)
            .run(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM project_records WHERE mongo_id = ?1 AND (?2 IS NULL OR user_id = ?2)",
                    params![mongo_id, user_id],
                )?)
            })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // instructions
    // ─────────────────────────────────────────────────────────────────────

    pub async fn insert_instructions(
        &self,
        instructions: &Instructions,
        tx: Option<&RelationalTransaction>,
    ) -> Result<(), StoreError> {
        let instructions = instructions.clone();
        self.handle(tx)
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO instructions (id, kind, location, description, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        instructions.id,
                        instructions.kind.as_str(),
                        instructions.location,
                        instructions.description,
                        instructions.created_at
                    ],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn find_instructions(&self, id: &str) -> Result<Option<Instructions>, StoreError> {
        let id = id.to_string();
        self.handle(None)
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT id, kind, location, description, created_at FROM instructions WHERE id = ?1",
                        params![id],
                        |row| {
                            let kind: String = row.get(1)?;
                            let kind = InstructionsKind::parse(&kind).ok_or_else(|| {
                                rusqlite::Error::FromSqlConversionFailure(
                                    1,
                                    Type::Text,
                                    format!("unknown instructions kind '{kind}'").into(),
                                )
                            })?;
                            Ok(Instructions {
                                id: row.get(0)?,
                                kind,
                                location: row.get(2)?,
                                description: row.get(3)?,
                                created_at: row.get(4)?,
                            })
                        },
                    )
                    .optional()?)
            })
            .await
    }
}

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get(0)?,
        mongo_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        is_universal: row.get(4)?,
        allow_anonymous_access: row.get(5)?,
        instructions_id: row.get(6)?,
    })
}

fn query_templates(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Template>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let templates = stmt
        .query_map(params, template_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> RelationalStore {
        RelationalStore::open(dir.path().join("relational.sqlite"))
            .await
            .unwrap()
    }

    fn new_template(mongo_id: &str, universal: Option<bool>) -> NewTemplate {
        NewTemplate {
            mongo_id: mongo_id.to_string(),
            name: format!("template {mongo_id}"),
            description: "desc".to_string(),
            is_universal: universal,
            ..NewTemplate::default()
        }
    }

    #[tokio::test]
    async fn courses_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let course = store.insert_course("Course 1", "first", None).await.unwrap();
        assert_eq!(store.find_course(course.id, None).await.unwrap(), Some(course));
        assert_eq!(store.find_course(9999, None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn template_mongo_id_is_unique() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store.insert_template(&new_template("abc", None), None).await.unwrap();
        let err = store
            .insert_template(&new_template("abc", None), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn missing_instructions_is_not_a_duplicate() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let template = NewTemplate {
            instructions_id: Some("absent".to_string()),
            ..new_template("abc", None)
        };
        let err = store.insert_template(&template, None).await.unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[tokio::test]
    async fn template_projects_follow_their_template() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let template = store.insert_template(&new_template("src", None), None).await.unwrap();
        let other = store.insert_template(&new_template("other", None), None).await.unwrap();
        store.insert_template_project(template.id, "p1", None).await.unwrap();
        store.insert_template_project(other.id, "p2", None).await.unwrap();
        store.insert_template_project(template.id, "p3", None).await.unwrap();

        assert_eq!(
            store.list_template_project_ids(template.id).await.unwrap(),
            vec!["p1".to_string(), "p3".to_string()]
        );

        assert!(store.delete_template(template.id, None).await.unwrap());
        assert!(store.list_template_project_ids(template.id).await.unwrap().is_empty());
        assert!(store.insert_template_project(template.id, "p4", None).await.is_err());
    }

    #[tokio::test]
    async fn undo_removes_template_and_its_records() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let template = store.insert_template(&new_template("doc", None), None).await.unwrap();
        let kept = store.insert_template(&new_template("kept", None), None).await.unwrap();
        for mongo_id in ["doc", "kept"] {
            store
                .insert_project_record(
                    &NewProjectRecord {
                        mongo_id: mongo_id.to_string(),
                        user_id: Some("instructor".to_string()),
                        course_id: None,
                        created_at: Utc::now(),
                    },
                    None,
                )
                .await
                .unwrap();
        }

        let undo = store.clone();
        tokio::task::spawn_blocking(move || undo.undo_template_blocking(template.id, "doc"))
            .await
            .unwrap()
            .unwrap();

        assert!(store.find_template_by_mongo_id("doc").await.unwrap().is_none());
        assert_eq!(store.find_template_by_mongo_id("kept").await.unwrap(), Some(kept));
        let records = store.list_project_records("instructor", None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mongo_id, "kept");
    }

    #[tokio::test]
    async fn universal_listing_ignores_other_templates() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store.insert_template(&new_template("a", Some(true)), None).await.unwrap();
        store.insert_template(&new_template("b", Some(false)), None).await.unwrap();
        store.insert_template(&new_template("c", None), None).await.unwrap();
        store.insert_template(&new_template("d", Some(true)), None).await.unwrap();

        let ids: Vec<String> = store
            .list_universal_templates()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.mongo_id)
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "d".to_string()]);
    }

    #[tokio::test]
    async fn deleting_a_template_cascades_to_course_links() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let course = store.insert_course("C", "", None).await.unwrap();
        let template = store.insert_template(&new_template("x", None), None).await.unwrap();
        store
            .insert_course_template(
                CourseTemplate {
                    course_id: course.id,
                    template_id: template.id,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(store.list_course_templates(course.id).await.unwrap().len(), 1);

        assert!(store.delete_template(template.id, None).await.unwrap());
        assert!(store.list_course_templates(course.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn course_link_requires_an_existing_course() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let template = store.insert_template(&new_template("x", None), None).await.unwrap();
        let result = store
            .insert_course_template(
                CourseTemplate {
                    course_id: 42,
                    template_id: template.id,
                },
                None,
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn project_records_filter_by_user_and_course() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        for (mongo_id, user, course) in [("p1", "u1", Some(1)), ("p2", "u1", Some(2)), ("p3", "u2", Some(1)), ("p4", "u1", None)] {
            store
                .insert_project_record(
                    &NewProjectRecord {
                        mongo_id: mongo_id.to_string(),
                        user_id: Some(user.to_string()),
                        course_id: course,
                        created_at: Utc::now(),
                    },
                    None,
                )
                .await
                .unwrap();
        }

        let all: Vec<String> = store
            .list_project_records("u1", None)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.mongo_id)
            .collect();
        assert_eq!(all, vec!["p1", "p2", "p4"]);

        let course_one = store.list_project_records("u1", Some(1)).await.unwrap();
        assert_eq!(course_one.len(), 1);
        assert_eq!(course_one[0].mongo_id, "p1");

        assert_eq!(store.delete_project_records("p1", Some("u2"), None).await.unwrap(), 0);
        assert_eq!(store.delete_project_records("p1", Some("u1"), None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rolled_back_transaction_leaves_no_rows() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let tx = store.begin().await.unwrap();
        store.insert_template(&new_template("t", None), Some(&tx)).await.unwrap();
        tx.abort().await.unwrap();

        assert!(store.find_template_by_mongo_id("t").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn instructions_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let instructions = Instructions {
            id: "i1".to_string(),
            kind: InstructionsKind::Document,
            location: "doc-1".to_string(),
            description: Some("read me".to_string()),
            created_at: Utc::now(),
        };
        store.insert_instructions(&instructions, None).await.unwrap();
        assert_eq!(store.find_instructions("i1").await.unwrap(), Some(instructions));
    }
}

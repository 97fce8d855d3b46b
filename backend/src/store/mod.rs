//! # Store Adapters
//!
//! The service keeps its data in two independent stores:
//!
//! - `documents`: project file trees, as whole JSON documents, in the
//!   `Projects` (working) and `TemplateProjects` (template) collections.
//! - `relational`: templates, course links, project records, courses and
//!   instructions.
//!
//! The document id is the only join key between the two. No constraint spans
//! the stores; the promotion protocol keeps them consistent.

pub mod capability;
pub mod documents;
pub mod relational;
mod session;

use crate::config::Config;
use crate::error::StoreError;
use documents::{DocumentSession, DocumentStore};
use log::info;
use relational::{RelationalStore, RelationalTransaction};

/// Both stores, cheap to clone and shared by every request.
#[derive(Debug, Clone)]
pub struct Stores {
    pub documents: DocumentStore,
    pub relational: RelationalStore,
}

impl Stores {
    pub async fn open(config: &Config) -> Result<Self, StoreError> {
        Ok(Self {
            documents: DocumentStore::open(&config.document_db, config.topology).await?,
            relational: RelationalStore::open(&config.relational_db).await?,
        })
    }

    /// Commits a promotion: the relational transaction first, then the
    /// document session, both in one blocking task. If the document commit
    /// fails, the template row and the project records of `mongo_id` are
    /// deleted again.
    pub(crate) async fn commit_promotion(
        &self,
        relational: RelationalTransaction,
        documents: DocumentSession,
        template_id: i64,
        mongo_id: &str,
    ) -> Result<(), StoreError> {
        let store = self.relational.clone();
        let mongo_id = mongo_id.to_string();
        session::commit_pair(relational.into_session(), documents.into_session(), move || {
            info!("Undoing template {} of document {}", template_id, mongo_id);
            store.undo_template_blocking(template_id, &mongo_id)
        })
        .await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::capability::ClusterTopology;
    use tempfile::TempDir;

    /// Fresh stores in a temporary directory. Keep the `TempDir` alive for
    /// as long as the stores are used.
    pub(crate) async fn temp_stores(topology: ClusterTopology) -> (TempDir, Stores) {
        let dir = TempDir::new().unwrap();
        let config = Config {
            document_db: dir.path().join("documents.sqlite"),
            relational_db: dir.path().join("relational.sqlite"),
            topology,
            ..Config::default()
        };
        let stores = Stores::open(&config).await.unwrap();
        (dir, stores)
    }
}

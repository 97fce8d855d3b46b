//! The promotion steps shared by every entry point.
//!
//! 1. Ask the document store whether it supports multi-document
//!    transactions; if so, open a document session and a relational
//!    transaction.
//! 2. Find the project in the working collection.
//! 3. Insert a copy into the template collection.
//! 4. Delete it from the working collection.
//! 5. Insert the relational template row.
//! 6. Link the template to its course, unless it is universal.
//! 7. Commit the relational transaction, then the document session, in one
//!    blocking task.
//!
//! The record variant writes a project record between steps 2 and 3.
//!
//! With transactions any failure rolls back both stores. Without them every
//! step commits on its own and a failure leaves the earlier steps in place:
//! a missing course after step 5 leaves the document in the template
//! collection and the template row behind.

use crate::error::{PromotionError, StoreError};
use crate::store::capability;
use crate::store::documents::{Collection, DocumentSession};
use crate::store::relational::RelationalTransaction;
use crate::store::Stores;
use common::model::course::NewProjectRecord;
use common::model::template::{CourseTemplate, NewTemplate, Template};
use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CourseLink {
    Course(i64),
    Universal,
}

#[derive(Debug, Clone)]
pub(crate) struct PromotionPlan {
    pub course: CourseLink,
    /// Write a project record before moving the document.
    pub record: bool,
    /// Template description; derived from the project name when `None`.
    pub description: Option<String>,
    pub instructions_id: Option<String>,
}

impl PromotionPlan {
    pub fn for_course(course_id: i64) -> Self {
        Self {
            course: CourseLink::Course(course_id),
            record: false,
            description: None,
            instructions_id: None,
        }
    }
}

/// The transaction scope of one promotion when the store supports it.
struct PromotionScope {
    documents: DocumentSession,
    relational: RelationalTransaction,
}

impl PromotionScope {
    async fn begin(stores: &Stores) -> Result<Self, StoreError> {
        let documents = stores.documents.start_session().await?;
        let relational = stores.relational.begin().await?;
        Ok(Self {
            documents,
            relational,
        })
    }

    /// Commits the relational side first, then the documents. Both commits
    /// run in one blocking task, so dropping the request future cannot stop
    /// between them. If the document commit fails, the relational rows of
    /// `template` are deleted again.
    async fn commit(self, stores: &Stores, template: &Template) -> Result<(), StoreError> {
        stores
            .commit_promotion(self.relational, self.documents, template.id, &template.mongo_id)
            .await
            .inspect_err(|e| {
                error!("commit of template {} failed: {}", template.id, e);
            })
    }

    async fn abort(self) {
        if let Err(e) = self.relational.abort().await {
            warn!("relational rollback failed: {}", e);
        }
        if let Err(e) = self.documents.abort().await {
            warn!("document rollback failed: {}", e);
        }
    }
}

pub(crate) async fn promote(
    stores: &Stores,
    project_id: &str,
    plan: &PromotionPlan,
) -> Result<Template, PromotionError> {
    if !capability::supports_transactions(&stores.documents).await? {
        info!("Promoting project {} without transactions", project_id);
        return run_steps(stores, project_id, plan, None).await.inspect_err(|e| {
            warn!(
                "Promotion of {} failed without transaction support, earlier steps stay applied: {}",
                project_id, e
            );
        });
    }

    info!("Promoting project {} in a transaction", project_id);
    let scope = PromotionScope::begin(stores).await?;
    match run_steps(stores, project_id, plan, Some(&scope)).await {
        Ok(template) => {
            scope.commit(stores, &template).await?;
            info!(
                "Promoted project {} to template {}",
                project_id, template.id
            );
            Ok(template)
        }
        Err(e) => {
            warn!("Aborting promotion of {}: {}", project_id, e);
            scope.abort().await;
            Err(e)
        }
    }
}

async fn run_steps(
    stores: &Stores,
    project_id: &str,
    plan: &PromotionPlan,
    scope: Option<&PromotionScope>,
) -> Result<Template, PromotionError> {
    let session = scope.map(|s| &s.documents);
    let tx = scope.map(|s| &s.relational);

    let project = stores
        .documents
        .find_by_id(Collection::Projects, project_id, session)
        .await?
        .ok_or_else(|| PromotionError::ProjectNotFound(project_id.to_string()))?;

    if plan.record {
        let course_id = match plan.course {
            CourseLink::Course(id) => Some(id),
            CourseLink::Universal => None,
        };
        stores
            .relational
            .insert_project_record(
                &NewProjectRecord {
                    mongo_id: project_id.to_string(),
                    user_id: project.user_id.clone(),
                    course_id,
                    created_at: project.created_at,
                },
                tx,
            )
            .await?;
    }

    let mut frozen = project.clone();
    stores
        .documents
        .insert_one(Collection::TemplateProjects, &mut frozen, session)
        .await?;
    if !stores
        .documents
        .delete_one(Collection::Projects, project_id, session)
        .await?
    {
        warn!("project {} vanished from the working collection mid-promotion", project_id);
    }

    let description = plan
        .description
        .clone()
        .unwrap_or_else(|| format!("Template created from project: {}", project.name));
    let template = stores
        .relational
        .insert_template(
            &NewTemplate {
                mongo_id: project_id.to_string(),
                name: project.name.clone(),
                description,
                is_universal: match plan.course {
                    CourseLink::Universal => Some(true),
                    CourseLink::Course(_) => None,
                },
                allow_anonymous_access: None,
                instructions_id: plan.instructions_id.clone(),
            },
            tx,
        )
        .await?;

    if let CourseLink::Course(course_id) = plan.course {
        let course = stores
            .relational
            .find_course(course_id, tx)
            .await?
            .ok_or(PromotionError::CourseNotFound(course_id))?;
        stores
            .relational
            .insert_course_template(
                CourseTemplate {
                    course_id: course.id,
                    template_id: template.id,
                },
                tx,
            )
            .await?;
    }

    Ok(template)
}

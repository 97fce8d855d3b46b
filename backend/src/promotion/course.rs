//! Promotion of a project into a course template.

use crate::error::PromotionError;
use crate::promotion::protocol::{self, PromotionPlan};
use crate::store::documents::Collection;
use crate::store::Stores;
use common::model::project::Project;
use common::model::template::Template;

/// Moves a working project into the template collection and assigns the new
/// template to `course_id`.
pub async fn promote_project_to_template(
    stores: &Stores,
    project_id: &str,
    course_id: i64,
) -> Result<Template, PromotionError> {
    protocol::promote(stores, project_id, &PromotionPlan::for_course(course_id)).await
}

/// Stores a brand-new project, then promotes it with a project record.
///
/// The project is inserted into the working collection on its own first; a
/// failed promotion leaves it there.
pub async fn promote_new_project_to_template(
    stores: &Stores,
    mut project: Project,
    course_id: i64,
) -> Result<Template, PromotionError> {
    stores
        .documents
        .insert_one(Collection::Projects, &mut project, None)
        .await?;
    let project_id = project.id.clone().unwrap_or_default();

    let plan = PromotionPlan {
        record: true,
        ..PromotionPlan::for_course(course_id)
    };
    protocol::promote(stores, &project_id, &plan).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::capability::ClusterTopology;
    use crate::store::testing::temp_stores;
    use common::model::project::ProjectFile;

    async fn working_project(stores: &Stores, name: &str) -> String {
        let mut project = Project::new(name, Some("instructor".to_string()));
        project.files.push(ProjectFile::text("/tmp/index.html", "<h1>x</h1>"));
        stores
            .documents
            .insert_one(Collection::Projects, &mut project, None)
            .await
            .unwrap();
        project.id.unwrap()
    }

    async fn counts(stores: &Stores) -> (u64, u64) {
        (
            stores.documents.count(Collection::Projects, None).await.unwrap(),
            stores.documents.count(Collection::TemplateProjects, None).await.unwrap(),
        )
    }

    #[tokio::test]
    async fn promotes_and_links_to_course() {
        for topology in [ClusterTopology::ReplicaSet, ClusterTopology::Single] {
            let (_dir, stores) = temp_stores(topology).await;
            let course = stores.relational.insert_course("Course 1", "", None).await.unwrap();
            let id = working_project(&stores, "Bees").await;

            let template = promote_project_to_template(&stores, &id, course.id).await.unwrap();
            assert_eq!(template.mongo_id, id);
            assert_eq!(template.name, "Bees");
            assert_eq!(template.description, "Template created from project: Bees");
            assert!(!template.is_universal());

            assert_eq!(counts(&stores).await, (0, 1));
            let frozen = stores
                .documents
                .find_by_id(Collection::TemplateProjects, &id, None)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(frozen.name, "Bees");

            let linked = stores.relational.list_course_templates(course.id).await.unwrap();
            assert_eq!(linked, vec![template]);
        }
    }

    #[tokio::test]
    async fn missing_project_fails_without_side_effects() {
        for topology in [ClusterTopology::ReplicaSet, ClusterTopology::Single] {
            let (_dir, stores) = temp_stores(topology).await;
            let course = stores.relational.insert_course("C", "", None).await.unwrap();

            let err = promote_project_to_template(&stores, "nope", course.id)
                .await
                .unwrap_err();
            assert!(matches!(err, PromotionError::ProjectNotFound(_)));
            assert_eq!(counts(&stores).await, (0, 0));
        }
    }

    #[tokio::test]
    async fn missing_course_rolls_everything_back_with_transactions() {
        let (_dir, stores) = temp_stores(ClusterTopology::ReplicaSet).await;
        let id = working_project(&stores, "Wonderland").await;
        let before = counts(&stores).await;

        let err = promote_project_to_template(&stores, &id, 404).await.unwrap_err();
        assert!(matches!(err, PromotionError::CourseNotFound(404)));

        assert_eq!(counts(&stores).await, before);
        assert!(stores
            .documents
            .find_by_id(Collection::Projects, &id, None)
            .await
            .unwrap()
            .is_some());
        assert!(stores
            .relational
            .find_template_by_mongo_id(&id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn missing_course_leaves_partial_state_without_transactions() {
        let (_dir, stores) = temp_stores(ClusterTopology::Single).await;
        let id = working_project(&stores, "Wonderland").await;

        let err = promote_project_to_template(&stores, &id, 404).await.unwrap_err();
        assert!(matches!(err, PromotionError::CourseNotFound(404)));

        // Best effort: the move and the template row are not undone.
        assert_eq!(counts(&stores).await, (0, 1));
        assert!(stores
            .documents
            .find_by_id(Collection::TemplateProjects, &id, None)
            .await
            .unwrap()
            .is_some());
        assert!(stores
            .relational
            .find_template_by_mongo_id(&id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn promoting_twice_is_rejected() {
        let (_dir, stores) = temp_stores(ClusterTopology::ReplicaSet).await;
        let course = stores.relational.insert_course("C", "", None).await.unwrap();
        let id = working_project(&stores, "Once").await;

        promote_project_to_template(&stores, &id, course.id).await.unwrap();
        let err = promote_project_to_template(&stores, &id, course.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PromotionError::ProjectNotFound(_)));
        assert_eq!(counts(&stores).await, (0, 1));
    }

    #[tokio::test]
    async fn promote_new_writes_a_project_record() {
        let (_dir, stores) = temp_stores(ClusterTopology::ReplicaSet).await;
        let course = stores.relational.insert_course("C", "", None).await.unwrap();
        let project = Project::new("Fresh", Some("instructor".to_string()));

        let template = promote_new_project_to_template(&stores, project, course.id)
            .await
            .unwrap();

        let records = stores
            .relational
            .list_project_records("instructor", Some(course.id))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mongo_id, template.mongo_id);
        assert_eq!(counts(&stores).await, (0, 1));
    }

    #[tokio::test]
    async fn promote_new_with_missing_course_keeps_only_the_new_project() {
        let (_dir, stores) = temp_stores(ClusterTopology::ReplicaSet).await;
        let project = Project::new("Fresh", Some("instructor".to_string()));

        let err = promote_new_project_to_template(&stores, project, 77)
            .await
            .unwrap_err();
        assert!(matches!(err, PromotionError::CourseNotFound(77)));

        assert_eq!(counts(&stores).await, (1, 0));
        assert!(stores
            .relational
            .list_project_records("instructor", None)
            .await
            .unwrap()
            .is_empty());
    }
}

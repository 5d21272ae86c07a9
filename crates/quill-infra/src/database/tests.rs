#[cfg(test)]
mod tests {
    use crate::database::entity::post;
    use crate::database::postgres_repo::PostgresPostRepository;
    use quill_core::domain::Post;
    use quill_core::ports::{BaseRepository, PostRepository};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn post_model(slug: &str) -> post::Model {
        let now = chrono::Utc::now();
        post::Model {
            id: uuid::Uuid::new_v4(),
            title: "Test Post".to_owned(),
            content: "Content".to_owned(),
            slug: slug.to_owned(),
            published: true,
            scheduled_at: None,
            published_at: Some(now.into()),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn test_find_post_by_id() {
        let model = post_model("test-post");
        let post_id = model.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

        assert!(result.is_some());
        let post = result.unwrap();
        assert_eq!(post.title, "Test Post");
        assert_eq!(post.id, post_id);
    }

    #[tokio::test]
    async fn test_find_live_by_slug_maps_model() {
        let model = post_model("hello-world");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result = repo
            .find_live_by_slug("hello-world", chrono::Utc::now())
            .await
            .unwrap();

        assert_eq!(result.unwrap().slug, "hello-world");
    }

    #[tokio::test]
    async fn test_lost_claim_returns_none() {
        // The conditional update matched no row: a concurrent run won.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result = repo
            .claim_for_publication(uuid::Uuid::new_v4(), chrono::Utc::now())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_won_claim_refetches_post() {
        let mut model = post_model("claimed");
        model.scheduled_at = None;
        let post_id = model.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results(vec![vec![model]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result = repo
            .claim_for_publication(post_id, chrono::Utc::now())
            .await
            .unwrap();

        let claimed = result.expect("claim should return the updated post");
        assert_eq!(claimed.id, post_id);
        assert!(claimed.published_at.is_some());
    }
}

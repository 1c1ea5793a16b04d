use std::sync::Arc;

use chrono::Utc;
use configs::ListingConfig;
use serde_json::Value;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{Post, PostInput};
use super::query::{project, ListParams, PostQuery};
use super::repository::PostRepository;
use crate::authz::{ensure_can_mutate, Actor};
use crate::errors::ServiceError;
use crate::pagination::PageLinks;

/// One page of a post listing.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    /// Matches across all pages.
    pub total: u64,
    pub pagination: PageLinks,
    pub projection: Option<Vec<&'static str>>,
}

impl PostPage {
    pub fn count(&self) -> usize { self.posts.len() }

    /// Posts as JSON, reduced to the selected fields when `select` was given.
    pub fn render(&self) -> Result<Vec<Value>, ServiceError> {
        self.posts
            .iter()
            .map(|p| {
                let value = serde_json::to_value(p).map_err(|e| ServiceError::Db(e.to_string()))?;
                Ok(match &self.projection {
                    Some(fields) => project(value, fields),
                    None => value,
                })
            })
            .collect()
    }
}

/// Post use cases. Reads are public; writes take the acting user.
pub struct PostService<R: PostRepository> {
    repo: Arc<R>,
    listing: ListingConfig,
}

impl<R: PostRepository> PostService<R> {
    pub fn new(repo: Arc<R>, listing: ListingConfig) -> Self { Self { repo, listing } }

    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &ListParams) -> Result<PostPage, ServiceError> {
        let query = PostQuery::build(params, &self.listing)?;
        let (posts, total) = self.repo.find_page(&query).await?;
        debug!(total, returned = posts.len(), page = query.pagination.page, "posts listed");
        Ok(PostPage {
            pagination: query.pagination.links(total),
            posts,
            total,
            projection: query.projection,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Post, ServiceError> {
        self.repo.find_with_owner(id).await?.ok_or_else(|| ServiceError::not_found("Post"))
    }

    #[instrument(skip(self, actor, input), fields(actor = %actor.id))]
    pub async fn create(&self, actor: &Actor, input: PostInput) -> Result<Post, ServiceError> {
        let new = input.into_new_post()?;
        let post = Post::create(new, actor.id, Utc::now().into());
        let saved = self.repo.insert(&post).await?;
        info!(post_id = %saved.id, post_type = saved.post_type().as_str(), "post_created");
        Ok(saved)
    }

    #[instrument(skip(self, actor, input), fields(actor = %actor.id))]
    pub async fn update(&self, actor: &Actor, id: Uuid, input: PostInput) -> Result<Post, ServiceError> {
        let current = self.repo.find(id).await?.ok_or_else(|| ServiceError::not_found("Post"))?;
        ensure_can_mutate(actor, current.user_id, "update this post")?;
        let next = current.patched(input)?;
        let saved = self.repo.update(&next).await?;
        info!(post_id = %saved.id, "post_updated");
        Ok(saved)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        let current = self.repo.find(id).await?.ok_or_else(|| ServiceError::not_found("Post"))?;
        ensure_can_mutate(actor, current.user_id, "delete this post")?;
        let comments_removed = self.repo.delete_cascade(id).await?;
        info!(post_id = %id, comments_removed, "post_deleted");
        Ok(())
    }

    /// Every post of a user, newest first.
    #[instrument(skip(self))]
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, ServiceError> {
        self.repo.find_by_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::{domain::CommentInput, repository::SeaOrmCommentRepository, service::CommentService};
    use crate::post::domain::PostKind;
    use crate::post::repository::SeaOrmPostRepository;
    use crate::test_support::{get_db, seed_user};
    use models::user::Role;

    fn job(title: &str, category: &str) -> PostInput {
        PostInput {
            title: Some(title.into()),
            description: Some("desc".into()),
            post_type: Some("job".into()),
            category: Some(category.into()),
            location: Some("Shimla".into()),
            contact_email: Some("hr@example.com".into()),
            company: Some("Tech Solutions".into()),
            job_type: Some("Full-time".into()),
            salary: Some("40k".into()),
            requirements: Some("2 years".into()),
            ..Default::default()
        }
    }

    fn service(title: &str, rating: f64) -> PostInput {
        PostInput {
            title: Some(title.into()),
            description: Some("desc".into()),
            post_type: Some("service".into()),
            category: Some("Home".into()),
            location: Some("Kullu".into()),
            contact_email: Some("fix@example.com".into()),
            provider: Some("Ravi".into()),
            rating: Some(rating),
            ..Default::default()
        }
    }

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        ListParams::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    async fn setup() -> (PostService<SeaOrmPostRepository>, sea_orm::DatabaseConnection) {
        let db = get_db().await.unwrap();
        let svc = PostService::new(Arc::new(SeaOrmPostRepository::new(db.clone())), ListingConfig::default());
        (svc, db)
    }

    #[tokio::test]
    async fn create_then_get_includes_owner_name() {
        let (svc, db) = setup().await;
        let owner = seed_user(&db, "Asha", "asha@example.com", Role::User).await;
        let created = svc.create(&owner, job("Software Developer", "IT")).await.unwrap();
        assert_eq!(created.user_id, owner.id);
        assert!(created.user_name.is_none());

        let fetched = svc.get(created.id).await.unwrap();
        assert_eq!(fetched.user_name.as_deref(), Some("Asha"));
        assert_eq!(fetched.title, "Software Developer");
        assert!(matches!(fetched.kind, PostKind::Job(_)));
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let (svc, _db) = setup().await;
        assert!(matches!(svc.get(Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn exact_match_filters_return_only_matches() {
        let (svc, db) = setup().await;
        let owner = seed_user(&db, "Asha", "asha@example.com", Role::User).await;
        svc.create(&owner, job("Dev", "IT")).await.unwrap();
        svc.create(&owner, job("Cook", "Hospitality")).await.unwrap();
        svc.create(&owner, service("Plumber", 4.0)).await.unwrap();

        let page = svc.list(&params(&[("type", "job"), ("category", "IT")])).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.posts[0].title, "Dev");
    }

    #[tokio::test]
    async fn pagination_links_follow_the_window() {
        let (svc, db) = setup().await;
        let owner = seed_user(&db, "Asha", "asha@example.com", Role::User).await;
        for i in 0..25 {
            svc.create(&owner, job(&format!("Job {i:02}"), "IT")).await.unwrap();
        }

        let first = svc.list(&params(&[("page", "1"), ("limit", "10")])).await.unwrap();
        assert_eq!((first.count(), first.total), (10, 25));
        assert!(first.pagination.prev.is_none());
        assert_eq!(first.pagination.next.map(|n| n.page), Some(2));

        let last = svc.list(&params(&[("page", "3"), ("limit", "10")])).await.unwrap();
        assert_eq!(last.count(), 5);
        assert!(last.pagination.next.is_none());
        assert_eq!(last.pagination.prev.map(|p| p.page), Some(2));
    }

    #[tokio::test]
    async fn pages_do_not_overlap_under_sort() {
        let (svc, db) = setup().await;
        let owner = seed_user(&db, "Asha", "asha@example.com", Role::User).await;
        for i in 0..6 {
            svc.create(&owner, service(&format!("S{i}"), 4.0)).await.unwrap();
        }
        let a = svc.list(&params(&[("sort", "-rating"), ("limit", "3")])).await.unwrap();
        let b = svc.list(&params(&[("sort", "-rating"), ("limit", "3"), ("page", "2")])).await.unwrap();
        let mut ids: Vec<Uuid> = a.posts.iter().chain(b.posts.iter()).map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[tokio::test]
    async fn huge_page_is_a_validation_error() {
        let (svc, db) = setup().await;
        let owner = seed_user(&db, "Asha", "asha@example.com", Role::User).await;
        svc.create(&owner, job("Dev", "IT")).await.unwrap();

        let err = svc.list(&params(&[("page", "9223372036854775808")])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref f) if f[0].field == "page"));

        let far = svc.list(&params(&[("page", "1000000"), ("limit", "100")])).await.unwrap();
        assert_eq!((far.count(), far.total), (0, 1));
        assert_eq!(far.pagination.prev.map(|p| p.page), Some(999_999));
    }

    #[tokio::test]
    async fn range_filter_and_projection() {
        let (svc, db) = setup().await;
        let owner = seed_user(&db, "Asha", "asha@example.com", Role::User).await;
        svc.create(&owner, service("Great", 4.5)).await.unwrap();
        svc.create(&owner, service("Okay", 3.0)).await.unwrap();

        let page = svc.list(&params(&[("rating[gte]", "4"), ("select", "title")])).await.unwrap();
        assert_eq!(page.total, 1);
        let rendered = page.render().unwrap();
        let keys: Vec<&String> = rendered[0].as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(rendered[0]["title"], "Great");
        assert!(rendered[0].get("id").is_some());
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_delete() {
        let (svc, db) = setup().await;
        let owner = seed_user(&db, "Asha", "asha@example.com", Role::User).await;
        let other = seed_user(&db, "Bo", "bo@example.com", Role::User).await;
        let post = svc.create(&owner, job("Dev", "IT")).await.unwrap();

        let upd = PostInput { title: Some("Hijacked".into()), ..Default::default() };
        assert!(matches!(svc.update(&other, post.id, upd).await, Err(ServiceError::Unauthorized(_))));
        assert!(matches!(svc.delete(&other, post.id).await, Err(ServiceError::Unauthorized(_))));
        assert_eq!(svc.get(post.id).await.unwrap().title, "Dev");
    }

    #[tokio::test]
    async fn admin_can_update_any_post_but_not_its_type() {
        let (svc, db) = setup().await;
        let owner = seed_user(&db, "Asha", "asha@example.com", Role::User).await;
        let admin = seed_user(&db, "Root", "root@example.com", Role::Admin).await;
        let post = svc.create(&owner, job("Dev", "IT")).await.unwrap();

        let updated = svc
            .update(&admin, post.id, PostInput { salary: Some("55k".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.user_id, owner.id);
        assert_eq!(updated.created_at, post.created_at);
        match updated.kind {
            PostKind::Job(j) => assert_eq!(j.salary, "55k"),
            other => panic!("unexpected {other:?}"),
        }

        let err = svc
            .update(&admin, post.id, PostInput { post_type: Some("service".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_removes_comments_too() {
        let (svc, db) = setup().await;
        let comments = CommentService::new(Arc::new(SeaOrmCommentRepository::new(db.clone())));
        let owner = seed_user(&db, "Asha", "asha@example.com", Role::User).await;
        let reader = seed_user(&db, "Bo", "bo@example.com", Role::User).await;
        let post = svc.create(&owner, job("Dev", "IT")).await.unwrap();
        for text in ["first", "second"] {
            comments.add(&reader, post.id, CommentInput { text: Some(text.into()) }).await.unwrap();
        }

        svc.delete(&owner, post.id).await.unwrap();
        assert!(comments.list_for_post(post.id).await.unwrap().is_empty());
        assert!(matches!(svc.get(post.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(&owner, post.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_by_user_only_returns_their_posts() {
        let (svc, db) = setup().await;
        let a = seed_user(&db, "Asha", "asha@example.com", Role::User).await;
        let b = seed_user(&db, "Bo", "bo@example.com", Role::User).await;
        svc.create(&a, job("One", "IT")).await.unwrap();
        svc.create(&a, job("Two", "IT")).await.unwrap();
        svc.create(&b, job("Three", "IT")).await.unwrap();

        let mine = svc.list_by_user(a.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|p| p.user_id == a.id));
        assert!(svc.list_by_user(Uuid::new_v4()).await.unwrap().is_empty());
    }
}

use std::sync::Arc;

use configs::AppConfig;
use sea_orm::DatabaseConnection;
use service::{
    auth::{repo::SeaOrmAuthRepository, service::AuthConfig, AuthService},
    comment::{repository::SeaOrmCommentRepository, CommentService},
    post::{repository::SeaOrmPostRepository, PostService},
};

/// Shared handler state: one instance of each service over a shared pool.
#[derive(Clone)]
pub struct ServerState {
    pub posts: Arc<PostService<SeaOrmPostRepository>>,
    pub comments: Arc<CommentService<SeaOrmCommentRepository>>,
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, cfg: &AppConfig) -> Self {
        let posts = PostService::new(Arc::new(SeaOrmPostRepository::new(db.clone())), cfg.listing);
        let comments = CommentService::new(Arc::new(SeaOrmCommentRepository::new(db.clone())));
        let auth = AuthService::new(Arc::new(SeaOrmAuthRepository::new(db)), AuthConfig::from(&cfg.auth));
        Self {
            posts: Arc::new(posts),
            comments: Arc::new(comments),
            auth: Arc::new(auth),
        }
    }
}

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::comment::model::Comment;
use crate::like::model::{Like, LikeTarget};
use crate::post::model::Post;
use crate::user::model::UserSummary;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Backend(String),
}

/// Persistence seam for posts, comments, likes and the user summaries they
/// reference. Implementations own id issuance: ids must grow with creation
/// order because the feed sorts on them. With several writer processes the
/// order holds per second and per process only.
#[async_trait]
pub trait Store: Send + Sync {
    fn next_id(&self) -> ObjectId;

    async fn insert_post(&self, post: Post) -> Result<Post, StoreError>;

    async fn find_post(&self, id: &ObjectId) -> Result<Option<Post>, StoreError>;

    /// Posts visible to `viewer`, newest first, strictly older than `before`
    /// when given, at most `take` rows
    async fn feed_posts(
        &self,
        viewer: &ObjectId,
        before: Option<&ObjectId>,
        take: i64,
    ) -> Result<Vec<Post>, StoreError>;

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, StoreError>;

    async fn find_comment(&self, id: &ObjectId) -> Result<Option<Comment>, StoreError>;

    /// Oldest first
    async fn comments_for_post(&self, post_id: &ObjectId) -> Result<Vec<Comment>, StoreError>;

    async fn count_comments(&self, post_id: &ObjectId) -> Result<u64, StoreError>;

    async fn count_replies(&self, comment_id: &ObjectId) -> Result<u64, StoreError>;

    /// Fails with `StoreError::Duplicate` when the user already likes the target
    async fn insert_like(&self, target: LikeTarget, like: Like) -> Result<Like, StoreError>;

    /// Returns whether a like was removed
    async fn delete_like(&self, target: LikeTarget, user_id: &ObjectId) -> Result<bool, StoreError>;

    /// Newest first
    async fn likes_for(&self, target: LikeTarget) -> Result<Vec<Like>, StoreError>;

    async fn count_likes(&self, target: LikeTarget) -> Result<u64, StoreError>;

    async fn has_liked(&self, target: LikeTarget, user_id: &ObjectId) -> Result<bool, StoreError>;

    async fn find_users(&self, ids: &[ObjectId]) -> Result<Vec<UserSummary>, StoreError>;
}

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::comment::model::Comment;
use crate::database::store::{Store, StoreError};
use crate::like::model::{Like, LikeTarget};
use crate::post::model::Post;
use crate::user::model::UserSummary;

#[derive(Default)]
struct Tables {
    posts: Vec<Post>,
    comments: Vec<Comment>,
    likes: HashMap<LikeTarget, Vec<Like>>,
    users: HashMap<ObjectId, UserSummary>,
}

/// Process-local store for tests and `DATA_STORE=memory` development runs.
///
/// Ids share one timestamp prefix and carry a strictly increasing sequence in
/// the remaining eight bytes, so creation order and id order always agree.
pub struct MemoryStore {
    epoch: u32,
    sequence: AtomicU64,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            epoch: Utc::now().timestamp() as u32,
            sequence: AtomicU64::new(1),
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Users normally come from the identity provider
    pub async fn insert_user(&self, user: UserSummary) {
        self.tables.write().await.users.insert(user.id, user);
    }

    /// Remove a post outright; used to exercise cursors that outlive their post
    pub async fn remove_post(&self, id: &ObjectId) -> bool {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|post| post.id != *id);
        tables.posts.len() != before
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn next_id(&self) -> ObjectId {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&self.epoch.to_be_bytes());
        bytes[4..].copy_from_slice(&seq.to_be_bytes());
        ObjectId::from_bytes(bytes)
    }

    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        self.tables.write().await.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: &ObjectId) -> Result<Option<Post>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|post| post.id == *id).cloned())
    }

    async fn feed_posts(
        &self,
        viewer: &ObjectId,
        before: Option<&ObjectId>,
        take: i64,
    ) -> Result<Vec<Post>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Post> = tables
            .posts
            .iter()
            .filter(|post| post.is_visible_to(viewer))
            .filter(|post| before.is_none_or(|cursor| post.id < *cursor))
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows.truncate(take.max(0) as usize);
        Ok(rows)
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, StoreError> {
        self.tables.write().await.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: &ObjectId) -> Result<Option<Comment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == *id).cloned())
    }

    async fn comments_for_post(&self, post_id: &ObjectId) -> Result<Vec<Comment>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == *post_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    async fn count_comments(&self, post_id: &ObjectId) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().filter(|c| c.post_id == *post_id).count() as u64)
    }

    async fn count_replies(&self, comment_id: &ObjectId) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.parent_id.as_ref() == Some(comment_id))
            .count() as u64)
    }

    async fn insert_like(&self, target: LikeTarget, like: Like) -> Result<Like, StoreError> {
        let mut tables = self.tables.write().await;
        let likes = tables.likes.entry(target).or_default();
        if likes.iter().any(|l| l.user_id == like.user_id) {
            return Err(StoreError::Duplicate(format!(
                "You already like this {}",
                target.noun()
            )));
        }
        likes.push(like.clone());
        Ok(like)
    }

    async fn delete_like(&self, target: LikeTarget, user_id: &ObjectId) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(likes) = tables.likes.get_mut(&target) else {
            return Ok(false);
        };
        let before = likes.len();
        likes.retain(|l| l.user_id != *user_id);
        Ok(likes.len() != before)
    }

    async fn likes_for(&self, target: LikeTarget) -> Result<Vec<Like>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows = tables.likes.get(&target).cloned().unwrap_or_default();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn count_likes(&self, target: LikeTarget) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.likes.get(&target).map_or(0, |likes| likes.len() as u64))
    }

    async fn has_liked(&self, target: LikeTarget, user_id: &ObjectId) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .get(&target)
            .is_some_and(|likes| likes.iter().any(|l| l.user_id == *user_id)))
    }

    async fn find_users(&self, ids: &[ObjectId]) -> Result<Vec<UserSummary>, StoreError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::comment::model::Comment;
use crate::database::store::{Store, StoreError};
use crate::like::model::{Like, LikeTarget};
use crate::post::model::Post;
use crate::user::model::UserSummary;

const DUPLICATE_KEY: i32 = 11000;

fn backend(context: &'static str) -> impl FnOnce(MongoError) -> StoreError {
    move |e| StoreError::Backend(format!("{}: {}", context, e))
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) if write_error.code == DUPLICATE_KEY
    )
}

const SEQUENCE_MASK: u64 = (1 << 40) - 1;

/// Issues ObjectIds that sort in issue order within this process: the usual
/// seconds prefix, three process-random bytes, then a 40-bit sequence in
/// place of the driver's wrapping 24-bit counter.
pub struct SequentialIds {
    process: [u8; 3],
    sequence: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        let seed = ObjectId::new().bytes();
        SequentialIds {
            process: [seed[4], seed[5], seed[6]],
            sequence: AtomicU64::new(0),
        }
    }

    pub fn next(&self) -> ObjectId {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) & SEQUENCE_MASK;
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&(Utc::now().timestamp() as u32).to_be_bytes());
        bytes[4..7].copy_from_slice(&self.process);
        bytes[7..].copy_from_slice(&seq.to_be_bytes()[3..]);
        ObjectId::from_bytes(bytes)
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MongoStore {
    ids: SequentialIds,
    posts: Collection<Post>,
    comments: Collection<Comment>,
    post_likes: Collection<Like>,
    comment_likes: Collection<Like>,
    users: Collection<UserSummary>,
}

impl MongoStore {
    pub fn new(client: &Client, database_name: &str) -> Self {
        let db = client.database(database_name);
        MongoStore {
            ids: SequentialIds::new(),
            posts: db.collection::<Post>("posts"),
            comments: db.collection::<Comment>("comments"),
            post_likes: db.collection::<Like>("post_likes"),
            comment_likes: db.collection::<Like>("comment_likes"),
            users: db.collection::<UserSummary>("users"),
        }
    }

    /// The like uniqueness constraint lives here, not in application code
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        for likes in [&self.post_likes, &self.comment_likes] {
            let model = IndexModel::builder()
                .keys(doc! { "user_id": 1, "target_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            likes
                .create_index(model)
                .await
                .map_err(backend("Failed to create like index"))?;
        }

        let model = IndexModel::builder()
            .keys(doc! { "post_id": 1, "_id": 1 })
            .build();
        self.comments
            .create_index(model)
            .await
            .map_err(backend("Failed to create comment index"))?;

        info!("MongoDB indexes are in place");
        Ok(())
    }

    fn likes(&self, target: LikeTarget) -> &Collection<Like> {
        match target {
            LikeTarget::Post(_) => &self.post_likes,
            LikeTarget::Comment(_) => &self.comment_likes,
        }
    }
}

#[async_trait]
impl Store for MongoStore {
    fn next_id(&self) -> ObjectId {
        self.ids.next()
    }

    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        self.posts
            .insert_one(&post)
            .await
            .map_err(backend("Failed to create post"))?;
        Ok(post)
    }

    async fn find_post(&self, id: &ObjectId) -> Result<Option<Post>, StoreError> {
        self.posts
            .find_one(doc! { "_id": id })
            .await
            .map_err(backend("Failed to fetch post"))
    }

    async fn feed_posts(
        &self,
        viewer: &ObjectId,
        before: Option<&ObjectId>,
        take: i64,
    ) -> Result<Vec<Post>, StoreError> {
        let mut filter = doc! {
            "$or": [
                { "is_public": true },
                { "author_id": viewer },
            ]
        };
        if let Some(cursor) = before {
            filter.insert("_id", doc! { "$lt": cursor });
        }

        let cursor = self
            .posts
            .find(filter)
            .sort(doc! { "_id": -1 })
            .limit(take)
            .await
            .map_err(backend("Failed to fetch feed"))?;

        cursor
            .try_collect()
            .await
            .map_err(backend("Failed to collect feed"))
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, StoreError> {
        self.comments
            .insert_one(&comment)
            .await
            .map_err(backend("Failed to add comment"))?;
        Ok(comment)
    }

    async fn find_comment(&self, id: &ObjectId) -> Result<Option<Comment>, StoreError> {
        self.comments
            .find_one(doc! { "_id": id })
            .await
            .map_err(backend("Failed to fetch comment"))
    }

    async fn comments_for_post(&self, post_id: &ObjectId) -> Result<Vec<Comment>, StoreError> {
        let cursor = self
            .comments
            .find(doc! { "post_id": post_id })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(backend("Failed to fetch comments"))?;

        cursor
            .try_collect()
            .await
            .map_err(backend("Failed to collect comments"))
    }

    async fn count_comments(&self, post_id: &ObjectId) -> Result<u64, StoreError> {
        self.comments
            .count_documents(doc! { "post_id": post_id })
            .await
            .map_err(backend("Failed to count comments"))
    }

    async fn count_replies(&self, comment_id: &ObjectId) -> Result<u64, StoreError> {
        self.comments
            .count_documents(doc! { "parent_id": comment_id })
            .await
            .map_err(backend("Failed to count replies"))
    }

    async fn insert_like(&self, target: LikeTarget, like: Like) -> Result<Like, StoreError> {
        match self.likes(target).insert_one(&like).await {
            Ok(_) => Ok(like),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(format!(
                "You already like this {}",
                target.noun()
            ))),
            Err(e) => Err(backend("Failed to create like")(e)),
        }
    }

    async fn delete_like(&self, target: LikeTarget, user_id: &ObjectId) -> Result<bool, StoreError> {
        let result = self
            .likes(target)
            .delete_one(doc! { "target_id": target.id(), "user_id": user_id })
            .await
            .map_err(backend("Failed to delete like"))?;

        Ok(result.deleted_count > 0)
    }

    async fn likes_for(&self, target: LikeTarget) -> Result<Vec<Like>, StoreError> {
        let cursor = self
            .likes(target)
            .find(doc! { "target_id": target.id() })
            .sort(doc! { "_id": -1 })
            .await
            .map_err(backend("Failed to fetch likes"))?;

        cursor
            .try_collect()
            .await
            .map_err(backend("Failed to collect likes"))
    }

    async fn count_likes(&self, target: LikeTarget) -> Result<u64, StoreError> {
        self.likes(target)
            .count_documents(doc! { "target_id": target.id() })
            .await
            .map_err(backend("Failed to count likes"))
    }

    async fn has_liked(&self, target: LikeTarget, user_id: &ObjectId) -> Result<bool, StoreError> {
        let found = self
            .likes(target)
            .find_one(doc! { "target_id": target.id(), "user_id": user_id })
            .await
            .map_err(backend("Failed to check like"))?;

        Ok(found.is_some())
    }

    async fn find_users(&self, ids: &[ObjectId]) -> Result<Vec<UserSummary>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .users
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .projection(doc! { "first_name": 1, "last_name": 1, "email": 1 })
            .await
            .map_err(backend("Failed to fetch users"))?;

        cursor
            .try_collect()
            .await
            .map_err(backend("Failed to collect users"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_sort_in_issue_order() {
        let ids = SequentialIds::new();
        let issued: Vec<ObjectId> = (0..10_000).map(|_| ids.next()).collect();
        assert!(issued.windows(2).all(|w| w[0] < w[1]));
    }
}

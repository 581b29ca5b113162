use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use mongodb::bson::oid::ObjectId;

use crate::database::Store;
use crate::like::model::{Like, LikeTarget, LikerView};
use crate::post::service::find_visible_post;
use crate::user::service::load_authors;
use crate::utils::error::CustomError;

pub struct LikeService {
    store: Arc<dyn Store>,
}

impl LikeService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        LikeService { store }
    }

    /// The target must exist and sit on a post the viewer can see
    async fn ensure_visible(&self, viewer: &ObjectId, target: LikeTarget) -> Result<(), CustomError> {
        let store = self.store.as_ref();
        match target {
            LikeTarget::Post(post_id) => {
                find_visible_post(store, viewer, &post_id).await?;
            }
            LikeTarget::Comment(comment_id) => {
                let not_found = || CustomError::NotFoundError("Comment not found".into());
                let comment = store.find_comment(&comment_id).await?.ok_or_else(not_found)?;
                match find_visible_post(store, viewer, &comment.post_id).await {
                    Ok(_) => {}
                    Err(CustomError::NotFoundError(_)) => return Err(not_found()),
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    /// A second like by the same user is a conflict, enforced by the store
    pub async fn like(&self, user: &ObjectId, target: LikeTarget) -> Result<Like, CustomError> {
        self.ensure_visible(user, target).await?;

        let like = Like {
            id: self.store.next_id(),
            target_id: *target.id(),
            user_id: *user,
            created_at: Utc::now(),
        };
        let like = self.store.insert_like(target, like).await?;
        info!("{} liked {} {}", user, target.noun(), target.id());
        Ok(like)
    }

    /// Idempotent: removing a like that is not there still succeeds
    pub async fn unlike(&self, user: &ObjectId, target: LikeTarget) -> Result<bool, CustomError> {
        self.ensure_visible(user, target).await?;

        let removed = self.store.delete_like(target, user).await?;
        debug!(
            "{} unliked {} {} (removed={})",
            user,
            target.noun(),
            target.id(),
            removed
        );
        Ok(removed)
    }

    /// Who liked the target, newest first
    pub async fn likers(&self, viewer: &ObjectId, target: LikeTarget) -> Result<Vec<LikerView>, CustomError> {
        self.ensure_visible(viewer, target).await?;

        let likes = self.store.likes_for(target).await?;
        let users = load_authors(self.store.as_ref(), likes.iter().map(|l| l.user_id)).await?;

        Ok(likes
            .iter()
            .map(|like| LikerView {
                id: like.id.to_hex(),
                user: users.get(&like.user_id).cloned(),
                created_at: like.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::model::{Comment, CreateCommentRequest};
    use crate::comment::service::CommentService;
    use crate::config::FeedConfig;
    use crate::database::{MemoryStore, StoreError};
    use crate::post::model::{CreatePostRequest, Post};
    use crate::user::model::UserSummary;
    use crate::post::service::PostService;

    struct Fixture {
        likes: LikeService,
        posts: PostService,
        comments: CommentService,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Fixture {
            likes: LikeService::new(store.clone()),
            posts: PostService::new(store.clone(), FeedConfig::default()),
            comments: CommentService::new(store),
        }
    }

    async fn post(f: &Fixture, owner: &ObjectId, is_public: bool) -> ObjectId {
        let view = f
            .posts
            .create_post(
                owner,
                CreatePostRequest {
                    content: "post".into(),
                    image_url: None,
                    is_public: Some(is_public),
                },
            )
            .await
            .unwrap();
        ObjectId::parse_str(&view.id).unwrap()
    }

    #[actix_web::test]
    async fn duplicate_like_is_conflict() {
        let f = fixture();
        let user = ObjectId::new();
        let target = LikeTarget::Post(post(&f, &user, true).await);

        f.likes.like(&user, target).await.unwrap();
        let err = f.likes.like(&user, target).await.unwrap_err();
        assert!(matches!(err, CustomError::ConflictError(_)));

        let likers = f.likes.likers(&user, target).await.unwrap();
        assert_eq!(likers.len(), 1);
    }

    #[actix_web::test]
    async fn unlike_is_idempotent() {
        let f = fixture();
        let user = ObjectId::new();
        let target = LikeTarget::Post(post(&f, &user, true).await);

        f.likes.like(&user, target).await.unwrap();
        assert!(f.likes.unlike(&user, target).await.unwrap());
        assert!(!f.likes.unlike(&user, target).await.unwrap());
    }

    #[actix_web::test]
    async fn likers_are_newest_first() {
        let f = fixture();
        let owner = ObjectId::new();
        let target = LikeTarget::Post(post(&f, &owner, true).await);
        let first = ObjectId::new();
        let second = ObjectId::new();

        let a = f.likes.like(&first, target).await.unwrap();
        let b = f.likes.like(&second, target).await.unwrap();

        let likers = f.likes.likers(&owner, target).await.unwrap();
        let ids: Vec<String> = likers.iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids, vec![b.id.to_hex(), a.id.to_hex()]);
    }

    #[actix_web::test]
    async fn cannot_like_what_you_cannot_see() {
        let f = fixture();
        let owner = ObjectId::new();
        let stranger = ObjectId::new();
        let private = post(&f, &owner, false).await;

        let err = f.likes.like(&stranger, LikeTarget::Post(private)).await.unwrap_err();
        assert!(matches!(err, CustomError::NotFoundError(_)));

        let comment = f
            .comments
            .add_comment(
                &owner,
                CreateCommentRequest {
                    content: "hidden".into(),
                    post_id: private.to_hex(),
                    parent_id: None,
                },
            )
            .await
            .unwrap();
        let comment_id = ObjectId::parse_str(&comment.id).unwrap();

        let err = f
            .likes
            .like(&stranger, LikeTarget::Comment(comment_id))
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::NotFoundError(_)));

        f.likes.like(&owner, LikeTarget::Comment(comment_id)).await.unwrap();
        let err = f
            .likes
            .like(&owner, LikeTarget::Comment(ObjectId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::NotFoundError(_)));
    }

    /// Memory store whose post lookups fail as if the database went away
    struct PostsOffline(MemoryStore);

    #[async_trait::async_trait]
    impl Store for PostsOffline {
        fn next_id(&self) -> ObjectId {
            self.0.next_id()
        }
        async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
            self.0.insert_post(post).await
        }
        async fn find_post(&self, _id: &ObjectId) -> Result<Option<Post>, StoreError> {
            Err(StoreError::Backend("socket closed".into()))
        }
        async fn feed_posts(
            &self,
            viewer: &ObjectId,
            before: Option<&ObjectId>,
            take: i64,
        ) -> Result<Vec<Post>, StoreError> {
            self.0.feed_posts(viewer, before, take).await
        }
        async fn insert_comment(&self, comment: Comment) -> Result<Comment, StoreError> {
            self.0.insert_comment(comment).await
        }
        async fn find_comment(&self, id: &ObjectId) -> Result<Option<Comment>, StoreError> {
            self.0.find_comment(id).await
        }
        async fn comments_for_post(&self, post_id: &ObjectId) -> Result<Vec<Comment>, StoreError> {
            self.0.comments_for_post(post_id).await
        }
        async fn count_comments(&self, post_id: &ObjectId) -> Result<u64, StoreError> {
            self.0.count_comments(post_id).await
        }
        async fn count_replies(&self, comment_id: &ObjectId) -> Result<u64, StoreError> {
            self.0.count_replies(comment_id).await
        }
        async fn insert_like(&self, target: LikeTarget, like: Like) -> Result<Like, StoreError> {
            self.0.insert_like(target, like).await
        }
        async fn delete_like(&self, target: LikeTarget, user_id: &ObjectId) -> Result<bool, StoreError> {
            self.0.delete_like(target, user_id).await
        }
        async fn likes_for(&self, target: LikeTarget) -> Result<Vec<Like>, StoreError> {
            self.0.likes_for(target).await
        }
        async fn count_likes(&self, target: LikeTarget) -> Result<u64, StoreError> {
            self.0.count_likes(target).await
        }
        async fn has_liked(&self, target: LikeTarget, user_id: &ObjectId) -> Result<bool, StoreError> {
            self.0.has_liked(target, user_id).await
        }
        async fn find_users(&self, ids: &[ObjectId]) -> Result<Vec<UserSummary>, StoreError> {
            self.0.find_users(ids).await
        }
    }

    #[actix_web::test]
    async fn store_failure_on_comment_target_is_not_a_404() {
        let inner = MemoryStore::new();
        let comment = Comment {
            id: inner.next_id(),
            post_id: inner.next_id(),
            parent_id: None,
            author_id: ObjectId::new(),
            content: "hi".into(),
            created_at: Utc::now(),
        };
        let comment_id = comment.id;
        inner.insert_comment(comment).await.unwrap();

        let likes = LikeService::new(Arc::new(PostsOffline(inner)));
        let err = likes
            .like(&ObjectId::new(), LikeTarget::Comment(comment_id))
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::InternalServerError(_)));
    }
}

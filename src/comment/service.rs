use std::sync::Arc;

use chrono::Utc;
use futures_util::future::try_join_all;
use log::info;
use mongodb::bson::oid::ObjectId;

use crate::comment::model::{Comment, CommentView, CreateCommentRequest};
use crate::database::Store;
use crate::like::model::LikeTarget;
use crate::post::service::find_visible_post;
use crate::user::service::load_authors;
use crate::utils::error::CustomError;
use crate::utils::helpers::parse_object_id;
use crate::utils::validation::validate_comment_content;

pub struct CommentService {
    store: Arc<dyn Store>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        CommentService { store }
    }

    /// Add a comment or a reply. Replies nest one level only: answering a
    /// reply attaches the new comment to that reply's own parent.
    pub async fn add_comment(
        &self,
        author: &ObjectId,
        request: CreateCommentRequest,
    ) -> Result<CommentView, CustomError> {
        let content = validate_comment_content(&request.content)?;

        if request.post_id.trim().is_empty() {
            return Err(CustomError::ValidationError("Post ID is required".into()));
        }
        let post_id = parse_object_id(&request.post_id, "post ID")?;
        let post = find_visible_post(self.store.as_ref(), author, &post_id).await?;

        let parent_id = match request.parent_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parent_id = parse_object_id(raw, "parent ID")?;
                let parent = self
                    .store
                    .find_comment(&parent_id)
                    .await?
                    .filter(|parent| parent.post_id == post.id)
                    .ok_or_else(|| CustomError::NotFoundError("Parent comment not found".into()))?;
                Some(parent.parent_id.unwrap_or(parent.id))
            }
        };

        let comment = Comment {
            id: self.store.next_id(),
            post_id: post.id,
            parent_id,
            author_id: *author,
            content,
            created_at: Utc::now(),
        };

        let comment = self.store.insert_comment(comment).await?;
        info!("comment {} added to post {}", comment.id, comment.post_id);

        let mut views = self.present(author, std::slice::from_ref(&comment)).await?;
        views
            .pop()
            .ok_or_else(|| CustomError::InternalServerError("Failed to present comment".into()))
    }

    /// All comments of a post in creation order, replies included
    pub async fn get_comments_for_post(
        &self,
        viewer: &ObjectId,
        post_id: &ObjectId,
    ) -> Result<Vec<CommentView>, CustomError> {
        let post = find_visible_post(self.store.as_ref(), viewer, post_id).await?;
        let comments = self.store.comments_for_post(&post.id).await?;
        self.present(viewer, &comments).await
    }

    async fn present(&self, viewer: &ObjectId, comments: &[Comment]) -> Result<Vec<CommentView>, CustomError> {
        let store = self.store.as_ref();
        let authors = load_authors(store, comments.iter().map(|c| c.author_id)).await?;

        let counts = try_join_all(comments.iter().map(|comment| async move {
            let target = LikeTarget::Comment(comment.id);
            let like_count = store.count_likes(target).await?;
            let reply_count = store.count_replies(&comment.id).await?;
            let liked_by_me = store.has_liked(target, viewer).await?;
            Ok::<_, CustomError>((like_count, reply_count, liked_by_me))
        }))
        .await?;

        Ok(comments
            .iter()
            .zip(counts)
            .map(|(comment, (like_count, reply_count, liked_by_me))| CommentView {
                id: comment.id.to_hex(),
                post_id: comment.post_id.to_hex(),
                parent_id: comment.parent_id.map(|id| id.to_hex()),
                content: comment.content.clone(),
                created_at: comment.created_at,
                author: authors.get(&comment.author_id).cloned(),
                like_count,
                reply_count,
                liked_by_me,
            })
            .collect())
    }
}

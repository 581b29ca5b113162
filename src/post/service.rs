use std::sync::Arc;

use chrono::Utc;
use futures_util::future::try_join_all;
use log::{debug, info};
use mongodb::bson::oid::ObjectId;

use crate::config::FeedConfig;
use crate::database::Store;
use crate::like::model::LikeTarget;
use crate::post::model::{CreatePostRequest, FeedPage, FeedQuery, Post, PostView};
use crate::user::service::load_authors;
use crate::utils::error::CustomError;
use crate::utils::helpers::parse_object_id;
use crate::utils::validation::{normalize_limit, validate_image_url, validate_post_content};

/// Result of cutting a `limit + 1` fetch down to one page
#[derive(Debug)]
pub struct PageSplit {
    pub rows: Vec<Post>,
    pub has_more: bool,
    pub next_cursor: Option<ObjectId>,
}

/// `rows` must be the newest-first result of asking for `limit + 1` rows.
/// The extra row only signals that another page exists; the cursor is the id
/// of the last row actually returned.
pub fn split_page(mut rows: Vec<Post>, limit: usize) -> PageSplit {
    let has_more = rows.len() > limit;
    if has_more {
        rows.truncate(limit);
    }
    let next_cursor = if has_more {
        rows.last().map(|post| post.id)
    } else {
        None
    };

    PageSplit {
        rows,
        has_more,
        next_cursor,
    }
}

/// Load a post the viewer is allowed to see. Someone else's private post is
/// reported exactly like a missing one.
pub(crate) async fn find_visible_post(
    store: &dyn Store,
    viewer: &ObjectId,
    post_id: &ObjectId,
) -> Result<Post, CustomError> {
    store
        .find_post(post_id)
        .await?
        .filter(|post| post.is_visible_to(viewer))
        .ok_or_else(|| CustomError::NotFoundError("Post not found".into()))
}

pub struct PostService {
    store: Arc<dyn Store>,
    feed: FeedConfig,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>, feed: FeedConfig) -> Self {
        PostService { store, feed }
    }

    /// One page of the viewer's feed, newest first
    pub async fn feed(&self, viewer: &ObjectId, query: FeedQuery) -> Result<FeedPage, CustomError> {
        let limit = normalize_limit(query.limit, self.feed.default_limit, self.feed.max_limit)?;
        let cursor = match query.cursor.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_object_id(raw, "cursor")?),
        };

        let rows = self
            .store
            .feed_posts(viewer, cursor.as_ref(), limit + 1)
            .await?;
        let page = split_page(rows, limit as usize);

        debug!(
            "feed page for {}: {} posts, has_more={}",
            viewer,
            page.rows.len(),
            page.has_more
        );

        Ok(FeedPage {
            posts: self.present(viewer, &page.rows).await?,
            has_more: page.has_more,
            next_cursor: page.next_cursor.map(|id| id.to_hex()),
        })
    }

    pub async fn create_post(
        &self,
        author: &ObjectId,
        request: CreatePostRequest,
    ) -> Result<PostView, CustomError> {
        let content = validate_post_content(&request.content)?;
        let image_url = validate_image_url(request.image_url.as_deref())?;

        let post = Post {
            id: self.store.next_id(),
            author_id: *author,
            content,
            image_url,
            is_public: request.is_public.unwrap_or(true),
            created_at: Utc::now(),
        };

        let post = self.store.insert_post(post).await?;
        info!("post {} created by {}", post.id, author);

        let mut views = self.present(author, std::slice::from_ref(&post)).await?;
        views
            .pop()
            .ok_or_else(|| CustomError::InternalServerError("Failed to present post".into()))
    }

    pub async fn get_post(&self, viewer: &ObjectId, post_id: &ObjectId) -> Result<PostView, CustomError> {
        let post = find_visible_post(self.store.as_ref(), viewer, post_id).await?;
        let mut views = self.present(viewer, std::slice::from_ref(&post)).await?;
        views
            .pop()
            .ok_or_else(|| CustomError::InternalServerError("Failed to present post".into()))
    }

    /// Decorate posts with author, counts and the viewer's like status
    pub async fn present(&self, viewer: &ObjectId, posts: &[Post]) -> Result<Vec<PostView>, CustomError> {
        let store = self.store.as_ref();
        let authors = load_authors(store, posts.iter().map(|post| post.author_id)).await?;

        let counts = try_join_all(posts.iter().map(|post| async move {
            let target = LikeTarget::Post(post.id);
            let like_count = store.count_likes(target).await?;
            let comment_count = store.count_comments(&post.id).await?;
            let liked_by_me = store.has_liked(target, viewer).await?;
            Ok::<_, CustomError>((like_count, comment_count, liked_by_me))
        }))
        .await?;

        Ok(posts
            .iter()
            .zip(counts)
            .map(|(post, (like_count, comment_count, liked_by_me))| PostView {
                id: post.id.to_hex(),
                content: post.content.clone(),
                image_url: post.image_url.clone(),
                is_public: post.is_public,
                created_at: post.created_at,
                author: authors.get(&post.author_id).cloned(),
                like_count,
                comment_count,
                liked_by_me,
            })
            .collect())
    }
}

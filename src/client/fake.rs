use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::client::{ApiError, SocialApi, Target};
use crate::comment::model::{CommentView, CreateCommentRequest};
use crate::like::model::LikerView;
use crate::post::model::{FeedPage, PostView};

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn post(n: i64) -> PostView {
    PostView {
        id: format!("p{:03}", n),
        content: format!("post {}", n),
        image_url: None,
        is_public: true,
        created_at: at(n),
        author: None,
        like_count: 0,
        comment_count: 0,
        liked_by_me: false,
    }
}

pub fn comment(id: &str, parent: Option<&str>, minute: i64) -> CommentView {
    CommentView {
        id: id.to_string(),
        post_id: "p001".to_string(),
        parent_id: parent.map(str::to_string),
        content: format!("comment {}", id),
        created_at: at(minute),
        author: None,
        like_count: 0,
        reply_count: 0,
        liked_by_me: false,
    }
}

pub fn liker(id: &str) -> LikerView {
    LikerView {
        id: id.to_string(),
        user: None,
        created_at: at(0),
    }
}

/// Scripted in-process stand-in for the HTTP API
#[derive(Default)]
pub struct FakeApi {
    /// Newest first, the order the server returns them
    pub posts: Vec<PostView>,
    pub comments: Mutex<HashMap<String, Vec<CommentView>>>,
    pub likers: Mutex<HashMap<Target, Vec<LikerView>>>,
    pub fail_next: Mutex<Option<ApiError>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn with_posts(count: i64) -> Self {
        FakeApi {
            posts: (1..=count).rev().map(post).collect(),
            ..Default::default()
        }
    }

    pub fn fail_with(&self, error: ApiError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_next.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SocialApi for FakeApi {
    async fn fetch_feed(&self, cursor: Option<&str>, limit: u32) -> Result<FeedPage, ApiError> {
        self.record(format!("feed {:?} {}", cursor, limit))?;
        let start = match cursor {
            Some(cursor) => match self.posts.iter().position(|p| p.id == cursor) {
                Some(index) => index + 1,
                None => self.posts.len(),
            },
            None => 0,
        };
        let end = (start + limit as usize).min(self.posts.len());
        let posts = self.posts[start..end].to_vec();
        let has_more = end < self.posts.len();
        Ok(FeedPage {
            next_cursor: if has_more {
                posts.last().map(|p| p.id.clone())
            } else {
                None
            },
            posts,
            has_more,
        })
    }

    async fn like(&self, target: &Target) -> Result<(), ApiError> {
        self.record(format!("like {}", target.id()))
    }

    async fn unlike(&self, target: &Target) -> Result<(), ApiError> {
        self.record(format!("unlike {}", target.id()))
    }

    async fn fetch_comments(&self, post_id: &str) -> Result<Vec<CommentView>, ApiError> {
        self.record(format!("comments {}", post_id))?;
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(post_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_comment(&self, request: &CreateCommentRequest) -> Result<CommentView, ApiError> {
        self.record(format!("create comment {}", request.post_id))?;
        let mut comments = self.comments.lock().unwrap();
        let list = comments.entry(request.post_id.clone()).or_default();
        let mut created = comment(
            &format!("c{}", 100 + list.len()),
            request.parent_id.as_deref(),
            100 + list.len() as i64,
        );
        created.post_id = request.post_id.clone();
        created.content = request.content.clone();
        list.push(created.clone());
        Ok(created)
    }

    async fn fetch_likers(&self, target: &Target) -> Result<Vec<LikerView>, ApiError> {
        self.record(format!("likers {}", target.id()))?;
        Ok(self
            .likers
            .lock()
            .unwrap()
            .get(target)
            .cloned()
            .unwrap_or_default())
    }
}

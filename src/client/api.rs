use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use thiserror::Error;

use crate::client::Target;
use crate::comment::model::{CommentView, CreateCommentRequest};
use crate::like::model::LikerView;
use crate::post::model::FeedPage;

/// How a request to the server failed, as far as the client can tell
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("not authenticated")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ApiError::Unauthorized,
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            400 | 422 => ApiError::Validation(message),
            _ => ApiError::Server { status, message },
        }
    }
}

/// The server operations the reconciliation engine depends on
#[async_trait]
pub trait SocialApi: Send + Sync {
    async fn fetch_feed(&self, cursor: Option<&str>, limit: u32) -> Result<FeedPage, ApiError>;

    async fn like(&self, target: &Target) -> Result<(), ApiError>;

    async fn unlike(&self, target: &Target) -> Result<(), ApiError>;

    async fn fetch_comments(&self, post_id: &str) -> Result<Vec<CommentView>, ApiError>;

    async fn create_comment(&self, request: &CreateCommentRequest) -> Result<CommentView, ApiError>;

    async fn fetch_likers(&self, target: &Target) -> Result<Vec<LikerView>, ApiError>;
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct CommentEnvelope {
    comment: CommentView,
}

/// `SocialApi` over HTTP with a bearer token issued by the identity provider
#[derive(Clone)]
pub struct HttpSocialApi {
    base_url: String,
    token: String,
    client: Client,
}

impl HttpSocialApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: sanitize_base_url(base_url.into()),
            token: token.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn target_path(target: &Target) -> String {
        match target {
            Target::Post(id) => format!("/posts/{}", id),
            Target::Comment(id) => format!("/comments/{}", id),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.to_string());
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Transport(format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl SocialApi for HttpSocialApi {
    async fn fetch_feed(&self, cursor: Option<&str>, limit: u32) -> Result<FeedPage, ApiError> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        self.send(self.client.get(self.url("/posts")).query(&query))
            .await
    }

    async fn like(&self, target: &Target) -> Result<(), ApiError> {
        let url = self.url(&format!("{}/like", Self::target_path(target)));
        self.send::<IgnoredAny>(self.client.post(url)).await?;
        Ok(())
    }

    async fn unlike(&self, target: &Target) -> Result<(), ApiError> {
        let url = self.url(&format!("{}/like", Self::target_path(target)));
        self.send::<IgnoredAny>(self.client.delete(url)).await?;
        Ok(())
    }

    async fn fetch_comments(&self, post_id: &str) -> Result<Vec<CommentView>, ApiError> {
        let url = self.url(&format!("/posts/{}/comments", post_id));
        let body: DataEnvelope<Vec<CommentView>> = self.send(self.client.get(url)).await?;
        Ok(body.data)
    }

    async fn create_comment(&self, request: &CreateCommentRequest) -> Result<CommentView, ApiError> {
        let body: CommentEnvelope = self
            .send(self.client.post(self.url("/comments")).json(request))
            .await?;
        Ok(body.comment)
    }

    async fn fetch_likers(&self, target: &Target) -> Result<Vec<LikerView>, ApiError> {
        let url = self.url(&format!("{}/likes", Self::target_path(target)));
        let body: DataEnvelope<Vec<LikerView>> = self.send(self.client.get(url)).await?;
        Ok(body.data)
    }
}

fn sanitize_base_url(mut base: String) -> String {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{}", base);
    }
    while base.ends_with('/') {
        base.pop();
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_onto_taxonomy() {
        assert_eq!(ApiError::from_status(401, "x".into()), ApiError::Unauthorized);
        assert_eq!(
            ApiError::from_status(409, "Already liked".into()),
            ApiError::Conflict("Already liked".into())
        );
        assert!(matches!(ApiError::from_status(404, "x".into()), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_status(400, "x".into()), ApiError::Validation(_)));
        assert!(matches!(
            ApiError::from_status(503, "x".into()),
            ApiError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn base_url_is_normalized() {
        let api = HttpSocialApi::new("localhost:8000//", "t").unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/posts"), "http://localhost:8000/posts");
    }
}

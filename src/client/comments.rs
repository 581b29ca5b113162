use std::collections::HashMap;

use log::warn;

use crate::client::{ApiError, SocialApi};
use crate::comment::model::{CommentKind, CommentView, CreateCommentRequest};
use crate::post::model::PostView;

/// A top-level comment and every reply beneath it, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct CommentThread<'a> {
    pub comment: &'a CommentView,
    pub replies: Vec<&'a CommentView>,
}

fn root_of<'a>(by_id: &HashMap<&'a str, &'a CommentView>, comment: &'a CommentView) -> &'a str {
    let mut current = comment;
    // Bounded so a parent cycle cannot spin forever
    for _ in 0..by_id.len() {
        match current.kind() {
            CommentKind::Reply { parent_id } => match by_id.get(parent_id) {
                Some(&parent) => current = parent,
                None => break,
            },
            CommentKind::TopLevel => break,
        }
    }
    current.id.as_str()
}

/// Group a flat list for display. Replies whose parent is missing from the
/// list are shown as threads of their own.
pub fn group_threads(comments: &[CommentView]) -> Vec<CommentThread<'_>> {
    let by_id: HashMap<&str, &CommentView> =
        comments.iter().map(|c| (c.id.as_str(), c)).collect();

    let roots: Vec<&str> = comments.iter().map(|c| root_of(&by_id, c)).collect();

    let mut threads: Vec<CommentThread<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (comment, root) in comments.iter().zip(roots.iter().copied()) {
        if comment.id == root && !index.contains_key(root) {
            index.insert(root, threads.len());
            threads.push(CommentThread {
                comment,
                replies: Vec::new(),
            });
        }
    }

    for (comment, root) in comments.iter().zip(roots.iter().copied()) {
        if comment.id == root {
            continue;
        }
        match index.get(root) {
            Some(&i) => threads[i].replies.push(comment),
            None => threads.push(CommentThread {
                comment,
                replies: Vec::new(),
            }),
        }
    }

    threads
}

/// The comment area under one post
#[derive(Debug)]
pub struct CommentSection {
    post_id: String,
    expanded: bool,
    comments: Option<Vec<CommentView>>,
    loading: bool,
    submitting: bool,
    comment_count: u64,
    replying_to: Option<String>,
    last_error: Option<ApiError>,
}

impl CommentSection {
    pub fn new(post_id: impl Into<String>, comment_count: u64) -> Self {
        CommentSection {
            post_id: post_id.into(),
            expanded: false,
            comments: None,
            loading: false,
            submitting: false,
            comment_count,
            replying_to: None,
            last_error: None,
        }
    }

    pub fn for_post(post: &PostView) -> Self {
        Self::new(post.id.clone(), post.comment_count)
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn comment_count(&self) -> u64 {
        self.comment_count
    }

    pub fn comments(&self) -> Option<&[CommentView]> {
        self.comments.as_deref()
    }

    pub fn replying_to(&self) -> Option<&str> {
        self.replying_to.as_deref()
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn reply_to(&mut self, comment_id: Option<String>) {
        self.replying_to = comment_id;
    }

    pub fn threads(&self) -> Vec<CommentThread<'_>> {
        self.comments.as_deref().map(group_threads).unwrap_or_default()
    }

    /// Flip expansion. True when the caller should now fetch the comments;
    /// only the first expansion does.
    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        if self.expanded && self.comments.is_none() && !self.loading {
            self.loading = true;
            return true;
        }
        false
    }

    pub fn finish_fetch(&mut self, result: Result<Vec<CommentView>, ApiError>) {
        self.loading = false;
        match result {
            Ok(comments) => {
                self.comment_count = comments.len() as u64;
                self.comments = Some(comments);
                self.last_error = None;
            }
            Err(e) => {
                warn!("loading comments for {} failed: {}", self.post_id, e);
                self.last_error = Some(e);
            }
        }
    }

    pub async fn toggle_and_load<A: SocialApi + ?Sized>(&mut self, api: &A) {
        if self.toggle() {
            let result = api.fetch_comments(&self.post_id).await;
            self.finish_fetch(result);
        }
    }

    /// Add a comment returned by the server. False if it was already listed.
    pub fn merge(&mut self, comment: CommentView) -> bool {
        if let Some(list) = self.comments.as_mut() {
            if list.iter().any(|c| c.id == comment.id) {
                return false;
            }
            let at = list.partition_point(|c| c.created_at <= comment.created_at);
            list.insert(at, comment);
        }
        self.comment_count += 1;
        true
    }

    /// Build the create request, or None when the content is blank or a
    /// submission is already running
    pub fn begin_submit(&mut self, content: &str) -> Option<CreateCommentRequest> {
        let content = content.trim();
        if content.is_empty() || self.submitting {
            return None;
        }
        self.submitting = true;
        Some(CreateCommentRequest {
            content: content.to_string(),
            post_id: self.post_id.clone(),
            parent_id: self.replying_to.clone(),
        })
    }

    pub fn finish_submit(
        &mut self,
        result: Result<CommentView, ApiError>,
    ) -> Result<CommentView, ApiError> {
        self.submitting = false;
        match result {
            Ok(comment) => {
                self.merge(comment.clone());
                self.replying_to = None;
                Ok(comment)
            }
            Err(e) => {
                warn!("posting a comment on {} failed: {}", self.post_id, e);
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Submit a comment or a reply to `replying_to`. Ok(None) when nothing
    /// was sent.
    pub async fn submit<A: SocialApi + ?Sized>(
        &mut self,
        api: &A,
        content: &str,
    ) -> Result<Option<CommentView>, ApiError> {
        let Some(request) = self.begin_submit(content) else {
            return Ok(None);
        };
        let result = api.create_comment(&request).await;
        self.finish_submit(result).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::{FakeApi, comment};

    fn ids<'a>(items: impl IntoIterator<Item = &'a CommentView>) -> Vec<&'a str> {
        items.into_iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn replies_group_under_top_level_ancestor() {
        let list = vec![
            comment("a", None, 1),
            comment("b", None, 2),
            comment("a1", Some("a"), 3),
            comment("a1x", Some("a1"), 4),
            comment("b1", Some("b"), 5),
        ];
        let threads = group_threads(&list);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, "a");
        assert_eq!(ids(threads[0].replies.iter().copied()), ["a1", "a1x"]);
        assert_eq!(threads[1].comment.id, "b");
        assert_eq!(ids(threads[1].replies.iter().copied()), ["b1"]);
    }

    #[test]
    fn orphan_reply_is_shown_top_level() {
        let list = vec![comment("a", None, 1), comment("r", Some("gone"), 2)];
        let threads = group_threads(&list);
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[1].comment.id, "r");
        assert!(threads[1].replies.is_empty());
    }

    #[actix_web::test]
    async fn comments_are_fetched_once() {
        let api = FakeApi::default();
        api.comments
            .lock()
            .unwrap()
            .insert("p001".into(), vec![comment("a", None, 1)]);
        let mut section = CommentSection::new("p001", 1);

        section.toggle_and_load(&api).await;
        assert!(section.is_expanded());
        assert_eq!(section.comments().map(|c| c.len()), Some(1));

        section.toggle_and_load(&api).await;
        section.toggle_and_load(&api).await;
        assert!(section.is_expanded());
        assert_eq!(api.calls(), ["comments p001"]);
    }

    #[actix_web::test]
    async fn failed_fetch_is_retried_on_next_expand() {
        let api = FakeApi::default();
        let mut section = CommentSection::new("p001", 0);

        api.fail_with(ApiError::Transport("offline".into()));
        section.toggle_and_load(&api).await;
        assert!(section.comments().is_none());
        assert!(section.last_error().is_some());

        section.toggle_and_load(&api).await;
        section.toggle_and_load(&api).await;
        assert_eq!(section.comments().map(|c| c.len()), Some(0));
        assert_eq!(api.calls().len(), 2);
    }

    #[actix_web::test]
    async fn reply_is_merged_and_target_cleared() {
        let api = FakeApi::default();
        api.comments
            .lock()
            .unwrap()
            .insert("p001".into(), vec![comment("a", None, 1)]);
        let mut section = CommentSection::new("p001", 1);
        section.toggle_and_load(&api).await;

        section.reply_to(Some("a".into()));
        let created = section.submit(&api, "  nice  ").await.unwrap().unwrap();

        assert_eq!(created.content, "nice");
        assert_eq!(created.parent_id.as_deref(), Some("a"));
        assert_eq!(section.comment_count(), 2);
        assert_eq!(section.replying_to(), None);
        let threads = section.threads();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies.len(), 1);

        assert!(!section.merge(created));
        assert_eq!(section.comment_count(), 2);
    }

    #[actix_web::test]
    async fn blank_content_is_not_sent() {
        let api = FakeApi::default();
        let mut section = CommentSection::new("p001", 0);
        assert_eq!(section.submit(&api, "   ").await, Ok(None));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn one_submission_at_a_time() {
        let mut section = CommentSection::new("p001", 0);
        assert!(section.begin_submit("first").is_some());
        assert!(section.begin_submit("second").is_none());
        let err = section.finish_submit(Err(ApiError::NotFound("Post not found".into())));
        assert!(err.is_err());
        assert!(!section.is_submitting());
        assert_eq!(section.comment_count(), 0);
    }

    #[test]
    fn merge_keeps_chronological_order() {
        let mut section = CommentSection::new("p001", 0);
        section.toggle();
        section.finish_fetch(Ok(vec![comment("a", None, 1), comment("c", None, 3)]));
        section.merge(comment("b", None, 2));
        assert_eq!(ids(section.comments().unwrap()), ["a", "b", "c"]);
    }
}

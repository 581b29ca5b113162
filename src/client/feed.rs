use std::collections::HashSet;

use log::{debug, warn};

use crate::client::{ApiError, CommentSection, SocialApi};
use crate::post::model::{FeedPage, PostView};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    /// First page, or a refresh replacing the list
    Initial,
    /// Next page appended to the list
    Incremental,
}

/// Handed out when a load starts and redeemed with its response. A ticket
/// from an older generation is stale and its response is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    phase: LoadPhase,
    cursor: Option<String>,
}

impl LoadTicket {
    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

/// Accumulated feed pages for one screen
#[derive(Debug)]
pub struct FeedEngine {
    posts: Vec<PostView>,
    next_cursor: Option<String>,
    has_more: bool,
    phase: LoadPhase,
    generation: u64,
    page_size: u32,
    last_error: Option<ApiError>,
}

impl Default for FeedEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl FeedEngine {
    pub fn new(page_size: u32) -> Self {
        FeedEngine {
            posts: Vec::new(),
            next_cursor: None,
            has_more: false,
            phase: LoadPhase::Idle,
            generation: 0,
            page_size: page_size.max(1),
            last_error: None,
        }
    }

    pub fn posts(&self) -> &[PostView] {
        &self.posts
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase != LoadPhase::Idle
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// Start loading from the top. Ignored while another refresh is in
    /// flight; an in-flight load-more is superseded.
    pub fn begin_refresh(&mut self) -> Option<LoadTicket> {
        if self.phase == LoadPhase::Initial {
            debug!("refresh ignored, one is already in flight");
            return None;
        }
        self.generation += 1;
        self.phase = LoadPhase::Initial;
        self.last_error = None;
        Some(LoadTicket {
            generation: self.generation,
            phase: LoadPhase::Initial,
            cursor: None,
        })
    }

    /// Start loading the next page, unless a load is running or the feed is
    /// exhausted
    pub fn begin_load_more(&mut self) -> Option<LoadTicket> {
        if self.is_loading() || !self.has_more {
            return None;
        }
        let cursor = self.next_cursor.clone()?;
        self.phase = LoadPhase::Incremental;
        self.last_error = None;
        Some(LoadTicket {
            generation: self.generation,
            phase: LoadPhase::Incremental,
            cursor: Some(cursor),
        })
    }

    /// Apply the response for `ticket`. Returns false when the ticket was
    /// stale and nothing changed.
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<FeedPage, ApiError>) -> bool {
        if ticket.generation != self.generation || ticket.phase != self.phase {
            debug!(
                "dropping stale {:?} response (generation {}, current {})",
                ticket.phase, ticket.generation, self.generation
            );
            return false;
        }
        self.phase = LoadPhase::Idle;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("feed load failed: {}", e);
                self.last_error = Some(e);
                return true;
            }
        };

        match ticket.phase {
            LoadPhase::Initial => {
                self.posts.clear();
                self.append(page.posts);
            }
            _ => self.append(page.posts),
        }

        self.next_cursor = page.next_cursor;
        self.has_more = page.has_more && self.next_cursor.is_some();
        true
    }

    fn append(&mut self, posts: Vec<PostView>) {
        let mut seen: HashSet<String> = self.posts.iter().map(|p| p.id.clone()).collect();
        for post in posts {
            if seen.insert(post.id.clone()) {
                self.posts.push(post);
            }
        }
    }

    /// Mutable access to one accumulated post, e.g. to bump its comment count
    pub fn post_mut(&mut self, post_id: &str) -> Option<&mut PostView> {
        self.posts.iter_mut().find(|p| p.id == post_id)
    }

    /// Carry a comment section's count back onto its post. False when the
    /// post is no longer in the list.
    pub fn sync_comment_count(&mut self, section: &CommentSection) -> bool {
        match self.post_mut(section.post_id()) {
            Some(post) => {
                post.comment_count = section.comment_count();
                true
            }
            None => false,
        }
    }

    pub async fn refresh<A: SocialApi + ?Sized>(&mut self, api: &A) -> bool {
        let Some(ticket) = self.begin_refresh() else {
            return false;
        };
        let result = api.fetch_feed(ticket.cursor(), self.page_size).await;
        self.complete(ticket, result)
    }

    /// Called when the end-of-list sentinel becomes visible
    pub async fn load_more<A: SocialApi + ?Sized>(&mut self, api: &A) -> bool {
        let Some(ticket) = self.begin_load_more() else {
            return false;
        };
        let result = api.fetch_feed(ticket.cursor(), self.page_size).await;
        self.complete(ticket, result)
    }
}

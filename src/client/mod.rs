//! Client-side state for a feed screen: page accumulation, optimistic likes,
//! comment sections and likers lists, reconciled against the HTTP API.

pub mod api;
pub mod comments;
pub mod feed;
pub mod likers;
pub mod likes;

#[cfg(test)]
mod fake;

pub use api::{ApiError, HttpSocialApi, SocialApi};
pub use comments::{CommentSection, CommentThread, group_threads};
pub use feed::{FeedEngine, LoadPhase, LoadTicket};
pub use likers::LikersCache;
pub use likes::{LikeAction, LikeLedger, LikeState, PendingToggle};

/// A likeable thing, keyed by kind and id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Post(String),
    Comment(String),
}

impl Target {
    pub fn id(&self) -> &str {
        match self {
            Target::Post(id) | Target::Comment(id) => id,
        }
    }
}

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::client::{ApiError, SocialApi, Target};
use crate::comment::model::CommentView;
use crate::post::model::PostView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikeState {
    pub liked: bool,
    pub count: u64,
}

impl LikeState {
    fn toggled(self) -> Self {
        if self.liked {
            LikeState {
                liked: false,
                count: self.count.saturating_sub(1),
            }
        } else {
            LikeState {
                liked: true,
                count: self.count + 1,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Like,
    Unlike,
}

/// A toggle that has been applied optimistically and awaits the server
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PendingToggle {
    target: Target,
    snapshot: LikeState,
    optimistic: LikeState,
    action: LikeAction,
}

impl PendingToggle {
    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn snapshot(&self) -> LikeState {
        self.snapshot
    }

    pub fn action(&self) -> LikeAction {
        self.action
    }
}

/// Like state for every post and comment on screen, with at most one
/// mutation in flight per target
#[derive(Debug, Default)]
pub struct LikeLedger {
    states: HashMap<Target, LikeState>,
    in_flight: HashSet<Target>,
}

impl LikeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what the server reported, unless a mutation is in flight
    pub fn track(&mut self, target: Target, state: LikeState) {
        if self.in_flight.contains(&target) {
            return;
        }
        self.states.insert(target, state);
    }

    pub fn track_posts(&mut self, posts: &[PostView]) {
        for post in posts {
            self.track(
                Target::Post(post.id.clone()),
                LikeState {
                    liked: post.liked_by_me,
                    count: post.like_count,
                },
            );
        }
    }

    pub fn track_comments(&mut self, comments: &[CommentView]) {
        for comment in comments {
            self.track(
                Target::Comment(comment.id.clone()),
                LikeState {
                    liked: comment.liked_by_me,
                    count: comment.like_count,
                },
            );
        }
    }

    pub fn state(&self, target: &Target) -> LikeState {
        self.states.get(target).copied().unwrap_or_default()
    }

    pub fn is_in_flight(&self, target: &Target) -> bool {
        self.in_flight.contains(target)
    }

    /// Flip the target immediately. None when a toggle for the same target
    /// is already waiting on the server.
    pub fn begin(&mut self, target: &Target) -> Option<PendingToggle> {
        if !self.in_flight.insert(target.clone()) {
            debug!("toggle ignored, {:?} is already in flight", target);
            return None;
        }

        let snapshot = self.state(target);
        let optimistic = snapshot.toggled();
        self.states.insert(target.clone(), optimistic);

        Some(PendingToggle {
            target: target.clone(),
            snapshot,
            optimistic,
            action: if snapshot.liked {
                LikeAction::Unlike
            } else {
                LikeAction::Like
            },
        })
    }

    /// Reconcile with the server's answer. A conflict on like means the like
    /// already exists, which is the state we predicted.
    pub fn settle(&mut self, pending: PendingToggle, outcome: Result<(), ApiError>) -> LikeState {
        self.in_flight.remove(&pending.target);

        let state = match outcome {
            Ok(()) => pending.optimistic,
            Err(ApiError::Conflict(_)) if pending.action == LikeAction::Like => pending.optimistic,
            Err(e) => {
                warn!("{:?} on {:?} failed, rolling back: {}", pending.action, pending.target, e);
                pending.snapshot
            }
        };

        self.states.insert(pending.target, state);
        state
    }

    /// Full round trip. None when the tap was swallowed by the in-flight guard.
    pub async fn toggle<A: SocialApi + ?Sized>(
        &mut self,
        api: &A,
        target: &Target,
    ) -> Option<LikeState> {
        let pending = self.begin(target)?;
        let outcome = match pending.action {
            LikeAction::Like => api.like(target).await,
            LikeAction::Unlike => api.unlike(target).await,
        };
        Some(self.settle(pending, outcome))
    }
}

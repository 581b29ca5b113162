use std::collections::{HashMap, HashSet};

use log::warn;

use crate::client::{ApiError, SocialApi, Target};
use crate::like::model::LikerView;

/// "Who liked this" lists, fetched on first open and kept for the life of
/// the screen
#[derive(Debug, Default)]
pub struct LikersCache {
    entries: HashMap<Target, Vec<LikerView>>,
    loading: HashSet<Target>,
}

impl LikersCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &Target) -> Option<&[LikerView]> {
        self.entries.get(target).map(Vec::as_slice)
    }

    pub fn is_loading(&self, target: &Target) -> bool {
        self.loading.contains(target)
    }

    /// True when the caller should fetch: nothing cached and no fetch running
    pub fn begin(&mut self, target: &Target) -> bool {
        if self.entries.contains_key(target) {
            return false;
        }
        self.loading.insert(target.clone())
    }

    pub fn finish(&mut self, target: &Target, result: Result<Vec<LikerView>, ApiError>) {
        self.loading.remove(target);
        match result {
            Ok(likers) => {
                self.entries.insert(target.clone(), likers);
            }
            Err(e) => warn!("loading likers for {:?} failed: {}", target, e),
        }
    }

    pub async fn open<A: SocialApi + ?Sized>(
        &mut self,
        api: &A,
        target: &Target,
    ) -> Option<&[LikerView]> {
        if self.begin(target) {
            let result = api.fetch_likers(target).await;
            self.finish(target, result);
        }
        self.get(target)
    }
}

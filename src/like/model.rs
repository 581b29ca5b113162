use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::user::model::AuthorView;

/// What a like points at. Post likes and comment likes live in separate
/// collections, each unique on (user_id, target_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Post(ObjectId),
    Comment(ObjectId),
}

impl LikeTarget {
    pub fn id(&self) -> &ObjectId {
        match self {
            LikeTarget::Post(id) | LikeTarget::Comment(id) => id,
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            LikeTarget::Post(_) => "post",
            LikeTarget::Comment(_) => "comment",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub target_id: ObjectId,
    pub user_id: ObjectId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LikeView {
    pub id: String,
    pub target_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Like> for LikeView {
    fn from(like: &Like) -> Self {
        LikeView {
            id: like.id.to_hex(),
            target_id: like.target_id.to_hex(),
            user_id: like.user_id.to_hex(),
            created_at: like.created_at,
        }
    }
}

/// One entry of a "who liked this" list
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LikerView {
    pub id: String,
    #[serde(default)]
    pub user: Option<AuthorView>,
    pub created_at: DateTime<Utc>,
}

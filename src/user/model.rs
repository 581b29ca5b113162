use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// The slice of a user record this service reads. Users are written by the
/// identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&UserSummary> for AuthorView {
    fn from(user: &UserSummary) -> Self {
        AuthorView {
            id: user.id.to_hex(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;

use crate::database::Store;
use crate::user::model::AuthorView;
use crate::utils::error::CustomError;

/// Resolve author summaries for a batch of records in one lookup.
/// Unknown ids are simply absent from the map.
pub async fn load_authors<I>(
    store: &dyn Store,
    ids: I,
) -> Result<HashMap<ObjectId, AuthorView>, CustomError>
where
    I: IntoIterator<Item = ObjectId>,
{
    let mut unique: Vec<ObjectId> = ids.into_iter().collect();
    unique.sort();
    unique.dedup();

    let users = store.find_users(&unique).await?;
    Ok(users
        .iter()
        .map(|user| (user.id, AuthorView::from(user)))
        .collect())
}
